//! Percent-encoded URL construction.
//!
//! Uploads and manifest records both go through [`join_segments`], so a file
//! is always recorded under the exact URL it was stored at.

use url::Url;

use crate::error::UrlError;

/// `base` followed by `segments`, each segment percent-encoded on its own.
///
/// A trailing `/` on `base` is ignored, and any path `base` already carries
/// is kept as a prefix.
pub fn join_segments<'s, I>(base: &str, segments: I) -> Result<Url, UrlError>
where
    I: IntoIterator<Item = &'s str>,
{
    let invalid = |reason: String| UrlError {
        url: base.to_string(),
        reason,
    };
    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| invalid("URL cannot be a base".to_string()))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_segments_under_base_path() {
        let url = join_segments("http://files:7070/store/", ["widget", "main", "42"]).unwrap();
        assert_eq!(url.as_str(), "http://files:7070/store/widget/main/42");
    }

    #[test]
    fn segments_are_percent_encoded() {
        let url = join_segments("http://files", ["odd name#1"]).unwrap();
        assert_eq!(url.as_str(), "http://files/odd%20name%231");
    }

    #[test]
    fn relative_base_is_rejected() {
        let err = join_segments("files/store", ["a"]).unwrap_err();
        assert_eq!(err.url, "files/store");
    }
}
