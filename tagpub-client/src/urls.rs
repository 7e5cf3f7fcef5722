//! Service URLs: core's segment join plus the dry-run marker.

use tagpub_core::urls::join_segments;
use tagpub_core::UrlError;
use url::Url;

use crate::error::ClientError;

pub(crate) const DRY_RUN_PARAM: &str = "dry-run";

impl From<UrlError> for ClientError {
    fn from(e: UrlError) -> Self {
        ClientError::InvalidUrl {
            url: e.url,
            reason: e.reason,
        }
    }
}

/// `base` + `segments`, each segment encoded on its own; `?dry-run=1` when asked.
pub(crate) fn join<'s, I>(base: &str, segments: I, dry_run: bool) -> Result<String, ClientError>
where
    I: IntoIterator<Item = &'s str>,
{
    Ok(mark(join_segments(base, segments)?, dry_run))
}

/// Append the dry-run query flag when `dry_run` is set.
pub(crate) fn mark(mut url: Url, dry_run: bool) -> String {
    if dry_run {
        url.query_pairs_mut().append_pair(DRY_RUN_PARAM, "1");
    }
    url.into()
}
