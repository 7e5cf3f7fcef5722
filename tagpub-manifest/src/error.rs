//! Error types for tagpub-manifest.

use std::path::PathBuf;

use tagpub_core::UrlError;
use thiserror::Error;

/// All errors that can arise while assembling a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backend metadata file had a malformed line.
    #[error("failed to parse {path} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A backend JSON descriptor could not be decoded.
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The backend declared no artifacts at all.
    #[error("no artifacts declared in {path}")]
    NoArtifacts { path: PathBuf },

    /// A descriptor's `file` is absolute or climbs out of the output directory.
    #[error("descriptor file '{file}' is not a path inside the output directory")]
    UnsafePath { file: String },

    /// A record URL could not be built from the store base URL.
    #[error("cannot build store URL: {0}")]
    Url(#[from] UrlError),

    /// Commit id (or another required piece of source metadata) could not be resolved.
    #[error("source metadata unavailable: {what}: {detail}")]
    SourceMetadataUnavailable { what: &'static str, detail: String },
}

/// Convenience constructor for [`ManifestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
