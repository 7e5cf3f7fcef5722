//! Error types for tagpub-publish.

use std::path::PathBuf;

use thiserror::Error;

use tagpub_client::ClientError;
use tagpub_core::{IdentityError, UrlError};
use tagpub_manifest::ManifestError;
use tagpub_render::RenderError;

/// All errors that can arise from staging and publishing a build.
///
/// Errors from the store, registry and manifest layers pass through
/// unchanged; publishing never retries beyond the store's consistency poll.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Store or registry failure, including the consistency timeout.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Manifest assembly failed (metadata files, commit resolution).
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Installer config rendering failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The tag name is not a valid key segment.
    #[error("invalid tag: {0}")]
    Identity(#[from] IdentityError),

    /// The store base URL cannot address this build.
    #[error(transparent)]
    Url(#[from] UrlError),

    /// A directory the backend should have produced is missing.
    #[error("expected build output not found: {path}")]
    MissingOutput { path: PathBuf },

    /// The package indexer exited unsuccessfully or could not be started.
    #[error("{program} failed on {path}: {message}")]
    Indexer {
        program: String,
        path: PathBuf,
        message: String,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PublishError {
    /// True when the store never confirmed the upload.
    pub fn is_consistency_timeout(&self) -> bool {
        matches!(
            self,
            PublishError::Client(ClientError::ConsistencyTimeout { .. })
        )
    }
}

/// Convenience constructor for [`PublishError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PublishError {
    PublishError::Io {
        path: path.into(),
        source,
    }
}
