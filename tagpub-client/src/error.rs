//! Error types for tagpub-client.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from store and registry operations.
///
/// "Not found" is never an error here; lookups return `Ok(None)` / `Ok(false)`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (DNS, connect, timeout, …).
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: &'static str,
        url: String,
        message: String,
    },

    /// The service answered with a status the operation cannot accept.
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// A response body was not the JSON document expected.
    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A service URL could not be constructed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store never reported an uploaded build as present.
    #[error("storage consistency timeout: {location} not visible after {attempts} attempts")]
    ConsistencyTimeout { location: String, attempts: u32 },

    /// The artifact exists but has no package repository to install from.
    #[error("artifact '{artifact}' is of type {kind} and has no package repository")]
    NotInstallable { artifact: String, kind: &'static str },
}

/// Convenience constructor for [`ClientError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ClientError {
    ClientError::Io {
        path: path.into(),
        source,
    }
}
