//! Error types for tagpub-core.

use std::path::PathBuf;

use thiserror::Error;

/// Rejections raised while constructing a [`crate::BuildIdentity`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// A required key segment (repository, branch) was empty.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// A key segment would not map to exactly one path segment.
    #[error("{field} '{value}' is not a valid path segment")]
    InvalidSegment { field: &'static str, value: String },

    /// A build id was supplied but is empty or the legacy `"0"` sentinel.
    ///
    /// Developer builds are expressed only by omitting the build id.
    #[error("build id '{0}' is not allowed; omit the build id for developer builds")]
    ReservedBuildId(String),
}

/// All errors that can arise while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A configured service endpoint is not an absolute http(s) URL.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A numeric setting is out of range.
    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// `dirs::home_dir()` returned `None`: cannot locate `~/.tagpub/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// A store or registry URL could not be built from its base and segments.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid URL '{url}': {reason}")]
pub struct UrlError {
    pub url: String,
    pub reason: String,
}
