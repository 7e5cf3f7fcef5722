//! tagpub core library: build identity, manifest types, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: [`BuildIdentity`], [`StorageLocation`], [`ArtifactRecord`], [`TagManifest`]
//! - [`error`]: [`IdentityError`], [`ConfigError`]
//! - [`config`]: layered service configuration (defaults, YAML, environment)
//! - [`urls`]: percent-encoded store URLs shared by uploads and manifests

pub mod config;
pub mod error;
pub mod types;
pub mod urls;

pub use config::{Config, ConsistencyConfig};
pub use error::{ConfigError, IdentityError, UrlError};
pub use types::{
    validate_build_id, ArtifactName, ArtifactRecord, BuildIdentity, BuildMode, StorageLocation,
    TagKey, TagManifest, DEVELOPER_SEGMENT,
};
