//! # tagpub-manifest
//!
//! Turns a packaging backend's declared outputs into a [`TagManifest`].
//!
//! - [`metadata`]: parse `packages.txt` / `image.json` left by the backend
//! - [`source`]: commit metadata through the [`SourceControl`] seam
//! - [`builder`]: [`ManifestBuilder`], one [`ArtifactRecord`] per declared output
//! - [`stamp`]: build-id/commit version stamping for rpm and maven
//!
//! [`TagManifest`]: tagpub_core::TagManifest
//! [`ArtifactRecord`]: tagpub_core::ArtifactRecord

pub mod builder;
pub mod error;
pub mod metadata;
pub mod source;
pub mod stamp;

pub use builder::{BuildOutput, ManifestBuilder, MAVEN_REPOSITORY_DIR, RPM_REPOSITORY_DIR};
pub use error::ManifestError;
pub use metadata::{ImageDescriptor, MavenCoordinates, RpmPackage};
pub use source::{
    github_commit_url, resolve_branch, resolve_commit, CommitInfo, FixedSource, GitCli,
    SourceControl,
};
pub use stamp::{build_stamp, maven_version, rpm_release};
