//! # tagpub-publish
//!
//! Stages a packaging backend's output and publishes it: store upload with a
//! bounded consistency wait, then a tag manifest in the registry.
//!
//! Call [`Stager::stage`] to lay out a build directory for upload and
//! [`Publisher::publish_staged`] to push it. Builds without a build id run
//! the same sequence with every write sent as dry-run.

pub mod error;
pub mod publisher;
pub mod stage;

pub use error::PublishError;
pub use publisher::{PublishReport, Publisher, StoreOutcome};
pub use stage::{Backend, Createrepo, NoopIndexer, RepoIndexer, StagedBuild, Stager, STAGE_DIR};
