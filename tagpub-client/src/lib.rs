//! # tagpub-client
//!
//! Clients for the two remote services a publish touches:
//!
//! - [`RemoteStore`]: per-build file storage, existence probes, and the
//!   bounded consistency poll
//! - [`TagRegistry`]: tag manifests and single artifact records
//!
//! Both speak through the [`Transport`] seam. [`UreqTransport`] is the real
//! HTTP implementation; [`MemoryBackend`] emulates both services in-process.

pub mod error;
pub mod install;
pub mod memory;
pub mod registry;
pub mod store;
pub mod transport;
mod urls;

pub use error::ClientError;
pub use install::{fetch_install_config, InstallConfig};
pub use memory::{MemoryBackend, Method, RecordedRequest, Service};
pub use registry::TagRegistry;
pub use store::{ConsistencyPolicy, RemoteStore, UploadReport, UploadedFile};
pub use transport::{Body, HttpResponse, Transport, UreqTransport};
