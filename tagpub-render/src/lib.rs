//! # tagpub-render
//!
//! Tera-based rendering of installer configs published alongside a build:
//! the yum `.repo` descriptor for rpm repositories and maven `settings.xml`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tagpub_core::BuildIdentity;
//! use tagpub_render::{RepoConfigContext, TemplateEngine};
//!
//! fn repo_file(identity: &BuildIdentity, repository_url: &str) -> Option<String> {
//!     let engine = TemplateEngine::embedded().ok()?;
//!     engine
//!         .render_repo_config(&RepoConfigContext::new(identity, repository_url))
//!         .ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{MavenSettingsContext, RepoConfigContext};
pub use engine::{ConfigKind, TemplateEngine};
pub use error::RenderError;
