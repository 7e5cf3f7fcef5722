//! Staging: lay a backend's output directory out exactly as it will be stored.
//!
//! | Backend | Staged from                    | Stored as                         |
//! |---------|--------------------------------|-----------------------------------|
//! | rpm     | `RPMS/**` + index + config     | `repo/...`, `repo/config.txt`     |
//! | maven   | `maven-repository/**`          | `maven-repository/...`            |
//! | file    | `image.json` `file`            | the same relative path            |
//!
//! The staged directory is rebuilt from scratch on every run, so a retried
//! publish uploads the same bytes as the first attempt.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;

use tagpub_core::BuildIdentity;
use tagpub_manifest::{BuildOutput, MAVEN_REPOSITORY_DIR, RPM_REPOSITORY_DIR};
use tagpub_render::{ConfigKind, RepoConfigContext, TemplateEngine};

use crate::error::{io_err, PublishError};

/// Directory under the build directory that becomes the upload root.
pub const STAGE_DIR: &str = "publish";
/// Where `rpmbuild` leaves binary packages.
pub const RPMS_DIR: &str = "RPMS";

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Packaging backend whose output is being published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Rpm,
    Maven,
    File,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Rpm => "rpm",
            Backend::Maven => "maven",
            Backend::File => "file",
        }
    }

    /// Read the metadata file the backend left in `build_dir`.
    pub fn read_output(&self, build_dir: &Path) -> Result<BuildOutput, PublishError> {
        Ok(match self {
            Backend::Rpm => BuildOutput::read_rpm(build_dir)?,
            Backend::Maven => BuildOutput::read_maven(build_dir)?,
            Backend::File => BuildOutput::read_file(build_dir)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Package indexer
// ---------------------------------------------------------------------------

/// Generates package-repository metadata (`repodata/`) for a directory of rpms.
pub trait RepoIndexer {
    fn index(&self, repo_dir: &Path) -> Result<(), PublishError>;
}

/// [`RepoIndexer`] that runs `createrepo`.
#[derive(Debug, Clone)]
pub struct Createrepo {
    program: PathBuf,
}

impl Default for Createrepo {
    fn default() -> Self {
        Self {
            program: PathBuf::from("createrepo"),
        }
    }
}

impl Createrepo {
    /// Use a different executable, e.g. `createrepo_c`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RepoIndexer for Createrepo {
    fn index(&self, repo_dir: &Path) -> Result<(), PublishError> {
        let program = self.program.display().to_string();
        tracing::debug!(program = %program, dir = %repo_dir.display(), "indexing rpm repository");

        let output = Command::new(&self.program)
            .arg("--quiet")
            .arg(repo_dir)
            .output()
            .map_err(|e| PublishError::Indexer {
                program: program.clone(),
                path: repo_dir.to_path_buf(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PublishError::Indexer {
                program,
                path: repo_dir.to_path_buf(),
                message: if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                },
            });
        }
        Ok(())
    }
}

/// [`RepoIndexer`] that leaves the directory as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndexer;

impl RepoIndexer for NoopIndexer {
    fn index(&self, _repo_dir: &Path) -> Result<(), PublishError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stager
// ---------------------------------------------------------------------------

/// A build laid out for upload, plus the metadata the manifest is built from.
#[derive(Debug, Clone)]
pub struct StagedBuild {
    pub backend: Backend,
    pub upload_dir: PathBuf,
    pub output: BuildOutput,
}

/// Prepares upload directories.
pub struct Stager<'a> {
    store_url: &'a str,
    engine: &'a TemplateEngine,
    indexer: &'a dyn RepoIndexer,
}

impl<'a> Stager<'a> {
    pub fn new(
        store_url: &'a str,
        engine: &'a TemplateEngine,
        indexer: &'a dyn RepoIndexer,
    ) -> Self {
        Self {
            store_url,
            engine,
            indexer,
        }
    }

    /// Read the backend's metadata and stage its output under `<build_dir>/publish`.
    pub fn stage(
        &self,
        backend: Backend,
        identity: &BuildIdentity,
        build_dir: &Path,
    ) -> Result<StagedBuild, PublishError> {
        let output = backend.read_output(build_dir)?;
        let upload_dir = build_dir.join(STAGE_DIR);
        reset_dir(&upload_dir)?;

        match &output {
            BuildOutput::Rpm { .. } => self.stage_rpm(identity, build_dir, &upload_dir)?,
            BuildOutput::Maven { .. } => {
                let from = build_dir.join(MAVEN_REPOSITORY_DIR);
                let copied = copy_output_tree(&from, &upload_dir.join(MAVEN_REPOSITORY_DIR))?;
                tracing::debug!(files = copied, "staged maven repository");
            }
            BuildOutput::File { descriptor } => {
                let rel: PathBuf = descriptor.file_segments()?.into_iter().collect();
                let from = build_dir.join(&rel);
                if !from.is_file() {
                    return Err(PublishError::MissingOutput { path: from });
                }
                let to = upload_dir.join(&rel);
                copy_file(&from, &to)?;
                tracing::debug!(file = %descriptor.file, "staged file artifact");
            }
        }

        tracing::info!(
            backend = backend.as_str(),
            build = %identity,
            dir = %upload_dir.display(),
            "build staged"
        );
        Ok(StagedBuild {
            backend,
            upload_dir,
            output,
        })
    }

    fn stage_rpm(
        &self,
        identity: &BuildIdentity,
        build_dir: &Path,
        upload_dir: &Path,
    ) -> Result<(), PublishError> {
        let repo_dir = upload_dir.join(RPM_REPOSITORY_DIR);
        let copied = copy_output_tree(&build_dir.join(RPMS_DIR), &repo_dir)?;
        tracing::debug!(files = copied, "staged rpm packages");

        self.indexer.index(&repo_dir)?;

        let repository_url = identity
            .location()
            .file_url(self.store_url, &[RPM_REPOSITORY_DIR])?;
        let config = self
            .engine
            .render_repo_config(&RepoConfigContext::new(identity, repository_url))?;
        let config_path = repo_dir.join(ConfigKind::YumRepo.file_name());
        fs::write(&config_path, config).map_err(|e| io_err(&config_path, e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn reset_dir(dir: &Path) -> Result<(), PublishError> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| io_err(dir, e))
}

fn copy_file(from: &Path, to: &Path) -> Result<(), PublishError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    fs::copy(from, to).map_err(|e| io_err(from, e))?;
    Ok(())
}

/// Copy a directory the backend produced. Missing source is [`PublishError::MissingOutput`].
fn copy_output_tree(from: &Path, to: &Path) -> Result<usize, PublishError> {
    if !from.is_dir() {
        return Err(PublishError::MissingOutput {
            path: from.to_path_buf(),
        });
    }
    fs::create_dir_all(to).map_err(|e| io_err(to, e))?;
    copy_tree(from, to)
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize, PublishError> {
    let mut copied = 0;
    let entries = fs::read_dir(from).map_err(|e| io_err(from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(from, e))?;
        let path = entry.path();
        let target = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| io_err(&target, e))?;
            copied += copy_tree(&path, &target)?;
        } else if file_type.is_file() {
            fs::copy(&path, &target).map_err(|e| io_err(&path, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}
