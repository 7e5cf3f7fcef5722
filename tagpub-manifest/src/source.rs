//! Source-control metadata for manifests.
//!
//! Only three opaque questions are ever asked of a checkout: the current
//! commit, the current branch, and the origin remote URL. [`GitCli`] answers
//! them by shelling out to `git`; [`FixedSource`] answers them from values
//! supplied up front (CI environment, tests).

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ManifestError;

const GITHUB_PREFIX: &str = "https://github.com/";

/// The three source-control calls the manifest builder depends on.
pub trait SourceControl {
    /// Full commit id of `HEAD`.
    fn commit_id(&self, checkout: &Path) -> Result<String, ManifestError>;

    /// Current branch name.
    fn branch(&self, checkout: &Path) -> Result<String, ManifestError>;

    /// URL of the `origin` remote, `None` if there is no such remote.
    fn origin_url(&self, checkout: &Path) -> Result<Option<String>, ManifestError>;
}

/// Commit provenance recorded in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub commit_id: String,
    pub commit_url: Option<String>,
}

/// Resolve commit id (required) and commit URL (best-effort).
///
/// A failure to read the origin remote only drops the commit URL.
pub fn resolve_commit(
    source: &dyn SourceControl,
    checkout: &Path,
) -> Result<CommitInfo, ManifestError> {
    let commit_id = validate_commit_id(&source.commit_id(checkout)?)?;
    let commit_url = match source.origin_url(checkout) {
        Ok(Some(origin)) => github_commit_url(&origin, &commit_id),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(error = %err, "origin remote unavailable; omitting commit_url");
            None
        }
    };
    Ok(CommitInfo {
        commit_id,
        commit_url,
    })
}

/// Branch the checkout is on. A detached `HEAD` has no branch.
pub fn resolve_branch(
    source: &dyn SourceControl,
    checkout: &Path,
) -> Result<String, ManifestError> {
    let branch = source.branch(checkout)?;
    let branch = branch.trim();
    if branch.is_empty() || branch == "HEAD" {
        return Err(ManifestError::SourceMetadataUnavailable {
            what: "branch",
            detail: "checkout is not on a branch (detached HEAD)".to_string(),
        });
    }
    Ok(branch.to_string())
}

/// Commit permalink for GitHub-hosted origins, `None` for anything else.
///
/// `https://github.com/org/repo.git` becomes
/// `https://github.com/org/repo/commit/<sha>`.
pub fn github_commit_url(origin: &str, commit_id: &str) -> Option<String> {
    let rest = origin.trim().strip_prefix(GITHUB_PREFIX)?;
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let mut parts = rest.split('/');
    let (org, repo) = (parts.next()?, parts.next()?);
    if org.is_empty() || repo.is_empty() || parts.next().is_some() {
        return None;
    }
    Some(format!("{GITHUB_PREFIX}{org}/{repo}/commit/{commit_id}"))
}

/// Accept 40 (sha-1) or 64 (sha-256) hex characters, normalised to lowercase.
pub fn validate_commit_id(raw: &str) -> Result<String, ManifestError> {
    let id = raw.trim().to_ascii_lowercase();
    let well_formed =
        matches!(id.len(), 40 | 64) && id.chars().all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        return Err(ManifestError::SourceMetadataUnavailable {
            what: "commit id",
            detail: format!("'{}' is not a full commit hash", raw.trim()),
        });
    }
    Ok(id)
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

/// [`SourceControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitCli {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(
        &self,
        checkout: &Path,
        what: &'static str,
        args: &[&str],
    ) -> Result<Output, ManifestError> {
        let output = Command::new(&self.program)
            .arg("-C")
            .arg(checkout)
            .args(args)
            .output()
            .map_err(|e| ManifestError::SourceMetadataUnavailable {
                what,
                detail: format!("failed to run {}: {e}", self.program.display()),
            })?;
        Ok(Output {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn run_required(
        &self,
        checkout: &Path,
        what: &'static str,
        args: &[&str],
    ) -> Result<String, ManifestError> {
        let output = self.run(checkout, what, args)?;
        if !output.success || output.stdout.is_empty() {
            return Err(ManifestError::SourceMetadataUnavailable {
                what,
                detail: format!("git {} failed: {}", args.join(" "), output.stderr),
            });
        }
        Ok(output.stdout)
    }
}

struct Output {
    success: bool,
    stdout: String,
    stderr: String,
}

impl SourceControl for GitCli {
    fn commit_id(&self, checkout: &Path) -> Result<String, ManifestError> {
        self.run_required(checkout, "commit id", &["rev-parse", "HEAD"])
    }

    fn branch(&self, checkout: &Path) -> Result<String, ManifestError> {
        self.run_required(checkout, "branch", &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn origin_url(&self, checkout: &Path) -> Result<Option<String>, ManifestError> {
        // `git config --get` exits 1 when the key is unset.
        let output = self.run(
            checkout,
            "origin url",
            &["config", "--get", "remote.origin.url"],
        )?;
        if !output.success || output.stdout.is_empty() {
            return Ok(None);
        }
        Ok(Some(output.stdout))
    }
}

// ---------------------------------------------------------------------------
// FixedSource
// ---------------------------------------------------------------------------

/// [`SourceControl`] with pre-resolved answers, independent of the checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedSource {
    pub commit_id: Option<String>,
    pub branch: Option<String>,
    pub origin_url: Option<String>,
}

impl FixedSource {
    pub fn new(commit_id: impl Into<String>) -> Self {
        Self {
            commit_id: Some(commit_id.into()),
            ..Self::default()
        }
    }

    pub fn with_origin(mut self, origin_url: impl Into<String>) -> Self {
        self.origin_url = Some(origin_url.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

impl SourceControl for FixedSource {
    fn commit_id(&self, _checkout: &Path) -> Result<String, ManifestError> {
        self.commit_id
            .clone()
            .ok_or(ManifestError::SourceMetadataUnavailable {
                what: "commit id",
                detail: "no commit id supplied".to_string(),
            })
    }

    fn branch(&self, _checkout: &Path) -> Result<String, ManifestError> {
        self.branch
            .clone()
            .ok_or(ManifestError::SourceMetadataUnavailable {
                what: "branch",
                detail: "no branch supplied".to_string(),
            })
    }

    fn origin_url(&self, _checkout: &Path) -> Result<Option<String>, ManifestError> {
        Ok(self.origin_url.clone())
    }
}
