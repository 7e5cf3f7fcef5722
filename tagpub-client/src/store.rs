//! Remote build store.
//!
//! ## Surface
//!
//! ```text
//! GET {base}/{repo}/{branch}/{build}                   -> 2xx stored, 404 absent
//! PUT {base}/{repo}/{branch}/{build}/{relative_path}   body = file bytes
//! PUT ...?dry-run=1                                    developer builds only
//! ```
//!
//! Uploads are addressed by build id, so re-uploading the same build is a
//! harmless overwrite. The store may be eventually consistent; after an
//! upload, [`RemoteStore::wait_until_stored`] polls the existence probe a
//! bounded number of times.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};

use tagpub_core::{BuildIdentity, ConsistencyConfig, StorageLocation};

use crate::error::{io_err, ClientError};
use crate::transport::{Body, Transport};
use crate::urls;

/// Fixed-interval, bounded-attempt polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsistencyPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl From<&ConsistencyConfig> for ConsistencyPolicy {
    fn from(config: &ConsistencyConfig) -> Self {
        Self {
            interval: config.interval(),
            max_attempts: config.max_attempts,
        }
    }
}

impl Default for ConsistencyPolicy {
    fn default() -> Self {
        Self::from(&ConsistencyConfig::default())
    }
}

/// One file sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    /// Path relative to the upload root, `/`-separated.
    pub relative_path: String,
    pub bytes: u64,
    pub sha256: String,
}

/// Everything one [`RemoteStore::put`] sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub location: String,
    pub dry_run: bool,
    pub files: Vec<UploadedFile>,
}

impl UploadReport {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

/// Client for the per-build file store.
pub struct RemoteStore<'a> {
    transport: &'a dyn Transport,
    base_url: String,
}

impl<'a> RemoteStore<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Same URL the manifest records for `extra`, plus the dry-run marker.
    fn location_url(
        &self,
        location: &StorageLocation,
        extra: &[&str],
        dry_run: bool,
    ) -> Result<String, ClientError> {
        Ok(urls::mark(location.url(&self.base_url, extra)?, dry_run))
    }

    /// Existence probe for the build's storage key.
    ///
    /// `404`/`410` and other client-side statuses mean "not stored"; server
    /// errors are surfaced, since they say nothing about presence.
    pub fn exists(&self, identity: &BuildIdentity) -> Result<bool, ClientError> {
        let location = identity.location();
        let url = self.location_url(&location, &[], false)?;
        let response = self.transport.get(&url)?;

        if response.is_success() {
            tracing::debug!(location = %location, "store reports build present");
            return Ok(true);
        }
        if response.status >= 500 {
            return Err(ClientError::Status {
                method: "GET",
                url,
                status: response.status,
                body: response.text(),
            });
        }
        tracing::debug!(
            location = %location,
            status = response.status,
            "store reports build absent"
        );
        Ok(false)
    }

    /// Upload every regular file under `local_dir` to `{location}/{relative_path}`.
    ///
    /// Developer builds are sent with the dry-run marker. Files go up in
    /// sorted path order; any failed file aborts the upload.
    pub fn put(
        &self,
        identity: &BuildIdentity,
        local_dir: &Path,
    ) -> Result<UploadReport, ClientError> {
        let location = identity.location();
        let dry_run = identity.is_developer();

        let mut paths = Vec::new();
        collect_files(local_dir, &mut paths)?;
        paths.sort();

        tracing::info!(
            location = %location,
            files = paths.len(),
            dry_run,
            "uploading build"
        );

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let segments = relative_segments(local_dir, &path)?;
            let relative_path = segments.join("/");
            let bytes = fs::read(&path).map_err(|e| io_err(&path, e))?;

            let extra: Vec<&str> = segments.iter().map(String::as_str).collect();
            let url = self.location_url(&location, &extra, dry_run)?;
            let response = self.transport.put(&url, Body::Bytes(&bytes))?;
            if !response.is_success() {
                return Err(ClientError::Status {
                    method: "PUT",
                    url,
                    status: response.status,
                    body: response.text(),
                });
            }

            tracing::debug!(file = %relative_path, bytes = bytes.len(), "uploaded");
            files.push(UploadedFile {
                relative_path,
                bytes: bytes.len() as u64,
                sha256: hex::encode(Sha256::digest(&bytes)),
            });
        }

        Ok(UploadReport {
            location: location.path(),
            dry_run,
            files,
        })
    }

    /// Poll [`exists`](Self::exists) until it reports the build, at most
    /// `policy.max_attempts` probes, sleeping `policy.interval` between them.
    ///
    /// Returns the number of probes used. Exhausting the attempts is fatal.
    pub fn wait_until_stored(
        &self,
        identity: &BuildIdentity,
        policy: ConsistencyPolicy,
    ) -> Result<u32, ClientError> {
        let location = identity.location();
        for attempt in 1..=policy.max_attempts {
            if self.exists(identity)? {
                tracing::info!(location = %location, attempt, "upload visible in store");
                return Ok(attempt);
            }
            tracing::info!(
                location = %location,
                attempt,
                max_attempts = policy.max_attempts,
                "upload not yet visible; waiting"
            );
            if attempt < policy.max_attempts {
                sleep(policy.interval);
            }
        }
        Err(ClientError::ConsistencyTimeout {
            location: location.path(),
            attempts: policy.max_attempts,
        })
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ClientError> {
    let entries = fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
        if file_type.is_dir() {
            collect_files(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn relative_segments(root: &Path, path: &Path) -> Result<Vec<String>, ClientError> {
    let rel = path.strip_prefix(root).map_err(|_| {
        io_err(
            path,
            std::io::Error::other("file is outside the upload root"),
        )
    })?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect())
}
