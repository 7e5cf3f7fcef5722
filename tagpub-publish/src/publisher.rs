//! The publish sequence.
//!
//! ## `publish`: 3-step protocol
//!
//! 1. Probe the store. If the build is absent, upload it; for release builds,
//!    poll until the store reports it present.
//! 2. Build the manifest from the backend's metadata and the checkout.
//! 3. Write the manifest to the registry (dry-run for developer builds).
//!
//! Storage is confirmed before the registry hears about it, so a tag never
//! points at files that are not there. If step 3 fails, re-running the same
//! publish skips the upload because step 1 finds the build already stored.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use tagpub_client::{ConsistencyPolicy, RemoteStore, TagRegistry, UploadedFile};
use tagpub_core::{BuildIdentity, TagManifest};
use tagpub_manifest::{BuildOutput, ManifestBuilder, SourceControl};

use crate::error::PublishError;
use crate::stage::StagedBuild;

// ---------------------------------------------------------------------------
// Store outcome
// ---------------------------------------------------------------------------

/// What step 1 did with the build's files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StoreOutcome {
    /// The existence probe found the build; nothing was uploaded.
    AlreadyStored,
    /// Files were uploaded and the store confirmed them after `attempts` probes.
    Uploaded {
        files: Vec<UploadedFile>,
        attempts: u32,
    },
    /// Developer build: files were sent with the dry-run marker, nothing persisted.
    DryRun { files: Vec<UploadedFile> },
}

impl StoreOutcome {
    /// Files sent in this call.
    pub fn files(&self) -> &[UploadedFile] {
        match self {
            StoreOutcome::AlreadyStored => &[],
            StoreOutcome::Uploaded { files, .. } | StoreOutcome::DryRun { files } => files,
        }
    }
}

/// Summary of one publish call.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    /// `{repo}/{branch}/{tag}`.
    pub tag: String,
    /// `{repo}/{branch}/{build}`.
    pub location: String,
    pub dry_run: bool,
    pub store: StoreOutcome,
    pub manifest: TagManifest,
    /// Opaque status string returned by the registry.
    pub registry_response: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Sequences store, manifest and registry for one build.
pub struct Publisher<'a> {
    store: &'a RemoteStore<'a>,
    registry: &'a TagRegistry<'a>,
    source: &'a dyn SourceControl,
    policy: ConsistencyPolicy,
}

impl<'a> Publisher<'a> {
    pub fn new(
        store: &'a RemoteStore<'a>,
        registry: &'a TagRegistry<'a>,
        source: &'a dyn SourceControl,
        policy: ConsistencyPolicy,
    ) -> Self {
        Self {
            store,
            registry,
            source,
            policy,
        }
    }

    /// Publish a staged build under `tag`.
    pub fn publish_staged(
        &self,
        identity: &BuildIdentity,
        tag: &str,
        staged: &StagedBuild,
        checkout: &Path,
    ) -> Result<PublishReport, PublishError> {
        self.publish(identity, tag, &staged.upload_dir, checkout, &staged.output)
    }

    /// Run the three steps. Any error propagates unchanged.
    pub fn publish(
        &self,
        identity: &BuildIdentity,
        tag: &str,
        upload_dir: &Path,
        checkout: &Path,
        output: &BuildOutput,
    ) -> Result<PublishReport, PublishError> {
        let started_at = Utc::now();
        let key = identity.tag_key(tag)?;
        let dry_run = identity.is_developer();

        if dry_run {
            tracing::info!(
                build = %identity,
                "developer build: store and registry writes are dry-run"
            );
        }

        // Step 1: make sure the files are durably stored.
        let store = self.ensure_stored(identity, upload_dir)?;

        // Step 2: manifest.
        let manifest = ManifestBuilder::new(self.store.base_url(), self.source)
            .build(identity, checkout, output)?;

        // Step 3: registry.
        let registry_response = self.registry.put_tag(&key, &manifest, dry_run)?;

        tracing::info!(
            tag = %key,
            artifacts = manifest.artifacts.len(),
            dry_run,
            "published"
        );
        Ok(PublishReport {
            tag: key.to_string(),
            location: identity.location().path(),
            dry_run,
            store,
            manifest,
            registry_response,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn ensure_stored(
        &self,
        identity: &BuildIdentity,
        upload_dir: &Path,
    ) -> Result<StoreOutcome, PublishError> {
        if self.store.exists(identity)? {
            tracing::info!(
                location = %identity.location(),
                "build already stored; skipping upload"
            );
            return Ok(StoreOutcome::AlreadyStored);
        }

        let upload = self.store.put(identity, upload_dir)?;
        if upload.dry_run {
            // Nothing was persisted, so there is nothing to wait for.
            return Ok(StoreOutcome::DryRun {
                files: upload.files,
            });
        }

        let attempts = self.store.wait_until_stored(identity, self.policy)?;
        Ok(StoreOutcome::Uploaded {
            files: upload.files,
            attempts,
        })
    }
}
