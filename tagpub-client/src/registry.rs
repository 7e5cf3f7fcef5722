//! Tag registry client.
//!
//! ```text
//! GET /api/repos/{repo}/branches/{branch}/tags/{tag}                     -> manifest JSON
//! PUT /api/repos/{repo}/branches/{branch}/tags/{tag}[?dry-run=1]         body = manifest JSON
//! GET /api/repos/{repo}/branches/{branch}/tags/{tag}/artifacts/{name}    -> record JSON
//! PUT /api/repos/{repo}/branches/{branch}/tags/{tag}/artifacts/{name}[?dry-run=1]
//! ```
//!
//! Writes replace whatever is at the key. A failed write is returned to the
//! caller as-is; nothing here retries.

use serde::de::DeserializeOwned;

use tagpub_core::{ArtifactRecord, TagKey, TagManifest};

use crate::error::ClientError;
use crate::transport::{Body, Transport};
use crate::urls;

/// Client for the tag registry service.
pub struct TagRegistry<'a> {
    transport: &'a dyn Transport,
    base_url: String,
}

impl<'a> TagRegistry<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    fn url(
        &self,
        key: &TagKey,
        artifact: Option<&str>,
        dry_run: bool,
    ) -> Result<String, ClientError> {
        let mut segments = vec![
            "api",
            "repos",
            key.repository.as_str(),
            "branches",
            key.branch.as_str(),
            "tags",
            key.tag.as_str(),
        ];
        if let Some(name) = artifact {
            segments.push("artifacts");
            segments.push(name);
        }
        urls::join(&self.base_url, segments, dry_run)
    }

    /// The manifest at `key`, `None` if the registry has none.
    pub fn get_tag(&self, key: &TagKey) -> Result<Option<TagManifest>, ClientError> {
        let url = self.url(key, None, false)?;
        self.get_json(&url)
    }

    /// Replace the manifest at `key`. Returns the registry's response body.
    ///
    /// With `dry_run` the registry validates the manifest without storing it.
    pub fn put_tag(
        &self,
        key: &TagKey,
        manifest: &TagManifest,
        dry_run: bool,
    ) -> Result<String, ClientError> {
        let url = self.url(key, None, dry_run)?;
        let body = manifest.to_json().map_err(|source| ClientError::Json {
            url: url.clone(),
            source,
        })?;
        tracing::info!(key = %key, dry_run, artifacts = manifest.artifacts.len(), "writing tag");
        self.put_json(&url, &body)
    }

    /// One artifact record within the tag at `key`.
    pub fn get_artifact(
        &self,
        key: &TagKey,
        artifact: &str,
    ) -> Result<Option<ArtifactRecord>, ClientError> {
        let url = self.url(key, Some(artifact), false)?;
        self.get_json(&url)
    }

    /// Replace one artifact record within the tag at `key`.
    pub fn put_artifact(
        &self,
        key: &TagKey,
        artifact: &str,
        record: &ArtifactRecord,
        dry_run: bool,
    ) -> Result<String, ClientError> {
        let url = self.url(key, Some(artifact), dry_run)?;
        let body = serde_json::to_value(record).map_err(|source| ClientError::Json {
            url: url.clone(),
            source,
        })?;
        tracing::info!(key = %key, artifact, dry_run, "writing artifact");
        self.put_json(&url, &body)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, ClientError> {
        let response = self.transport.get(url)?;
        if response.is_not_found() {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(ClientError::Status {
                method: "GET",
                url: url.to_string(),
                status: response.status,
                body: response.text(),
            });
        }
        serde_json::from_slice(&response.body)
            .map(Some)
            .map_err(|source| ClientError::Json {
                url: url.to_string(),
                source,
            })
    }

    fn put_json(&self, url: &str, body: &serde_json::Value) -> Result<String, ClientError> {
        let response = self.transport.put(url, Body::Json(body))?;
        if !response.is_success() {
            return Err(ClientError::Status {
                method: "PUT",
                url: url.to_string(),
                status: response.status,
                body: response.text(),
            });
        }
        Ok(response.text())
    }
}
