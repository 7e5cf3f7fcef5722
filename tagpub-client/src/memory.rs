//! In-process emulation of the store and registry HTTP surfaces.
//!
//! [`MemoryBackend`] implements [`Transport`] by routing URLs under its two
//! base URLs to in-memory maps. It records every request, keeps committed
//! and dry-run writes apart, and can make freshly uploaded builds invisible
//! to the next `k` existence probes to mimic an eventually consistent store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tagpub_core::{ArtifactRecord, TagKey, TagManifest};

use crate::error::ClientError;
use crate::transport::{Body, HttpResponse, Transport};
use crate::urls::DRY_RUN_PARAM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Store,
    Registry,
}

/// One request seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub service: Service,
    /// Path below the service base URL, without query.
    pub path: String,
    pub dry_run: bool,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    tags: BTreeMap<String, serde_json::Value>,
    requests: Vec<RecordedRequest>,
    visibility_lag: u32,
    hidden: BTreeMap<String, u32>,
    registry_write_failure: Option<u16>,
}

/// In-memory store + registry.
#[derive(Debug)]
pub struct MemoryBackend {
    store_base: String,
    registry_base: String,
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new(store_base: impl Into<String>, registry_base: impl Into<String>) -> Self {
        Self {
            store_base: store_base.into().trim_end_matches('/').to_string(),
            registry_base: registry_base.into().trim_end_matches('/').to_string(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn store_base(&self) -> &str {
        &self.store_base
    }

    pub fn registry_base(&self) -> &str {
        &self.registry_base
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// After each committed upload, hide the build from the next `probes` existence checks.
    ///
    /// `u32::MAX` makes uploads effectively never visible.
    pub fn set_visibility_lag(&self, probes: u32) {
        self.state().visibility_lag = probes;
    }

    /// Make every registry PUT answer with `status`.
    pub fn fail_registry_writes(&self, status: u16) {
        self.state().registry_write_failure = Some(status);
    }

    /// Undo [`fail_registry_writes`](Self::fail_registry_writes).
    pub fn clear_registry_failure(&self) {
        self.state().registry_write_failure = None;
    }

    /// Seed a stored file at `path` (below the store base).
    pub fn insert_file(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.state()
            .files
            .insert(path.trim_matches('/').to_string(), bytes.into());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(path.trim_matches('/')).cloned()
    }

    /// Paths of every committed file, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    /// The committed manifest at `key`.
    pub fn tag(&self, key: &TagKey) -> Option<TagManifest> {
        let value = self.state().tags.get(&key.to_string()).cloned()?;
        serde_json::from_value(value).ok()
    }

    /// Raw committed manifest JSON bytes at `key`.
    pub fn tag_bytes(&self, key: &TagKey) -> Option<Vec<u8>> {
        let state = self.state();
        let value = state.tags.get(&key.to_string())?;
        serde_json::to_vec(value).ok()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    /// PUTs that were allowed to change state.
    pub fn committed_writes(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::Put && !r.dry_run)
            .collect()
    }

    /// PUTs sent with the dry-run marker.
    pub fn dry_run_writes(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == Method::Put && r.dry_run)
            .collect()
    }

    /// Existence probes against build locations.
    pub fn store_probes(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == Method::Get && r.service == Service::Store)
            .count()
    }

    fn route(
        &self,
        method: &'static str,
        url: &str,
    ) -> Result<(Service, String, bool), ClientError> {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };
        let dry_run = query
            .split('&')
            .any(|pair| pair == format!("{DRY_RUN_PARAM}=1"));

        let registry_prefix = format!("{}/api/", self.registry_base);
        if let Some(rest) = path.strip_prefix(&registry_prefix) {
            return Ok((Service::Registry, format!("api/{rest}"), dry_run));
        }
        if let Some(rest) = path.strip_prefix(&format!("{}/", self.store_base)) {
            return Ok((Service::Store, rest.trim_matches('/').to_string(), dry_run));
        }
        Err(ClientError::Transport {
            method,
            url: url.to_string(),
            message: "no in-memory service at this address".to_string(),
        })
    }
}

impl Transport for MemoryBackend {
    fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        let (service, path, dry_run) = self.route("GET", url)?;
        let mut state = self.state();
        state.requests.push(RecordedRequest {
            method: Method::Get,
            service,
            path: path.clone(),
            dry_run,
        });
        Ok(match service {
            Service::Store => store_get(&mut state, &path),
            Service::Registry => registry_get(&state, &path),
        })
    }

    fn put(&self, url: &str, body: Body<'_>) -> Result<HttpResponse, ClientError> {
        let (service, path, dry_run) = self.route("PUT", url)?;
        let mut state = self.state();
        state.requests.push(RecordedRequest {
            method: Method::Put,
            service,
            path: path.clone(),
            dry_run,
        });
        Ok(match service {
            Service::Store => store_put(&mut state, &path, body, dry_run),
            Service::Registry => registry_put(&mut state, &path, body, dry_run),
        })
    }
}

// ---------------------------------------------------------------------------
// Store emulation
// ---------------------------------------------------------------------------

/// `repo/branch/build` prefix of a stored file path.
fn build_prefix(path: &str) -> Option<String> {
    let parts: Vec<&str> = path.splitn(4, '/').collect();
    (parts.len() == 4).then(|| parts[..3].join("/"))
}

fn store_get(state: &mut State, path: &str) -> HttpResponse {
    if let Some(bytes) = state.files.get(path) {
        return HttpResponse::new(200, bytes.clone());
    }
    let prefix = format!("{path}/");
    if !state.files.keys().any(|k| k.starts_with(&prefix)) {
        return HttpResponse::new(404, "not found");
    }
    if let Some(remaining) = state.hidden.get_mut(path) {
        if *remaining > 0 {
            *remaining -= 1;
            return HttpResponse::new(404, "not found");
        }
    }
    HttpResponse::new(200, Vec::new())
}

fn store_put(state: &mut State, path: &str, body: Body<'_>, dry_run: bool) -> HttpResponse {
    if dry_run {
        return HttpResponse::new(200, "dry run");
    }
    let bytes = match body {
        Body::Bytes(bytes) => bytes.to_vec(),
        Body::Json(value) => value.to_string().into_bytes(),
    };
    state.files.insert(path.to_string(), bytes);
    if let Some(prefix) = build_prefix(path) {
        let lag = state.visibility_lag;
        state.hidden.insert(prefix, lag);
    }
    HttpResponse::new(201, "stored")
}

// ---------------------------------------------------------------------------
// Registry emulation
// ---------------------------------------------------------------------------

enum RegistryPath {
    Tag(String),
    Artifact(String, String),
}

fn parse_registry_path(path: &str) -> Option<RegistryPath> {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        ["api", "repos", repo, "branches", branch, "tags", tag] => {
            Some(RegistryPath::Tag(format!("{repo}/{branch}/{tag}")))
        }
        ["api", "repos", repo, "branches", branch, "tags", tag, "artifacts", name] => Some(
            RegistryPath::Artifact(format!("{repo}/{branch}/{tag}"), (*name).to_string()),
        ),
        _ => None,
    }
}

fn json_response(value: &serde_json::Value) -> HttpResponse {
    HttpResponse::new(200, value.to_string())
}

fn registry_get(state: &State, path: &str) -> HttpResponse {
    match parse_registry_path(path) {
        Some(RegistryPath::Tag(key)) => state
            .tags
            .get(&key)
            .map(json_response)
            .unwrap_or_else(|| HttpResponse::new(404, "tag not found")),
        Some(RegistryPath::Artifact(key, name)) => state
            .tags
            .get(&key)
            .and_then(|tag| tag.get("artifacts"))
            .and_then(|artifacts| artifacts.get(&name))
            .map(json_response)
            .unwrap_or_else(|| HttpResponse::new(404, "artifact not found")),
        None => HttpResponse::new(404, "no such resource"),
    }
}

fn body_json(body: Body<'_>) -> Result<serde_json::Value, HttpResponse> {
    match body {
        Body::Json(value) => Ok(value.clone()),
        Body::Bytes(bytes) => serde_json::from_slice(bytes)
            .map_err(|e| HttpResponse::new(400, format!("invalid JSON: {e}"))),
    }
}

fn registry_put(state: &mut State, path: &str, body: Body<'_>, dry_run: bool) -> HttpResponse {
    if let Some(status) = state.registry_write_failure {
        return HttpResponse::new(status, "registry unavailable");
    }
    let value = match body_json(body) {
        Ok(value) => value,
        Err(response) => return response,
    };

    match parse_registry_path(path) {
        Some(RegistryPath::Tag(key)) => {
            if let Err(e) = serde_json::from_value::<TagManifest>(value.clone()) {
                return HttpResponse::new(422, format!("invalid manifest: {e}"));
            }
            if dry_run {
                return HttpResponse::new(200, "OK (dry run)");
            }
            state.tags.insert(key, value);
            HttpResponse::new(200, "OK")
        }
        Some(RegistryPath::Artifact(key, name)) => {
            if let Err(e) = serde_json::from_value::<ArtifactRecord>(value.clone()) {
                return HttpResponse::new(422, format!("invalid artifact: {e}"));
            }
            let Some(tag) = state.tags.get_mut(&key) else {
                return HttpResponse::new(404, "tag not found");
            };
            if dry_run {
                return HttpResponse::new(200, "OK (dry run)");
            }
            match tag.get_mut("artifacts").and_then(|a| a.as_object_mut()) {
                Some(artifacts) => {
                    artifacts.insert(name, value);
                }
                None => {
                    let mut artifacts = serde_json::Map::new();
                    artifacts.insert(name, value);
                    tag["artifacts"] = serde_json::Value::Object(artifacts);
                }
            }
            HttpResponse::new(200, "OK")
        }
        None => HttpResponse::new(404, "no such resource"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_prefix_takes_three_segments() {
        assert_eq!(
            build_prefix("widget/main/42/repo/a.rpm").as_deref(),
            Some("widget/main/42")
        );
        assert_eq!(build_prefix("widget/main/42"), None);
    }

    #[test]
    fn unknown_host_is_transport_error() {
        let backend = MemoryBackend::new("http://files", "http://tags");
        let err = backend.get("http://elsewhere/x").unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
    }

    #[test]
    fn dry_run_store_put_is_not_persisted() {
        let backend = MemoryBackend::new("http://files", "http://tags");
        backend
            .put("http://files/w/m/dev/a.txt?dry-run=1", Body::Bytes(b"x"))
            .unwrap();
        assert!(backend.stored_files().is_empty());
        assert_eq!(backend.dry_run_writes().len(), 1);
    }
}
