//! TagRegistry protocol tests against the in-memory backend.

use std::collections::BTreeMap;

use tagpub_client::{
    fetch_install_config, ClientError, MemoryBackend, TagRegistry, Transport,
};
use tagpub_core::{ArtifactName, ArtifactRecord, TagKey, TagManifest};

const STORE: &str = "http://files.test:7070";
const REGISTRY: &str = "http://tags.test:9090";
const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

fn key() -> TagKey {
    TagKey::new("widget", "main", "tested").expect("key")
}

fn manifest(build_id: &str) -> TagManifest {
    let mut artifacts = BTreeMap::new();
    artifacts.insert(
        ArtifactName::from("widget"),
        ArtifactRecord::Rpm {
            name: "widget".into(),
            version: "1.0".into(),
            release: "1".into(),
            repository_url: format!("{STORE}/widget/main/{build_id}/repo"),
        },
    );
    artifacts.insert(
        ArtifactName::from("widget-src"),
        ArtifactRecord::File {
            url: format!("{STORE}/widget/main/{build_id}/widget-1.0.tar.gz"),
        },
    );
    TagManifest {
        build_id: Some(build_id.into()),
        build_url: None,
        commit_id: SHA.into(),
        commit_url: None,
        files_url: None,
        artifacts,
    }
}

#[test]
fn get_missing_tag_is_none() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    let registry = TagRegistry::new(&backend, REGISTRY);
    assert_eq!(registry.get_tag(&key()).expect("get"), None);
}

#[test]
fn put_then_get_tag() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    let registry = TagRegistry::new(&backend, REGISTRY);

    let status = registry.put_tag(&key(), &manifest("42"), false).expect("put");
    assert_eq!(status, "OK");
    assert_eq!(registry.get_tag(&key()).expect("get"), Some(manifest("42")));

    let paths: Vec<_> = backend.committed_writes().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, ["api/repos/widget/branches/main/tags/tested"]);
}

#[test]
fn put_tag_is_last_write_wins() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    let registry = TagRegistry::new(&backend, REGISTRY);
    registry.put_tag(&key(), &manifest("41"), false).expect("put");
    registry.put_tag(&key(), &manifest("42"), false).expect("put");
    assert_eq!(
        backend.tag(&key()).and_then(|m| m.build_id),
        Some("42".to_string())
    );
}

#[test]
fn dry_run_put_validates_without_storing() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    let registry = TagRegistry::new(&backend, REGISTRY);

    let status = registry.put_tag(&key(), &manifest("42"), true).expect("put");
    assert!(status.contains("dry run"));
    assert_eq!(backend.tag(&key()), None);
    assert_eq!(backend.dry_run_writes().len(), 1);
    assert!(backend.committed_writes().is_empty());
}

#[test]
fn failed_write_surfaces_status() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    backend.fail_registry_writes(503);
    let registry = TagRegistry::new(&backend, REGISTRY);

    let err = registry.put_tag(&key(), &manifest("42"), false).unwrap_err();
    match err {
        ClientError::Status { method, status, .. } => {
            assert_eq!(method, "PUT");
            assert_eq!(status, 503);
        }
        other => panic!("unexpected error: {other}"),
    }
    // Exactly one attempt; nothing retries.
    assert_eq!(backend.requests().len(), 1);
}

#[test]
fn artifact_get_and_put() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    let registry = TagRegistry::new(&backend, REGISTRY);
    registry.put_tag(&key(), &manifest("42"), false).expect("put");

    let rec = registry.get_artifact(&key(), "widget").expect("get");
    assert_eq!(rec.map(|r| r.kind()), Some("rpm"));
    assert_eq!(registry.get_artifact(&key(), "absent").expect("get"), None);

    let docs = ArtifactRecord::File {
        url: format!("{STORE}/widget/main/42/docs.zip"),
    };
    registry
        .put_artifact(&key(), "widget-docs", &docs, false)
        .expect("put artifact");
    let tag = backend.tag(&key()).expect("tag");
    assert_eq!(tag.artifacts.len(), 3);
    assert_eq!(tag.artifact("widget-docs"), Some(&docs));
}

#[test]
fn artifact_put_on_missing_tag_is_error() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    let registry = TagRegistry::new(&backend, REGISTRY);
    let err = registry
        .put_artifact(
            &key(),
            "widget",
            &ArtifactRecord::File { url: "http://x".into() },
            false,
        )
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 404, .. }), "got: {err}");
}

#[test]
fn malformed_registry_json_is_reported() {
    struct Garbage;
    impl Transport for Garbage {
        fn get(&self, _url: &str) -> Result<tagpub_client::HttpResponse, ClientError> {
            Ok(tagpub_client::HttpResponse::new(200, "{ nope"))
        }
        fn put(
            &self,
            _url: &str,
            _body: tagpub_client::Body<'_>,
        ) -> Result<tagpub_client::HttpResponse, ClientError> {
            Ok(tagpub_client::HttpResponse::new(200, "OK"))
        }
    }
    let registry = TagRegistry::new(&Garbage, REGISTRY);
    let err = registry.get_tag(&key()).unwrap_err();
    assert!(matches!(err, ClientError::Json { .. }));
}

#[test]
fn manifest_with_unsupported_artifact_type_is_a_decode_error() {
    struct Foreign;
    impl Transport for Foreign {
        fn get(&self, _url: &str) -> Result<tagpub_client::HttpResponse, ClientError> {
            Ok(tagpub_client::HttpResponse::new(
                200,
                format!(
                    r#"{{"build_id":"42","build_url":null,"commit_id":"{SHA}","commit_url":null,
                       "artifacts":{{"widget":{{"type":"deb","url":"http://x/widget.deb"}}}}}}"#
                ),
            ))
        }
        fn put(
            &self,
            _url: &str,
            _body: tagpub_client::Body<'_>,
        ) -> Result<tagpub_client::HttpResponse, ClientError> {
            Ok(tagpub_client::HttpResponse::new(200, "OK"))
        }
    }
    let registry = TagRegistry::new(&Foreign, REGISTRY);
    match registry.get_tag(&key()).unwrap_err() {
        ClientError::Json { source, .. } => {
            assert!(source.to_string().contains("deb"), "{source}")
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Install lookup
// ---------------------------------------------------------------------------

#[test]
fn install_config_follows_repository_url() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    let registry = TagRegistry::new(&backend, REGISTRY);
    registry.put_tag(&key(), &manifest("42"), false).expect("put");
    backend.insert_file("widget/main/42/repo/config.txt", "[widget/main/42]\n");

    let config = fetch_install_config(&registry, &backend, &key(), "widget")
        .expect("fetch")
        .expect("present");
    assert_eq!(config.config_url, format!("{STORE}/widget/main/42/repo/config.txt"));
    assert_eq!(config.contents, "[widget/main/42]\n");
}

#[test]
fn install_config_for_unknown_artifact_is_none() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    let registry = TagRegistry::new(&backend, REGISTRY);
    let found = fetch_install_config(&registry, &backend, &key(), "widget").expect("fetch");
    assert!(found.is_none());
}

#[test]
fn install_config_rejects_plain_files() {
    let backend = MemoryBackend::new(STORE, REGISTRY);
    let registry = TagRegistry::new(&backend, REGISTRY);
    registry.put_tag(&key(), &manifest("42"), false).expect("put");
    let err = fetch_install_config(&registry, &backend, &key(), "widget-src").unwrap_err();
    assert!(matches!(err, ClientError::NotInstallable { kind: "file", .. }));
}
