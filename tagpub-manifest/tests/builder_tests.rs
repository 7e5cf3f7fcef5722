//! Manifest builder tests: backend metadata on disk through to manifest JSON.
//!
//! Each test gets an isolated `TempDir` output directory and a `FixedSource`,
//! so nothing here needs git.

use std::fs;
use std::path::Path;

use rstest::rstest;
use tagpub_core::{ArtifactRecord, BuildIdentity};
use tagpub_manifest::{
    github_commit_url, BuildOutput, FixedSource, ManifestBuilder, ManifestError,
};
use tempfile::TempDir;

const SHA: &str = "0123456789abcdef0123456789abcdef01234567";
const STORE: &str = "http://files.example:7070";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn output_dir(file: &str, content: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join(file), content).expect("write fixture");
    dir
}

fn widget(build_id: Option<&str>) -> BuildIdentity {
    BuildIdentity::new("widget", "main", build_id.map(str::to_string), None).expect("identity")
}

// ---------------------------------------------------------------------------
// Commit URLs
// ---------------------------------------------------------------------------

#[rstest]
#[case("https://github.com/org/repo.git", Some("https://github.com/org/repo/commit/"))]
#[case("https://github.com/org/repo", Some("https://github.com/org/repo/commit/"))]
#[case("https://github.com/org/repo/", Some("https://github.com/org/repo/commit/"))]
#[case("git@github.com:org/repo.git", None)]
#[case("https://gitlab.example/org/repo.git", None)]
#[case("https://github.com/org", None)]
#[case("https://github.com/org/repo/extra", None)]
fn commit_url_only_for_github(#[case] origin: &str, #[case] prefix: Option<&str>) {
    let url = github_commit_url(origin, SHA);
    match prefix {
        Some(prefix) => assert_eq!(url, Some(format!("{prefix}{SHA}"))),
        None => assert_eq!(url, None),
    }
}

#[test]
fn non_github_origin_builds_manifest_without_commit_url() {
    let dir = output_dir("packages.txt", "widget,1.0,1\n");
    let source = FixedSource::new(SHA).with_origin("https://git.internal/widget.git");
    let output = BuildOutput::read_rpm(dir.path()).expect("read");
    let manifest = ManifestBuilder::new(STORE, &source)
        .build(&widget(Some("42")), dir.path(), &output)
        .expect("build");
    assert_eq!(manifest.commit_id, SHA);
    assert!(manifest.commit_url.is_none());
}

// ---------------------------------------------------------------------------
// rpm
// ---------------------------------------------------------------------------

#[test]
fn rpm_widget_scenario() {
    let dir = output_dir("packages.txt", "widget,1.0,1\n");
    let source = FixedSource::new(SHA).with_origin("https://github.com/org/widget.git");
    let output = BuildOutput::read_rpm(dir.path()).expect("read");
    let manifest = ManifestBuilder::new(STORE, &source)
        .build(&widget(Some("42")), dir.path(), &output)
        .expect("build");

    let json = serde_json::to_value(&manifest).expect("json");
    assert_eq!(json["build_id"], "42");
    assert_eq!(json["commit_id"], SHA);
    assert_eq!(
        json["commit_url"],
        format!("https://github.com/org/widget/commit/{SHA}")
    );
    assert_eq!(
        json["artifacts"]["widget"],
        serde_json::json!({
            "type": "rpm",
            "name": "widget",
            "version": "1.0",
            "release": "1",
            "repository_url": "http://files.example:7070/widget/main/42/repo",
        })
    );
    assert!(json.get("files_url").is_none());
}

#[test]
fn rpm_artifact_count_matches_distinct_packages() {
    let dir = output_dir(
        "packages.txt",
        "widget,1.0,1\nwidget-devel,1.0,1\nwidget-docs,1.0,1\nwidget-tools,1.0,1\n",
    );
    let source = FixedSource::new(SHA);
    let output = BuildOutput::read_rpm(dir.path()).expect("read");
    let manifest = ManifestBuilder::new(STORE, &source)
        .build(&widget(Some("42")), dir.path(), &output)
        .expect("build");

    assert_eq!(manifest.artifacts.len(), 4);
    let urls: Vec<_> = manifest
        .artifacts
        .values()
        .map(|a| a.location_url().to_string())
        .collect();
    assert!(urls.iter().all(|u| u == "http://files.example:7070/widget/main/42/repo"));
}

#[test]
fn developer_build_has_null_build_id() {
    let dir = output_dir("packages.txt", "widget,1.0,1\n");
    let source = FixedSource::new(SHA);
    let output = BuildOutput::read_rpm(dir.path()).expect("read");
    let manifest = ManifestBuilder::new(STORE, &source)
        .build(&widget(None), dir.path(), &output)
        .expect("build");
    assert!(manifest.build_id.is_none());
    assert_eq!(
        manifest.artifact("widget").map(|a| a.location_url()),
        Some("http://files.example:7070/widget/main/dev/repo")
    );
}

#[test]
fn empty_packages_file_is_an_error() {
    let dir = output_dir("packages.txt", "# nothing built\n");
    let err = BuildOutput::read_rpm(dir.path()).unwrap_err();
    assert!(matches!(err, ManifestError::NoArtifacts { .. }), "got: {err}");
}

#[test]
fn missing_packages_file_is_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = BuildOutput::read_rpm(dir.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Io { .. }), "got: {err}");
}

#[test]
fn unresolvable_commit_aborts_manifest() {
    let dir = output_dir("packages.txt", "widget,1.0,1\n");
    let source = FixedSource {
        commit_id: Some("not-a-sha".to_string()),
        ..FixedSource::default()
    };
    let output = BuildOutput::read_rpm(dir.path()).expect("read");
    let err = ManifestBuilder::new(STORE, &source)
        .build(&widget(Some("42")), dir.path(), &output)
        .unwrap_err();
    assert!(matches!(err, ManifestError::SourceMetadataUnavailable { .. }));
}

// ---------------------------------------------------------------------------
// maven
// ---------------------------------------------------------------------------

#[test]
fn maven_records_share_repository_and_files_url() {
    let dir = output_dir(
        "packages.txt",
        "org.example,widget-core,1.0.0-42.01234567\norg.example,widget-api,1.0.0-42.01234567\n",
    );
    let build = BuildIdentity::new(
        "widget",
        "main",
        Some("42".into()),
        Some("https://ci.example/job/42".into()),
    )
    .expect("identity");
    let source = FixedSource::new(SHA);
    let output = BuildOutput::read_maven(dir.path()).expect("read");
    let manifest = ManifestBuilder::new(STORE, &source)
        .build(&build, dir.path(), &output)
        .expect("build");

    assert_eq!(manifest.build_url.as_deref(), Some("https://ci.example/job/42"));
    assert_eq!(
        manifest.files_url.as_deref(),
        Some("http://files.example:7070/widget/main/42")
    );
    match manifest.artifact("widget-api").expect("widget-api") {
        ArtifactRecord::Maven {
            group_id,
            repository_url,
            ..
        } => {
            assert_eq!(group_id, "org.example");
            assert_eq!(
                repository_url,
                "http://files.example:7070/widget/main/42/maven-repository"
            );
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// file / container
// ---------------------------------------------------------------------------

#[test]
fn image_descriptor_produces_single_file_record() {
    let dir = output_dir(
        "image.json",
        r#"{"artifact_id": "widget-image", "file": "images/widget.tar"}"#,
    );
    let source = FixedSource::new(SHA);
    let output = BuildOutput::read_file(dir.path()).expect("read");
    let manifest = ManifestBuilder::new(STORE, &source)
        .build(&widget(Some("42")), Path::new("."), &output)
        .expect("build");

    assert_eq!(manifest.artifacts.len(), 1);
    assert_eq!(
        manifest.artifact("widget-image"),
        Some(&ArtifactRecord::File {
            url: "http://files.example:7070/widget/main/42/images/widget.tar".into()
        })
    );
}

#[test]
fn image_reference_produces_container_record() {
    let dir = output_dir(
        "image.json",
        r#"{"artifact_id": "widget", "file": "widget.tar", "image": "quay.io/org/widget:42"}"#,
    );
    let source = FixedSource::new(SHA);
    let output = BuildOutput::read_file(dir.path()).expect("read");
    let manifest = ManifestBuilder::new(STORE, &source)
        .build(&widget(Some("42")), Path::new("."), &output)
        .expect("build");
    let record = manifest.artifact("widget").expect("record");
    assert_eq!(record.kind(), "container");
    assert_eq!(record.describe(), "quay.io/org/widget:42");
}

#[test]
fn malformed_descriptor_reports_path() {
    let dir = output_dir("image.json", "{ not json");
    let err = BuildOutput::read_file(dir.path()).unwrap_err();
    assert!(matches!(err, ManifestError::Json { .. }));
    assert!(err.to_string().contains("image.json"));
}
