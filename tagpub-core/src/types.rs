//! Domain types for build publishing.
//!
//! A [`BuildIdentity`] names one CI build. Everything persisted for that build
//! is addressed through its [`StorageLocation`], and the URLs recorded in a
//! [`TagManifest`] are derived from the same location, so stored paths and
//! manifest URLs cannot drift apart.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{IdentityError, UrlError};
use crate::urls::join_segments;

/// Path segment used in place of a build id for developer builds.
///
/// Developer uploads are always dry-run, so nothing durable ever lives here.
pub const DEVELOPER_SEGMENT: &str = "dev";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for an artifact inside a manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactName(pub String);

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ArtifactName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ArtifactName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Build identity
// ---------------------------------------------------------------------------

/// Whether a build persists anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// A CI build with an id; uploads and registry writes are committed.
    Release { build_id: String },
    /// A developer or test build; every write is dry-run.
    Developer,
}

/// Identifies one build: repository, branch, optional build id and CI URL.
///
/// Immutable once constructed. The absence of a build id is the only signal
/// that switches publishing into developer (dry-run) mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildIdentity {
    repository: String,
    branch: String,
    build_id: Option<String>,
    build_url: Option<String>,
}

impl BuildIdentity {
    /// Validate and construct a build identity.
    ///
    /// `build_id` of `Some("")`, `Some("0")` or the developer segment is
    /// rejected: developer builds are spelled `None` and nothing else.
    pub fn new(
        repository: impl Into<String>,
        branch: impl Into<String>,
        build_id: Option<String>,
        build_url: Option<String>,
    ) -> Result<Self, IdentityError> {
        let repository = repository.into();
        let branch = branch.into();
        validate_segment("repository", &repository)?;
        validate_segment("branch", &branch)?;

        if let Some(id) = build_id.as_deref() {
            validate_build_id(id)?;
        }

        let build_url = build_url.filter(|u| !u.trim().is_empty());

        Ok(Self {
            repository,
            branch,
            build_id,
            build_url,
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn build_id(&self) -> Option<&str> {
        self.build_id.as_deref()
    }

    pub fn build_url(&self) -> Option<&str> {
        self.build_url.as_deref()
    }

    pub fn mode(&self) -> BuildMode {
        match &self.build_id {
            Some(id) => BuildMode::Release {
                build_id: id.clone(),
            },
            None => BuildMode::Developer,
        }
    }

    /// `true` when no build id was given; all persistence becomes dry-run.
    pub fn is_developer(&self) -> bool {
        self.build_id.is_none()
    }

    pub fn location(&self) -> StorageLocation {
        StorageLocation {
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            segment: self
                .build_id
                .clone()
                .unwrap_or_else(|| DEVELOPER_SEGMENT.to_string()),
        }
    }

    /// Registry key for `tag` on this build's repository and branch.
    pub fn tag_key(&self, tag: &str) -> Result<TagKey, IdentityError> {
        TagKey::new(self.repository.clone(), self.branch.clone(), tag)
    }
}

impl fmt::Display for BuildIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.build_id {
            Some(id) => write!(f, "{}/{}#{}", self.repository, self.branch, id),
            None => write!(f, "{}/{} (developer build)", self.repository, self.branch),
        }
    }
}

// ---------------------------------------------------------------------------
// Storage location
// ---------------------------------------------------------------------------

/// `{repository}/{branch}/{build_id}`: the per-build storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageLocation {
    repository: String,
    branch: String,
    segment: String,
}

impl StorageLocation {
    /// Relative key, e.g. `widget/main/42`.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.repository, self.branch, self.segment)
    }

    /// Last key segment: the build id, or [`DEVELOPER_SEGMENT`].
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Absolute URL of `relative` (already split into path segments) under
    /// this build's key. Uploads and manifest records both use this.
    pub fn url(&self, store_base: &str, relative: &[&str]) -> Result<Url, UrlError> {
        join_segments(
            store_base,
            [
                self.repository.as_str(),
                self.branch.as_str(),
                self.segment.as_str(),
            ]
            .into_iter()
            .chain(relative.iter().copied()),
        )
    }

    /// Absolute URL of this build's files under a store base URL.
    pub fn files_url(&self, store_base: &str) -> Result<String, UrlError> {
        Ok(self.url(store_base, &[])?.into())
    }

    /// Absolute URL of one stored file.
    pub fn file_url(&self, store_base: &str, relative: &[&str]) -> Result<String, UrlError> {
        Ok(self.url(store_base, relative)?.into())
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// ---------------------------------------------------------------------------
// Tag key
// ---------------------------------------------------------------------------

/// `(repository, branch, tag)`: where a manifest lives in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagKey {
    pub repository: String,
    pub branch: String,
    pub tag: String,
}

impl TagKey {
    pub fn new(
        repository: impl Into<String>,
        branch: impl Into<String>,
        tag: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let key = Self {
            repository: repository.into(),
            branch: branch.into(),
            tag: tag.into(),
        };
        validate_segment("repository", &key.repository)?;
        validate_segment("branch", &key.branch)?;
        validate_segment("tag", &key.tag)?;
        Ok(key)
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.repository, self.branch, self.tag)
    }
}

// ---------------------------------------------------------------------------
// Artifact records
// ---------------------------------------------------------------------------

/// One named output of a build, tagged by artifact type.
///
/// Package records point at the package repository (a yum or maven index);
/// single-file records carry a direct `url` into the store layout.
///
/// The set of types is closed: a manifest carrying any other `type` fails to
/// decode rather than being read back with fields dropped, since writing it
/// back would silently strip the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactRecord {
    Rpm {
        name: String,
        version: String,
        release: String,
        repository_url: String,
    },
    Maven {
        group_id: String,
        artifact_id: String,
        version: String,
        repository_url: String,
    },
    File {
        url: String,
    },
    Container {
        image: String,
        url: String,
    },
}

impl ArtifactRecord {
    /// The `type` discriminator as written on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ArtifactRecord::Rpm { .. } => "rpm",
            ArtifactRecord::Maven { .. } => "maven",
            ArtifactRecord::File { .. } => "file",
            ArtifactRecord::Container { .. } => "container",
        }
    }

    /// Where the artifact (or its containing package repository) is retrievable.
    pub fn location_url(&self) -> &str {
        match self {
            ArtifactRecord::Rpm { repository_url, .. }
            | ArtifactRecord::Maven { repository_url, .. } => repository_url,
            ArtifactRecord::File { url } | ArtifactRecord::Container { url, .. } => url,
        }
    }

    /// Package repository URL, for package-typed records only.
    pub fn repository_url(&self) -> Option<&str> {
        match self {
            ArtifactRecord::Rpm { repository_url, .. }
            | ArtifactRecord::Maven { repository_url, .. } => Some(repository_url),
            ArtifactRecord::File { .. } | ArtifactRecord::Container { .. } => None,
        }
    }

    /// Human-readable identifying fields, e.g. `widget-1.0-1`.
    pub fn describe(&self) -> String {
        match self {
            ArtifactRecord::Rpm {
                name,
                version,
                release,
                ..
            } => format!("{name}-{version}-{release}"),
            ArtifactRecord::Maven {
                group_id,
                artifact_id,
                version,
                ..
            } => format!("{group_id}:{artifact_id}:{version}"),
            ArtifactRecord::File { url } => url.rsplit('/').next().unwrap_or(url).to_string(),
            ArtifactRecord::Container { image, .. } => image.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tag manifest
// ---------------------------------------------------------------------------

/// The structured record of one build's artifacts and source provenance.
///
/// Artifacts are kept in a `BTreeMap` so the serialized form is identical
/// across runs with identical inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagManifest {
    pub build_id: Option<String>,
    pub build_url: Option<String>,
    pub commit_id: String,
    pub commit_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_url: Option<String>,
    #[serde(default)]
    pub artifacts: BTreeMap<ArtifactName, ArtifactRecord>,
}

impl TagManifest {
    pub fn artifact(&self, name: &str) -> Option<&ArtifactRecord> {
        self.artifacts.get(&ArtifactName::from(name))
    }

    /// Canonical JSON body sent to the registry.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject build ids that are empty, the legacy `"0"` sentinel, the developer
/// segment, or not a single path segment.
pub fn validate_build_id(id: &str) -> Result<(), IdentityError> {
    if id.is_empty() || id == "0" || id == DEVELOPER_SEGMENT {
        return Err(IdentityError::ReservedBuildId(id.to_string()));
    }
    validate_segment("build id", id)
}

fn validate_segment(field: &'static str, value: &str) -> Result<(), IdentityError> {
    if value.is_empty() {
        return Err(IdentityError::Empty { field });
    }
    let bad = value == "."
        || value == ".."
        || value
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '?' || c == '#' || c.is_whitespace());
    if bad {
        return Err(IdentityError::InvalidSegment {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn release() -> BuildIdentity {
        BuildIdentity::new("widget", "main", Some("42".into()), None).expect("identity")
    }

    #[test]
    fn location_uses_build_id() {
        let loc = release().location();
        assert_eq!(loc.path(), "widget/main/42");
        assert_eq!(
            loc.files_url("http://files:7070/").unwrap(),
            "http://files:7070/widget/main/42"
        );
        assert_eq!(
            loc.file_url("http://files:7070", &["repo", "config.txt"])
                .unwrap(),
            "http://files:7070/widget/main/42/repo/config.txt"
        );
    }

    #[test]
    fn file_url_encodes_each_segment() {
        let loc = release().location();
        assert_eq!(
            loc.file_url("http://files:7070", &["images", "my image#1.tar"])
                .unwrap(),
            "http://files:7070/widget/main/42/images/my%20image%231.tar"
        );
    }

    #[test]
    fn developer_build_uses_fixed_segment() {
        let id = BuildIdentity::new("widget", "main", None, None).unwrap();
        assert!(id.is_developer());
        assert_eq!(id.mode(), BuildMode::Developer);
        assert_eq!(id.location().segment(), DEVELOPER_SEGMENT);
    }

    #[test]
    fn legacy_zero_sentinel_is_rejected() {
        let err = BuildIdentity::new("widget", "main", Some("0".into()), None).unwrap_err();
        assert_eq!(err, IdentityError::ReservedBuildId("0".into()));
    }

    #[test]
    fn blank_build_url_is_dropped() {
        let id = BuildIdentity::new("widget", "main", Some("7".into()), Some("  ".into())).unwrap();
        assert_eq!(id.build_url(), None);
    }

    #[test]
    fn tag_key_display() {
        let key = release().tag_key("latest").unwrap();
        assert_eq!(key.to_string(), "widget/main/latest");
    }

    #[test]
    fn artifact_record_serializes_with_type_tag() {
        let rec = ArtifactRecord::Rpm {
            name: "widget".into(),
            version: "1.0".into(),
            release: "1".into(),
            repository_url: "http://files/widget/main/42/repo".into(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "rpm");
        assert_eq!(json["release"], "1");
        assert_eq!(rec.describe(), "widget-1.0-1");
    }

    #[test]
    fn unknown_artifact_type_is_rejected() {
        let err = serde_json::from_str::<ArtifactRecord>(r#"{"type":"deb","url":"http://x"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown variant `deb`"), "{err}");
    }

    #[test]
    fn manifest_nulls_are_explicit() {
        let m = TagManifest {
            build_id: None,
            build_url: None,
            commit_id: "a".repeat(40),
            commit_url: None,
            files_url: None,
            artifacts: BTreeMap::new(),
        };
        let json = serde_json::to_value(&m).unwrap();
        assert!(json["build_id"].is_null());
        assert!(json["commit_url"].is_null());
        assert!(json.get("files_url").is_none());
    }
}
