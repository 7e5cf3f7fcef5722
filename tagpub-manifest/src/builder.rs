//! Manifest assembly.
//!
//! Package backends (rpm, maven) produce one record per declared package, all
//! pointing at one package-repository URL. Single-file backends produce one
//! record with a direct URL. Every URL is derived from the build's
//! [`StorageLocation`](tagpub_core::StorageLocation) with the same
//! percent-encoded segment join the store client uploads through.

use std::collections::BTreeMap;
use std::path::Path;

use tagpub_core::{ArtifactName, ArtifactRecord, BuildIdentity, TagManifest};

use crate::error::ManifestError;
use crate::metadata::{self, ImageDescriptor, MavenCoordinates, RpmPackage};
use crate::source::{self, github_commit_url, CommitInfo, SourceControl};

/// Relative directory holding the yum repository inside the upload root.
pub const RPM_REPOSITORY_DIR: &str = "repo";
/// Relative directory holding the maven repository inside the upload root.
pub const MAVEN_REPOSITORY_DIR: &str = "maven-repository";

/// What a packaging backend declared it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutput {
    Rpm { packages: Vec<RpmPackage> },
    Maven { packages: Vec<MavenCoordinates> },
    File { descriptor: ImageDescriptor },
}

impl BuildOutput {
    /// Read `<dir>/packages.txt` as rpm triples.
    pub fn read_rpm(dir: &Path) -> Result<Self, ManifestError> {
        let path = dir.join(metadata::PACKAGES_FILE);
        let packages = metadata::read_rpm_packages(&path)?;
        if packages.is_empty() {
            return Err(ManifestError::NoArtifacts { path });
        }
        Ok(BuildOutput::Rpm { packages })
    }

    /// Read `<dir>/packages.txt` as maven coordinates.
    pub fn read_maven(dir: &Path) -> Result<Self, ManifestError> {
        let path = dir.join(metadata::PACKAGES_FILE);
        let packages = metadata::read_maven_packages(&path)?;
        if packages.is_empty() {
            return Err(ManifestError::NoArtifacts { path });
        }
        Ok(BuildOutput::Maven { packages })
    }

    /// Read `<dir>/image.json`.
    pub fn read_file(dir: &Path) -> Result<Self, ManifestError> {
        let descriptor =
            metadata::read_image_descriptor(&dir.join(metadata::IMAGE_DESCRIPTOR_FILE))?;
        Ok(BuildOutput::File { descriptor })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BuildOutput::Rpm { .. } => "rpm",
            BuildOutput::Maven { .. } => "maven",
            BuildOutput::File { .. } => "file",
        }
    }
}

/// Builds a [`TagManifest`] from a [`BuildOutput`] and source metadata.
///
/// Holds no state beyond the store base URL and the source-control seam;
/// the same inputs always produce the same manifest.
pub struct ManifestBuilder<'a> {
    store_url: &'a str,
    source: &'a dyn SourceControl,
}

impl<'a> ManifestBuilder<'a> {
    pub fn new(store_url: &'a str, source: &'a dyn SourceControl) -> Self {
        Self { store_url, source }
    }

    pub fn build(
        &self,
        identity: &BuildIdentity,
        checkout: &Path,
        output: &BuildOutput,
    ) -> Result<TagManifest, ManifestError> {
        let location = identity.location();

        let (commit, artifacts, manifest_files_url) = match output {
            BuildOutput::Rpm { packages } => {
                let repository_url = location.file_url(self.store_url, &[RPM_REPOSITORY_DIR])?;
                let artifacts = packages
                    .iter()
                    .map(|p| {
                        (
                            ArtifactName::from(p.name.as_str()),
                            ArtifactRecord::Rpm {
                                name: p.name.clone(),
                                version: p.version.clone(),
                                release: p.release.clone(),
                                repository_url: repository_url.clone(),
                            },
                        )
                    })
                    .collect::<BTreeMap<_, _>>();
                (source::resolve_commit(self.source, checkout)?, artifacts, None)
            }
            BuildOutput::Maven { packages } => {
                let repository_url =
                    location.file_url(self.store_url, &[MAVEN_REPOSITORY_DIR])?;
                let artifacts = packages
                    .iter()
                    .map(|p| {
                        (
                            ArtifactName::from(p.artifact_id.as_str()),
                            ArtifactRecord::Maven {
                                group_id: p.group_id.clone(),
                                artifact_id: p.artifact_id.clone(),
                                version: p.version.clone(),
                                repository_url: repository_url.clone(),
                            },
                        )
                    })
                    .collect::<BTreeMap<_, _>>();
                (
                    source::resolve_commit(self.source, checkout)?,
                    artifacts,
                    Some(location.files_url(self.store_url)?),
                )
            }
            BuildOutput::File { descriptor } => {
                let segments = descriptor.file_segments()?;
                let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
                let url = location.file_url(self.store_url, &segments)?;
                let record = match &descriptor.image {
                    Some(image) => ArtifactRecord::Container {
                        image: image.clone(),
                        url,
                    },
                    None => ArtifactRecord::File { url },
                };
                let mut artifacts = BTreeMap::new();
                artifacts.insert(ArtifactName::from(descriptor.artifact_id.as_str()), record);
                (
                    self.descriptor_commit(descriptor, checkout)?,
                    artifacts,
                    None,
                )
            }
        };

        tracing::debug!(
            build = %identity,
            kind = output.kind(),
            artifacts = artifacts.len(),
            "manifest assembled"
        );

        Ok(TagManifest {
            build_id: identity.build_id().map(str::to_string),
            build_url: identity.build_url().map(str::to_string),
            commit_id: commit.commit_id,
            commit_url: commit.commit_url,
            files_url: manifest_files_url,
            artifacts,
        })
    }

    /// Descriptor commit fields win over the checkout's.
    fn descriptor_commit(
        &self,
        descriptor: &ImageDescriptor,
        checkout: &Path,
    ) -> Result<CommitInfo, ManifestError> {
        let Some(raw) = descriptor.commit_id.as_deref() else {
            return source::resolve_commit(self.source, checkout);
        };
        let commit_id = source::validate_commit_id(raw)?;
        let commit_url = match descriptor.commit_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Some(url.trim().to_string()),
            _ => self
                .source
                .origin_url(checkout)
                .ok()
                .flatten()
                .and_then(|origin| github_commit_url(&origin, &commit_id)),
        };
        Ok(CommitInfo {
            commit_id,
            commit_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FixedSource;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn identity() -> BuildIdentity {
        BuildIdentity::new("widget", "main", Some("42".into()), None).unwrap()
    }

    #[test]
    fn duplicate_package_names_collapse_to_one_entry() {
        let source = FixedSource::new(SHA);
        let builder = ManifestBuilder::new("http://files", &source);
        let output = BuildOutput::Rpm {
            packages: vec![
                RpmPackage {
                    name: "widget".into(),
                    version: "1.0".into(),
                    release: "1".into(),
                },
                RpmPackage {
                    name: "widget".into(),
                    version: "1.0".into(),
                    release: "2".into(),
                },
            ],
        };
        let manifest = builder.build(&identity(), Path::new("."), &output).unwrap();
        assert_eq!(manifest.artifacts.len(), 1);
        match manifest.artifact("widget").unwrap() {
            ArtifactRecord::Rpm { release, .. } => assert_eq!(release, "2"),
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn file_url_matches_normalized_descriptor_path() {
        let source = FixedSource::new(SHA);
        let builder = ManifestBuilder::new("http://files/", &source);
        let output = BuildOutput::File {
            descriptor: ImageDescriptor {
                artifact_id: "widget-image".into(),
                file: "./images/widget#1.tar".into(),
                commit_id: None,
                commit_url: None,
                image: None,
            },
        };
        let manifest = builder.build(&identity(), Path::new("."), &output).unwrap();
        assert_eq!(
            manifest.artifact("widget-image").unwrap().location_url(),
            "http://files/widget/main/42/images/widget%231.tar"
        );
    }

    #[test]
    fn descriptor_commit_overrides_checkout() {
        let other = "f".repeat(40);
        let source = FixedSource::new(SHA).with_origin("https://github.com/org/widget.git");
        let builder = ManifestBuilder::new("http://files", &source);
        let output = BuildOutput::File {
            descriptor: ImageDescriptor {
                artifact_id: "widget-image".into(),
                file: "widget.tar".into(),
                commit_id: Some(other.clone()),
                commit_url: None,
                image: None,
            },
        };
        let manifest = builder.build(&identity(), Path::new("."), &output).unwrap();
        assert_eq!(manifest.commit_id, other);
        assert_eq!(
            manifest.commit_url.as_deref(),
            Some(format!("https://github.com/org/widget/commit/{other}").as_str())
        );
    }
}
