//! Backend metadata files.
//!
//! | Backend   | File           | Format                                   |
//! |-----------|----------------|------------------------------------------|
//! | rpm       | `packages.txt` | `name,version,release` per line          |
//! | maven     | `packages.txt` | `group_id,artifact_id,version` per line  |
//! | file      | `image.json`   | [`ImageDescriptor`]                      |
//!
//! Blank lines and `#` comments are skipped. Whitespace-separated records on
//! one line are accepted too, matching what `rpm -q --qf` prints.

use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ManifestError};

pub const PACKAGES_FILE: &str = "packages.txt";
pub const IMAGE_DESCRIPTOR_FILE: &str = "image.json";

/// One rpm package produced by a spec file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpmPackage {
    pub name: String,
    pub version: String,
    pub release: String,
}

/// One maven module produced by a reactor build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenCoordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

/// Descriptor for a single-file artifact such as an image archive or tarball.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub artifact_id: String,
    /// Path of the artifact file, relative to the output directory.
    pub file: String,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub commit_url: Option<String>,
    /// Pull reference, when the artifact is a pushed container image.
    #[serde(default)]
    pub image: Option<String>,
}

impl ImageDescriptor {
    /// `file` as plain path segments, with `.` components dropped.
    ///
    /// The staged copy and the recorded URL are both built from this list.
    pub fn file_segments(&self) -> Result<Vec<String>, ManifestError> {
        let unsafe_path = || ManifestError::UnsafePath {
            file: self.file.clone(),
        };
        let mut segments = Vec::new();
        for component in Path::new(&self.file).components() {
            match component {
                Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return Err(unsafe_path()),
            }
        }
        if segments.is_empty() || self.file.trim().is_empty() {
            return Err(unsafe_path());
        }
        Ok(segments)
    }
}

pub fn parse_rpm_packages(text: &str, path: &Path) -> Result<Vec<RpmPackage>, ManifestError> {
    Ok(parse_triples(text, path, "name,version,release")?
        .into_iter()
        .map(|[name, version, release]| RpmPackage {
            name,
            version,
            release,
        })
        .collect())
}

pub fn parse_maven_packages(
    text: &str,
    path: &Path,
) -> Result<Vec<MavenCoordinates>, ManifestError> {
    Ok(parse_triples(text, path, "group_id,artifact_id,version")?
        .into_iter()
        .map(|[group_id, artifact_id, version]| MavenCoordinates {
            group_id,
            artifact_id,
            version,
        })
        .collect())
}

pub fn read_rpm_packages(path: &Path) -> Result<Vec<RpmPackage>, ManifestError> {
    let text = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse_rpm_packages(&text, path)
}

pub fn read_maven_packages(path: &Path) -> Result<Vec<MavenCoordinates>, ManifestError> {
    let text = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse_maven_packages(&text, path)
}

pub fn read_image_descriptor(path: &Path) -> Result<ImageDescriptor, ManifestError> {
    let text = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let descriptor: ImageDescriptor =
        serde_json::from_str(&text).map_err(|source| ManifestError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    if descriptor.artifact_id.trim().is_empty() || descriptor.file.trim().is_empty() {
        return Err(ManifestError::Parse {
            path: path.to_path_buf(),
            line: 1,
            message: "artifact_id and file must be non-empty".to_string(),
        });
    }
    Ok(descriptor)
}

fn parse_triples(text: &str, path: &Path, shape: &str) -> Result<Vec<[String; 3]>, ManifestError> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for record in line.split_whitespace() {
            let fields: Vec<&str> = record.split(',').map(str::trim).collect();
            match fields.as_slice() {
                [a, b, c] if !a.is_empty() && !b.is_empty() && !c.is_empty() => {
                    records.push([a.to_string(), b.to_string(), c.to_string()]);
                }
                _ => {
                    return Err(ManifestError::Parse {
                        path: path.to_path_buf(),
                        line: index + 1,
                        message: format!("expected '{shape}', got '{record}'"),
                    })
                }
            }
        }
    }
    Ok(records)
}
