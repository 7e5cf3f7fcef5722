//! Version stamping: make every CI build's packages sort after the last one
//! and trace back to their commit.
//!
//! Stamps take the raw build id rather than a full identity: they are applied
//! before packaging, when only the id and the checkout are known.

use tagpub_core::DEVELOPER_SEGMENT;

/// `{build_id}.{short commit}`, e.g. `42.0123abcd`.
///
/// Developer builds (`None`) stamp with the developer segment.
pub fn build_stamp(build_id: Option<&str>, commit_id: &str) -> String {
    let build = build_id.unwrap_or(DEVELOPER_SEGMENT);
    let short: String = commit_id.chars().take(8).collect();
    format!("{build}.{short}")
}

/// rpm `Release:` value, `0.{build_id}.{short commit}`.
pub fn rpm_release(build_id: Option<&str>, commit_id: &str) -> String {
    format!("0.{}", build_stamp(build_id, commit_id))
}

/// Maven version with `SNAPSHOT` replaced by the build stamp.
///
/// Versions without `SNAPSHOT` are returned unchanged.
pub fn maven_version(version: &str, build_id: Option<&str>, commit_id: &str) -> String {
    version
        .trim()
        .replace("SNAPSHOT", &build_stamp(build_id, commit_id))
}
