//! Template contexts: serializable rendering payloads.

use serde::{Deserialize, Serialize};

use tagpub_core::BuildIdentity;

use crate::error::RenderError;

/// Payload for the yum `.repo` descriptor written next to uploaded packages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfigContext {
    /// Section header and display name, `{repo}/{branch}/{build}`.
    pub section: String,
    pub repository: String,
    /// Package index URL (`baseurl`).
    pub repository_url: String,
    pub build_url: String,
}

impl RepoConfigContext {
    /// Build from an identity and the package-repository URL recorded in its manifest.
    pub fn new(identity: &BuildIdentity, repository_url: impl Into<String>) -> Self {
        RepoConfigContext {
            section: identity.location().path(),
            repository: identity.repository().to_string(),
            repository_url: repository_url.into(),
            build_url: identity.build_url().unwrap_or("(none)").to_string(),
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        Ok(tera::Context::from_value(serde_json::to_value(self)?)?)
    }
}

/// One upstream repository in maven `settings.xml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MavenRepositoryCtx {
    pub id: String,
    pub url: String,
}

/// Payload for a maven global settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MavenSettingsContext {
    pub repositories: Vec<MavenRepositoryCtx>,
}

impl MavenSettingsContext {
    /// Repository ids are `repo-{index}` in the order given.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let repositories = urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| MavenRepositoryCtx {
                id: format!("repo-{i}"),
                url: url.into(),
            })
            .collect();
        MavenSettingsContext { repositories }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        Ok(tera::Context::from_value(serde_json::to_value(self)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_context_section_follows_storage_location() {
        let id = BuildIdentity::new("widget", "main", Some("42".into()), None).unwrap();
        let ctx = RepoConfigContext::new(&id, "http://files/widget/main/42/repo");
        assert_eq!(ctx.section, "widget/main/42");
        assert_eq!(ctx.build_url, "(none)");
        ctx.to_tera_context().expect("context conversion");
    }

    #[test]
    fn maven_ids_are_indexed() {
        let ctx = MavenSettingsContext::from_urls(["http://a", "http://b"]);
        let ids: Vec<_> = ctx.repositories.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["repo-0", "repo-1"]);
    }
}
