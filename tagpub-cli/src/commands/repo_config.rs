//! `tagpub repo-config <repo> <branch>`: render the yum descriptor locally.

use anyhow::{Context, Result};
use clap::Args;

use tagpub_core::BuildIdentity;
use tagpub_manifest::RPM_REPOSITORY_DIR;
use tagpub_render::{RepoConfigContext, TemplateEngine};

use super::GlobalArgs;

/// Arguments for `tagpub repo-config`.
#[derive(Args, Debug)]
pub struct RepoConfigArgs {
    pub repo: String,
    pub branch: String,

    #[arg(long)]
    pub build_id: Option<String>,

    #[arg(long)]
    pub build_url: Option<String>,
}

impl RepoConfigArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let identity = BuildIdentity::new(self.repo, self.branch, self.build_id, self.build_url)
            .context("invalid build identity")?;
        let config = global.config()?;

        let repository_url = identity
            .location()
            .file_url(&config.store_url, &[RPM_REPOSITORY_DIR])
            .context("invalid store URL")?;
        let engine = TemplateEngine::embedded().context("failed to load templates")?;
        let rendered = engine
            .render_repo_config(&RepoConfigContext::new(&identity, repository_url))
            .context("failed to render repo config")?;
        print!("{rendered}");
        Ok(())
    }
}
