//! `tagpub install-config <repo> <branch> <tag> <package>`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use tagpub_client::fetch_install_config;

use super::{emit, print_json, tag_key, GlobalArgs, Services};

/// Arguments for `tagpub install-config`.
#[derive(Args, Debug)]
pub struct InstallConfigArgs {
    pub repo: String,
    pub branch: String,
    pub tag: String,
    /// Package (artifact name) to install.
    pub package: String,

    /// Write the config here, e.g. /etc/yum.repos.d/<repo>.repo.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

impl InstallConfigArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let key = tag_key(&self.repo, &self.branch, &self.tag)?;
        let services = Services::connect(global)?;
        let registry = services.registry();

        let lookup = fetch_install_config(&registry, services.transport(), &key, &self.package)
            .with_context(|| format!("install lookup failed for '{}' in {key}", self.package))?;
        let Some(config) = lookup else {
            bail!("no artifact '{}' in {key}", self.package);
        };

        if global.json {
            return print_json(&config);
        }
        emit(&config.contents, self.output.as_deref())
    }
}
