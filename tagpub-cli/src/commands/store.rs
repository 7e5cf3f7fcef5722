//! `tagpub store exists`

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;

use tagpub_core::BuildIdentity;

use super::{print_json, GlobalArgs, Services};

#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Report whether a build's files are in the store.
    Exists {
        repo: String,
        branch: String,
        build_id: String,
    },
}

#[derive(Serialize)]
struct ExistsJson {
    location: String,
    exists: bool,
}

pub fn run(command: StoreCommand, global: &GlobalArgs) -> Result<()> {
    match command {
        StoreCommand::Exists {
            repo,
            branch,
            build_id,
        } => {
            let identity = BuildIdentity::new(repo, branch, Some(build_id), None)
                .context("invalid build identity")?;
            let services = Services::connect(global)?;
            let location = identity.location().path();
            let exists = services
                .store()
                .exists(&identity)
                .with_context(|| format!("existence probe failed for {location}"))?;

            if global.json {
                return print_json(&ExistsJson { location, exists });
            }
            if exists {
                println!("{} {location} is stored", "✓".green().bold());
            } else {
                println!("{} {location} is not stored", "✗".yellow().bold());
            }
            Ok(())
        }
    }
}
