//! `tagpub tag get|put`: whole-manifest access.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use tagpub_core::TagManifest;

use super::{dry_run_prefix, print_json, read_json_file, tag_key, GlobalArgs, Services};

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Print the manifest recorded under a tag.
    Get {
        repo: String,
        branch: String,
        tag: String,
    },
    /// Replace the manifest under a tag with the contents of a JSON file.
    Put {
        repo: String,
        branch: String,
        tag: String,
        /// Manifest JSON.
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Ask the registry to validate without storing.
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn run(command: TagCommand, global: &GlobalArgs) -> Result<()> {
    let services = Services::connect(global)?;
    let registry = services.registry();

    match command {
        TagCommand::Get { repo, branch, tag } => {
            let key = tag_key(&repo, &branch, &tag)?;
            let manifest = registry
                .get_tag(&key)
                .with_context(|| format!("failed to read tag {key}"))?;
            match manifest {
                Some(manifest) => print_json(&manifest),
                None => bail!("no tag recorded at {key}"),
            }
        }
        TagCommand::Put {
            repo,
            branch,
            tag,
            file,
            dry_run,
        } => {
            let key = tag_key(&repo, &branch, &tag)?;
            let manifest: TagManifest = read_json_file(&file)?;
            let response = registry
                .put_tag(&key, &manifest, dry_run)
                .with_context(|| format!("failed to write tag {key}"))?;
            println!(
                "{}✓ {key}: {}",
                dry_run_prefix(dry_run),
                response.trim()
            );
            Ok(())
        }
    }
}
