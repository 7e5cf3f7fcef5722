//! `tagpub artifact get|put`: one record within a tag.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use tagpub_core::ArtifactRecord;

use super::{dry_run_prefix, print_json, read_json_file, tag_key, GlobalArgs, Services};

#[derive(Subcommand, Debug)]
pub enum ArtifactCommand {
    /// Print one artifact record.
    Get {
        repo: String,
        branch: String,
        tag: String,
        name: String,
    },
    /// Replace one artifact record with the contents of a JSON file.
    Put {
        repo: String,
        branch: String,
        tag: String,
        name: String,
        /// Artifact record JSON.
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Ask the registry to validate without storing.
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn run(command: ArtifactCommand, global: &GlobalArgs) -> Result<()> {
    let services = Services::connect(global)?;
    let registry = services.registry();

    match command {
        ArtifactCommand::Get {
            repo,
            branch,
            tag,
            name,
        } => {
            let key = tag_key(&repo, &branch, &tag)?;
            let record = registry
                .get_artifact(&key, &name)
                .with_context(|| format!("failed to read artifact '{name}' in {key}"))?;
            match record {
                Some(record) => print_json(&record),
                None => bail!("no artifact '{name}' in {key}"),
            }
        }
        ArtifactCommand::Put {
            repo,
            branch,
            tag,
            name,
            file,
            dry_run,
        } => {
            let key = tag_key(&repo, &branch, &tag)?;
            let record: ArtifactRecord = read_json_file(&file)?;
            let response = registry
                .put_artifact(&key, &name, &record, dry_run)
                .with_context(|| format!("failed to write artifact '{name}' in {key}"))?;
            println!(
                "{}✓ {key} {name}: {}",
                dry_run_prefix(dry_run),
                response.trim()
            );
            Ok(())
        }
    }
}
