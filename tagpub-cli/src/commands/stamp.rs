//! `tagpub stamp rpm-release|maven-version`: version strings for a CI build,
//! printed for the packaging step to consume before it runs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use tagpub_core::validate_build_id;
use tagpub_manifest::{maven_version, resolve_commit, rpm_release};

use super::{print_json, source_control, GlobalArgs};

#[derive(Subcommand, Debug)]
pub enum StampCommand {
    /// rpm `Release:` value, `0.<build id>.<short commit>`.
    RpmRelease(StampArgs),

    /// Maven version with `SNAPSHOT` replaced by `<build id>.<short commit>`.
    MavenVersion {
        /// Project version, e.g. "2.3.0-SNAPSHOT".
        version: String,

        #[command(flatten)]
        args: StampArgs,
    },
}

/// Build and commit the stamp is derived from.
#[derive(Args, Debug)]
pub struct StampArgs {
    /// CI build id. Omit for a developer build.
    #[arg(long)]
    pub build_id: Option<String>,

    /// Source checkout to read the commit from.
    #[arg(long, default_value = ".")]
    pub checkout: PathBuf,

    /// Use this commit id instead of asking git.
    #[arg(long, value_name = "SHA")]
    pub commit_id: Option<String>,
}

#[derive(Serialize)]
struct Stamp<'a> {
    build_id: Option<&'a str>,
    commit_id: &'a str,
    stamp: &'a str,
}

impl StampArgs {
    /// Validated build id and resolved commit.
    fn resolve(&self) -> Result<(Option<&str>, String)> {
        if let Some(id) = self.build_id.as_deref() {
            validate_build_id(id).context("invalid build id")?;
        }
        let source = source_control(self.commit_id.as_deref(), None);
        let commit = resolve_commit(source.as_ref(), &self.checkout)
            .with_context(|| format!("cannot read commit from '{}'", self.checkout.display()))?;
        Ok((self.build_id.as_deref(), commit.commit_id))
    }
}

pub fn run(command: StampCommand, global: &GlobalArgs) -> Result<()> {
    let (stamp, args, commit_id) = match &command {
        StampCommand::RpmRelease(args) => {
            let (build_id, commit_id) = args.resolve()?;
            (rpm_release(build_id, &commit_id), args, commit_id)
        }
        StampCommand::MavenVersion { version, args } => {
            let (build_id, commit_id) = args.resolve()?;
            (maven_version(version, build_id, &commit_id), args, commit_id)
        }
    };
    tracing::debug!(stamp = %stamp, commit = %commit_id, "version stamp");

    if global.json {
        return print_json(&Stamp {
            build_id: args.build_id.as_deref(),
            commit_id: &commit_id,
            stamp: &stamp,
        });
    }
    println!("{stamp}");
    Ok(())
}
