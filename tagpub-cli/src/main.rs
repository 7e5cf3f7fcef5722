//! tagpub: publish build outputs to the file store and tag registry.
//!
//! # Usage
//!
//! ```text
//! tagpub publish <backend> --repo <r> [--branch <b>] --tag <t> --build-dir <d> [--build-id <n>]
//! tagpub tag get <repo> <branch> <tag>
//! tagpub tag put <repo> <branch> <tag> --file manifest.json [--dry-run]
//! tagpub artifact get <repo> <branch> <tag> <name>
//! tagpub artifact put <repo> <branch> <tag> <name> --file record.json [--dry-run]
//! tagpub store exists <repo> <branch> <build-id>
//! tagpub install-config <repo> <branch> <tag> <package> [--output <path>]
//! tagpub repo-config <repo> <branch> [--build-id <id>] [--build-url <url>]
//! tagpub maven-settings <url>... [--output <path>]
//! tagpub stamp rpm-release|maven-version <version> [--build-id <id>] [--commit-id <sha>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    artifact::ArtifactCommand, install_config::InstallConfigArgs,
    maven_settings::MavenSettingsArgs, publish::PublishArgs, repo_config::RepoConfigArgs,
    stamp::StampCommand, store::StoreCommand, tag::TagCommand, GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "tagpub",
    version,
    about = "Publish build artifacts and record them under registry tags",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stage, upload and tag a build's output.
    Publish(PublishArgs),

    /// Read or replace a tag manifest.
    Tag {
        #[command(subcommand)]
        command: TagCommand,
    },

    /// Read or replace a single artifact record within a tag.
    Artifact {
        #[command(subcommand)]
        command: ArtifactCommand,
    },

    /// Query the file store.
    Store {
        #[command(subcommand)]
        command: StoreCommand,
    },

    /// Fetch the installer config for one package of a tag.
    InstallConfig(InstallConfigArgs),

    /// Render the yum repository descriptor for a build.
    RepoConfig(RepoConfigArgs),

    /// Render a maven settings.xml for a list of upstream repositories.
    MavenSettings(MavenSettingsArgs),

    /// Print the build-stamped rpm release or maven version.
    Stamp {
        #[command(subcommand)]
        command: StampCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let global = cli.global;
    match cli.command {
        Commands::Publish(args) => args.run(&global),
        Commands::Tag { command } => commands::tag::run(command, &global),
        Commands::Artifact { command } => commands::artifact::run(command, &global),
        Commands::Store { command } => commands::store::run(command, &global),
        Commands::InstallConfig(args) => args.run(&global),
        Commands::RepoConfig(args) => args.run(&global),
        Commands::MavenSettings(args) => args.run(),
        Commands::Stamp { command } => commands::stamp::run(command, &global),
    }
}

/// Log to stderr so stdout stays parseable. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
