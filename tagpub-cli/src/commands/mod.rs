//! Subcommands and the service wiring they share.

pub mod artifact;
pub mod install_config;
pub mod maven_settings;
pub mod publish;
pub mod repo_config;
pub mod stamp;
pub mod store;
pub mod tag;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::Serialize;

use tagpub_client::{MemoryBackend, RemoteStore, TagRegistry, Transport, UreqTransport};
use tagpub_core::{config, Config, TagKey};
use tagpub_manifest::{FixedSource, GitCli, SourceControl};

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// File store base URL (overrides config and TAGPUB_STORE_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub store_url: Option<String>,

    /// Tag registry base URL (overrides config and TAGPUB_REGISTRY_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub registry_url: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Emit machine-readable JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Talk to an in-process store and registry instead of the network.
    #[arg(long, global = true)]
    pub memory: bool,
}

impl GlobalArgs {
    /// Config file and environment, then these flags.
    pub fn config(&self) -> Result<Config> {
        let config = config::load().context("failed to load ~/.tagpub/config.yaml")?;
        config
            .with_endpoints(self.store_url.clone(), self.registry_url.clone())
            .validate()
            .context("invalid service endpoint")
    }
}

/// Configured transport plus the endpoints the clients are built against.
pub struct Services {
    pub config: Config,
    transport: Box<dyn Transport>,
}

impl Services {
    pub fn connect(global: &GlobalArgs) -> Result<Self> {
        let config = global.config()?;
        let transport: Box<dyn Transport> = if global.memory {
            tracing::debug!("using in-memory store and registry");
            Box::new(MemoryBackend::new(
                config.store_url.clone(),
                config.registry_url.clone(),
            ))
        } else {
            Box::new(UreqTransport::new(config.http_timeout()))
        };
        Ok(Self { config, transport })
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn store(&self) -> RemoteStore<'_> {
        RemoteStore::new(self.transport(), self.config.store_url.clone())
    }

    pub fn registry(&self) -> TagRegistry<'_> {
        TagRegistry::new(self.transport(), self.config.registry_url.clone())
    }
}

/// `git` on the checkout, or fixed answers when the commit was given on the command line.
pub fn source_control(
    commit_id: Option<&str>,
    origin_url: Option<&str>,
) -> Box<dyn SourceControl> {
    match commit_id {
        Some(sha) => {
            let mut fixed = FixedSource::new(sha);
            if let Some(origin) = origin_url {
                fixed = fixed.with_origin(origin);
            }
            Box::new(fixed)
        }
        None => Box::new(GitCli::default()),
    }
}

/// Registry key from positional arguments.
pub fn tag_key(repo: &str, branch: &str, tag: &str) -> Result<TagKey> {
    TagKey::new(repo, branch, tag).context("invalid tag key")
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize JSON output")?
    );
    Ok(())
}

pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in '{}'", path.display()))
}

/// Write to `output`, or stdout when absent.
pub fn emit(contents: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("cannot write '{}'", path.display()))?;
            eprintln!("✓ wrote {}", path.display());
        }
        None => print!("{contents}"),
    }
    Ok(())
}

pub fn dry_run_prefix(dry_run: bool) -> &'static str {
    if dry_run {
        "[dry-run] "
    } else {
        ""
    }
}
