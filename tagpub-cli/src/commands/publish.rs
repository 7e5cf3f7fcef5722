//! `tagpub publish rpm|maven|file`: stage, upload and tag one build.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use tagpub_client::ConsistencyPolicy;
use tagpub_core::BuildIdentity;
use tagpub_manifest::resolve_branch;
use tagpub_publish::{
    Backend, Createrepo, NoopIndexer, PublishReport, Publisher, RepoIndexer, Stager, StoreOutcome,
};
use tagpub_render::TemplateEngine;

use super::{dry_run_prefix, print_json, source_control, GlobalArgs, Services};

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BackendArg {
    Rpm,
    Maven,
    File,
}

impl From<BackendArg> for Backend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Rpm => Backend::Rpm,
            BackendArg::Maven => Backend::Maven,
            BackendArg::File => Backend::File,
        }
    }
}

/// Arguments for `tagpub publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Packaging backend that produced the build directory.
    #[arg(value_enum)]
    pub backend: BackendArg,

    #[arg(long)]
    pub repo: String,

    /// Branch being built. Defaults to the checkout's current branch.
    #[arg(long)]
    pub branch: Option<String>,

    /// Tag to record the build under (e.g. "tested", "latest").
    #[arg(long)]
    pub tag: String,

    /// CI build id. Omit for a developer build: every write becomes dry-run.
    #[arg(long)]
    pub build_id: Option<String>,

    /// CI job URL recorded in the manifest.
    #[arg(long)]
    pub build_url: Option<String>,

    /// Directory the backend wrote its output and metadata file to.
    #[arg(long)]
    pub build_dir: PathBuf,

    /// Source checkout to read commit metadata from.
    #[arg(long, default_value = ".")]
    pub checkout: PathBuf,

    /// Use this commit id instead of asking git.
    #[arg(long, value_name = "SHA")]
    pub commit_id: Option<String>,

    /// Origin URL to derive the commit link from (with --commit-id).
    #[arg(long, value_name = "URL", requires = "commit_id")]
    pub origin_url: Option<String>,

    /// Directory of `.tera` files overriding the embedded installer templates.
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// rpm index generator.
    #[arg(long, default_value = "createrepo", value_name = "PROGRAM")]
    pub createrepo: PathBuf,

    /// Skip rpm index generation.
    #[arg(long)]
    pub no_index: bool,
}

impl PublishArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let source = source_control(self.commit_id.as_deref(), self.origin_url.as_deref());
        let branch = match &self.branch {
            Some(branch) => branch.clone(),
            None => resolve_branch(source.as_ref(), &self.checkout)
                .context("cannot determine branch; pass --branch")?,
        };
        let identity = BuildIdentity::new(
            self.repo.clone(),
            branch,
            self.build_id.clone(),
            self.build_url.clone(),
        )
        .context("invalid build identity")?;

        let services = Services::connect(global)?;
        let engine = TemplateEngine::new(self.templates.as_deref())
            .context("failed to load installer templates")?;
        let indexer: Box<dyn RepoIndexer> = if self.no_index {
            Box::new(NoopIndexer)
        } else {
            Box::new(Createrepo::with_program(self.createrepo.clone()))
        };

        let backend = Backend::from(self.backend);
        let staged = Stager::new(&services.config.store_url, &engine, indexer.as_ref())
            .stage(backend, &identity, &self.build_dir)
            .with_context(|| {
                format!(
                    "failed to stage {} output in '{}'",
                    backend.as_str(),
                    self.build_dir.display()
                )
            })?;

        let store = services.store();
        let registry = services.registry();
        let policy = ConsistencyPolicy::from(&services.config.consistency);
        let report = Publisher::new(&store, &registry, source.as_ref(), policy)
            .publish_staged(&identity, &self.tag, &staged, &self.checkout)
            .with_context(|| format!("publish failed for {identity}"))?;

        if global.json {
            return print_json(&report);
        }
        print_report(&report);
        Ok(())
    }
}

#[derive(Tabled)]
struct ArtifactRow {
    #[tabled(rename = "artifact")]
    name: String,
    #[tabled(rename = "type")]
    kind: &'static str,
    #[tabled(rename = "identity")]
    identity: String,
    #[tabled(rename = "location")]
    location: String,
}

fn print_report(report: &PublishReport) {
    let prefix = dry_run_prefix(report.dry_run);
    let elapsed = (report.finished_at - report.started_at).num_milliseconds();

    println!(
        "{prefix}{} published {} ({}) in {elapsed} ms",
        "✓".green().bold(),
        report.tag.bold(),
        report.location,
    );

    match &report.store {
        StoreOutcome::AlreadyStored => println!("  ·  already stored; upload skipped"),
        StoreOutcome::Uploaded { files, attempts } => println!(
            "  ✎  uploaded {} files ({} bytes), confirmed after {attempts} probe(s)",
            files.len(),
            files.iter().map(|f| f.bytes).sum::<u64>(),
        ),
        StoreOutcome::DryRun { files } => {
            println!("  ~  {} files sent as dry-run; nothing stored", files.len())
        }
    }

    println!("  commit {}", report.manifest.commit_id);
    if let Some(url) = &report.manifest.commit_url {
        println!("  {}", url.bright_black());
    }

    let rows: Vec<ArtifactRow> = report
        .manifest
        .artifacts
        .iter()
        .map(|(name, record)| ArtifactRow {
            name: name.to_string(),
            kind: record.kind(),
            identity: record.describe(),
            location: record.location_url().to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("  registry: {}", report.registry_response.trim());
}
