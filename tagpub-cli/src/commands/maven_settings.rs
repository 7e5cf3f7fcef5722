//! `tagpub maven-settings <url>...`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use tagpub_render::{MavenSettingsContext, TemplateEngine};

use super::emit;

/// Arguments for `tagpub maven-settings`.
#[derive(Args, Debug)]
pub struct MavenSettingsArgs {
    /// Upstream repository URLs, in resolution order.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Write the settings file here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

impl MavenSettingsArgs {
    pub fn run(self) -> Result<()> {
        let engine = TemplateEngine::embedded().context("failed to load templates")?;
        let rendered = engine
            .render_maven_settings(&MavenSettingsContext::from_urls(self.urls))
            .context("failed to render settings.xml")?;
        emit(&rendered, self.output.as_deref())
    }
}
