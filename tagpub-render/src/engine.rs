//! Tera rendering engine: [`ConfigKind`] enum and [`TemplateEngine`].
//!
//! | Kind           | Template                   | Written as      |
//! |----------------|----------------------------|-----------------|
//! | YumRepo        | `yum/repo.tera`            | `config.txt`    |
//! | MavenSettings  | `maven/settings.xml.tera`  | `settings.xml`  |

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use tera::Tera;

use crate::context::{MavenSettingsContext, RepoConfigContext};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// ConfigKind
// ---------------------------------------------------------------------------

/// Installer configs that can be generated for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    YumRepo,
    MavenSettings,
}

impl ConfigKind {
    pub const ALL: [ConfigKind; 2] = [ConfigKind::YumRepo, ConfigKind::MavenSettings];

    /// Template name, and path of the override below a user template directory.
    pub fn template_name(&self) -> &'static str {
        match self {
            ConfigKind::YumRepo => "yum/repo.tera",
            ConfigKind::MavenSettings => "maven/settings.xml.tera",
        }
    }

    /// Default template, baked in at compile time.
    fn embedded_template(&self) -> &'static str {
        match self {
            ConfigKind::YumRepo => include_str!("templates/yum.repo.tera"),
            ConfigKind::MavenSettings => include_str!("templates/maven_settings.xml.tera"),
        }
    }

    /// File name the rendered config is written under.
    pub fn file_name(&self) -> &'static str {
        match self {
            ConfigKind::YumRepo => "config.txt",
            ConfigKind::MavenSettings => "settings.xml",
        }
    }
}

/// Each kind's embedded template, replaced by `<dir>/<template_name>` when
/// that file exists. Other files in `dir` are ignored.
fn build_tera(override_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    for kind in ConfigKind::ALL {
        let path = override_dir.map(|dir| dir.join(kind.template_name()));
        let source = match path {
            Some(path) if path.is_file() => Cow::Owned(
                fs::read_to_string(&path).map_err(|source| RenderError::Io { path, source })?,
            ),
            _ => Cow::Borrowed(kind.embedded_template()),
        };
        tera.add_raw_template(kind.template_name(), &source)?;
    }
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for installer configs with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files (e.g. `yum/repo.tera`) that
/// replace the embedded defaults. Create once and reuse.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Construct a new [`TemplateEngine`], loading embedded templates plus any
    /// overrides found in `user_template_dir`.
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Engine with embedded templates only.
    pub fn embedded() -> Result<Self, RenderError> {
        Self::new(None)
    }

    /// Render the yum `.repo` descriptor.
    pub fn render_repo_config(&self, ctx: &RepoConfigContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(ConfigKind::YumRepo.template_name(), &tera_ctx)?)
    }

    /// Render a maven `settings.xml` listing the given upstream repositories.
    pub fn render_maven_settings(
        &self,
        ctx: &MavenSettingsContext,
    ) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self
            .tera
            .render(ConfigKind::MavenSettings.template_name(), &tera_ctx)?)
    }
}
