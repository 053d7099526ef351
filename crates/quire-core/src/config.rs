//! Site layout and development settings.
//!
//! Directory names follow a fixed convention under a site root:
//! `pages/` (content), `templates/` (layouts), `assets/` (static files)
//! and `public/` (output). Only the site root and the output directory can
//! be moved. Everything else that is tunable lives in [`Settings`].

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Content directory name.
pub const PAGES_DIR: &str = "pages";
/// Layout template directory name.
pub const TEMPLATES_DIR: &str = "templates";
/// Static asset directory name.
pub const ASSETS_DIR: &str = "assets";
/// Output directory name.
pub const PUBLIC_DIR: &str = "public";
/// Optional settings file in the site root.
pub const SETTINGS_FILE: &str = "quire.toml";
/// Environment variable prefix for settings overrides (`QUIRE__SERVE__PORT`).
pub const ENV_PREFIX: &str = "QUIRE";

/// The four directory roots of one build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    /// Content documents.
    pub content_root: PathBuf,
    /// Layout templates.
    pub template_root: PathBuf,
    /// Generated site.
    pub output_root: PathBuf,
    /// Static assets.
    pub asset_root: PathBuf,
}

impl SiteLayout {
    /// Create a layout from explicit roots.
    pub fn new(
        content_root: impl Into<PathBuf>,
        template_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        asset_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            content_root: content_root.into(),
            template_root: template_root.into(),
            output_root: output_root.into(),
            asset_root: asset_root.into(),
        }
    }

    /// Derive the conventional layout under a site root.
    pub fn from_site_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(
            root.join(PAGES_DIR),
            root.join(TEMPLATES_DIR),
            root.join(PUBLIC_DIR),
            root.join(ASSETS_DIR),
        )
    }

    /// Override the output root.
    #[must_use]
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    /// Check that every root is set.
    pub fn validate(&self) -> Result<()> {
        let roots = [
            ("content", &self.content_root),
            ("template", &self.template_root),
            ("output", &self.output_root),
            ("asset", &self.asset_root),
        ];
        for (name, root) in roots {
            if root.as_os_str().is_empty() {
                return Err(CoreError::config(format!(
                    "{name} directory cannot be empty"
                )));
            }
        }
        Ok(())
    }

    /// Source directories observed in watch mode.
    #[must_use]
    pub fn watch_roots(&self) -> [&Path; 3] {
        [&self.content_root, &self.template_root, &self.asset_root]
    }
}

/// Development settings loaded from `quire.toml` and the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Development server settings.
    #[serde(default)]
    pub serve: ServeSettings,

    /// Watch loop settings.
    #[serde(default)]
    pub watch: WatchSettings,

    /// Asset pipeline settings.
    #[serde(default)]
    pub assets: AssetSettings,
}

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServeSettings {
    /// Host to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Watch loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchSettings {
    /// Minimum time between the starts of two rebuilds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Quiet period after an accepted change before the rebuild starts.
    /// The watch loop never waits less than `debounce_ms`.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

/// Asset pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSettings {
    /// Minify bundled stylesheets.
    #[serde(default = "default_true")]
    pub minify_css: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_settle_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

impl Default for ServeSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            minify_css: default_true(),
        }
    }
}

impl WatchSettings {
    /// Debounce window as a duration.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Settle period as a duration.
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Settings {
    /// Load settings for a site root.
    ///
    /// Reads `quire.toml` when present, then applies `QUIRE__*` environment
    /// overrides (for example `QUIRE__WATCH__DEBOUNCE_MS=250`).
    pub fn load(site_root: &Path) -> Result<Self> {
        let path = site_root.join(SETTINGS_FILE);
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                CoreError::config_with_source(
                    format!("Failed to read settings: {}", path.display()),
                    e,
                )
            })?;

        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.serve.host.is_empty() {
            return Err(CoreError::config("serve.host cannot be empty"));
        }
        if self.watch.debounce_ms == 0 {
            tracing::warn!("watch.debounce_ms is 0, every change event triggers a rebuild");
        }
        Ok(())
    }
}
