use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::report::presentation::ColorChoice;
use crate::report::rows::DEFAULT_ADVISORY_URL;

/// Name of the project configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".osv-table.toml";

/// Project-level configuration loaded from `.osv-table.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Prefix of advisory links (e.g., "https://osv.dev/").
    pub advisory_url: Option<String>,

    /// When to style the table (auto, always, never).
    #[serde(default)]
    pub color: ColorChoice,

    /// Optional upper bound on the rendered row width.
    pub max_width: Option<NonZeroUsize>,
}

impl ProjectConfig {
    pub fn advisory_url(&self) -> &str {
        self.advisory_url.as_deref().unwrap_or(DEFAULT_ADVISORY_URL)
    }
}

/// Load project configuration from a TOML file.
pub fn load_project_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: ProjectConfig = toml::from_str(&content)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

/// Try to load config from `.osv-table.toml` in the given directory, or return defaults.
pub fn load_config_or_default(dir: &Path) -> ProjectConfig {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return ProjectConfig::default();
    }
    match load_project_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Ignoring {}: {:#}", config_path.display(), err);
            ProjectConfig::default()
        }
    }
}
