//! Site configuration file (site.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use vitrine_static::{BuildConfig, Delivery, EnvVars, ExclusionSet};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub env: EnvConfig,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_output")]
    pub output: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct BuildSettings {
    #[serde(default)]
    pub delivery: Delivery,
    #[serde(default)]
    pub minify: bool,
    /// Extra top-level names to leave out, on top of the built-in list
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnvConfig {
    #[serde(default = "default_url_var")]
    pub url: String,
    #[serde(default = "default_key_var")]
    pub key: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            url: default_url_var(),
            key: default_key_var(),
        }
    }
}

fn default_source() -> String {
    ".".to_string()
}
fn default_output() -> String {
    "public".to_string()
}
fn default_url_var() -> String {
    EnvVars::default().url
}
fn default_key_var() -> String {
    EnvVars::default().key
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub delivery: Option<Delivery>,
    pub minify: bool,
}

impl ConfigFile {
    /// Merge file settings and overrides into a build configuration.
    pub fn build_config(&self, overrides: Overrides) -> BuildConfig {
        let mut excludes = ExclusionSet::default();
        excludes.extend(self.build.exclude.iter().cloned());

        BuildConfig {
            source_dir: overrides
                .source
                .unwrap_or_else(|| PathBuf::from(&self.site.source)),
            output_dir: overrides
                .output
                .unwrap_or_else(|| PathBuf::from(&self.site.output)),
            delivery: overrides.delivery.unwrap_or(self.build.delivery),
            minify: overrides.minify || self.build.minify,
            excludes,
            env: EnvVars {
                url: self.env.url.clone(),
                key: self.env.key.clone(),
            },
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}
