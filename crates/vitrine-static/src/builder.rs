//! Site assembler.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use serde::Deserialize;
use walkdir::WalkDir;

use crate::assets::AssetPipeline;
use crate::exclude::ExclusionSet;
use crate::inject::{inject_script, link_config_file, InjectionPoint};
use crate::runtime::{EnvVars, RuntimeConfig};
use crate::templates::TemplateEngine;

/// Name of the configuration file pages load when nothing is inlined.
pub const CONFIG_FILE: &str = "config.js";

/// Marker file telling GitHub Pages not to run Jekyll, so dot files are served.
pub const NOJEKYLL_MARKER: &str = ".nojekyll";

/// How the runtime configuration reaches the browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Inline `<script>` in every HTML page when the environment provides
    /// the configuration; `config.js` otherwise.
    #[default]
    Inline,

    /// Always a `config.js` at the output root; HTML is never rewritten.
    File,
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delivery::Inline => write!(f, "inline"),
            Delivery::File => write!(f, "file"),
        }
    }
}

impl FromStr for Delivery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(Delivery::Inline),
            "file" => Ok(Delivery::File),
            other => Err(format!(
                "unknown delivery '{}', expected 'inline' or 'file'",
                other
            )),
        }
    }
}

/// Configuration for assembling a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source directory
    pub source_dir: PathBuf,

    /// Output directory, wiped and recreated on every build
    pub output_dir: PathBuf,

    /// Configuration delivery policy
    pub delivery: Delivery,

    /// Minify HTML output
    pub minify: bool,

    /// Top-level names never copied
    pub excludes: ExclusionSet,

    /// Environment variables holding the runtime configuration
    pub env: EnvVars,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_dir: PathBuf::from("public"),
            delivery: Delivery::default(),
            minify: false,
            excludes: ExclusionSet::default(),
            env: EnvVars::default(),
        }
    }
}

/// Where the configuration object in the output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Environment variables
    Environment,

    /// The `config.js` committed in the source tree
    LocalFile,

    /// Generated stub with empty fields
    Stub,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::LocalFile => write!(f, "local {}", CONFIG_FILE),
            ConfigSource::Stub => write!(f, "empty stub"),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of HTML pages processed
    pub pages: usize,

    /// Number of other files copied, including those inside directories
    pub files: usize,

    /// Number of top-level directories copied
    pub directories: usize,

    /// Number of top-level entries skipped by the exclusion set
    pub excluded: usize,

    /// Source of the delivered configuration
    pub config_source: ConfigSource,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Output directory {} would overwrite the source directory", .0.display())]
    OutputOverlapsSource(PathBuf),

    #[error("Failed to reset output directory {}: {source}", path.display())]
    ResetError { path: PathBuf, source: io::Error },

    #[error("Failed to read {}: {source}", path.display())]
    ReadError { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", path.display())]
    WriteError { path: PathBuf, source: io::Error },

    #[error("Failed to render template: {0}")]
    TemplateError(#[from] minijinja::Error),
}

impl BuildError {
    fn read(path: &Path, source: io::Error) -> Self {
        BuildError::ReadError {
            path: path.to_path_buf(),
            source,
        }
    }

    fn write(path: &Path, source: io::Error) -> Self {
        BuildError::WriteError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Assembles a deployable site from a source tree.
///
/// One build is a single pass: reset the output directory, copy or transform
/// every top-level source entry, deliver the configuration, write the
/// hosting marker. Any filesystem failure aborts the build.
pub struct SiteAssembler {
    config: BuildConfig,
    templates: TemplateEngine,
}

impl SiteAssembler {
    /// Create a new site assembler.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            templates: TemplateEngine::new(),
        }
    }

    /// Build with the runtime configuration taken from the process environment.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let runtime = RuntimeConfig::from_env(&self.config.env);
        self.build_with(runtime.as_ref())
    }

    /// Build with an explicit runtime configuration.
    pub fn build_with(&self, runtime: Option<&RuntimeConfig>) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        if !self.config.source_dir.is_dir() {
            return Err(BuildError::SourceNotFound(self.config.source_dir.clone()));
        }
        self.check_overlap()?;

        let excludes = self.effective_excludes();

        self.reset_output()?;
        let nested_output = self.nested_output();

        match runtime {
            Some(_) => tracing::info!(
                "Runtime configuration found in {} and {} ({} delivery)",
                self.config.env.url,
                self.config.env.key,
                self.config.delivery
            ),
            None => tracing::warn!(
                "No runtime configuration in the environment (local mode or missing secrets), using fallback {}",
                CONFIG_FILE
            ),
        }

        let script = match (self.config.delivery, runtime) {
            (Delivery::Inline, Some(rt)) => Some(self.templates.render_script(rt)?),
            _ => None,
        };

        let mut pages = 0;
        let mut files = 0;
        let mut directories = 0;
        let mut excluded = 0;
        let mut local_config = None;

        for entry in self.source_entries()? {
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            let source_path = entry.path();

            if excludes.contains(&name_str) {
                tracing::debug!("Skipping excluded entry {}", name_str);
                excluded += 1;
                continue;
            }

            let metadata =
                fs::metadata(&source_path).map_err(|e| BuildError::read(&source_path, e))?;
            let output_path = self.config.output_dir.join(&name);

            if metadata.is_dir() {
                files += copy_dir(&source_path, &output_path, nested_output.as_deref())?;
                directories += 1;
            } else if is_html(&source_path) {
                self.write_page(&source_path, &output_path, script.as_deref())?;
                pages += 1;
            } else if name_str == CONFIG_FILE {
                local_config = Some(source_path);
            } else {
                fs::copy(&source_path, &output_path)
                    .map_err(|e| BuildError::write(&output_path, e))?;
                files += 1;
            }
        }

        let config_source = self.deliver_config(runtime, local_config.as_deref())?;

        self.finalize()?;

        let duration = start.elapsed();

        Ok(BuildResult {
            pages,
            files,
            directories,
            excluded,
            config_source,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Refuse output directories that are, or contain, the source directory.
    fn check_overlap(&self) -> Result<(), BuildError> {
        let Ok(output) = fs::canonicalize(&self.config.output_dir) else {
            // Not created yet, so it cannot contain anything.
            return Ok(());
        };
        let source = fs::canonicalize(&self.config.source_dir)
            .map_err(|e| BuildError::read(&self.config.source_dir, e))?;

        if source.starts_with(&output) {
            return Err(BuildError::OutputOverlapsSource(
                self.config.output_dir.clone(),
            ));
        }
        Ok(())
    }

    /// The configured exclusions plus the output directory itself when it
    /// lives directly inside the source directory.
    fn effective_excludes(&self) -> ExclusionSet {
        let mut excludes = self.config.excludes.clone();

        let output = &self.config.output_dir;
        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let same_dir = match (
            fs::canonicalize(parent),
            fs::canonicalize(&self.config.source_dir),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };

        if same_dir {
            if let Some(name) = output.file_name() {
                excludes.insert(name.to_string_lossy().into_owned());
            }
        }

        excludes
    }

    /// The output directory as a path under the source directory, when it
    /// lives somewhere below it. Recursive copies must not descend into it.
    fn nested_output(&self) -> Option<PathBuf> {
        let output = fs::canonicalize(&self.config.output_dir).ok()?;
        let source = fs::canonicalize(&self.config.source_dir).ok()?;
        let relative = output.strip_prefix(&source).ok()?;

        Some(self.config.source_dir.join(relative))
    }

    /// Delete the output directory if present and recreate it empty.
    fn reset_output(&self) -> Result<(), BuildError> {
        let output = &self.config.output_dir;

        match fs::remove_dir_all(output) {
            Ok(()) => tracing::debug!("Removed previous output {}", output.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(BuildError::ResetError {
                    path: output.clone(),
                    source,
                })
            }
        }

        fs::create_dir_all(output).map_err(|source| BuildError::ResetError {
            path: output.clone(),
            source,
        })
    }

    /// Immediate children of the source directory, sorted by name.
    fn source_entries(&self) -> Result<Vec<fs::DirEntry>, BuildError> {
        let source = &self.config.source_dir;

        let mut entries = fs::read_dir(source)
            .map_err(|e| BuildError::read(source, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BuildError::read(source, e))?;

        entries.sort_by_key(|e| e.file_name());
        Ok(entries)
    }

    /// Transform and write one HTML page.
    fn write_page(
        &self,
        source_path: &Path,
        output_path: &Path,
        script: Option<&str>,
    ) -> Result<(), BuildError> {
        let html = fs::read(source_path).map_err(|e| BuildError::read(source_path, e))?;
        let name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let html = match script {
            Some(script) => {
                let injected = inject_script(&html, script);
                match injected.point {
                    point if !point.is_fallback() => {
                        tracing::info!("Injected runtime configuration into {}", name);
                    }
                    InjectionPoint::HeadClose => {
                        tracing::warn!(
                            "No config placeholder in {}, injected before </head>",
                            name
                        );
                    }
                    _ => {
                        tracing::warn!(
                            "No config placeholder or </head> in {}, injected at the top",
                            name
                        );
                    }
                }
                Cow::Owned(injected.html)
            }
            None => link_config_file(&html, CONFIG_FILE),
        };

        let html: Cow<[u8]> = if self.config.minify {
            match String::from_utf8(html.into_owned()) {
                Ok(text) => AssetPipeline::minify_html(&text).into_bytes().into(),
                Err(e) => {
                    tracing::warn!("{} is not valid UTF-8, writing it unminified", name);
                    e.into_bytes().into()
                }
            }
        } else {
            html
        };

        fs::write(output_path, html).map_err(|e| BuildError::write(output_path, e))
    }

    /// Make sure the output can always produce a configuration object.
    fn deliver_config(
        &self,
        runtime: Option<&RuntimeConfig>,
        local_config: Option<&Path>,
    ) -> Result<ConfigSource, BuildError> {
        let output_path = self.config.output_dir.join(CONFIG_FILE);

        let source = match (self.config.delivery, runtime, local_config) {
            (Delivery::Inline, Some(_), _) => {
                if local_config.is_some() {
                    tracing::info!("Not shipping local {}, environment takes precedence", CONFIG_FILE);
                }
                ConfigSource::Environment
            }
            (Delivery::File, Some(rt), _) => {
                let content = self.templates.render_file(Some(rt))?;
                fs::write(&output_path, content)
                    .map_err(|e| BuildError::write(&output_path, e))?;
                tracing::info!("Wrote {} from environment", CONFIG_FILE);
                ConfigSource::Environment
            }
            (_, None, Some(local)) => {
                fs::copy(local, &output_path).map_err(|e| BuildError::write(&output_path, e))?;
                tracing::info!("Copied local {}", CONFIG_FILE);
                ConfigSource::LocalFile
            }
            (_, None, None) => {
                let content = self.templates.render_file(None)?;
                fs::write(&output_path, content)
                    .map_err(|e| BuildError::write(&output_path, e))?;
                tracing::warn!("No local {} found, wrote an empty stub", CONFIG_FILE);
                ConfigSource::Stub
            }
        };

        Ok(source)
    }

    /// Write the hosting marker file.
    fn finalize(&self) -> Result<(), BuildError> {
        let marker = self.config.output_dir.join(NOJEKYLL_MARKER);
        fs::write(&marker, "").map_err(|e| BuildError::write(&marker, e))
    }
}

fn is_html(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("html")
}

/// Copy a directory tree unchanged, skipping `skip` and everything below it.
/// Returns the number of files copied.
fn copy_dir(source: &Path, destination: &Path, skip: Option<&Path>) -> Result<usize, BuildError> {
    let mut files = 0;

    let walker = WalkDir::new(source)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| skip != Some(e.path()));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            BuildError::ReadError {
                path,
                source: e.into(),
            }
        })?;

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| BuildError::write(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| BuildError::write(&target, e))?;
            files += 1;
        }
    }

    Ok(files)
}
