//! Site build command.

use std::path::Path;

use anyhow::Result;
use vitrine_static::SiteAssembler;

use crate::config::{load_config, Overrides};

/// Run the build command.
pub async fn run(config_path: &Path, overrides: Overrides) -> Result<()> {
    tracing::info!("Building site...");

    let file_config = load_config(config_path)?;
    let config = file_config.build_config(overrides);

    let result = SiteAssembler::new(config).build()?;

    tracing::info!(
        "Processed {} pages, copied {} files from {} directories, skipped {} entries in {}ms",
        result.pages,
        result.files,
        result.directories,
        result.excluded,
        result.duration_ms
    );
    tracing::info!("Configuration source: {}", result.config_source);
    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
