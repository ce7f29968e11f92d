//! Scaffold a site in the current directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use vitrine_static::builder::CONFIG_FILE;
use vitrine_static::inject::CONFIG_MARKER;
use vitrine_static::templates::TemplateEngine;

/// Run the init command.
pub async fn run(yes: bool) -> Result<()> {
    scaffold(Path::new("."), yes)
}

/// Write the starter files into `root`. Existing files are kept unless
/// `overwrite` is set.
pub fn scaffold(root: &Path, overwrite: bool) -> Result<()> {
    tracing::info!("Initializing vitrine...");

    write_file(&root.join("site.toml"), DEFAULT_CONFIG, overwrite)?;

    let index = DEFAULT_INDEX.replace("{marker}", CONFIG_MARKER);
    write_file(&root.join("index.html"), &index, overwrite)?;

    // Local fallback with empty fields; fill in for local development.
    let stub = TemplateEngine::new()
        .render_file(None)
        .context("Failed to render config.js stub")?;
    write_file(&root.join(CONFIG_FILE), &stub, overwrite)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'vitrine dev' to start the development server.");

    Ok(())
}

fn write_file(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());
    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# vitrine configuration

[site]
# Source directory
source = "."

# Output directory, wiped on every build
output = "public"

[build]
# "inline": embed the configuration in every page when the environment
#           provides it, ship config.js otherwise
# "file":   always ship config.js
delivery = "inline"

# Strip comments and whitespace between tags
minify = false

# Extra top-level names to leave out of the output
exclude = []

[env]
# Environment variables holding the API URL and key
url = "SUPABASE_URL"
key = "SUPABASE_KEY"
"#;

const DEFAULT_INDEX: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Welcome</title>
  {marker}
</head>
<body>
  <h1>Welcome</h1>
  <script>
    console.log('API endpoint configured:', Boolean(window.CONFIG && window.CONFIG.SUPABASE_URL));
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scaffolds_starter_files() {
        let temp = tempdir().unwrap();

        scaffold(temp.path(), false).unwrap();

        let index = fs::read_to_string(temp.path().join("index.html")).unwrap();
        assert!(index.contains(CONFIG_MARKER));

        let config = fs::read_to_string(temp.path().join("config.js")).unwrap();
        assert!(config.contains(r#"SUPABASE_KEY: """#));

        let toml = fs::read_to_string(temp.path().join("site.toml")).unwrap();
        assert!(toml.contains("delivery = \"inline\""));
    }

    #[test]
    fn keeps_existing_files_without_overwrite() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "mine").unwrap();

        scaffold(temp.path(), false).unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("index.html")).unwrap(), "mine");

        scaffold(temp.path(), true).unwrap();
        assert_ne!(fs::read_to_string(temp.path().join("index.html")).unwrap(), "mine");
    }
}
