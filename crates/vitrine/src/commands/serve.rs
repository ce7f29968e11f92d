//! Preview server for a built site.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use vitrine_static::builder::NOJEKYLL_MARKER;

/// Run the serve command.
pub async fn run(port: u16, dir: PathBuf, open: bool) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!(
            "Directory not found: {}. Run 'vitrine build' first.",
            dir.display()
        );
    }
    if !dir.join(NOJEKYLL_MARKER).exists() {
        tracing::warn!(
            "{} has no {} marker, it may not be a vitrine build",
            dir.display(),
            NOJEKYLL_MARKER
        );
    }

    let addr: SocketAddr = format!("127.0.0.1:{}", port)
        .parse()
        .context("Invalid address")?;

    let not_found = dir.join("404.html");
    let app = if not_found.exists() {
        Router::new().fallback_service(ServeDir::new(&dir).not_found_service(ServeFile::new(not_found)))
    } else {
        Router::new().fallback_service(ServeDir::new(&dir))
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    if open {
        let _ = open::that(format!("http://{}", addr));
    }

    axum::serve(listener, app).await?;

    Ok(())
}
