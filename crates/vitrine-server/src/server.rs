//! Development server implementation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use vitrine_static::{BuildConfig, BuildError, BuildResult, SiteAssembler};

use crate::watcher::FileWatcher;
use crate::websocket::{hmr_client_script, with_hmr_client, HmrHub, HmrMessage, HMR_PATH, HMR_SCRIPT_PATH};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Site build configuration
    pub build: BuildConfig,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            port: 7777,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("Build failed: {0}")]
    BuildError(#[from] BuildError),

    #[error("Build task failed: {0}")]
    TaskError(String),
}

/// Shared server state.
struct ServerState {
    hmr: HmrHub,
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Build the site, then serve it and rebuild on every source change.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        let assembler = Arc::new(SiteAssembler::new(self.config.build.clone()));
        let result = rebuild(&assembler).await?;
        tracing::info!(
            "Built {} pages and {} files in {}ms",
            result.pages,
            result.files,
            result.duration_ms
        );

        let state = Arc::new(ServerState { hmr: HmrHub::new() });

        let (watch_paths, ignored) = self.watch_targets()?;
        let (watcher, mut rx) = FileWatcher::new(&watch_paths, ignored)
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracing::info!("Changed: {}", event.path().display());

                match rebuild(&assembler).await {
                    Ok(result) => {
                        tracing::info!("Rebuilt in {}ms", result.duration_ms);
                        state_clone.hmr.send(HmrMessage::Reload);
                    }
                    Err(e) => {
                        tracing::error!("{}", e);
                        state_clone.hmr.send(HmrMessage::BuildFailed {
                            message: e.to_string(),
                        });
                    }
                }
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = Router::new()
            .route(HMR_PATH, get(ws_handler))
            .route(HMR_SCRIPT_PATH, get(hmr_script_handler))
            .fallback_service(ServeDir::new(&self.config.build.output_dir))
            .layer(middleware::from_fn(inject_hmr_client))
            .with_state(state);

        tracing::info!("Starting dev server at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }

    /// Paths to watch and prefixes whose changes are ignored.
    ///
    /// The output directory and excluded entries are ignored, otherwise every
    /// rebuild would trigger the next one.
    fn watch_targets(&self) -> Result<(Vec<PathBuf>, Vec<PathBuf>), ServerError> {
        let build = &self.config.build;
        let source = build
            .source_dir
            .canonicalize()
            .map_err(|e| ServerError::WatchError(e.to_string()))?;

        let mut ignored: Vec<PathBuf> = build.excludes.iter().map(|name| source.join(name)).collect();
        if let Ok(output) = build.output_dir.canonicalize() {
            ignored.push(output);
        }

        Ok((vec![source], ignored))
    }
}

/// Run one build on the blocking pool.
async fn rebuild(assembler: &Arc<SiteAssembler>) -> Result<BuildResult, ServerError> {
    let assembler = Arc::clone(assembler);

    let result = tokio::task::spawn_blocking(move || assembler.build())
        .await
        .map_err(|e| ServerError::TaskError(e.to_string()))?;

    Ok(result?)
}

/// Add the live reload client to HTML responses.
async fn inject_hmr_client(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));

    if response.status() != StatusCode::OK || !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to buffer response: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = with_hmr_client(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(html))
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hmr.subscribe();

    if send_message(&mut socket, &HmrMessage::Connected).await.is_err() {
        return;
    }

    while let Ok(msg) = rx.recv().await {
        if send_message(&mut socket, &msg).await.is_err() {
            break;
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &HmrMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

/// Handler for the live reload client script.
async fn hmr_script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        hmr_client_script(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn creates_server_with_default_config() {
        let server = DevServer::new(DevServerConfig::default());
        assert_eq!(server.config.port, 7777);
        assert_eq!(server.config.host, "127.0.0.1");
    }

    #[test]
    fn ignores_output_and_excluded_entries() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("site");
        let output = source.join("public");
        fs::create_dir_all(&output).unwrap();

        let server = DevServer::new(DevServerConfig {
            build: BuildConfig {
                source_dir: source.clone(),
                output_dir: output.clone(),
                ..Default::default()
            },
            ..Default::default()
        });

        let (watch, ignored) = server.watch_targets().unwrap();
        let source = source.canonicalize().unwrap();

        assert_eq!(watch, vec![source.clone()]);
        assert!(ignored.contains(&output.canonicalize().unwrap()));
        assert!(ignored.contains(&source.join("node_modules")));
    }

    #[tokio::test]
    async fn rebuild_runs_the_assembler() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("site");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("index.html"), "<html><head></head></html>").unwrap();

        let assembler = Arc::new(SiteAssembler::new(BuildConfig {
            source_dir: source,
            output_dir: temp.path().join("out"),
            ..Default::default()
        }));

        let result = rebuild(&assembler).await.unwrap();

        assert_eq!(result.pages, 1);
        assert!(temp.path().join("out/.nojekyll").exists());
    }
}
