//! Development server for vitrine sites.
//!
//! Builds the site, serves the output directory, watches the source tree and
//! rebuilds on change, telling open pages to reload over a WebSocket.

pub mod server;
pub mod watcher;
pub mod websocket;

pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{HmrHub, HmrMessage};
