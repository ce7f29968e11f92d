//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Path of the live reload WebSocket endpoint.
pub const HMR_PATH: &str = "/__hmr";

/// Path the live reload client script is served from.
pub const HMR_SCRIPT_PATH: &str = "/__hmr.js";

/// Messages sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HmrMessage {
    /// Full page reload
    Reload,

    /// Rebuild failed; the page keeps showing the previous output
    BuildFailed {
        /// Error message
        message: String,
    },

    /// Connection established
    Connected,
}

/// Hub for broadcasting messages to all connected clients.
#[derive(Debug, Clone)]
pub struct HmrHub {
    sender: broadcast::Sender<HmrMessage>,
}

impl HmrHub {
    /// Create a new hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: HmrMessage) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(msg);
    }

    /// Subscribe to messages.
    pub fn subscribe(&self) -> broadcast::Receiver<HmrMessage> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for HmrHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate the client-side live reload script.
///
/// Development only: the dev server adds it to HTML responses, built output
/// never contains it.
pub fn hmr_client_script() -> String {
    format!(
        r#"
(function() {{
  'use strict';

  const scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
  const ws = new WebSocket(scheme + location.host + '{}');

  ws.onmessage = function(event) {{
    const msg = JSON.parse(event.data);

    switch (msg.type) {{
      case 'reload':
        location.reload();
        break;

      case 'build_failed':
        console.error('[vitrine] Build failed:', msg.message);
        break;

      case 'connected':
        console.log('[vitrine] Live reload connected');
        break;
    }}
  }};

  ws.onclose = function() {{
    console.log('[vitrine] Disconnected, retrying...');
    setTimeout(function() {{ location.reload(); }}, 1000);
  }};
}})();
"#,
        HMR_PATH
    )
}

/// Add the client script tag to an HTML page, before the last `</body>` if
/// there is one.
pub fn with_hmr_client(html: &str) -> String {
    let tag = format!(r#"<script src="{}"></script>"#, HMR_SCRIPT_PATH);

    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => format!("{}{}\n{}", &html[..at], tag, &html[at..]),
        None => format!("{}\n{}", html, tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = HmrHub::new();
        let mut rx = hub.subscribe();

        hub.send(HmrMessage::Reload);

        match rx.try_recv() {
            Ok(HmrMessage::Reload) => {}
            _ => panic!("Expected Reload message"),
        }
    }

    #[test]
    fn serializes_messages() {
        let msg = HmrMessage::BuildFailed {
            message: "Source directory not found".to_string(),
        };

        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("build_failed"));
        assert!(json.contains("Source directory not found"));
    }

    #[test]
    fn client_script_targets_hmr_endpoint() {
        let script = hmr_client_script();

        assert!(script.contains("/__hmr'"));
        assert!(script.contains("location.reload()"));
    }

    #[test]
    fn injects_client_before_body_close() {
        let html = "<html><BODY><p>x</p></BODY></html>";

        assert_eq!(
            with_hmr_client(html),
            "<html><BODY><p>x</p><script src=\"/__hmr.js\"></script>\n</BODY></html>"
        );
    }

    #[test]
    fn appends_client_without_body() {
        let html = "<p>fragment</p>";

        assert!(with_hmr_client(html).ends_with("<script src=\"/__hmr.js\"></script>"));
    }
}
