//! Live-reload wire protocol.
//!
//! Messages travel as JSON text frames over the reload WebSocket. The
//! server greets each new session with `connected`, the client answers
//! with a `handshake` carrying its current URL, and from then on the
//! server pushes `change` and `unlink` notifications as watch events land.

use serde::{Deserialize, Serialize};

/// A reload protocol message, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Server greeting, sent once per session right after the upgrade.
    Connected,
    /// Client reply declaring which URL the session is viewing.
    Handshake { url: String },
    /// A component the session depends on was rebuilt. `path` is the
    /// fingerprinted module to re-import, `name` the root-relative source
    /// file for display.
    Change { path: String, name: String },
    /// A watched source file was deleted; the client should do a full
    /// reload.
    Unlink,
}

impl ReloadMessage {
    /// Serialize for a text frame. Serialization of these shapes cannot
    /// fail.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
