// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{BridgeError, Result};

/// Persistent bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL joined with a room name to form the conference url.  When
    /// unset the room name itself is the url.
    pub server_url: Option<String>,
    /// Whether POST calls to an unknown plugin also raise
    /// `UNDEFINED_JITSI_ERROR` (GET calls always report an empty result).
    pub report_routing_misses: bool,
    /// Tracing filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// JID announced by the simulated runtime once "connected".
    pub simulated_jid: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            report_routing_misses: true,
            log_filter: "info".into(),
            simulated_jid: "guest@meet.local/confbridge".into(),
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file.  Missing fields take their defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| BridgeError::Config(format!("{}: {e}", path.as_ref().display())))?;
        debug!("bridge config loaded");
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// The url a room is reported under in conference events.
    ///
    /// Query string and fragment of the server URL are dropped.
    pub fn conference_url(&self, room: &str) -> String {
        room_url(self.server_url.as_deref(), room)
    }
}

/// Join a room name onto a server URL, dropping its query and fragment.
pub fn room_url(server_url: Option<&str>, room: &str) -> String {
    match server_url {
        Some(base) => {
            let base = base.split(['?', '#']).next().unwrap_or_default();
            format!("{}/{}", base.trim_end_matches('/'), room)
        }
        None => room.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_is_the_url_without_server() {
        let config = BridgeConfig::default();
        assert_eq!(config.conference_url("test"), "test");
    }

    #[test]
    fn server_url_is_normalized() {
        let config = BridgeConfig {
            server_url: Some("https://meet.example.org/?lang=en#top".into()),
            ..Default::default()
        };
        assert_eq!(config.conference_url("test"), "https://meet.example.org/test");
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"server_url":"https://meet.example.org"}"#).expect("write");

        let config = BridgeConfig::load(&path).expect("load");
        assert_eq!(config.server_url.as_deref(), Some("https://meet.example.org"));
        assert!(config.report_routing_misses);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let config = BridgeConfig {
            report_routing_misses: false,
            log_filter: "confbridge=debug".into(),
            ..Default::default()
        };
        config.save(&path).expect("save");
        assert_eq!(BridgeConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn invalid_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").expect("write");
        assert!(matches!(BridgeConfig::load(&path), Err(BridgeError::Config(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = BridgeConfig::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }
}
