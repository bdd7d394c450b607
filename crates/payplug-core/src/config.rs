// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What `StartAuthorization` does while an earlier session is unfinished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionConflictPolicy {
    /// Refuse the new session with a configuration error.
    #[default]
    Reject,
    /// Drop the unfinished session and start a new generation.
    Replace,
}

/// Persistent bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Geo location string sent with card token requests.
    pub geo_location: String,
    /// Policy for a second `StartAuthorization`.
    pub session_conflict_policy: SessionConflictPolicy,
    /// Query parameter that carries the redirect correlation id.
    pub correlation_param: String,
    /// How absent transaction fields are rendered.
    pub unknown_field_marker: String,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            geo_location: "UNKNOWN".into(),
            session_conflict_policy: SessionConflictPolicy::Reject,
            correlation_param: "payplug_ref".into(),
            unknown_field_marker: "nil".into(),
            log_filter: "info".into(),
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("payplug.json");
        std::fs::write(&path, r#"{"sessionConflictPolicy":"replace"}"#).expect("write");

        let config = BridgeConfig::load(&path).expect("load");
        assert_eq!(config.session_conflict_policy, SessionConflictPolicy::Replace);
        assert_eq!(config.geo_location, "UNKNOWN");
        assert_eq!(config.correlation_param, "payplug_ref");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("payplug.json");
        let config = BridgeConfig {
            geo_location: "25.03,121.56".into(),
            ..Default::default()
        };
        config.save(&path).expect("save");

        let loaded = BridgeConfig::load(&path).expect("load");
        assert_eq!(loaded.geo_location, "25.03,121.56");
        assert_eq!(loaded.session_conflict_policy, SessionConflictPolicy::Reject);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = BridgeConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, crate::BridgeError::Io(_)));
    }
}
