// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host configuration resolution.

use std::path::{Path, PathBuf};

use payplug_core::BridgeConfig;

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV: &str = "PAYPLUG_CONFIG";

/// Where the effective config came from. Reported once logging is up.
#[derive(Debug)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
    /// The file was named but could not be used; defaults apply.
    Unreadable { path: PathBuf, reason: String },
}

/// Config from `$PAYPLUG_CONFIG`, or defaults.
pub fn load() -> (BridgeConfig, ConfigSource) {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => load_from(Path::new(&path)),
        None => (BridgeConfig::default(), ConfigSource::Defaults),
    }
}

/// Config from `path`; a missing or malformed file falls back to defaults.
pub fn load_from(path: &Path) -> (BridgeConfig, ConfigSource) {
    match BridgeConfig::load(path) {
        Ok(config) => (config, ConfigSource::File(path.to_path_buf())),
        Err(e) => (
            BridgeConfig::default(),
            ConfigSource::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        ),
    }
}
