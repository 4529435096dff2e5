// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration, read from a YAML settings file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NativePrinterError, Result};

/// Settings file read when no path is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Top-level settings.  Every section and field has a default, so a missing
/// or partial file still yields a usable configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub websocket: WebSocketConfig,
    pub log: LogConfig,
    pub print: PrintConfig,
}

/// WebSocket listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// TCP port the server listens on (default 8080).
    pub port: u16,
    /// Accept connections from any origin.  When false, only pages served
    /// from `localhost` / `127.0.0.1` on `port` may connect.
    pub enable_cors: bool,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            enable_cors: false,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum severity (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Directory holding the rotated log files.
    pub folder: PathBuf,
    /// Number of rotated files kept before the oldest is deleted.
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            folder: PathBuf::from("logs"),
            max_files: 30,
        }
    }
}

/// Print pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Scratch directory for downloaded documents.
    pub temp_dir: PathBuf,
    /// Connect timeout for document downloads, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("./temp"),
            connect_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load settings from `path`.
    ///
    /// A missing file is not an error: the defaults are returned.  A file
    /// that exists but cannot be read or parsed yields `Config`, and the
    /// caller decides whether to fall back.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            NativePrinterError::Config(format!("read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw)
            .map_err(|e| NativePrinterError::Config(format!("parse {}: {e}", path.display())))
    }

    /// Parse settings from YAML text.  An empty document yields the defaults.
    pub fn from_yaml(raw: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.websocket.port, 8080);
        assert!(!config.websocket.enable_cors);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.folder, PathBuf::from("logs"));
        assert_eq!(config.print.temp_dir, PathBuf::from("./temp"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = AppConfig::from_yaml("websocket:\n  port: 9100\nlog:\n  level: debug\n").unwrap();
        assert_eq!(config.websocket.port, 9100);
        assert!(!config.websocket.enable_cors);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.folder, PathBuf::from("logs"));
        assert_eq!(config.print, PrintConfig::default());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "websocket: [unterminated").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, NativePrinterError::Config(_)));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }
}
