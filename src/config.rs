// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Inbox configuration (C11): TOML on disk, serde in memory.
//!
//! An absent config file is not an error - [`InboxConfig::load_or_create`]
//! writes the defaults to disk on first run and returns them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem I/O failure.
    #[error("io")]
    Io,
    /// Malformed TOML.
    #[error("parse: {0}")]
    Parse(#[from] toml::de::Error),
    /// Config could not be serialized back to TOML.
    #[error("serialize: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// HTTP adapter bind settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InboxSection {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for InboxSection {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080 }
    }
}

/// Inbox identity key file locations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeysSection {
    /// Private key PEM path.
    pub private_key_path: String,
    /// Public key hex path.
    pub public_key_path: String,
}

impl Default for KeysSection {
    fn default() -> Self {
        Self { private_key_path: "./data/inbox.key".into(), public_key_path: "./data/inbox.pub".into() }
    }
}

/// Persisted-state paths.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageSection {
    /// Trust registry JSON path.
    pub trust_registry_path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self { trust_registry_path: "./data/trust_registry.json".into() }
    }
}

/// Which executor to wire up, and its parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutorSection {
    /// One of `noop`, `file_queue`, `logger`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `file_queue` queue directory.
    #[serde(default)]
    pub queue_dir: Option<String>,
    /// `logger` log file path.
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self { kind: "noop".into(), queue_dir: None, log_file: None }
    }
}

/// Top-level inbox configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InboxConfig {
    /// `[inbox]`.
    #[serde(default)]
    pub inbox: InboxSection,
    /// `[keys]`.
    #[serde(default)]
    pub keys: KeysSection,
    /// `[storage]`.
    #[serde(default)]
    pub storage: StorageSection,
    /// `[executor]`.
    #[serde(default)]
    pub executor: ExecutorSection,
}

impl InboxConfig {
    /// Load config from `path`, or write and return the defaults if `path`
    /// does not exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            let defaults = Self::default();
            defaults.save(path)?;
            return Ok(defaults);
        }
        let raw = fs::read_to_string(path).map_err(|_| ConfigError::Io)?;
        let config: Self = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Write this config to `path` as TOML, creating parent directories as
    /// needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::Io)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str).map_err(|_| ConfigError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.toml");
        let config = InboxConfig::load_or_create(&path).unwrap();
        assert_eq!(config.inbox.port, 8080);
        assert!(path.exists());
    }

    #[test]
    fn existing_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.toml");
        let mut config = InboxConfig::default();
        config.inbox.port = 9999;
        config.executor.kind = "file_queue".into();
        config.save(&path).unwrap();

        let reloaded = InboxConfig::load_or_create(&path).unwrap();
        assert_eq!(reloaded.inbox.port, 9999);
        assert_eq!(reloaded.executor.kind, "file_queue");
    }
}
