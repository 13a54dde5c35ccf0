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

//! Trust registry (C4): persistent mapping of sender identity to policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

use crate::core::security::keystore::atomic_write_private;

const REGISTRY_VERSION: &str = "1";
const DEFAULT_MAX_ENVELOPE_SIZE: u64 = 10 * 1024 * 1024;

/// Rate limiting configuration for one sender. `None` means unlimited.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RateLimit {
    /// Maximum accepted envelopes in any rolling hour.
    #[serde(default)]
    pub max_per_hour: Option<u64>,
    /// Maximum accepted envelopes in any rolling day.
    #[serde(default)]
    pub max_per_day: Option<u64>,
}

/// Policy attached to a trusted sender.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SenderPolicy {
    /// Allowed scopes; `"*"` is a wildcard matching any scope.
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
    /// Maximum accepted envelope size, in bytes, as received.
    #[serde(default = "default_max_envelope_size")]
    pub max_envelope_size: u64,
    /// Rate limit caps.
    #[serde(default)]
    pub rate_limit: RateLimit,
}

fn default_max_envelope_size() -> u64 {
    DEFAULT_MAX_ENVELOPE_SIZE
}

impl Default for SenderPolicy {
    fn default() -> Self {
        Self {
            allowed_scopes: Vec::new(),
            max_envelope_size: DEFAULT_MAX_ENVELOPE_SIZE,
            rate_limit: RateLimit::default(),
        }
    }
}

impl SenderPolicy {
    /// True if `scope` is permitted by this policy.
    pub fn allows_scope(&self, scope: &str) -> bool {
        self.allowed_scopes.iter().any(|s| s == "*" || s == scope)
    }

    /// True if a size of `size_bytes` is permitted by this policy.
    pub fn allows_size(&self, size_bytes: u64) -> bool {
        size_bytes <= self.max_envelope_size
    }
}

/// One entry in the trust registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrustEntry {
    /// Sender's public key, lowercase hex.
    pub public_key: String,
    /// Human-readable label.
    pub name: String,
    /// When trust was added, ISO-8601 UTC.
    pub added_at: String,
    /// Policy governing this sender.
    #[serde(default)]
    pub policy: SenderPolicy,
}

/// Trust registry errors.
#[derive(Debug, Error)]
pub enum TrustRegistryError {
    /// `add` called for a key that is already present.
    #[error("sender already trusted")]
    AlreadyPresent,
    /// `remove` called for a key that is not present.
    #[error("sender not trusted")]
    NotFound,
    /// Filesystem I/O failure.
    #[error("io")]
    Io,
    /// Malformed persisted registry.
    #[error("parse")]
    Parse,
    /// Registry file declares an unsupported version.
    #[error("unsupported trust registry version")]
    UnsupportedVersion,
}

#[derive(Serialize, Deserialize)]
struct RegistryFile {
    version: String,
    senders: Vec<TrustEntry>,
}

/// In-memory, optionally file-backed trust registry.
pub struct TrustRegistry {
    path: Option<PathBuf>,
    entries: RwLock<BTreeMap<String, TrustEntry>>,
}

impl TrustRegistry {
    /// A fresh, empty, in-memory-only registry.
    pub fn new() -> Self {
        Self { path: None, entries: RwLock::new(BTreeMap::new()) }
    }

    /// Load a registry from `path`, or start empty if the file does not
    /// exist yet. Subsequent `add`/`remove` calls persist to `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrustRegistryError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(Self { path: Some(path), entries: RwLock::new(BTreeMap::new()) });
        }

        let raw = fs::read_to_string(&path).map_err(|_| TrustRegistryError::Io)?;
        let file: RegistryFile = serde_json::from_str(&raw).map_err(|_| TrustRegistryError::Parse)?;
        if file.version != REGISTRY_VERSION {
            return Err(TrustRegistryError::UnsupportedVersion);
        }

        let mut entries = BTreeMap::new();
        for entry in file.senders {
            entries.insert(entry.public_key.to_lowercase(), entry);
        }
        Ok(Self { path: Some(path), entries: RwLock::new(entries) })
    }

    /// Persist the registry to its configured path, atomically and with
    /// owner-only permissions. No-op for an in-memory-only registry.
    pub fn save(&self) -> Result<(), TrustRegistryError> {
        let Some(path) = &self.path else { return Ok(()) };
        let entries = self.entries.read().expect("lock poisoned");
        let file = RegistryFile {
            version: REGISTRY_VERSION.to_string(),
            senders: entries.values().cloned().collect(),
        };
        let json = serde_json::to_vec_pretty(&file).map_err(|_| TrustRegistryError::Parse)?;
        atomic_write_private(path, &json).map_err(|_| TrustRegistryError::Io)
    }

    /// Add a new trusted sender.
    pub fn add(&self, public_key: &str, name: &str, policy: SenderPolicy) -> Result<TrustEntry, TrustRegistryError> {
        let key = public_key.to_lowercase();
        {
            let mut entries = self.entries.write().expect("lock poisoned");
            if entries.contains_key(&key) {
                return Err(TrustRegistryError::AlreadyPresent);
            }
            let entry = TrustEntry {
                public_key: key.clone(),
                name: name.to_string(),
                added_at: chrono::Utc::now().to_rfc3339(),
                policy,
            };
            entries.insert(key, entry.clone());
            drop(entries);
            self.save()?;
            return Ok(entry);
        }
    }

    /// Remove a trusted sender.
    pub fn remove(&self, public_key: &str) -> Result<(), TrustRegistryError> {
        let key = public_key.to_lowercase();
        {
            let mut entries = self.entries.write().expect("lock poisoned");
            if entries.remove(&key).is_none() {
                return Err(TrustRegistryError::NotFound);
            }
        }
        self.save()
    }

    /// Look up a sender's trust entry.
    pub fn get(&self, public_key: &str) -> Option<TrustEntry> {
        let key = public_key.to_lowercase();
        self.entries.read().expect("lock poisoned").get(&key).cloned()
    }

    /// True if `public_key` is trusted.
    pub fn is_trusted(&self, public_key: &str) -> bool {
        self.get(public_key).is_some()
    }

    /// List all trusted senders.
    pub fn list(&self) -> Vec<TrustEntry> {
        self.entries.read().expect("lock poisoned").values().cloned().collect()
    }

    /// Number of trusted senders.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// True if there are no trusted senders.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TrustRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_get_round_trips() {
        let reg = TrustRegistry::new();
        let policy = SenderPolicy { allowed_scopes: vec!["*".into()], ..Default::default() };
        reg.add("ABCD", "alice", policy).unwrap();
        assert!(reg.is_trusted("abcd"));
        assert_eq!(reg.get("abcd").unwrap().name, "alice");
    }

    #[test]
    fn add_twice_fails_already_present() {
        let reg = TrustRegistry::new();
        reg.add("abcd", "alice", SenderPolicy::default()).unwrap();
        assert!(matches!(
            reg.add("abcd", "alice again", SenderPolicy::default()),
            Err(TrustRegistryError::AlreadyPresent)
        ));
    }

    #[test]
    fn remove_missing_fails_not_found() {
        let reg = TrustRegistry::new();
        assert!(matches!(reg.remove("abcd"), Err(TrustRegistryError::NotFound)));
    }

    #[test]
    fn persists_and_reloads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trust_registry.json");

        let reg = TrustRegistry::load(&path).unwrap();
        let policy = SenderPolicy { allowed_scopes: vec!["test".into()], max_envelope_size: 1024, ..Default::default() };
        reg.add("abcd", "alice", policy).unwrap();

        let reloaded = TrustRegistry::load(&path).unwrap();
        let entry = reloaded.get("abcd").unwrap();
        assert_eq!(entry.name, "alice");
        assert_eq!(entry.policy.max_envelope_size, 1024);
    }

    #[test]
    fn wildcard_scope_allows_anything() {
        let policy = SenderPolicy { allowed_scopes: vec!["*".into()], ..Default::default() };
        assert!(policy.allows_scope("anything"));
    }
}
