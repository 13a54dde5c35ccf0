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

#![forbid(unsafe_code)]

//! File-backed inbox identity: load or create the inbox's own Ed25519 key
//! pair, writing a PEM private key and a plain hex public key file.
//!
//! If `EPP_KEY_PASSPHRASE` is set, the private key file is encrypted at
//! rest (see `core::security::keys`).

use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use super::keys::{KeyError, KeyPair, PublicKey};

/// Keystore errors.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// Filesystem I/O failure.
    #[error("io")]
    Io,
    /// Key material error.
    #[error("key: {0}")]
    Key(#[from] KeyError),
}

fn env_passphrase() -> Option<String> {
    std::env::var("EPP_KEY_PASSPHRASE")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

fn set_private_perms_best_effort(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
}

/// Write bytes to `path` atomically (write-temp, fsync, rename), then
/// restrict permissions to owner-only where supported.
pub fn atomic_write_private(path: &Path, bytes: &[u8]) -> Result<(), KeystoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|_| KeystoreError::Io)?;
    }

    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");

    {
        let mut f = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)
            .map_err(|_| KeystoreError::Io)?;
        f.write_all(bytes).map_err(|_| KeystoreError::Io)?;
        let _ = f.sync_all();
    }

    set_private_perms_best_effort(&tmp);
    fs::rename(&tmp, path).map_err(|_| KeystoreError::Io)?;
    set_private_perms_best_effort(path);
    Ok(())
}

/// Load the inbox's key pair from `private_key_path`/`public_key_path`,
/// generating and persisting a new one if `private_key_path` is absent.
pub fn load_or_create(private_key_path: &Path, public_key_path: &Path) -> Result<KeyPair, KeystoreError> {
    let passphrase = env_passphrase();
    let pass_bytes = passphrase.as_deref().map(str::as_bytes);

    if private_key_path.exists() {
        let pem = fs::read_to_string(private_key_path).map_err(|_| KeystoreError::Io)?;
        let kp = KeyPair::from_private_pem(&pem, pass_bytes)?;
        return Ok(kp);
    }

    let kp = KeyPair::generate()?;
    let pem = kp.private_key_pem(pass_bytes)?;
    atomic_write_private(private_key_path, pem.as_bytes())?;
    fs::write(public_key_path, kp.public_key().to_hex()).map_err(|_| KeystoreError::Io)?;
    Ok(kp)
}

/// Load a public key from a plain hex file (as written alongside a private
/// key by [`load_or_create`]).
pub fn load_public_key(public_key_path: &Path) -> Result<PublicKey, KeystoreError> {
    let hex = fs::read_to_string(public_key_path).map_err(|_| KeystoreError::Io)?;
    Ok(PublicKey::from_hex(hex.trim())?)
}
