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

//! Standalone key generation CLI: writes a fresh Ed25519 key pair to the
//! paths `EPP_CONFIG_PATH` points at, or to `./data/inbox.{key,pub}` by
//! default. Honors `EPP_KEY_PASSPHRASE` the same way the inbox server does.

use anyhow::{Context, Result};

use epp_inbox::core::security::keystore;

fn env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    let private_key_path = env("EPP_PRIVATE_KEY_PATH", "./data/inbox.key");
    let public_key_path = env("EPP_PUBLIC_KEY_PATH", "./data/inbox.pub");

    if std::path::Path::new(&private_key_path).exists() {
        anyhow::bail!("{private_key_path} already exists; refusing to overwrite");
    }

    let keys = keystore::load_or_create(private_key_path.as_ref(), public_key_path.as_ref())
        .context("failed to generate key pair")?;

    println!("generated inbox key pair");
    println!("  private key: {private_key_path}");
    println!("  public key:  {public_key_path}");
    println!("  public key (hex): {}", keys.public_key().to_hex());

    Ok(())
}
