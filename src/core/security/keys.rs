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

//! Ed25519 key primitives (C1).
//!
//! Private keys are held as ring PKCS#8 documents; ring's Ed25519 v1
//! document is a fixed 16-byte DER prefix followed by the 32-byte raw seed,
//! which lets `private_key_bytes`/`from_private_bytes` round-trip the raw
//! form without an ASN.1 dependency.
//!
//! ## Key-at-rest encryption
//! PEM export optionally encrypts the PKCS#8 bytes the same way
//! `core::security::keystore` encrypts validator keys:
//! `MAGIC(8) || SALT(16) || NONCE(12) || CIPHERTEXT+TAG`, AES-256-GCM with a
//! PBKDF2-HMAC-SHA256-derived key. The blob is then PEM-wrapped under a
//! distinct header so a reader can tell encrypted and plain PEMs apart.

use ring::{
    aead,
    pbkdf2,
    rand::{SecureRandom, SystemRandom},
    signature::{Ed25519KeyPair, KeyPair as _},
};
use std::num::NonZeroU32;
use thiserror::Error;
use zeroize::Zeroize;

/// Key primitive errors.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Key material is malformed or the wrong length.
    #[error("bad key encoding")]
    BadKeyEncoding,
    /// PKCS#8 document rejected by the crypto backend.
    #[error("invalid key")]
    InvalidKey,
    /// An AEAD/KDF operation failed (bad passphrase or corrupt blob).
    #[error("crypto")]
    Crypto,
    /// PEM blob is encrypted but no passphrase was given.
    #[error("missing passphrase")]
    MissingPassphrase,
    /// Malformed PEM envelope.
    #[error("malformed pem")]
    MalformedPem,
}

/// Fixed 16-byte DER prefix for an Ed25519 PKCS#8 v1 document (version,
/// AlgorithmIdentifier for OID 1.3.101.112, and the OCTET STRING tag/length
/// for the 32-byte seed that follows).
const PKCS8_ED25519_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

const KEY_FILE_MAGIC: &[u8] = b"EPPKEY01";
const KEY_SALT_LEN: usize = 16;
const KEY_NONCE_LEN: usize = 12;
const PBKDF2_ITERS: u32 = 100_000;

/// An Ed25519 public key. Equality and hashing are over raw bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    /// Wrap raw public key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse raw public key bytes from a slice of any length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != 32 {
            return Err(KeyError::BadKeyEncoding);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// Parse a 64-character lowercase-or-mixed-case hex public key.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::BadKeyEncoding)?;
        Self::from_slice(&bytes)
    }

    /// Raw 32-byte encoding.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Lowercase 64-character hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// An Ed25519 key pair.
pub struct KeyPair {
    inner: Ed25519KeyPair,
    pkcs8: Vec<u8>,
    public: PublicKey,
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.pkcs8.zeroize();
    }
}

impl KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Result<Self, KeyError> {
        let rng = SystemRandom::new();
        let doc = Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| KeyError::Crypto)?;
        Self::from_pkcs8(doc.as_ref())
    }

    /// Load a key pair from a ring-format PKCS#8 document.
    pub fn from_pkcs8(bytes: &[u8]) -> Result<Self, KeyError> {
        let inner = Ed25519KeyPair::from_pkcs8(bytes).map_err(|_| KeyError::InvalidKey)?;
        let public = PublicKey::from_slice(inner.public_key().as_ref())?;
        Ok(Self { inner, pkcs8: bytes.to_vec(), public })
    }

    /// Load a key pair from a raw 32-byte private seed.
    pub fn from_private_bytes(seed: &[u8]) -> Result<Self, KeyError> {
        if seed.len() != 32 {
            return Err(KeyError::BadKeyEncoding);
        }
        let mut doc = Vec::with_capacity(48);
        doc.extend_from_slice(&PKCS8_ED25519_PREFIX);
        doc.extend_from_slice(seed);
        Self::from_pkcs8(&doc)
    }

    /// Raw 32-byte private seed.
    pub fn private_key_bytes(&self) -> &[u8] {
        &self.pkcs8[16..48]
    }

    /// This key pair's public key.
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Sign a message, returning the raw 64-byte Ed25519 signature.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.inner.sign(msg).as_ref().to_vec()
    }

    /// Export the private key as PEM, optionally encrypted with a passphrase.
    pub fn private_key_pem(&self, passphrase: Option<&[u8]>) -> Result<String, KeyError> {
        match passphrase {
            None => Ok(pem_encode(PEM_HEADER_PLAIN, &self.pkcs8)),
            Some(pass) => {
                let blob = encrypt_pkcs8(pass, &self.pkcs8)?;
                Ok(pem_encode(PEM_HEADER_ENCRYPTED, &blob))
            }
        }
    }

    /// Load a key pair from a PEM blob produced by [`KeyPair::private_key_pem`].
    pub fn from_private_pem(pem: &str, passphrase: Option<&[u8]>) -> Result<Self, KeyError> {
        let (header, bytes) = pem_decode(pem)?;
        let pkcs8 = match header.as_str() {
            PEM_HEADER_PLAIN => bytes,
            PEM_HEADER_ENCRYPTED => {
                let pass = passphrase.ok_or(KeyError::MissingPassphrase)?;
                decrypt_pkcs8(pass, &bytes)?
            }
            _ => return Err(KeyError::MalformedPem),
        };
        Self::from_pkcs8(&pkcs8)
    }
}

/// Verify an Ed25519 signature given raw public key bytes.
pub fn verify(public: &PublicKey, msg: &[u8], signature: &[u8]) -> bool {
    if signature.len() != 64 {
        return false;
    }
    let pk = ring::signature::UnparsedPublicKey::new(&ring::signature::ED25519, &public.0);
    pk.verify(msg, signature).is_ok()
}

const PEM_HEADER_PLAIN: &str = "EPP PRIVATE KEY";
const PEM_HEADER_ENCRYPTED: &str = "EPP ENCRYPTED PRIVATE KEY";

fn pem_encode(header: &str, bytes: &[u8]) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    let b64 = STANDARD.encode(bytes);
    let mut out = format!("-----BEGIN {header}-----\n");
    for chunk in b64.as_bytes().chunks(64) {
        out.push_str(std::str::from_utf8(chunk).unwrap());
        out.push('\n');
    }
    out.push_str(&format!("-----END {header}-----\n"));
    out
}

fn pem_decode(pem: &str) -> Result<(String, Vec<u8>), KeyError> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    let pem = pem.trim();
    let begin = "-----BEGIN ";
    let first_line = pem.lines().next().ok_or(KeyError::MalformedPem)?;
    if !first_line.starts_with(begin) || !first_line.ends_with("-----") {
        return Err(KeyError::MalformedPem);
    }
    let header = first_line
        .trim_start_matches(begin)
        .trim_end_matches("-----")
        .to_string();
    let mut body = String::new();
    for line in pem.lines().skip(1) {
        if line.starts_with("-----END ") {
            break;
        }
        body.push_str(line.trim());
    }
    let bytes = STANDARD.decode(body).map_err(|_| KeyError::MalformedPem)?;
    Ok((header, bytes))
}

fn derive_key(passphrase: &[u8], salt: &[u8; KEY_SALT_LEN]) -> [u8; 32] {
    let mut out = [0u8; 32];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(PBKDF2_ITERS).expect("nonzero"),
        salt,
        passphrase,
        &mut out,
    );
    out
}

fn encrypt_pkcs8(passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, KeyError> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; KEY_SALT_LEN];
    rng.fill(&mut salt).map_err(|_| KeyError::Crypto)?;
    let mut nonce_bytes = [0u8; KEY_NONCE_LEN];
    rng.fill(&mut nonce_bytes).map_err(|_| KeyError::Crypto)?;
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let mut key = derive_key(passphrase, &salt);
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, &key).map_err(|_| KeyError::Crypto)?;
    let less_safe = aead::LessSafeKey::new(unbound);

    let mut in_out = plaintext.to_vec();
    less_safe
        .seal_in_place_append_tag(nonce, aead::Aad::empty(), &mut in_out)
        .map_err(|_| KeyError::Crypto)?;
    key.zeroize();

    let mut out = Vec::with_capacity(KEY_FILE_MAGIC.len() + KEY_SALT_LEN + KEY_NONCE_LEN + in_out.len());
    out.extend_from_slice(KEY_FILE_MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&in_out);
    Ok(out)
}

fn decrypt_pkcs8(passphrase: &[u8], bytes: &[u8]) -> Result<Vec<u8>, KeyError> {
    let header_len = KEY_FILE_MAGIC.len() + KEY_SALT_LEN + KEY_NONCE_LEN;
    if bytes.len() < header_len + 16 || &bytes[..KEY_FILE_MAGIC.len()] != KEY_FILE_MAGIC {
        return Err(KeyError::MalformedPem);
    }

    let mut salt = [0u8; KEY_SALT_LEN];
    salt.copy_from_slice(&bytes[KEY_FILE_MAGIC.len()..KEY_FILE_MAGIC.len() + KEY_SALT_LEN]);
    let mut nonce_bytes = [0u8; KEY_NONCE_LEN];
    nonce_bytes.copy_from_slice(&bytes[KEY_FILE_MAGIC.len() + KEY_SALT_LEN..header_len]);
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let mut key = derive_key(passphrase, &salt);
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, &key).map_err(|_| KeyError::Crypto)?;
    let less_safe = aead::LessSafeKey::new(unbound);

    let mut in_out = bytes[header_len..].to_vec();
    let plain = less_safe
        .open_in_place(nonce, aead::Aad::empty(), &mut in_out)
        .map_err(|_| KeyError::Crypto)?;
    key.zeroize();
    Ok(plain.to_vec())
}
