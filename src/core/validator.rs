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

//! Envelope structural and field-level validation (C3).
//!
//! Produces a typed [`Envelope`] or fails with [`ValidationError::InvalidFormat`].
//! Checks run in the order listed below; all must hold, but the order among
//! them is not load-bearing the way the admission pipeline's gate order is
//! (that ordering lives in `core::pipeline`).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use uuid::Uuid;

use super::security::keys::PublicKey;
use super::types::{Capabilities, Delegation, HashAlg, Integrity, RawEnvelope, RawPayload};

/// Validation failure. The `reason` is a short, sanitized message - never a
/// raw parser exception.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

fn invalid(reason: impl Into<String>) -> ValidationError {
    ValidationError(reason.into())
}

fn scope_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9\-]+$").expect("valid regex"))
}

fn hex64_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{64}$").expect("valid regex"))
}

/// A validated envelope. Owns its parsed forms (public keys, timestamps,
/// decoded nonce/signature) alongside the original wire strings needed to
/// reconstruct the canonical signing bytes.
#[derive(Clone, Debug)]
pub struct Envelope {
    /// Protocol version (always `"1"` once validated).
    pub version: String,
    /// Envelope id, parsed UUID and original wire string.
    pub envelope_id: Uuid,
    /// Original `envelope_id` wire string (used verbatim in canonical bytes
    /// and in receipts).
    pub envelope_id_raw: String,
    /// Sender public key.
    pub sender: PublicKey,
    /// Sender public key, lowercased hex (as used in canonical bytes).
    pub sender_hex: String,
    /// Recipient public key.
    pub recipient: PublicKey,
    /// Recipient public key, lowercased hex.
    pub recipient_hex: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Creation time, original wire string.
    pub timestamp_raw: String,
    /// Expiration time.
    pub expires_at: DateTime<Utc>,
    /// Expiration time, original wire string.
    pub expires_at_raw: String,
    /// Nonce, original wire string (base64), used as the replay-protection key.
    pub nonce: String,
    /// Decoded nonce bytes.
    pub nonce_bytes: Vec<u8>,
    /// Scope identifier.
    pub scope: String,
    /// Payload.
    pub payload: RawPayload,
    /// Decoded signature bytes.
    pub signature: Vec<u8>,
    /// Conversation id, if present.
    pub conversation_id: Option<String>,
    /// In-reply-to id, if present.
    pub in_reply_to: Option<String>,
    /// Delegation, if present.
    pub delegation: Option<Delegation>,
    /// Content-integrity hash, if present (advisory).
    pub integrity: Option<Integrity>,
    /// Capability declarations, if present (advisory).
    pub capabilities: Option<Capabilities>,
    /// Opaque provenance, if present (advisory).
    pub provenance: Option<serde_json::Value>,
    /// Opaque payment sub-object, if present (advisory).
    pub payment: Option<serde_json::Value>,
}

impl Envelope {
    /// True if `now` is at or past `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid(format!("invalid ISO-8601 timestamp: {raw}")))
}

fn validate_pubkey_field(name: &str, raw: &str) -> Result<(String, PublicKey), ValidationError> {
    if !hex64_regex().is_match(raw) {
        return Err(invalid(format!(
            "{name} must be 64 hexadecimal characters (32 bytes)"
        )));
    }
    let lower = raw.to_lowercase();
    let pk = PublicKey::from_hex(&lower).map_err(|_| invalid(format!("{name} is not a valid public key")))?;
    Ok((lower, pk))
}

/// Validate a raw, as-received envelope, producing a typed [`Envelope`].
pub fn validate(raw: RawEnvelope) -> Result<Envelope, ValidationError> {
    // `version`'s value is gated by the admission pipeline (step 2), not
    // here: a non-"1" version is still a structurally well-formed envelope.

    let envelope_id = Uuid::parse_str(&raw.envelope_id)
        .map_err(|_| invalid(format!("envelope_id must be a valid UUID: {}", raw.envelope_id)))?;

    let (sender_hex, sender) = validate_pubkey_field("sender", &raw.sender)?;
    let (recipient_hex, recipient) = validate_pubkey_field("recipient", &raw.recipient)?;

    let timestamp = parse_timestamp(&raw.timestamp)?;
    let expires_at = parse_timestamp(&raw.expires_at)?;
    if expires_at <= timestamp {
        return Err(invalid("expires_at must be after timestamp"));
    }

    let nonce_bytes = STANDARD
        .decode(&raw.nonce)
        .map_err(|_| invalid("invalid base64 nonce"))?;
    if nonce_bytes.len() < 16 {
        return Err(invalid(format!(
            "nonce must be at least 16 bytes: {} bytes",
            nonce_bytes.len()
        )));
    }

    let signature = STANDARD
        .decode(&raw.signature)
        .map_err(|_| invalid("invalid base64 signature"))?;

    if !scope_regex().is_match(&raw.scope) {
        return Err(invalid(format!(
            "scope must contain only alphanumeric characters and hyphens: {}",
            raw.scope
        )));
    }

    if raw.payload.prompt.trim().is_empty() {
        return Err(invalid("prompt cannot be empty or whitespace-only"));
    }
    if let Some(pt) = &raw.payload.payload_type {
        if !scope_regex().is_match(pt) {
            return Err(invalid(format!("payload_type has an invalid format: {pt}")));
        }
    }

    if let Some(conv) = &raw.conversation_id {
        Uuid::parse_str(conv).map_err(|_| invalid("conversation_id must be a valid UUID"))?;
    }
    if let Some(reply) = &raw.in_reply_to {
        Uuid::parse_str(reply).map_err(|_| invalid("in_reply_to must be a valid UUID"))?;
    }

    if let Some(delegation) = &raw.delegation {
        if !hex64_regex().is_match(&delegation.on_behalf_of) {
            return Err(invalid("delegation.on_behalf_of must be a 64-hex public key"));
        }
    }

    if let Some(integrity) = &raw.integrity {
        if !matches!(integrity.alg, HashAlg::Sha256 | HashAlg::Sha384 | HashAlg::Sha512) {
            return Err(invalid("integrity.alg is unsupported"));
        }
        let expected_len = match integrity.alg {
            HashAlg::Sha256 => 64,
            HashAlg::Sha384 => 96,
            HashAlg::Sha512 => 128,
        };
        let is_hex = integrity.hash.len() == expected_len
            && integrity.hash.chars().all(|c| c.is_ascii_hexdigit());
        if !is_hex {
            return Err(invalid("integrity.hash has an invalid format for its algorithm"));
        }
    }

    Ok(Envelope {
        version: raw.version,
        envelope_id,
        envelope_id_raw: raw.envelope_id,
        sender,
        sender_hex,
        recipient,
        recipient_hex,
        timestamp,
        timestamp_raw: raw.timestamp,
        expires_at,
        expires_at_raw: raw.expires_at,
        nonce: raw.nonce,
        nonce_bytes,
        scope: raw.scope,
        payload: raw.payload,
        signature,
        conversation_id: raw.conversation_id,
        in_reply_to: raw.in_reply_to,
        delegation: raw.delegation,
        integrity: raw.integrity,
        capabilities: raw.capabilities,
        provenance: raw.provenance,
        payment: raw.payment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RawPayload;
    use chrono::Duration;

    fn base_raw() -> RawEnvelope {
        let now = Utc::now();
        RawEnvelope {
            version: "1".into(),
            envelope_id: Uuid::new_v4().to_string(),
            sender: "a".repeat(64),
            recipient: "b".repeat(64),
            timestamp: now.to_rfc3339(),
            expires_at: (now + Duration::minutes(15)).to_rfc3339(),
            nonce: STANDARD.encode([7u8; 16]),
            scope: "test".into(),
            payload: RawPayload {
                prompt: "Hello".into(),
                context: None,
                metadata: None,
                payload_type: None,
            },
            signature: STANDARD.encode([1u8; 64]),
            conversation_id: None,
            in_reply_to: None,
            delegation: None,
            integrity: None,
            capabilities: None,
            provenance: None,
            payment: None,
        }
    }

    #[test]
    fn accepts_well_formed_envelope() {
        assert!(validate(base_raw()).is_ok());
    }

    #[test]
    fn rejects_equal_expires_and_timestamp() {
        let mut raw = base_raw();
        raw.expires_at = raw.timestamp.clone();
        assert!(validate(raw).is_err());
    }

    #[test]
    fn rejects_nonce_of_15_bytes() {
        let mut raw = base_raw();
        raw.nonce = STANDARD.encode([7u8; 15]);
        assert!(validate(raw).is_err());
    }

    #[test]
    fn accepts_nonce_of_16_bytes() {
        let mut raw = base_raw();
        raw.nonce = STANDARD.encode([7u8; 16]);
        assert!(validate(raw).is_ok());
    }

    #[test]
    fn rejects_scope_with_space() {
        let mut raw = base_raw();
        raw.scope = "not valid".into();
        assert!(validate(raw).is_err());
    }

    #[test]
    fn accepts_single_char_scope() {
        let mut raw = base_raw();
        raw.scope = "a".into();
        assert!(validate(raw).is_ok());
    }

    #[test]
    fn lowercases_mixed_case_hex_keys() {
        let mut raw = base_raw();
        raw.sender = "A".repeat(64);
        let env = validate(raw).unwrap();
        assert_eq!(env.sender_hex, "a".repeat(64));
    }

    #[test]
    fn rejects_empty_prompt() {
        let mut raw = base_raw();
        raw.payload.prompt = "   ".into();
        assert!(validate(raw).is_err());
    }
}
