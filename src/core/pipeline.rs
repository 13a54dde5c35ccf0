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

//! The admission pipeline (C7): an ordered sequence of gates, each able to
//! halt the envelope with a stable rejection code.
//!
//! The order below is part of the wire contract, not an implementation
//! detail - do not reorder these steps. See `Inbox::admit`.

use chrono::Utc;
use uuid::Uuid;

use super::canonical::{canonical_bytes, CanonicalFields};
use super::policy::nonce_registry::NonceRegistry;
use super::policy::rate_limiter::RateLimiter;
use super::policy::trust_registry::TrustRegistry;
use super::receipt::{ErrorCode, Receipt};
use super::runtime::executor::Executor;
use super::security::keys::{self, PublicKey};
use super::types::RawEnvelope;
use super::validator::{self, Envelope};

/// An inbox: the admission pipeline bound to one identity, one set of
/// policy stores, and one executor.
pub struct Inbox {
    public_key: PublicKey,
    trust_registry: TrustRegistry,
    nonce_registry: NonceRegistry,
    rate_limiter: RateLimiter,
    executor: Box<dyn Executor>,
}

impl Inbox {
    /// Build an inbox bound to `public_key`.
    pub fn new(
        public_key: PublicKey,
        trust_registry: TrustRegistry,
        nonce_registry: NonceRegistry,
        rate_limiter: RateLimiter,
        executor: Box<dyn Executor>,
    ) -> Self {
        Self { public_key, trust_registry, nonce_registry, rate_limiter, executor }
    }

    /// This inbox's own public key.
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Read access to the trust registry, for admin operations outside the
    /// pipeline (e.g. an HTTP management endpoint).
    pub fn trust_registry(&self) -> &TrustRegistry {
        &self.trust_registry
    }

    /// Current nonce registry size, for metrics.
    pub fn nonce_registry_len(&self) -> usize {
        self.nonce_registry.len()
    }

    /// Current trust registry size, for metrics.
    pub fn trust_registry_len(&self) -> usize {
        self.trust_registry.len()
    }

    /// Run `raw_bytes` through the full admission pipeline, returning a
    /// receipt. Never panics on attacker-controlled input.
    pub fn admit(&self, raw_bytes: &[u8]) -> Receipt {
        let now = Utc::now();

        // Step 1: parse / structural validate.
        let raw: RawEnvelope = match serde_json::from_slice(raw_bytes) {
            Ok(raw) => raw,
            Err(e) => return Receipt::rejected("unknown", now.to_rfc3339(), ErrorCode::InvalidFormat, format!("malformed envelope: {e}")),
        };
        let envelope = match validator::validate(raw) {
            Ok(env) => env,
            Err(e) => return Receipt::rejected("unknown", now.to_rfc3339(), ErrorCode::InvalidFormat, e.0),
        };
        let envelope_id = envelope.envelope_id_raw.clone();

        // Step 2: version.
        if envelope.version != "1" {
            return self.reject(&envelope_id, now, ErrorCode::UnsupportedVersion, format!("unsupported version: {}", envelope.version));
        }

        // Step 3: recipient.
        if envelope.recipient != self.public_key {
            return self.reject(&envelope_id, now, ErrorCode::WrongRecipient, "recipient does not match this inbox");
        }

        // Step 4: freshness.
        if envelope.is_expired(now) {
            return self.reject(&envelope_id, now, ErrorCode::Expired, "envelope has expired");
        }

        // Step 5: signature.
        if !self.verify_signature(&envelope) {
            return self.reject(&envelope_id, now, ErrorCode::InvalidSignature, "signature verification failed");
        }

        // Step 6: replay (pre-check).
        if self.nonce_registry.has_seen(&envelope.nonce, now) {
            return self.reject(&envelope_id, now, ErrorCode::ReplayDetected, "nonce has already been used");
        }

        // Step 7: trust.
        let Some(entry) = self.trust_registry.get(&envelope.sender_hex) else {
            return self.reject(&envelope_id, now, ErrorCode::UntrustedSender, "sender is not a trusted sender");
        };

        // Step 8: scope.
        if !entry.policy.allows_scope(&envelope.scope) {
            return self.reject(&envelope_id, now, ErrorCode::PolicyDenied, format!("scope '{}' is not permitted for this sender", envelope.scope));
        }

        // Step 9: size, measured on the bytes as received.
        if !entry.policy.allows_size(raw_bytes.len() as u64) {
            return self.reject(
                &envelope_id,
                now,
                ErrorCode::SizeExceeded,
                format!("envelope of {} bytes exceeds the {} byte limit", raw_bytes.len(), entry.policy.max_envelope_size),
            );
        }

        // Step 10: rate.
        if let Err(e) = self.rate_limiter.check_and_record(
            &envelope.sender_hex,
            entry.policy.rate_limit.max_per_hour,
            entry.policy.rate_limit.max_per_day,
            now,
        ) {
            return self.reject(&envelope_id, now, ErrorCode::RateLimited, e.0);
        }

        // Step 11: commit nonce. Races with another admission of the same
        // nonce collapse to the same rejection code as step 6.
        if self.nonce_registry.add(&envelope.nonce, envelope.expires_at, now).is_err() {
            return self.reject(&envelope_id, now, ErrorCode::ReplayDetected, "nonce has already been used");
        }

        // Step 12: execute.
        let result = self.executor.execute(&envelope);
        if !result.success {
            tracing::warn!(
                envelope_id = %envelope_id,
                executor = %result.executor_name,
                error = result.error_message.as_deref().unwrap_or("unknown"),
                "executor failed; envelope remains accepted"
            );
        }

        Receipt::Accepted {
            envelope_id,
            received_at: now.to_rfc3339(),
            receipt_id: Uuid::new_v4().to_string(),
            executor: result.executor_name,
        }
    }

    fn reject(&self, envelope_id: &str, now: chrono::DateTime<Utc>, code: ErrorCode, message: impl Into<String>) -> Receipt {
        Receipt::rejected(envelope_id, now.to_rfc3339(), code, message)
    }

    fn verify_signature(&self, envelope: &Envelope) -> bool {
        let delegation_value = envelope.delegation.as_ref().map(|d| serde_json::to_value(d).expect("delegation serializes"));
        let payload_value = serde_json::to_value(&envelope.payload).expect("payload serializes");

        let fields = CanonicalFields {
            version: &envelope.version,
            envelope_id: &envelope.envelope_id_raw,
            sender: &envelope.sender_hex,
            recipient: &envelope.recipient_hex,
            timestamp: &envelope.timestamp_raw,
            expires_at: &envelope.expires_at_raw,
            nonce: &envelope.nonce,
            scope: &envelope.scope,
            conversation_id: envelope.conversation_id.as_deref(),
            in_reply_to: envelope.in_reply_to.as_deref(),
            delegation: delegation_value.as_ref(),
            payload: &payload_value,
        };
        let bytes = canonical_bytes(&fields);
        keys::verify(&envelope.sender, &bytes, &envelope.signature)
    }
}
