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

//! Wire data model for EPP envelopes.
//!
//! `RawEnvelope` is the permissive, serde-deserialized shape of the JSON body
//! as received. Unknown top-level fields are ignored (not rejected) per the
//! validator's "strict known-fields" policy: `RawEnvelope` deliberately does
//! not set `deny_unknown_fields`, and the canonical byte builder only ever
//! reads the named fields, so extra fields can neither change the signature
//! nor break parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload carried by an envelope.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawPayload {
    /// The prompt text to be delivered.
    pub prompt: String,
    /// Structured context data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Additional metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Free-form payload type tag, matching the scope charset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_type: Option<String>,
}

/// Acting-on-behalf-of delegation. Signed, non-malleable, advisory to the
/// executor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Delegation {
    /// Public key (hex) of the party this sender claims to act on behalf of.
    pub on_behalf_of: String,
    /// Free-form authorization evidence (e.g. a prior grant reference).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
}

/// Hash algorithm used by an [`Integrity`] declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlg {
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

/// Content-integrity hash over the canonical payload JSON. Advisory: present
/// in the signing preimage if the sender includes it, but never consulted by
/// the admission pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Integrity {
    /// Hash algorithm.
    pub alg: HashAlg,
    /// Lowercase-hex digest of the canonical payload.
    pub hash: String,
}

/// Filesystem capability declarations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilesystemCapabilities {
    /// Paths or globs the sender declares it may read.
    #[serde(default)]
    pub read: Vec<String>,
    /// Paths or globs the sender declares it may write.
    #[serde(default)]
    pub write: Vec<String>,
}

/// Network capability declarations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NetworkCapabilities {
    /// Domains the sender declares it may contact.
    #[serde(default)]
    pub domains: Vec<String>,
    /// Protocols (e.g. "https", "ws").
    #[serde(default)]
    pub protocols: Vec<String>,
    /// Ports.
    #[serde(default)]
    pub ports: Vec<u16>,
}

/// Capability declarations a sender requests. Advisory: carried in the
/// signing preimage but never authoritative for admission (§9); an executor
/// may consult these to bound what it is willing to do on the sender's
/// behalf.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Filesystem access requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemCapabilities>,
    /// Network access requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkCapabilities>,
    /// Named actions requested.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Named data-access scopes requested.
    #[serde(default)]
    pub data_access: Vec<String>,
    /// Opaque, implementation-defined extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,
}

impl Capabilities {
    /// True if no capability was declared at all.
    pub fn is_empty(&self) -> bool {
        self.filesystem.is_none()
            && self.network.is_none()
            && self.actions.is_empty()
            && self.data_access.is_empty()
            && self.custom.is_none()
    }

    /// True if any filesystem read/write access is requested.
    pub fn requires_filesystem(&self) -> bool {
        self.filesystem.as_ref().is_some_and(|fs| !fs.read.is_empty() || !fs.write.is_empty())
    }

    /// True if any network domain or protocol access is requested.
    pub fn requires_network(&self) -> bool {
        self.network.as_ref().is_some_and(|net| !net.domains.is_empty() || !net.protocols.is_empty())
    }
}

/// The as-received envelope, permissively deserialized. Unknown top-level
/// fields are ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEnvelope {
    /// Protocol version, must be `"1"`.
    pub version: String,
    /// Unique envelope identifier (UUID, textual).
    pub envelope_id: String,
    /// Sender's public key (hex).
    pub sender: String,
    /// Recipient's public key (hex).
    pub recipient: String,
    /// Creation time, ISO-8601 UTC.
    pub timestamp: String,
    /// Expiration time, ISO-8601 UTC.
    pub expires_at: String,
    /// Random nonce, base64.
    pub nonce: String,
    /// Scope identifier for policy matching.
    pub scope: String,
    /// Envelope payload.
    pub payload: RawPayload,
    /// Cryptographic signature, base64.
    pub signature: String,
    /// Conversation thread id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// envelope_id being replied to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    /// Acting-on-behalf-of delegation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation: Option<Delegation>,
    /// Content-integrity hash (advisory, non-authoritative).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<Integrity>,
    /// Capability declarations (advisory, non-authoritative).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
    /// Opaque provenance chain (advisory, non-authoritative).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Value>,
    /// Opaque payment request/proof (advisory, non-authoritative).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Value>,
}
