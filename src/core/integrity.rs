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

//! Content-integrity hashing over a payload (C13, advisory).
//!
//! `compute_payload_hash` hashes the same canonical-JSON encoding used to
//! build the signing preimage (`core::canonical::canonical_json_string`), so
//! a hash computed here matches one computed by any other conformant
//! implementation regardless of the payload's original key order. Integrity
//! is never consulted by the admission pipeline - see `core::validator`,
//! which only checks its wire format.

use serde_json::Value;
use sha2::{Digest, Sha256, Sha384, Sha512};

use super::canonical::canonical_json_string;
use super::types::{HashAlg, Integrity};

/// Hash `payload`'s canonical-JSON encoding with `alg`, returning lowercase
/// hex.
pub fn compute_payload_hash(payload: &Value, alg: HashAlg) -> String {
    let bytes = canonical_json_string(payload).into_bytes();
    match alg {
        HashAlg::Sha256 => hex::encode(Sha256::digest(&bytes)),
        HashAlg::Sha384 => hex::encode(Sha384::digest(&bytes)),
        HashAlg::Sha512 => hex::encode(Sha512::digest(&bytes)),
    }
}

/// Build an `Integrity` declaration for `payload`.
pub fn create_integrity(payload: &Value, alg: HashAlg) -> Integrity {
    Integrity { alg, hash: compute_payload_hash(payload, alg) }
}

/// True if `integrity.hash` matches `payload`'s hash under `integrity.alg`.
pub fn verify_integrity(payload: &Value, integrity: &Integrity) -> bool {
    compute_payload_hash(payload, integrity.alg) == integrity.hash.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_then_verify_round_trips() {
        let payload = json!({"prompt": "hello", "context": {"b": 1, "a": 2}});
        let integrity = create_integrity(&payload, HashAlg::Sha256);
        assert!(verify_integrity(&payload, &integrity));
    }

    #[test]
    fn hash_is_independent_of_key_order() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(compute_payload_hash(&a, HashAlg::Sha256), compute_payload_hash(&b, HashAlg::Sha256));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let payload = json!({"prompt": "hello"});
        let integrity = create_integrity(&payload, HashAlg::Sha256);
        let tampered = json!({"prompt": "goodbye"});
        assert!(!verify_integrity(&tampered, &integrity));
    }

    #[test]
    fn algorithms_produce_the_expected_digest_length() {
        let payload = json!({"prompt": "hi"});
        assert_eq!(compute_payload_hash(&payload, HashAlg::Sha256).len(), 64);
        assert_eq!(compute_payload_hash(&payload, HashAlg::Sha384).len(), 96);
        assert_eq!(compute_payload_hash(&payload, HashAlg::Sha512).len(), 128);
    }
}
