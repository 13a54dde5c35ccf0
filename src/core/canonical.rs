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

//! Canonical signing-bytes construction (C2).
//!
//! ## Canonical bytes
//! Twelve lines, joined by a single `\n`, no trailing newline:
//!
//! ```text
//! version
//! envelope_id
//! sender            (lowercase hex)
//! recipient         (lowercase hex)
//! timestamp
//! expires_at
//! nonce
//! scope
//! conversation_id   (or empty)
//! in_reply_to       (or empty)
//! delegation        (compact canonical JSON, or empty)
//! payload           (compact canonical JSON)
//! ```
//!
//! ## Canonical JSON
//! Sorted keys at every depth, `","`/`":"` separators, non-ASCII escaped as
//! `\uXXXX`, numeric types preserved as given. Key sorting falls out of
//! `serde_json::Value`'s default `BTreeMap`-backed `Map` (this crate does not
//! enable `serde_json`'s `preserve_order` feature); escaping is hand-rolled
//! below since `serde_json`'s own formatter passes non-ASCII through as raw
//! UTF-8.

use serde_json::Value;

/// The named fields that participate in the signing preimage, in wire form.
/// Borrowed, not owned: callers already hold these as `String`/`Value` on a
/// parsed envelope.
pub struct CanonicalFields<'a> {
    /// Protocol version.
    pub version: &'a str,
    /// Envelope id.
    pub envelope_id: &'a str,
    /// Sender public key, lowercase hex.
    pub sender: &'a str,
    /// Recipient public key, lowercase hex.
    pub recipient: &'a str,
    /// Creation timestamp, as received.
    pub timestamp: &'a str,
    /// Expiration timestamp, as received.
    pub expires_at: &'a str,
    /// Nonce, as received (base64).
    pub nonce: &'a str,
    /// Scope identifier.
    pub scope: &'a str,
    /// Conversation id, if any.
    pub conversation_id: Option<&'a str>,
    /// In-reply-to id, if any.
    pub in_reply_to: Option<&'a str>,
    /// Delegation object, if any.
    pub delegation: Option<&'a Value>,
    /// Payload object.
    pub payload: &'a Value,
}

/// Build the exact byte sequence to sign or verify for an envelope.
pub fn canonical_bytes(fields: &CanonicalFields<'_>) -> Vec<u8> {
    let delegation_str = fields.delegation.map(canonical_json_string).unwrap_or_default();
    let payload_str = canonical_json_string(fields.payload);

    let parts: [&str; 12] = [
        fields.version,
        fields.envelope_id,
        fields.sender,
        fields.recipient,
        fields.timestamp,
        fields.expires_at,
        fields.nonce,
        fields.scope,
        fields.conversation_id.unwrap_or(""),
        fields.in_reply_to.unwrap_or(""),
        &delegation_str,
        &payload_str,
    ];
    parts.join("\n").into_bytes()
}

/// Canonical JSON encoding of a value: sorted keys, compact separators,
/// ASCII-escaped non-ASCII. Exposed as a pure function per §4.2's
/// interop requirement.
pub fn canonical_json_string(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_escaped_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            // `Map`'s default backing is a `BTreeMap` (no `preserve_order`
            // feature enabled), so iteration is already key-sorted.
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped_string(k, out);
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
    }
}

fn write_escaped_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c if c.is_ascii() => out.push(c),
            c => {
                let cp = c as u32;
                if cp <= 0xFFFF {
                    out.push_str(&format!("\\u{:04x}", cp));
                } else {
                    let v = cp - 0x10000;
                    let high = 0xD800 + (v >> 10);
                    let low = 0xDC00 + (v & 0x3FF);
                    out.push_str(&format!("\\u{:04x}\\u{:04x}", high, low));
                }
            }
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_independence() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(canonical_json_string(&a), canonical_json_string(&b));
        assert_eq!(canonical_json_string(&a), "{\"a\":1,\"b\":2}");
    }

    #[test]
    fn escapes_non_ascii() {
        let v = json!({"name": "caf\u{e9}"});
        assert_eq!(canonical_json_string(&v), "{\"name\":\"caf\\u00e9\"}");
    }

    #[test]
    fn escapes_astral_as_surrogate_pair() {
        let v = json!("\u{1f600}");
        assert_eq!(canonical_json_string(&v), "\"\\ud83d\\ude00\"");
    }

    #[test]
    fn canonical_bytes_joins_twelve_lines_no_trailing_newline() {
        let payload = json!({"prompt": "hi"});
        let fields = CanonicalFields {
            version: "1",
            envelope_id: "e1",
            sender: "s",
            recipient: "r",
            timestamp: "t",
            expires_at: "x",
            nonce: "n",
            scope: "test",
            conversation_id: None,
            in_reply_to: None,
            delegation: None,
            payload: &payload,
        };
        let bytes = canonical_bytes(&fields);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "1\ne1\ns\nr\nt\nx\nn\ntest\n\n\n\n{\"prompt\":\"hi\"}"
        );
        assert!(!text.ends_with('\n'));
    }
}
