// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0

#![forbid(unsafe_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use epp_inbox::core::canonical::{canonical_bytes, CanonicalFields};
use epp_inbox::core::pipeline::Inbox;
use epp_inbox::core::policy::nonce_registry::NonceRegistry;
use epp_inbox::core::policy::rate_limiter::RateLimiter;
use epp_inbox::core::policy::trust_registry::{RateLimit, SenderPolicy, TrustRegistry};
use epp_inbox::core::receipt::{ErrorCode, Receipt};
use epp_inbox::core::runtime::executor::NoopExecutor;
use epp_inbox::core::security::keys::KeyPair;

struct Scenario {
    inbox_keys: KeyPair,
    sender_keys: KeyPair,
}

fn new_scenario() -> Scenario {
    Scenario { inbox_keys: KeyPair::generate().unwrap(), sender_keys: KeyPair::generate().unwrap() }
}

fn build_inbox(s: &Scenario, policy: SenderPolicy) -> Inbox {
    let trust = TrustRegistry::new();
    trust.add(&s.sender_keys.public_key().to_hex(), "e2e sender", policy).unwrap();
    Inbox::new(s.inbox_keys.public_key(), trust, NonceRegistry::new(), RateLimiter::new(), Box::new(NoopExecutor))
}

fn envelope_json(
    s: &Scenario,
    recipient_hex: &str,
    expires_at: chrono::DateTime<Utc>,
    nonce: &[u8],
    scope: &str,
    payload: Value,
) -> Vec<u8> {
    let now = Utc::now();
    let envelope_id = Uuid::new_v4().to_string();
    let timestamp = now.to_rfc3339();
    let expires_at = expires_at.to_rfc3339();
    let sender_hex = s.sender_keys.public_key().to_hex();
    let nonce_b64 = STANDARD.encode(nonce);

    let fields = CanonicalFields {
        version: "1",
        envelope_id: &envelope_id,
        sender: &sender_hex,
        recipient: recipient_hex,
        timestamp: &timestamp,
        expires_at: &expires_at,
        nonce: &nonce_b64,
        scope,
        conversation_id: None,
        in_reply_to: None,
        delegation: None,
        payload: &payload,
    };
    let signature = s.sender_keys.sign(&canonical_bytes(&fields));

    serde_json::to_vec(&json!({
        "version": "1",
        "envelope_id": envelope_id,
        "sender": sender_hex,
        "recipient": recipient_hex,
        "timestamp": timestamp,
        "expires_at": expires_at,
        "nonce": nonce_b64,
        "scope": scope,
        "payload": payload,
        "signature": STANDARD.encode(signature),
    }))
    .unwrap()
}

#[test]
fn happy_path_accepts_with_a_uuid_receipt_id() {
    let s = new_scenario();
    let policy = SenderPolicy { allowed_scopes: vec!["*".into()], max_envelope_size: 10_485_760, ..Default::default() };
    let inbox = build_inbox(&s, policy);
    let body = envelope_json(
        &s,
        &s.inbox_keys.public_key().to_hex(),
        Utc::now() + Duration::minutes(15),
        &[3u8; 16],
        "test",
        json!({ "prompt": "Hello" }),
    );

    match inbox.admit(&body) {
        Receipt::Accepted { receipt_id, executor, .. } => {
            assert!(Uuid::parse_str(&receipt_id).is_ok());
            assert_eq!(executor, "noop");
        }
        other => panic!("expected acceptance, got {other:?}"),
    }
}

#[test]
fn wrong_recipient_is_rejected_with_stable_code() {
    let s = new_scenario();
    let policy = SenderPolicy { allowed_scopes: vec!["*".into()], ..Default::default() };
    let inbox = build_inbox(&s, policy);
    let other_recipient = KeyPair::generate().unwrap().public_key().to_hex();
    let body = envelope_json(&s, &other_recipient, Utc::now() + Duration::minutes(15), &[4u8; 16], "test", json!({ "prompt": "Hello" }));

    assert_eq!(inbox.admit(&body).error_code(), Some(ErrorCode::WrongRecipient));
}

#[test]
fn forged_signature_is_rejected_not_accepted() {
    let s = new_scenario();
    let policy = SenderPolicy { allowed_scopes: vec!["*".into()], ..Default::default() };
    let inbox = build_inbox(&s, policy);
    let body = envelope_json(&s, &s.inbox_keys.public_key().to_hex(), Utc::now() + Duration::minutes(15), &[5u8; 16], "test", json!({ "prompt": "Hello" }));

    let mut value: Value = serde_json::from_slice(&body).unwrap();
    value["signature"] = json!(STANDARD.encode([0xAB; 64]));
    let forged = serde_json::to_vec(&value).unwrap();

    assert_eq!(inbox.admit(&forged).error_code(), Some(ErrorCode::InvalidSignature));
}

#[test]
fn replay_of_the_identical_envelope_is_rejected() {
    let s = new_scenario();
    let policy = SenderPolicy { allowed_scopes: vec!["*".into()], ..Default::default() };
    let inbox = build_inbox(&s, policy);
    let body = envelope_json(&s, &s.inbox_keys.public_key().to_hex(), Utc::now() + Duration::minutes(15), &[6u8; 16], "test", json!({ "prompt": "Hello" }));

    assert!(matches!(inbox.admit(&body), Receipt::Accepted { .. }));
    assert_eq!(inbox.admit(&body).error_code(), Some(ErrorCode::ReplayDetected));
}

#[test]
fn third_envelope_within_the_hour_is_rate_limited() {
    let s = new_scenario();
    let policy = SenderPolicy {
        allowed_scopes: vec!["*".into()],
        rate_limit: RateLimit { max_per_hour: Some(2), max_per_day: None },
        ..Default::default()
    };
    let inbox = build_inbox(&s, policy);
    let recipient = s.inbox_keys.public_key().to_hex();

    let first = envelope_json(&s, &recipient, Utc::now() + Duration::minutes(15), &[10u8; 16], "test", json!({ "prompt": "one" }));
    let second = envelope_json(&s, &recipient, Utc::now() + Duration::minutes(15), &[11u8; 16], "test", json!({ "prompt": "two" }));
    let third = envelope_json(&s, &recipient, Utc::now() + Duration::minutes(15), &[12u8; 16], "test", json!({ "prompt": "three" }));

    assert!(matches!(inbox.admit(&first), Receipt::Accepted { .. }));
    assert!(matches!(inbox.admit(&second), Receipt::Accepted { .. }));
    assert_eq!(inbox.admit(&third).error_code(), Some(ErrorCode::RateLimited));
}

#[test]
fn envelope_exactly_at_the_size_limit_is_accepted_one_byte_more_is_rejected() {
    let s = new_scenario();
    let recipient = s.inbox_keys.public_key().to_hex();

    // Pad the payload so we can grow the exact wire size by one byte via an
    // extra filler character, without touching anything that participates in
    // the signature twice.
    let base = envelope_json(&s, &recipient, Utc::now() + Duration::minutes(15), &[13u8; 16], "test", json!({ "prompt": "Hello" }));
    let limit = base.len() as u64;

    let policy_exact = SenderPolicy { allowed_scopes: vec!["*".into()], max_envelope_size: limit, ..Default::default() };
    let inbox_exact = build_inbox(&s, policy_exact);
    assert!(matches!(inbox_exact.admit(&base), Receipt::Accepted { .. }));

    let policy_short = SenderPolicy { allowed_scopes: vec!["*".into()], max_envelope_size: limit - 1, ..Default::default() };
    let inbox_short = build_inbox(&s, policy_short);
    let body2 = envelope_json(&s, &recipient, Utc::now() + Duration::minutes(15), &[14u8; 16], "test", json!({ "prompt": "Hello" }));
    assert_eq!(inbox_short.admit(&body2).error_code(), Some(ErrorCode::SizeExceeded));
}
