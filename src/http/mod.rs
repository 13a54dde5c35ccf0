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

//! Thin `axum` HTTP adapter (C12): wire (de)serialization and status-code
//! mapping only. Owns no policy decisions - every admission call is routed
//! straight through to `core::pipeline::Inbox::admit`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use prometheus::{Encoder, TextEncoder};
use serde_json::json;

use crate::core::pipeline::Inbox;
use crate::core::receipt::{ErrorCode, Receipt};
use crate::monitoring::metrics::Metrics;

/// Shared state handed to every route handler.
pub struct AppState {
    /// The admission pipeline.
    pub inbox: Inbox,
    /// Metrics to record each admission outcome against.
    pub metrics: Metrics,
}

/// Build the router for an inbox deployment.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/epp/v1/submit", post(submit))
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

fn status_for(receipt: &Receipt) -> StatusCode {
    match receipt.error_code() {
        None => StatusCode::OK,
        Some(
            ErrorCode::InvalidFormat
            | ErrorCode::UnsupportedVersion
            | ErrorCode::WrongRecipient
            | ErrorCode::Expired
            | ErrorCode::ReplayDetected
            | ErrorCode::SizeExceeded,
        ) => StatusCode::BAD_REQUEST,
        Some(ErrorCode::InvalidSignature) => StatusCode::UNAUTHORIZED,
        Some(ErrorCode::UntrustedSender | ErrorCode::PolicyDenied) => StatusCode::FORBIDDEN,
        Some(ErrorCode::RateLimited) => StatusCode::TOO_MANY_REQUESTS,
    }
}

async fn submit(State(state): State<Arc<AppState>>, body: Bytes) -> impl IntoResponse {
    let receipt = state.inbox.admit(&body);
    state.metrics.observe(&receipt);
    state.metrics.set_pool_sizes(state.inbox.nonce_registry_len(), state.inbox.trust_registry_len());

    match &receipt {
        Receipt::Accepted { envelope_id, executor, .. } => {
            tracing::info!(envelope_id = %envelope_id, executor = %executor, "envelope accepted");
        }
        Receipt::Rejected { envelope_id, error, .. } => {
            tracing::warn!(envelope_id = %envelope_id, code = ?error.code, "envelope rejected");
        }
    }

    (status_for(&receipt), Json(receipt))
}

async fn banner(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": "epp-inbox",
        "public_key": state.inbox.public_key().to_hex(),
    }))
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let families = state.metrics.registry.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).expect("prometheus encoding");
    ([(axum::http::header::CONTENT_TYPE, encoder.format_type().to_string())], buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::nonce_registry::NonceRegistry;
    use crate::core::policy::rate_limiter::RateLimiter;
    use crate::core::policy::trust_registry::TrustRegistry;
    use crate::core::runtime::executor::NoopExecutor;
    use crate::core::security::keys::KeyPair;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let keys = KeyPair::generate().unwrap();
        let inbox = Inbox::new(
            keys.public_key(),
            TrustRegistry::new(),
            NonceRegistry::new(),
            RateLimiter::new(),
            Box::new(NoopExecutor),
        );
        Arc::new(AppState { inbox, metrics: Metrics::new().unwrap() })
    }

    #[tokio::test]
    async fn health_returns_200() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn banner_includes_public_key() {
        let state = test_state();
        let expected_key = state.inbox.public_key().to_hex();
        let app = router(state);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["public_key"], expected_key);
    }

    #[tokio::test]
    async fn submit_with_untrusted_sender_is_403() {
        use crate::core::canonical::{canonical_bytes, CanonicalFields};
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let keys = KeyPair::generate().unwrap();
        let sender_keys = KeyPair::generate().unwrap();
        let inbox = Inbox::new(
            keys.public_key(),
            TrustRegistry::new(),
            NonceRegistry::new(),
            RateLimiter::new(),
            Box::new(NoopExecutor),
        );
        let state = Arc::new(AppState { inbox, metrics: Metrics::new().unwrap() });

        let now = chrono::Utc::now();
        let envelope_id = uuid::Uuid::new_v4().to_string();
        let timestamp = now.to_rfc3339();
        let expires_at = (now + chrono::Duration::minutes(5)).to_rfc3339();
        let sender_hex = sender_keys.public_key().to_hex();
        let recipient_hex = keys.public_key().to_hex();
        let nonce_b64 = STANDARD.encode([9u8; 16]);
        let payload = json!({ "prompt": "hi" });

        let fields = CanonicalFields {
            version: "1",
            envelope_id: &envelope_id,
            sender: &sender_hex,
            recipient: &recipient_hex,
            timestamp: &timestamp,
            expires_at: &expires_at,
            nonce: &nonce_b64,
            scope: "test",
            conversation_id: None,
            in_reply_to: None,
            delegation: None,
            payload: &payload,
        };
        let signature = sender_keys.sign(&canonical_bytes(&fields));

        let body = serde_json::to_vec(&json!({
            "version": "1",
            "envelope_id": envelope_id,
            "sender": sender_hex,
            "recipient": recipient_hex,
            "timestamp": timestamp,
            "expires_at": expires_at,
            "nonce": nonce_b64,
            "scope": "test",
            "payload": payload,
            "signature": STANDARD.encode(signature),
        }))
        .unwrap();

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/epp/v1/submit")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn metrics_route_serves_prometheus_text() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("epp_accepted_total"));
    }

    #[tokio::test]
    async fn submit_with_garbage_body_is_400() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/epp/v1/submit")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
