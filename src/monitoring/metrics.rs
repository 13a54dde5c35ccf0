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
#![warn(missing_docs)]

//! Prometheus metrics for the admission pipeline (C10). Counters track
//! accepted envelopes and rejections broken down by stable error code;
//! gauges expose live policy-store sizes.

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use thiserror::Error;

use crate::core::receipt::ErrorCode;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A Prometheus metric could not be created or registered.
    #[error("prometheus")]
    Prom,
}

/// Metrics container.
#[derive(Clone)]
pub struct Metrics {
    /// Registry exposed to the `/metrics` endpoint.
    pub registry: Registry,

    /// Accepted envelopes.
    pub accepted_total: IntCounter,
    /// Rejected envelopes, labeled by `code`.
    pub rejected_total: IntCounterVec,

    /// Current nonce registry size.
    pub nonce_registry_size: IntGauge,
    /// Current trust registry size.
    pub trust_registry_size: IntGauge,
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let accepted_total = IntCounter::new("epp_accepted_total", "Accepted envelopes")
            .map_err(|_| MetricsError::Prom)?;
        let rejected_total = IntCounterVec::new(
            Opts::new("epp_rejected_total", "Rejected envelopes by error code"),
            &["code"],
        )
        .map_err(|_| MetricsError::Prom)?;
        let nonce_registry_size = IntGauge::new("epp_nonce_registry_size", "Tracked nonce entries")
            .map_err(|_| MetricsError::Prom)?;
        let trust_registry_size = IntGauge::new("epp_trust_registry_size", "Trusted senders")
            .map_err(|_| MetricsError::Prom)?;

        registry.register(Box::new(accepted_total.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(rejected_total.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(nonce_registry_size.clone())).map_err(|_| MetricsError::Prom)?;
        registry.register(Box::new(trust_registry_size.clone())).map_err(|_| MetricsError::Prom)?;

        Ok(Self { registry, accepted_total, rejected_total, nonce_registry_size, trust_registry_size })
    }

    /// Record a receipt's outcome.
    pub fn observe(&self, receipt: &crate::core::receipt::Receipt) {
        match receipt.error_code() {
            None => self.accepted_total.inc(),
            Some(code) => self.rejected_total.with_label_values(&[error_code_label(code)]).inc(),
        }
    }

    /// Update the live policy-store size gauges.
    pub fn set_pool_sizes(&self, nonce_registry_len: usize, trust_registry_len: usize) {
        self.nonce_registry_size.set(nonce_registry_len as i64);
        self.trust_registry_size.set(trust_registry_len as i64);
    }
}

fn error_code_label(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::InvalidFormat => "INVALID_FORMAT",
        ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
        ErrorCode::WrongRecipient => "WRONG_RECIPIENT",
        ErrorCode::Expired => "EXPIRED",
        ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
        ErrorCode::ReplayDetected => "REPLAY_DETECTED",
        ErrorCode::UntrustedSender => "UNTRUSTED_SENDER",
        ErrorCode::PolicyDenied => "POLICY_DENIED",
        ErrorCode::SizeExceeded => "SIZE_EXCEEDED",
        ErrorCode::RateLimited => "RATE_LIMITED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::receipt::Receipt;

    #[test]
    fn observe_increments_accepted() {
        let m = Metrics::new().unwrap();
        let r = Receipt::Accepted {
            envelope_id: "e1".into(),
            received_at: "now".into(),
            receipt_id: "r1".into(),
            executor: "noop".into(),
        };
        m.observe(&r);
        assert_eq!(m.accepted_total.get(), 1);
    }

    #[test]
    fn observe_increments_rejected_by_code() {
        let m = Metrics::new().unwrap();
        let r = Receipt::rejected("e1", "now", ErrorCode::RateLimited, "too many");
        m.observe(&r);
        assert_eq!(m.rejected_total.with_label_values(&["RATE_LIMITED"]).get(), 1);
    }
}
