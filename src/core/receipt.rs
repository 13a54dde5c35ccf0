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

//! Receipt model and stable wire error codes (C8).

use serde::{Deserialize, Serialize};

/// The closed set of stable wire error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Envelope failed structural/field validation.
    InvalidFormat,
    /// `version` is not `"1"`.
    UnsupportedVersion,
    /// `recipient` does not match this inbox's public key.
    WrongRecipient,
    /// `now >= expires_at`.
    Expired,
    /// Signature verification failed, or signature/public key was malformed.
    InvalidSignature,
    /// Nonce has been seen before.
    ReplayDetected,
    /// Sender is not in the trust registry.
    UntrustedSender,
    /// Sender's policy denies this scope.
    PolicyDenied,
    /// Envelope exceeds the sender's policy size limit.
    SizeExceeded,
    /// Sender exceeded its hourly or daily rate cap.
    RateLimited,
}

/// Error detail attached to a rejected receipt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable message. Never an internal stack trace or stateful hint.
    pub message: String,
}

/// Outcome of processing an envelope through the admission pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Receipt {
    /// The envelope was admitted and handed to an executor.
    Accepted {
        /// The envelope's id.
        envelope_id: String,
        /// When this receipt was produced, ISO-8601 UTC.
        received_at: String,
        /// Fresh id identifying this receipt.
        receipt_id: String,
        /// Name reported by the executor that processed the envelope.
        executor: String,
    },
    /// The envelope was rejected.
    Rejected {
        /// The envelope's id, or the literal `"unknown"` if it could not be
        /// parsed.
        envelope_id: String,
        /// When this receipt was produced, ISO-8601 UTC.
        received_at: String,
        /// Why the envelope was rejected.
        error: ErrorDetail,
    },
}

impl Receipt {
    /// Build a rejected receipt.
    pub fn rejected(envelope_id: impl Into<String>, received_at: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Receipt::Rejected {
            envelope_id: envelope_id.into(),
            received_at: received_at.into(),
            error: ErrorDetail { code, message: message.into() },
        }
    }

    /// The error code of a rejected receipt, if any.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Receipt::Rejected { error, .. } => Some(error.code),
            Receipt::Accepted { .. } => None,
        }
    }
}
