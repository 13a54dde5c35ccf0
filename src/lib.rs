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

//! External Prompt Protocol inbox - a signed, policy-gated envelope format
//! and the admission pipeline that accepts or rejects it.
//!
//! This repository provides:
//! - Deterministic canonical encoding of envelopes for signing and verification
//! - Ed25519 key primitives with optional passphrase-encrypted key files
//! - A trust registry, nonce registry and sliding-window rate limiter
//! - The ordered admission pipeline (C7) and its stable wire error codes
//! - Reference executors and a thin `axum` HTTP adapter
//! - Monitoring via Prometheus metrics and structured logging

/// Core protocol primitives: data model, canonical encoding, security,
/// policy stores, the admission pipeline and receipts.
pub mod core;
/// Observability (Prometheus metrics).
pub mod monitoring;
/// Thin `axum` HTTP adapter implementing the inbox's wire contract.
pub mod http;
/// Configuration loading (`InboxConfig`).
pub mod config;
