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

//! Protocol core: data model, canonical encoding, security primitives,
//! policy stores and the admission pipeline.

/// Envelope, payload and extension data model (wire + validated forms).
pub mod types;
/// Canonical signing-bytes construction (C2).
pub mod canonical;
/// Envelope structural/field validation (C3).
pub mod validator;
/// Admission pipeline (C7).
pub mod pipeline;
/// Receipt model and stable error codes (C8).
pub mod receipt;
/// Ed25519 key primitives and file-backed keystore (C1).
pub mod security;
/// Trust registry, nonce registry and rate limiter (C4, C5, C6).
pub mod policy;
/// Executor interface and reference implementations (C9).
pub mod runtime;
/// Content-integrity hashing over the canonical payload (C13, advisory).
pub mod integrity;
/// Capability-declaration matching against an executor's allow-list (C13, advisory).
pub mod capabilities;
