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

//! Admission policy stores: trust, replay protection, and rate limiting.

/// Sender trust and per-sender policy (C4).
pub mod trust_registry;
/// Replay protection (C5).
pub mod nonce_registry;
/// Per-sender rate limiting (C6).
pub mod rate_limiter;
