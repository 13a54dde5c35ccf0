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

//! Capability-declaration matching (C13, advisory).
//!
//! `capabilities_allowed` compares what a sender *declared* it wants against
//! what an executor is willing to grant. It never gates admission - §9
//! treats capabilities as non-authoritative - but an executor may consult it
//! before acting on a sender's behalf.

use std::collections::HashSet;

use super::types::Capabilities;

/// Compare `declared` against `allowed`, returning `(true, [])` if every
/// declared capability is covered, or `(false, denied)` listing each
/// uncovered item as `"action:X"` / `"data:X"` / `"network:X"` /
/// `"filesystem:read"` / `"filesystem:write"`.
pub fn capabilities_allowed(declared: &Capabilities, allowed: &Capabilities) -> (bool, Vec<String>) {
    let mut denied = Vec::new();

    if !declared.actions.is_empty() {
        let allowed_actions: HashSet<&str> = allowed.actions.iter().map(String::as_str).collect();
        for action in &declared.actions {
            if !allowed_actions.contains(action.as_str()) && !allowed_actions.contains("*") {
                denied.push(format!("action:{action}"));
            }
        }
    }

    if !declared.data_access.is_empty() {
        let allowed_data: HashSet<&str> = allowed.data_access.iter().map(String::as_str).collect();
        for scope in &declared.data_access {
            if allowed_data.contains(scope.as_str()) || allowed_data.contains("*") {
                continue;
            }
            let resource = scope.split(':').next().unwrap_or(scope.as_str());
            let resource_wildcard = format!("{resource}:*");
            if !allowed_data.contains(resource_wildcard.as_str()) {
                denied.push(format!("data:{scope}"));
            }
        }
    }

    if let Some(declared_net) = &declared.network {
        if !declared_net.domains.is_empty() {
            let allowed_domains: HashSet<&str> =
                allowed.network.as_ref().map(|n| n.domains.iter().map(String::as_str).collect()).unwrap_or_default();
            for domain in &declared_net.domains {
                if !domain_allowed(domain, &allowed_domains) {
                    denied.push(format!("network:{domain}"));
                }
            }
        }
    }

    if let Some(declared_fs) = &declared.filesystem {
        let allowed_fs = allowed.filesystem.as_ref();
        if !declared_fs.read.is_empty() && !allowed_fs.is_some_and(|fs| !fs.read.is_empty()) {
            denied.push("filesystem:read".to_string());
        }
        if !declared_fs.write.is_empty() && !allowed_fs.is_some_and(|fs| !fs.write.is_empty()) {
            denied.push("filesystem:write".to_string());
        }
    }

    (denied.is_empty(), denied)
}

/// `domain` is allowed if it is listed exactly, `"*"` is listed, or a
/// `"*.suffix"` pattern matches it (either `foo.suffix` or bare `suffix`).
fn domain_allowed(domain: &str, allowed: &HashSet<&str>) -> bool {
    if allowed.contains(domain) || allowed.contains("*") {
        return true;
    }
    for pattern in allowed {
        if let Some(suffix) = pattern.strip_prefix('*') {
            if domain.ends_with(suffix) || domain == &suffix[1..] {
                return true;
            }
        }
    }
    false
}
