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

//! EPP inbox entrypoint (systemd-friendly).
//! Loads config and identity, wires policy stores and an executor, and
//! serves the HTTP adapter until shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use epp_inbox::config::InboxConfig;
use epp_inbox::core::pipeline::Inbox;
use epp_inbox::core::policy::nonce_registry::NonceRegistry;
use epp_inbox::core::policy::rate_limiter::RateLimiter;
use epp_inbox::core::policy::trust_registry::TrustRegistry;
use epp_inbox::core::runtime::executor::{Executor, FileQueueExecutor, LoggerExecutor, NoopExecutor};
use epp_inbox::core::security::keystore;
use epp_inbox::http::{router, AppState};
use epp_inbox::monitoring::metrics::Metrics;

fn env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn build_executor(cfg: &epp_inbox::config::ExecutorSection) -> Result<Box<dyn Executor>> {
    match cfg.kind.as_str() {
        "noop" => Ok(Box::new(NoopExecutor)),
        "file_queue" => {
            let dir = cfg.queue_dir.as_deref().unwrap_or("./data/queue");
            Ok(Box::new(FileQueueExecutor::new(dir).context("failed to initialize file queue executor")?))
        }
        "logger" => {
            let path = cfg.log_file.as_deref().unwrap_or("./data/envelopes.log");
            Ok(Box::new(LoggerExecutor::new(path).context("failed to initialize logger executor")?))
        }
        other => anyhow::bail!("unknown executor type: {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .try_init();

    let config_path = env("EPP_CONFIG_PATH", "./data/inbox.toml");
    let config = InboxConfig::load_or_create(&config_path).context("failed to load configuration")?;

    let keys = keystore::load_or_create(
        config.keys.private_key_path.as_ref(),
        config.keys.public_key_path.as_ref(),
    )
    .context("failed to load or create inbox identity")?;
    let public_key = keys.public_key();
    info!(public_key = %public_key.to_hex(), "inbox identity loaded");

    let trust_registry = TrustRegistry::load(&config.storage.trust_registry_path)
        .context("failed to load trust registry")?;
    let nonce_registry = NonceRegistry::new();
    let rate_limiter = RateLimiter::new();
    let executor = build_executor(&config.executor)?;
    let metrics = Metrics::new().context("failed to initialize metrics")?;

    let inbox = Inbox::new(public_key, trust_registry, nonce_registry, rate_limiter, executor);
    let state = Arc::new(AppState { inbox, metrics });

    let addr = format!("{}:{}", config.inbox.host, config.inbox.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "epp inbox listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sig.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
