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

//! Executor interface (C9): what happens to an admitted envelope.

use chrono::Utc;
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::validator::Envelope;

/// Outcome of handing an envelope to an [`Executor`].
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    /// Whether the executor accepted the envelope for processing.
    pub success: bool,
    /// The name of the executor that ran.
    pub executor_name: String,
    /// Executor-defined result payload, if any.
    pub result_data: Option<Value>,
    /// Error message, if `success` is false.
    pub error_message: Option<String>,
}

impl ExecutionResult {
    fn ok(executor_name: impl Into<String>, result_data: Option<Value>) -> Self {
        Self { success: true, executor_name: executor_name.into(), result_data, error_message: None }
    }

    fn err(executor_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { success: false, executor_name: executor_name.into(), result_data: None, error_message: Some(message.into()) }
    }
}

/// What an inbox does with an admitted envelope. Runs only after every
/// admission gate has passed; never consulted to decide admission itself.
pub trait Executor: Send + Sync {
    /// A short, stable name identifying this executor (reported in
    /// accepted receipts).
    fn name(&self) -> &str;

    /// Hand `envelope` off for processing.
    fn execute(&self, envelope: &Envelope) -> ExecutionResult;
}

/// Discards the envelope. Used when only admission matters, e.g. in tests
/// or a dry-run inbox.
#[derive(Default)]
pub struct NoopExecutor;

impl Executor for NoopExecutor {
    fn name(&self) -> &str {
        "noop"
    }

    fn execute(&self, _envelope: &Envelope) -> ExecutionResult {
        ExecutionResult::ok(self.name(), None)
    }
}

/// Writes each envelope as a standalone JSON file under a queue directory,
/// named `{YYYYMMDD_HHMMSS}_{envelope_id}.json`, for a separate worker to
/// pick up.
pub struct FileQueueExecutor {
    queue_dir: PathBuf,
}

impl FileQueueExecutor {
    /// An executor that queues into `queue_dir`, creating it if absent.
    pub fn new(queue_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let queue_dir = queue_dir.into();
        fs::create_dir_all(&queue_dir)?;
        Ok(Self { queue_dir })
    }

    fn write_entry(&self, envelope: &Envelope) -> std::io::Result<PathBuf> {
        let now = Utc::now();
        let file_name = format!(
            "{}_{}.json",
            now.format("%Y%m%d_%H%M%S"),
            envelope.envelope_id_raw
        );
        let path = self.queue_dir.join(file_name);

        let entry = json!({
            "envelope_id": envelope.envelope_id_raw,
            "sender": envelope.sender_hex,
            "recipient": envelope.recipient_hex,
            "scope": envelope.scope,
            "payload": envelope.payload,
            "queued_at": now.to_rfc3339(),
        });

        let bytes = serde_json::to_vec_pretty(&entry)?;
        let mut f = fs::OpenOptions::new().create(true).write(true).truncate(true).open(&path)?;
        f.write_all(&bytes)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&path, fs::Permissions::from_mode(0o600));
        }

        Ok(path)
    }
}

impl Executor for FileQueueExecutor {
    fn name(&self) -> &str {
        "file_queue"
    }

    fn execute(&self, envelope: &Envelope) -> ExecutionResult {
        match self.write_entry(envelope) {
            Ok(path) => ExecutionResult::ok(self.name(), Some(json!({ "path": path.display().to_string() }))),
            Err(e) => ExecutionResult::err(self.name(), format!("failed to queue envelope: {e}")),
        }
    }
}

/// Appends one JSON line per envelope to a log file. Intended for
/// development and smoke-testing an inbox deployment.
pub struct LoggerExecutor {
    log_path: PathBuf,
    file: Mutex<fs::File>,
}

impl LoggerExecutor {
    /// An executor that appends JSON lines to `log_path`, creating parent
    /// directories and the file as needed.
    pub fn new(log_path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new().create(true).append(true).open(&log_path)?;
        Ok(Self { log_path, file: Mutex::new(file) })
    }
}

impl Executor for LoggerExecutor {
    fn name(&self) -> &str {
        "logger"
    }

    fn execute(&self, envelope: &Envelope) -> ExecutionResult {
        let line = json!({
            "envelope_id": envelope.envelope_id_raw,
            "sender": envelope.sender_hex,
            "scope": envelope.scope,
            "prompt": envelope.payload.prompt,
            "logged_at": Utc::now().to_rfc3339(),
        });

        let mut file = self.file.lock().expect("lock poisoned");
        let result = (|| -> std::io::Result<()> {
            let mut bytes = serde_json::to_vec(&line)?;
            bytes.push(b'\n');
            file.write_all(&bytes)
        })();

        match result {
            Ok(()) => ExecutionResult::ok(self.name(), None),
            Err(e) => ExecutionResult::err(self.name(), format!("failed to append to {}: {e}", self.log_path.display())),
        }
    }
}

fn _assert_executor_is_object_safe(_: &dyn Executor) {}
