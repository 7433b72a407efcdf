//! Task variants and the uniform completion shape.
//!
//! A [`Task`] is one unit of blocking work with a stable identity. The
//! identity is derived from the operation's semantic key (for example
//! `api_request_<from>_<to>_<date>`) so that two logically identical
//! requests collide in the scheduler's dedup check. Tasks are immutable
//! once created, own their parameters, and carry no reference back to
//! the scheduler.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::transport::Transport;

/// Completion result of any task: a success flag and an opaque payload.
///
/// On failure the payload is a human-readable message; the two cases are
/// distinguished only by `success`, never by payload shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub success: bool,
    pub payload: String,
}

impl TaskOutcome {
    pub fn ok(payload: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: payload.into(),
        }
    }

    pub fn failed(payload: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: payload.into(),
        }
    }
}

/// Closed set of blocking operations the worker pool knows how to run.
pub enum TaskKind {
    /// One blocking GET against a fully built request target.
    Fetch {
        url: String,
        transport: Arc<dyn Transport>,
    },
    /// Read a cache artifact in full.
    CacheRead { path: PathBuf },
    /// Create-or-truncate a cache artifact and write the payload wholesale.
    CacheWrite { path: PathBuf, payload: String },
}

impl fmt::Debug for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch { url, .. } => f.debug_struct("Fetch").field("url", url).finish(),
            Self::CacheRead { path } => f.debug_struct("CacheRead").field("path", path).finish(),
            Self::CacheWrite { path, payload } => f
                .debug_struct("CacheWrite")
                .field("path", path)
                .field("bytes", &payload.len())
                .finish(),
        }
    }
}

#[derive(Debug)]
pub struct Task {
    id: String,
    kind: TaskKind,
}

impl Task {
    pub fn fetch(
        id: impl Into<String>,
        url: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: TaskKind::Fetch {
                url: url.into(),
                transport,
            },
        }
    }

    pub fn cache_read(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            kind: TaskKind::CacheRead { path: path.into() },
        }
    }

    pub fn cache_write(
        id: impl Into<String>,
        path: impl Into<PathBuf>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: TaskKind::CacheWrite {
                path: path.into(),
                payload: payload.into(),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the blocking operation to completion.
    ///
    /// Only ever called on a worker thread. Operation-level failures are
    /// folded into the returned outcome rather than propagated.
    pub fn execute(self) -> TaskOutcome {
        match self.kind {
            TaskKind::Fetch { url, transport } => execute_fetch(&url, transport.as_ref()),
            TaskKind::CacheRead { path } => execute_cache_read(&path),
            TaskKind::CacheWrite { path, payload } => execute_cache_write(&path, &payload),
        }
    }
}

fn execute_fetch(url: &str, transport: &dyn Transport) -> TaskOutcome {
    let response = match transport.get(url) {
        Ok(response) => response,
        Err(e) => return TaskOutcome::failed(format!("request failed: {e}")),
    };

    if !response.is_success() {
        return TaskOutcome::failed(format!("HTTP error: {}", response.status));
    }

    // The payload must at least be structurally well-formed JSON before
    // any orchestrator gets to interpret it.
    match serde_json::from_str::<serde_json::Value>(&response.body) {
        Ok(_) => TaskOutcome::ok(response.body),
        Err(e) => TaskOutcome::failed(format!("JSON parse error: {e}")),
    }
}

fn execute_cache_read(path: &Path) -> TaskOutcome {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return TaskOutcome::failed("cache file not found");
        }
        Err(e) => return TaskOutcome::failed(format!("cache read error: {e}")),
    };

    if content.is_empty() {
        TaskOutcome::failed("cache file is empty")
    } else {
        TaskOutcome::ok(content)
    }
}

fn execute_cache_write(path: &Path, payload: &str) -> TaskOutcome {
    let mut file = match std::fs::File::create(path) {
        Ok(file) => file,
        Err(_) => return TaskOutcome::failed("cannot create cache file"),
    };

    // No partial-write recovery: a failure after truncation is reported,
    // not rolled back.
    match file.write_all(payload.as_bytes()) {
        Ok(()) => TaskOutcome::ok("cache written successfully"),
        Err(e) => TaskOutcome::failed(format!("cache write error: {e}")),
    }
}
