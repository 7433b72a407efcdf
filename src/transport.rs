//! Blocking HTTP transport seam.
//!
//! Fetch tasks execute on scheduler worker threads, so the transport is
//! deliberately blocking. The trait exists so tests can substitute a
//! scripted transport without touching the network.

use std::time::Duration;

use crate::error::{Result, RouteScoutError};

/// Raw response as the core sees it: a status and an opaque body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One blocking GET. Connection-level failures come back as
/// [`RouteScoutError::Transport`]; non-2xx statuses are a normal response.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Production transport backed by a shared `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        match self.agent.get(url).call() {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map_err(|e| RouteScoutError::Transport(format!("read body: {e}")))?;
                Ok(HttpResponse { status, body })
            }
            // Non-2xx still carries a body worth reporting by status.
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(RouteScoutError::Transport(transport.to_string()))
            }
        }
    }
}
