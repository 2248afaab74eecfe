//! Blocking HTTP transport over the switch backend's REST interface.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `list(offset)` | `GET {base}switch/?offset=<offset>` |
//! | `save(name, condition)` | `POST {base}switch/<name>/` with the condition as JSON |
//! | `delete(name)` | `DELETE {base}switch/<name>/` |

use flippy::{SwitchRecord, Transport, TransportError};
use serde_json::Value;
use tracing::{debug, warn};
use ureq::http::Response;
use ureq::{Agent, Body};

use crate::{AdminConfig, ConfigError};

/// [`Transport`] backed by a blocking `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: Agent,
    base_url: String,
}

impl HttpTransport {
    /// A transport for the backend described by `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidProtocol`] if the base URL cannot be assembled.
    pub fn new(config: &AdminConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_base_url(config.base_url()?))
    }

    /// A transport rooted at `base_url` (which should end in `/`).
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.into(),
        }
    }

    /// The base URL requests are made under.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_url(&self, offset: usize) -> String {
        format!("{}switch/?offset={offset}", self.base_url)
    }

    fn switch_url(&self, name: &str) -> String {
        format!("{}switch/{}/", self.base_url, encode_segment(name))
    }
}

impl Transport for HttpTransport {
    fn list(&self, offset: usize) -> Result<Vec<SwitchRecord>, TransportError> {
        let url = self.list_url(offset);
        debug!(%url, "listing switches");
        let response = self.agent.get(&url).call().map_err(network)?;
        success(response)?
            .into_body()
            .read_json::<Vec<SwitchRecord>>()
            .map_err(|e| TransportError::Decode {
                message: e.to_string(),
            })
    }

    fn save(&self, name: &str, condition: &Value) -> Result<(), TransportError> {
        let url = self.switch_url(name);
        debug!(%url, "saving switch");
        let response = self.agent.post(&url).send_json(condition).map_err(network)?;
        success(response).map(drop)
    }

    fn delete(&self, name: &str) -> Result<(), TransportError> {
        let url = self.switch_url(name);
        debug!(%url, "deleting switch");
        let response = self.agent.delete(&url).call().map_err(network)?;
        success(response).map(drop)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Response handling
// ═══════════════════════════════════════════════════════════════════════════════

fn network(err: ureq::Error) -> TransportError {
    warn!(error = %err, "switch backend unreachable");
    TransportError::Network {
        message: err.to_string(),
    }
}

/// Pass 2xx responses through; turn anything else into a status error
/// carrying the response text.
fn success(response: Response<Body>) -> Result<Response<Body>, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .into_body()
        .read_to_string()
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or_default().to_owned());
    Err(TransportError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Percent-encode a switch name as a single path segment.
fn encode_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(ch),
            _ => {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).as_bytes() {
                    out.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }
    out
}
