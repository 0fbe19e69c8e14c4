//! Blocking JSON-over-HTTP helper shared by provider backends

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, TonebenchError};
use crate::format::truncate_chars;

/// Longest error-body excerpt carried into provider errors
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Thin wrapper around a configured `ureq` agent.
pub(crate) struct JsonClient {
    agent: ureq::Agent,
    provider: String,
    user_agent: String,
}

impl JsonClient {
    pub(crate) fn new(provider: &str, timeout_secs: u64) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            provider: provider.to_string(),
            user_agent: format!(
                "tonebench/{} ({})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ),
        }
    }

    /// POST `body` as JSON and decode the JSON response.
    ///
    /// Non-2xx statuses become provider errors carrying the status and a
    /// truncated response body.
    pub(crate) fn post(&self, url: &str, headers: &[(&str, &str)], body: &Value) -> Result<Value> {
        let payload = serde_json::to_string(body)?;

        let mut request = self
            .agent
            .post(url)
            .header("Content-Type", "application/json")
            .header("User-Agent", &self.user_agent);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let mut response = request
            .send(payload.as_str())
            .map_err(|e| self.error(format!("transport error: {}", e)))?;

        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| self.error(format!("failed to read response body: {}", e)))?;

        debug!(provider = %self.provider, status = status.as_u16(), bytes = text.len(), "provider_response");

        if !status.is_success() {
            return Err(self.error(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_chars(text.trim(), MAX_ERROR_BODY_CHARS)
            )));
        }

        serde_json::from_str(&text)
            .map_err(|e| self.error(format!("response is not valid JSON: {}", e)))
    }

    fn error(&self, reason: String) -> TonebenchError {
        TonebenchError::provider(&self.provider, reason)
    }
}
