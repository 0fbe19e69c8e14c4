//! Anthropic Messages API backend

use serde_json::{json, Value};

use super::http::JsonClient;
use super::{CompletionRequest, Provider, ProviderSettings};
use crate::error::Result;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    api_key: String,
    client: JsonClient,
}

impl AnthropicProvider {
    pub fn new(api_key: String, settings: &ProviderSettings) -> Self {
        Self {
            api_key,
            client: JsonClient::new("anthropic", settings.timeout_secs),
        }
    }
}

impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn invoke(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = build_body(request);
        let headers = [
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", API_VERSION),
        ];

        let response = self.client.post(MESSAGES_URL, &headers, &body)?;
        Ok(message_text(&response))
    }
}

// The Messages API has no JSON-object mode; the prompt carries that instruction.
fn build_body(request: &CompletionRequest<'_>) -> Value {
    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "temperature": request.temperature,
        "messages": [{"role": "user", "content": request.user}],
    });

    if let Some(system) = request.system {
        body["system"] = json!(system);
    }

    body
}

/// Concatenated text blocks of the response content
fn message_text(response: &Value) -> String {
    response
        .get("content")
        .and_then(|c| c.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}
