//! OpenAI and Azure OpenAI chat-completions backend

use serde_json::{json, Value};

use super::http::JsonClient;
use super::{CompletionRequest, Provider, ProviderSettings};
use crate::error::Result;

const OPENAI_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone, PartialEq)]
enum Flavor {
    OpenAi { base_url: String },
    Azure { endpoint: String, api_version: String },
}

/// Chat-completions provider for OpenAI and Azure OpenAI deployments.
pub struct OpenAiProvider {
    flavor: Flavor,
    api_key: String,
    client: JsonClient,
}

impl OpenAiProvider {
    /// OpenAI proper, or any compatible server when `base_url` is given
    pub fn openai(base_url: Option<String>, api_key: String, settings: &ProviderSettings) -> Self {
        Self {
            flavor: Flavor::OpenAi {
                base_url: base_url
                    .unwrap_or_else(|| OPENAI_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            api_key,
            client: JsonClient::new("openai", settings.timeout_secs),
        }
    }

    /// Azure OpenAI resource; the request model names the deployment
    pub fn azure(endpoint: String, api_key: String, settings: &ProviderSettings) -> Self {
        Self {
            flavor: Flavor::Azure {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                api_version: settings.api_version.clone(),
            },
            api_key,
            client: JsonClient::new("azure-openai", settings.timeout_secs),
        }
    }

    fn url(&self, model: &str) -> String {
        match &self.flavor {
            Flavor::OpenAi { base_url } => format!("{}/v1/chat/completions", base_url),
            Flavor::Azure {
                endpoint,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint, model, api_version
            ),
        }
    }
}

impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        match self.flavor {
            Flavor::OpenAi { .. } => "openai",
            Flavor::Azure { .. } => "azure-openai",
        }
    }

    fn invoke(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = build_body(request);
        let url = self.url(request.model);
        let bearer = format!("Bearer {}", self.api_key);

        let headers: Vec<(&str, &str)> = match self.flavor {
            Flavor::OpenAi { .. } => vec![("Authorization", bearer.as_str())],
            Flavor::Azure { .. } => vec![("api-key", self.api_key.as_str())],
        };

        let response = self.client.post(&url, &headers, &body)?;
        Ok(message_text(&response))
    }
}

fn build_body(request: &CompletionRequest<'_>) -> Value {
    let mut messages = Vec::new();
    if let Some(system) = request.system {
        messages.push(json!({"role": "system", "content": system}));
    }
    messages.push(json!({"role": "user", "content": request.user}));

    let mut body = json!({
        "model": request.model,
        "messages": messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    });

    if request.json_object {
        body["response_format"] = json!({"type": "json_object"});
    }

    body
}

/// First choice's message text; absent or null content reads as empty.
fn message_text(response: &Value) -> String {
    response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(system: Option<&'a str>, json_object: bool) -> CompletionRequest<'a> {
        CompletionRequest {
            system,
            user: "How was your day?",
            model: "kimi-2-5",
            temperature: 0.0,
            max_tokens: 4000,
            json_object,
        }
    }

    #[test]
    fn test_body_with_system_and_json_mode() {
        let body = build_body(&request(Some("Rubric"), true));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Rubric");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_body_without_system() {
        let body = build_body(&request(None, false));
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_message_text_extraction() {
        let response = json!({"choices": [{"message": {"role": "assistant", "content": "{\"a\":1}"}}]});
        assert_eq!(message_text(&response), "{\"a\":1}");
        let empty = json!({"choices": [{"message": {"content": null}}]});
        assert_eq!(message_text(&empty), "");
        assert_eq!(message_text(&json!({})), "");
    }

    #[test]
    fn test_urls() {
        let settings = ProviderSettings::default();
        let azure = OpenAiProvider::azure(
            "https://res.openai.azure.com/".to_string(),
            "k".to_string(),
            &settings,
        );
        assert_eq!(
            azure.url("kimi-2-5"),
            "https://res.openai.azure.com/openai/deployments/kimi-2-5/chat/completions?api-version=2024-08-01-preview"
        );

        let openai = OpenAiProvider::openai(None, "k".to_string(), &settings);
        assert_eq!(openai.url("gpt-4"), "https://api.openai.com/v1/chat/completions");
        assert_eq!(openai.name(), "openai");
    }
}
