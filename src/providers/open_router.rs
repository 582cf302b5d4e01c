use crate::providers::{ChatProvider, ChatRequest, ProviderError};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Client for OpenRouter or any other OpenAI-compatible chat completions API
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
    http_referer: Option<String>,
    app_title: Option<String>,
}

impl OpenRouterProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        OpenRouterProvider {
            client: Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            http_referer: None,
            app_title: None,
        }
    }

    /// Attribution headers OpenRouter uses to rank calling apps
    pub fn with_attribution(
        mut self,
        http_referer: Option<String>,
        app_title: Option<String>,
    ) -> Self {
        self.http_referer = http_referer;
        self.app_title = app_title;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    fn provider_name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let mut builder = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": request.model,
                "messages": request.messages,
            }));

        if let Some(referer) = &self.http_referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.app_title {
            builder = builder.header("X-Title", title);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let on_transport_error = |e: reqwest::Error| match request.timeout {
            Some(timeout) if e.is_timeout() => ProviderError::Timeout(timeout),
            _ => ProviderError::Request(e),
        };

        let response = builder.send().await.map_err(on_transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(on_transport_error)?;
        debug!("{} responded {}: {}", request.model, status, body);

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("error").map(upstream_error_message))
                .unwrap_or_else(|| body.trim().to_string());
            return Err(ProviderError::Status { status, message });
        }

        let response_body: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::UnexpectedShape(format!("body is not JSON ({})", e)))?;

        completion_content(&response_body)
    }
}

/// Pull the first choice's message content out of a completion body.
///
/// Some upstreams answer 200 with an `error` object instead of a completion;
/// that is reported as `ProviderError::Upstream`.
pub fn completion_content(body: &Value) -> Result<String, ProviderError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        return Err(ProviderError::Upstream(upstream_error_message(error)));
    }

    let choices = body["choices"]
        .as_array()
        .ok_or_else(|| ProviderError::UnexpectedShape("missing 'choices'".to_string()))?;
    let first = choices
        .first()
        .ok_or_else(|| ProviderError::UnexpectedShape("'choices' is empty".to_string()))?;
    let content = first["message"]["content"].as_str().ok_or_else(|| {
        ProviderError::UnexpectedShape("missing 'choices[0].message.content'".to_string())
    })?;

    if content.trim().is_empty() {
        return Err(ProviderError::UnexpectedShape(
            "completion content is empty".to_string(),
        ));
    }

    Ok(content.to_string())
}

fn upstream_error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        other => other["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string(),
    }
}
