use serde::Deserialize;
use serde_json::Value;

use super::CompletionProvider;
use crate::chat::{Message, Sender};
use crate::error::ParleyError;

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request_body(&self, context: &[Message]) -> Value {
        let contents: Vec<Value> = context
            .iter()
            .map(|m| {
                let role = match m.sender {
                    Sender::User => "user",
                    Sender::Bot => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": m.text }],
                })
            })
            .collect();

        serde_json::json!({ "contents": contents })
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

fn parse_response(body: &str) -> Result<String, ParleyError> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| ParleyError::Provider(format!("Failed to parse response: {e}")))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ParleyError::Provider("Gemini returned an empty response".into()));
    }
    Ok(text)
}

#[async_trait::async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, context: &[Message]) -> Result<String, ParleyError> {
        let request_body = self.build_request_body(context);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ParleyError::Provider(format!("Request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| ParleyError::Provider(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(ParleyError::Provider(format!(
                "Gemini API error ({}): {}",
                status, response_text
            )));
        }

        parse_response(&response_text)
    }
}
