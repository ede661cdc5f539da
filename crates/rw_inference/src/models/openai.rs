use async_trait::async_trait;
use reqwest::Client;
use rw_core::{Error, InferenceModel, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::Config;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1-mini";

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    text: Option<String>,
}

/// Client for the OpenAI Responses API.
pub struct OpenAiModel {
    client: Arc<Client>,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiModel {
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config.api_key.ok_or(Error::MissingCredential("OPENAI_API_KEY"))?;
        Ok(Self {
            client: Arc::new(Client::new()),
            api_key,
            model: config.model_name.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: config.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// First text block of the response, which is the assistant's message.
fn output_text(response: ResponsesResponse) -> Result<String> {
    response
        .output
        .into_iter()
        .flat_map(|item| item.content)
        .find_map(|content| content.text)
        .ok_or_else(|| Error::Inference("OpenAI response contained no text output".to_string()))
}

#[async_trait]
impl InferenceModel for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ResponsesRequest {
            model: &self.model,
            input: prompt,
        };

        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream("OpenAI request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!("OpenAI returned {}: {}", status, body)));
        }

        let response = response
            .json::<ResponsesResponse>()
            .await
            .map_err(|e| Error::upstream("Invalid OpenAI response", e))?;
        output_text(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_text_takes_first_text_block() {
        let json = r#"{
            "id": "resp_1",
            "output": [
                { "type": "reasoning", "content": [] },
                { "type": "message", "content": [
                    { "type": "output_text", "text": "<h1>Rewritten</h1>" },
                    { "type": "output_text", "text": "ignored" }
                ]}
            ]
        }"#;
        let response: ResponsesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(output_text(response).unwrap(), "<h1>Rewritten</h1>");
    }

    #[test]
    fn test_output_text_missing() {
        let response: ResponsesResponse = serde_json::from_str(r#"{"output": []}"#).unwrap();
        assert!(matches!(output_text(response), Err(Error::Inference(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let model = OpenAiModel::new(Config {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        })
        .unwrap();
        let debug = format!("{:?}", model);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("gpt-4.1-mini"));
    }
}
