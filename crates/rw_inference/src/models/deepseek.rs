use async_trait::async_trait;
use reqwest::Client;
use rw_core::{Error, InferenceModel, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::Config;

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

pub struct DeepSeekModel {
    client: Arc<Client>,
    api_key: String,
    model: String,
    base_url: String,
}

impl DeepSeekModel {
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config.api_key.ok_or(Error::MissingCredential("DEEPSEEK_API_KEY"))?;
        Ok(Self {
            client: Arc::new(Client::new()),
            api_key,
            model: config.model_name.unwrap_or_else(|| "deepseek-chat".to_string()),
            base_url: config
                .base_url
                .unwrap_or_else(|| "https://api.deepseek.com/v1".to_string()),
        })
    }
}

impl fmt::Debug for DeepSeekModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for DeepSeekModel {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream("DeepSeek request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!("DeepSeek returned {}: {}", status, body)));
        }

        let response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::upstream("Invalid DeepSeek response", e))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Inference("DeepSeek returned no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_requires_api_key() {
        let result = DeepSeekModel::new(Config::default());
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "Missing credential: DEEPSEEK_API_KEY");

        let result = DeepSeekModel::new(Config {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        });
        assert!(result.is_ok());
    }
}
