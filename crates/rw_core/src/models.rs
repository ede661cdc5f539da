use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync {
    /// Human readable model name, used in log lines
    fn name(&self) -> &str;

    /// Run a single prompt and return the model's text output
    async fn complete(&self, prompt: &str) -> Result<String>;
}
