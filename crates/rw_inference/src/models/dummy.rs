use rw_core::{InferenceModel, Result};
use std::fmt;

/// Wraps the first words of the prompt in a paragraph. Used for offline runs.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let words: Vec<&str> = prompt.split_whitespace().take(20).collect();
        Ok(format!("<p>{}</p>", words.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new();
        let output = model.complete("You are a professional SEO blog writer.").await.unwrap();
        assert_eq!(output, "<p>You are a professional SEO blog writer.</p>");
    }
}
