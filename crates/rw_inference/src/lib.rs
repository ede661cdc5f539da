use rw_core::Config as AppConfig;

pub mod models;

pub use models::{create_model, ModelKind};
pub use rw_core::InferenceModel;

/// Everything needed to construct one of the LLM clients.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
}

impl Config {
    /// Picks the credential belonging to `kind`'s provider.
    pub fn from_app_config(config: &AppConfig, kind: ModelKind) -> Self {
        let api_key = match kind {
            ModelKind::Deepseek => config.deepseek_api_key.clone(),
            ModelKind::Openai | ModelKind::Dummy => config.llm_api_key.clone(),
        };
        Self {
            api_key,
            model_name: None,
            base_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deepseek_never_gets_openai_key() {
        let app = AppConfig {
            llm_api_key: Some("sk-openai".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(Config::from_app_config(&app, ModelKind::Deepseek).api_key, None);
        assert_eq!(
            Config::from_app_config(&app, ModelKind::Openai).api_key.as_deref(),
            Some("sk-openai")
        );

        let app = AppConfig {
            deepseek_api_key: Some("ds-key".to_string()),
            ..app
        };
        assert_eq!(
            Config::from_app_config(&app, ModelKind::Deepseek).api_key.as_deref(),
            Some("ds-key")
        );
    }
}
