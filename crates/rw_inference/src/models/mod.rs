use rw_core::{Error, InferenceModel, Result};
use std::str::FromStr;
use std::sync::Arc;

use crate::Config;

pub mod deepseek;
pub mod dummy;
pub mod openai;

pub use deepseek::DeepSeekModel;
pub use dummy::DummyModel;
pub use openai::OpenAiModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModelKind {
    Openai,
    Deepseek,
    /// Offline stand-in; echoes the start of the prompt
    Dummy,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ModelKind::Openai),
            "deepseek" => Ok(ModelKind::Deepseek),
            "dummy" => Ok(ModelKind::Dummy),
            other => Err(Error::Config(format!("Unknown model: {}", other))),
        }
    }
}

pub fn create_model(kind: ModelKind, config: Config) -> Result<Arc<dyn InferenceModel>> {
    let model: Arc<dyn InferenceModel> = match kind {
        ModelKind::Openai => Arc::new(OpenAiModel::new(config)?),
        ModelKind::Deepseek => Arc::new(DeepSeekModel::new(config)?),
        ModelKind::Dummy => Arc::new(DummyModel::new()),
    };
    tracing::debug!("Created inference model {}", model.name());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_from_str() {
        assert_eq!("OpenAI".parse::<ModelKind>().unwrap(), ModelKind::Openai);
        assert_eq!("deepseek".parse::<ModelKind>().unwrap(), ModelKind::Deepseek);
        assert!("ollama".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_remote_models_require_api_key() {
        let result = create_model(ModelKind::Openai, Config::default());
        assert!(matches!(result, Err(Error::MissingCredential(_))));
        let result = create_model(ModelKind::Deepseek, Config::default());
        assert!(matches!(result, Err(Error::MissingCredential(_))));
    }

    #[test]
    fn test_dummy_needs_no_key() {
        let model = create_model(ModelKind::Dummy, Config::default()).unwrap();
        assert_eq!(model.name(), "Dummy");
    }
}
