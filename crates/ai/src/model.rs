//! Text-completion collaborator boundary.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AiError;

/// A request/response text completion model.
///
/// Its output is opaque and untrusted; callers run it through
/// [`crate::extract`] before acting on it.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

/// Model that always answers with the same completion (tests/dev).
///
/// Prompts it receives are recorded so tests can inspect them.
#[derive(Debug)]
pub struct FixedResponseModel {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl FixedResponseModel {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for FixedResponseModel {
    fn name(&self) -> &str {
        "fixed-response"
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_model_records_prompts() {
        let model = FixedResponseModel::new("[]");
        let out = model.complete("hola").await.unwrap();
        assert_eq!(out, "[]");
        assert_eq!(model.prompts(), vec!["hola".to_string()]);
    }
}
