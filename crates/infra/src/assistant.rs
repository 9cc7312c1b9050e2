//! Voice processor: utterance → model → extractor → batch executor.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use despensa_ai::{AiError, CommandExtractor, LanguageModel, build_prompt};
use despensa_events::{EventBus, InventoryEvent};

use crate::batch::{BatchError, BatchExecutor, BatchReport};

/// Reported when the model output contains no usable command.
pub const NOT_UNDERSTOOD: &str =
    "No se pudieron entender los comandos. Intenta ser más específico.";

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("model call failed: {0}")]
    Model(#[from] AiError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

pub struct VoiceProcessor<B> {
    model: Arc<dyn LanguageModel>,
    extractor: CommandExtractor,
    executor: BatchExecutor<B>,
}

impl<B> VoiceProcessor<B>
where
    B: EventBus<InventoryEvent>,
{
    pub fn new(
        model: Arc<dyn LanguageModel>,
        extractor: CommandExtractor,
        executor: BatchExecutor<B>,
    ) -> Self {
        Self {
            model,
            extractor,
            executor,
        }
    }

    /// Turn one dictated utterance into inventory changes.
    ///
    /// The model is called exactly once, before any command is interpreted.
    /// `context_hint` is advisory and only shapes the prompt.
    pub async fn process(
        &self,
        text: &str,
        context_hint: Option<&str>,
    ) -> Result<BatchReport, ProcessError> {
        let prompt = build_prompt(text, context_hint);
        let raw = self.model.complete(&prompt).await.map_err(|err| {
            tracing::warn!(model = self.model.name(), error = %err, "model call failed");
            err
        })?;
        tracing::debug!(model = self.model.name(), bytes = raw.len(), "model responded");

        Ok(self.execute_raw(&raw).await?)
    }

    /// Extract and execute commands from raw model output.
    pub async fn execute_raw(&self, raw: &str) -> Result<BatchReport, BatchError> {
        let commands = self.extractor.extract(raw);
        if commands.is_empty() {
            tracing::info!("model output contained no usable commands");
            let mut report = BatchReport::new(Uuid::now_v7());
            report.errors.push(NOT_UNDERSTOOD.to_string());
            return Ok(report);
        }

        self.executor.execute(&commands).await
    }
}
