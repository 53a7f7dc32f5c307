//! Question answering: augment a question, then generate from the prompt.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::augment::Augmenter;
use crate::document::{AugmentedResponse, RetrievalResult};
use crate::error::Result;
use crate::llm::LanguageModel;
use crate::retriever::RetrievalStatus;

/// A generated answer together with the evidence it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    /// Wall-clock seconds spent, rounded to milliseconds.
    pub processing_time: f64,
    pub context_used: bool,
    pub context_chunks: RetrievalResult,
    pub num_context_chunks: usize,
    pub retrieval_status: RetrievalStatus,
}

/// Pairs an [`Augmenter`] with a [`LanguageModel`].
#[derive(Clone)]
pub struct AnswerService {
    augmenter: Arc<Augmenter>,
    model: Arc<dyn LanguageModel>,
}

impl AnswerService {
    pub fn new(augmenter: Arc<Augmenter>, model: Arc<dyn LanguageModel>) -> Self {
        Self { augmenter, model }
    }

    pub fn augmenter(&self) -> &Arc<Augmenter> {
        &self.augmenter
    }

    pub fn model(&self) -> &Arc<dyn LanguageModel> {
        &self.model
    }

    /// Augment `question` and send the prompt to the model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`](crate::RagError::InvalidQuery) for
    /// a blank question and
    /// [`RagError::GenerationFailure`](crate::RagError::GenerationFailure)
    /// when the model call fails. Retrieval outages do not fail the call.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let started = Instant::now();

        let AugmentedResponse { context_chunks, rag_prompt, retrieval_status, .. } =
            self.augmenter.augment(question).await?;

        let answer = self.model.generate(&rag_prompt).await.map_err(|e| {
            error!(model = self.model.name(), error = %e, "generation failed");
            e
        })?;

        let processing_time = (started.elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
        info!(
            model = self.model.name(),
            num_context_chunks = context_chunks.len(),
            processing_time,
            "answered question"
        );

        Ok(Answer {
            question: question.to_string(),
            answer,
            processing_time,
            context_used: !context_chunks.is_empty(),
            num_context_chunks: context_chunks.len(),
            context_chunks,
            retrieval_status,
        })
    }
}
