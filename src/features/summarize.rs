use serde::Serialize;
use tracing::info;

use crate::ai::{GenerationRequest, TextGenerator};
use crate::core::models::{GenerationConfig, ModelChoice};
use crate::errors::DocError;
use crate::text::{
    CHUNKED_SUMMARY_THRESHOLD, DEFAULT_MAX_CHUNK_TOKENS, TokenChunker, default_tokenizer,
    needs_chunking,
};

pub const SUMMARY_INSTRUCTION: &str = "Summarize the following document.";
pub const COMBINE_INSTRUCTION: &str =
    "Combine the following partial summaries into a single coherent summary.";
pub const SUMMARY_MAX_TOKENS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    #[serde(rename = "summary")]
    pub text: String,
    pub token_count: usize,
    pub chunked: bool,
    pub chunk_count: usize,
}

/// Summarizes a document in one call, or chunk by chunk when it exceeds the threshold.
pub struct DocumentSummarizer<'a, G> {
    generator: &'a G,
    chunk_tokens: usize,
    threshold: usize,
    sampling: GenerationConfig,
}

impl<'a, G: TextGenerator> DocumentSummarizer<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self {
            generator,
            chunk_tokens: DEFAULT_MAX_CHUNK_TOKENS,
            threshold: CHUNKED_SUMMARY_THRESHOLD,
            sampling: GenerationConfig::default(),
        }
    }

    #[must_use]
    pub fn with_chunking(mut self, chunk_tokens: usize, threshold: usize) -> Self {
        self.chunk_tokens = chunk_tokens;
        self.threshold = threshold;
        self
    }

    /// # Errors
    ///
    /// - `InvalidInput` for blank text
    /// - `TokenizationError` if the text cannot be chunked
    /// - any generation error; a failed chunk aborts the whole summary
    pub async fn summarize(&self, text: &str, model: ModelChoice) -> Result<Summary, DocError> {
        if text.trim().is_empty() {
            return Err(DocError::InvalidInput(
                "document text must not be empty".to_string(),
            ));
        }

        let tokenizer = default_tokenizer()?;
        let token_count = tokenizer.count(text);

        if !needs_chunking(token_count, self.threshold) {
            info!(token_count, "Summarizing document in a single call");
            let text = self.call(SUMMARY_INSTRUCTION, text, model).await?;
            return Ok(Summary {
                text,
                token_count,
                chunked: false,
                chunk_count: 1,
            });
        }

        let chunks = TokenChunker::new(tokenizer, self.chunk_tokens)?.chunk(text)?;
        info!(
            token_count,
            chunk_count = chunks.len(),
            "Summarizing document chunk by chunk"
        );

        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            partials.push(self.call(SUMMARY_INSTRUCTION, &chunk.text, model).await?);
        }

        let combined = self
            .call(COMBINE_INSTRUCTION, &partials.join("\n\n"), model)
            .await?;

        Ok(Summary {
            text: combined,
            token_count,
            chunked: true,
            chunk_count: chunks.len(),
        })
    }

    async fn call(
        &self,
        instruction: &str,
        text: &str,
        model: ModelChoice,
    ) -> Result<String, DocError> {
        let request = GenerationRequest::new(
            model.model_name(),
            instruction,
            text,
            SUMMARY_MAX_TOKENS,
            self.sampling,
        );
        self.generator.generate(&request).await
    }
}
