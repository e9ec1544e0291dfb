//! BPE tokenizer used for token counts and chunk boundaries.

use once_cell::sync::Lazy;
use tiktoken_rs::{CoreBPE, get_bpe_from_model};

use crate::errors::DocError;

/// Model whose encoding sizes chunks and drives the summarization threshold.
pub const DEFAULT_TOKENIZER_MODEL: &str = "gpt-4";

static DEFAULT_TOKENIZER: Lazy<Result<Tokenizer, String>> =
    Lazy::new(|| Tokenizer::for_model(DEFAULT_TOKENIZER_MODEL).map_err(|e| e.to_string()));

pub struct Tokenizer {
    model: String,
    bpe: CoreBPE,
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer").field("model", &self.model).finish()
    }
}

impl Tokenizer {
    /// # Errors
    ///
    /// Returns `TokenizationError` if no encoding is known for `model`.
    pub fn for_model(model: &str) -> Result<Self, DocError> {
        let bpe = get_bpe_from_model(model)
            .map_err(|e| DocError::TokenizationError(format!("no encoding for {model}: {e}")))?;
        Ok(Self {
            model: model.to_string(),
            bpe,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<usize> {
        self.bpe.encode_with_special_tokens(text)
    }

    /// # Errors
    ///
    /// Returns `TokenizationError` if the ids do not form valid UTF-8, e.g. when they
    /// start or end inside a multi-byte character.
    pub fn decode(&self, ids: &[usize]) -> Result<String, DocError> {
        self.bpe
            .decode(ids.to_vec())
            .map_err(|e| DocError::TokenizationError(format!("decode failed: {e}")))
    }

    /// Decodes `ids`, replacing bytes that do not form whole characters with U+FFFD.
    #[must_use]
    pub fn decode_lossy(&self, ids: &[usize]) -> String {
        String::from_utf8_lossy(&self.bpe._decode_native(ids)).into_owned()
    }

    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// Process-wide tokenizer for [`DEFAULT_TOKENIZER_MODEL`], built on first use.
///
/// # Errors
///
/// Returns `TokenizationError` if the bundled encoding could not be loaded.
pub fn default_tokenizer() -> Result<&'static Tokenizer, DocError> {
    DEFAULT_TOKENIZER
        .as_ref()
        .map_err(|e| DocError::TokenizationError(e.clone()))
}

/// Number of tokens `text` encodes to with the default tokenizer.
///
/// # Errors
///
/// Returns `TokenizationError` if the tokenizer is unavailable.
pub fn calculate_tokens(text: &str) -> Result<usize, DocError> {
    Ok(default_tokenizer()?.count(text))
}
