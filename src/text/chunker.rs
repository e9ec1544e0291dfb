//! Token-budgeted chunking of long documents.
//!
//! A text is encoded once, then its ids are cut into consecutive runs of at most
//! `max_tokens` ids. Concatenating every chunk's ids reproduces the full encoding.

use tracing::debug;

use super::tokenizer::{Tokenizer, default_tokenizer};
use crate::errors::DocError;

pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 2000;

/// Token count above which a document is summarized chunk by chunk.
pub const CHUNKED_SUMMARY_THRESHOLD: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub text: String,
    pub token_ids: Vec<usize>,
}

impl TextChunk {
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.token_ids.len()
    }
}

#[must_use]
pub fn needs_chunking(token_count: usize, threshold: usize) -> bool {
    token_count > threshold
}

pub struct TokenChunker<'a> {
    tokenizer: &'a Tokenizer,
    max_tokens: usize,
}

impl<'a> TokenChunker<'a> {
    /// # Errors
    ///
    /// Returns `InvalidInput` if `max_tokens` is zero.
    pub fn new(tokenizer: &'a Tokenizer, max_tokens: usize) -> Result<Self, DocError> {
        if max_tokens == 0 {
            return Err(DocError::InvalidInput(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            tokenizer,
            max_tokens,
        })
    }

    /// Splits `text` into chunks of at most `max_tokens` tokens, in order.
    ///
    /// Empty text yields no chunks. The last chunk may be shorter and is never merged
    /// into its predecessor. When the budget is smaller than the ids of one character,
    /// the chunk text holds U+FFFD in place of the partial character; the ids are kept.
    ///
    /// # Errors
    ///
    /// Returns `TokenizationError` if the default tokenizer is unavailable.
    pub fn chunk(&self, text: &str) -> Result<Vec<TextChunk>, DocError> {
        let ids = self.tokenizer.encode(text);
        let mut chunks = Vec::with_capacity(ids.len() / self.max_tokens + 1);
        let mut buffer: Vec<usize> = Vec::with_capacity(self.max_tokens);

        for id in ids {
            buffer.push(id);
            if buffer.len() == self.max_tokens {
                buffer = self.emit_full(buffer, &mut chunks);
            }
        }

        if !buffer.is_empty() {
            let text = self
                .tokenizer
                .decode(&buffer)
                .unwrap_or_else(|_| self.tokenizer.decode_lossy(&buffer));
            chunks.push(TextChunk {
                text,
                token_ids: buffer,
            });
        }

        debug!(
            chunk_count = chunks.len(),
            max_tokens = self.max_tokens,
            "Chunked text"
        );
        Ok(chunks)
    }

    /// Emits the longest decodable head of a full buffer and returns the carried tail.
    ///
    /// A cut inside a multi-byte character leaves invalid UTF-8 on both sides, so the
    /// cut moves back until the head decodes; the tail starts the next chunk. If no
    /// head decodes, the whole buffer is emitted with a lossy decode.
    fn emit_full(&self, mut buffer: Vec<usize>, chunks: &mut Vec<TextChunk>) -> Vec<usize> {
        for cut in (1..=buffer.len()).rev() {
            if let Ok(text) = self.tokenizer.decode(&buffer[..cut]) {
                let tail = buffer.split_off(cut);
                chunks.push(TextChunk {
                    text,
                    token_ids: buffer,
                });
                return tail;
            }
        }
        debug!(
            max_tokens = self.max_tokens,
            "No character boundary in chunk, decoding lossily"
        );
        chunks.push(TextChunk {
            text: self.tokenizer.decode_lossy(&buffer),
            token_ids: buffer,
        });
        Vec::with_capacity(self.max_tokens)
    }
}

/// Chunks `text` with the default tokenizer.
///
/// # Errors
///
/// See [`TokenChunker::chunk`]; also `InvalidInput` for a zero budget.
pub fn chunk_text(text: &str, max_tokens: usize) -> Result<Vec<TextChunk>, DocError> {
    TokenChunker::new(default_tokenizer()?, max_tokens)?.chunk(text)
}
