//! Tokenization, chunking and document input

pub mod chunker;
pub mod document;
pub mod tokenizer;

pub use chunker::{
    CHUNKED_SUMMARY_THRESHOLD, DEFAULT_MAX_CHUNK_TOKENS, TextChunk, TokenChunker, chunk_text,
    needs_chunking,
};
pub use document::{DocumentFetcher, join_paragraphs};
pub use tokenizer::{Tokenizer, calculate_tokens, default_tokenizer};
