pub mod generate;
pub mod summarize;

pub use generate::{GeneratedDocument, generate_document};
pub use summarize::{DocumentSummarizer, Summary};
