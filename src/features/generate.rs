use tracing::info;

use crate::ai::{GenerationRequest, TextGenerator};
use crate::core::models::{GenerationConfig, ModelChoice, OutputLanguage};
use crate::errors::DocError;

pub const GENERATION_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub keyword: String,
    pub language: OutputLanguage,
    pub text: String,
}

impl GeneratedDocument {
    /// Markdown rendition offered for copying.
    #[must_use]
    pub fn as_markdown(&self) -> String {
        format!("# Generated Document\n\n{}", self.text)
    }
}

/// Writes a short document about a keyword in the chosen language.
///
/// # Errors
///
/// Returns `InvalidInput` for a blank keyword, otherwise whatever the generator reports.
pub async fn generate_document<G: TextGenerator>(
    generator: &G,
    keyword: &str,
    language: OutputLanguage,
    model: ModelChoice,
) -> Result<GeneratedDocument, DocError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(DocError::InvalidInput("keyword must not be empty".to_string()));
    }

    info!(%language, model = model.model_name(), "Generating document");
    let request = GenerationRequest::new(
        model.model_name(),
        language.generation_instruction(),
        keyword,
        GENERATION_MAX_TOKENS,
        GenerationConfig::default(),
    );
    let text = generator.generate(&request).await?;

    Ok(GeneratedDocument {
        keyword: keyword.to_string(),
        language,
        text: text.trim().to_string(),
    })
}
