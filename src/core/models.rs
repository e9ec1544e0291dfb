use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sampling settings shared by every generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            top_p: 0.95,
        }
    }
}

/// Which chat model backs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    /// Higher price, better output, slower.
    #[default]
    Flagship,
    /// Lower price, weaker output, faster.
    Mini,
}

impl ModelChoice {
    #[must_use]
    pub fn model_name(self) -> &'static str {
        match self {
            ModelChoice::Flagship => "gpt-4",
            ModelChoice::Mini => "gpt-4o-mini",
        }
    }
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flagship" | "gpt-4" | "gpt4" => Ok(ModelChoice::Flagship),
            "mini" | "gpt-4o-mini" => Ok(ModelChoice::Mini),
            other => Err(format!("unknown model choice: {other}")),
        }
    }
}

/// Output language for generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLanguage {
    #[default]
    Korean,
    English,
    Japanese,
    Chinese,
    Russian,
    French,
    German,
    Italian,
}

impl OutputLanguage {
    pub const ALL: [OutputLanguage; 8] = [
        OutputLanguage::Korean,
        OutputLanguage::English,
        OutputLanguage::Japanese,
        OutputLanguage::Chinese,
        OutputLanguage::Russian,
        OutputLanguage::French,
        OutputLanguage::German,
        OutputLanguage::Italian,
    ];

    /// System instruction asking for a ~2,000 character document, written in the target language.
    #[must_use]
    pub fn generation_instruction(self) -> &'static str {
        match self {
            OutputLanguage::Korean => "이 키워드에 대한 2,000자 길이의 문서를 한국어로 생성해줘.",
            OutputLanguage::English => {
                "Generate a 2,000-character document for this keyword in English."
            }
            OutputLanguage::Japanese => {
                "このキーワードについて2,000文字の日本語のドキュメントを作成してください。"
            }
            OutputLanguage::Chinese => "请用中文生成关于这个关键词的2,000字文档。",
            OutputLanguage::Russian => {
                "Создайте документ на 2,000 символов по этому ключевому слову на русском языке."
            }
            OutputLanguage::French => {
                "Générez un document de 2,000 caractères pour ce mot-clé en français."
            }
            OutputLanguage::German => {
                "Erstellen Sie ein 2,000 Zeichen langes Dokument für dieses Schlüsselwort auf Deutsch."
            }
            OutputLanguage::Italian => {
                "Genera un documento di 2,000 caratteri per questa parola chiave in italiano."
            }
        }
    }

    fn code(self) -> &'static str {
        match self {
            OutputLanguage::Korean => "ko",
            OutputLanguage::English => "en",
            OutputLanguage::Japanese => "ja",
            OutputLanguage::Chinese => "zh",
            OutputLanguage::Russian => "ru",
            OutputLanguage::French => "fr",
            OutputLanguage::German => "de",
            OutputLanguage::Italian => "it",
        }
    }
}

impl fmt::Display for OutputLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OutputLanguage {
    type Err = String;

    /// Accepts ISO 639-1 codes or English language names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        OutputLanguage::ALL
            .into_iter()
            .find(|lang| {
                lang.code() == wanted || format!("{lang:?}").to_ascii_lowercase() == wanted
            })
            .ok_or_else(|| format!("unsupported output language: {}", s.trim()))
    }
}
