use std::env;
use std::str::FromStr;

use crate::core::models::ModelChoice;
use crate::errors::DocError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
pub const DEFAULT_CHUNK_TOKENS: usize = 2000;
pub const DEFAULT_CHUNK_THRESHOLD: usize = 8192;
pub const DEFAULT_TIME_RETRIES: u32 = 2;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub openai_org_id: Option<String>,
    pub openai_base_url: String,
    pub maps_api_key: Option<String>,
    pub maps_base_url: String,
    pub default_model: ModelChoice,
    pub chunk_tokens: usize,
    pub chunk_threshold: usize,
    pub time_retries: u32,
    /// SSM parameter names consulted when the matching key is absent.
    pub openai_api_key_param: Option<String>,
    pub maps_api_key_param: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_org_id: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            maps_api_key: None,
            maps_base_url: DEFAULT_MAPS_BASE_URL.to_string(),
            default_model: ModelChoice::default(),
            chunk_tokens: DEFAULT_CHUNK_TOKENS,
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            time_retries: DEFAULT_TIME_RETRIES,
            openai_api_key_param: None,
            maps_api_key_param: None,
        }
    }
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigMissing` if a numeric or model variable is set but unparsable.
    pub fn from_env() -> Result<Self, DocError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` if a numeric or model variable is set but unparsable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DocError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let default_model = match non_empty("DOCDESK_MODEL") {
            Some(raw) => raw
                .parse::<ModelChoice>()
                .map_err(|e| DocError::ConfigMissing(format!("DOCDESK_MODEL: {e}")))?,
            None => defaults.default_model,
        };

        let chunk_tokens = parse_or(&non_empty, "DOCDESK_CHUNK_TOKENS", defaults.chunk_tokens)?;
        if chunk_tokens == 0 {
            return Err(DocError::ConfigMissing(
                "DOCDESK_CHUNK_TOKENS: must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_org_id: non_empty("OPENAI_ORG_ID"),
            openai_base_url: non_empty("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            maps_api_key: non_empty("GOOGLE_MAPS_API_KEY")
                .or_else(|| non_empty("GOOGLE_TIME_ZONE_API_KEY")),
            maps_base_url: non_empty("GOOGLE_MAPS_BASE_URL").unwrap_or(defaults.maps_base_url),
            default_model,
            chunk_tokens,
            chunk_threshold: parse_or(
                &non_empty,
                "DOCDESK_CHUNK_THRESHOLD",
                defaults.chunk_threshold,
            )?,
            time_retries: parse_or(&non_empty, "DOCDESK_TIME_RETRIES", defaults.time_retries)?,
            openai_api_key_param: non_empty("OPENAI_API_KEY_PARAM"),
            maps_api_key_param: non_empty("GOOGLE_MAPS_API_KEY_PARAM"),
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigMissing` when no text-generation key is configured.
    pub fn require_openai_key(&self) -> Result<&str, DocError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| DocError::ConfigMissing("OPENAI_API_KEY".to_string()))
    }

    /// # Errors
    ///
    /// Returns `ConfigMissing` when no geocoding/time zone key is configured.
    pub fn require_maps_key(&self) -> Result<&str, DocError> {
        self.maps_api_key
            .as_deref()
            .ok_or_else(|| DocError::ConfigMissing("GOOGLE_MAPS_API_KEY".to_string()))
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, DocError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| DocError::ConfigMissing(format!("{key}: {e}"))),
        None => Ok(default),
    }
}
