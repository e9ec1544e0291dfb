//! API Lambda handler - thin router from a request payload to one document action.
//!
//! Each invocation loads configuration, parses the action, runs it to completion
//! and renders either its JSON result or a user-facing error message.

use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info};
use uuid::Uuid;

use super::helpers;
use super::request::{DocRequest, DocumentSource, parse_language, parse_model, parse_request};
use crate::ai::ChatClient;
use crate::core::config::AppConfig;
use crate::core::secrets::resolve_secrets;
use crate::errors::DocError;
use crate::features::{DocumentSummarizer, generate_document};
use crate::geo::{GoogleMapsClient, PlaceTimeResolver};
use crate::text::{DocumentFetcher, calculate_tokens, chunk_text, join_paragraphs};

pub use self::function_handler as handler;

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Returns an error only when configuration cannot be loaded; every request-level
/// failure is rendered as an error response.
#[tracing::instrument(level = "info", skip(event), fields(correlation_id = %Uuid::new_v4()))]
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e.to_string())
    })?;
    let config = resolve_secrets(config).await.map_err(|e| {
        error!("Secret resolution error: {}", e);
        Error::from(e.to_string())
    })?;

    Ok(handle_payload(&config, &event.payload).await)
}

/// Parses and runs one request, always producing a response payload.
pub async fn handle_payload(config: &AppConfig, payload: &Value) -> Value {
    let request = match parse_request(payload) {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to parse request: {}", e);
            return helpers::err_response(e.status_code(), &e.to_string());
        }
    };

    match dispatch(config, request).await {
        Ok(body) => helpers::ok_json(&body),
        Err(e) => {
            error!(error = %e, "Document action failed");
            helpers::err_response(e.status_code(), &e.user_message())
        }
    }
}

/// Runs one action and returns its JSON result.
///
/// # Errors
///
/// Returns the action's error, including `ConfigMissing` when the secret it needs is absent.
pub async fn dispatch(config: &AppConfig, request: DocRequest) -> Result<Value, DocError> {
    match request {
        DocRequest::Generate {
            keyword,
            language,
            model,
        } => {
            let language = parse_language(language.as_deref())?;
            let model = parse_model(model.as_deref(), config.default_model)?;
            let client = chat_client(config)?;
            let document = generate_document(&client, &keyword, language, model).await?;
            Ok(json!({
                "keyword": document.keyword,
                "language": document.language,
                "document": document.text,
                "markdown": document.as_markdown(),
            }))
        }
        DocRequest::Summarize {
            text,
            paragraphs,
            url,
            model,
        } => {
            let model = parse_model(model.as_deref(), config.default_model)?;
            let text = match DocumentSource::pick(text, paragraphs, url)? {
                DocumentSource::Paragraphs(paragraphs) => join_paragraphs(&paragraphs),
                DocumentSource::Link(url) => DocumentFetcher::new()?.fetch(&url).await?,
                DocumentSource::Text(text) => text,
            };
            let client = chat_client(config)?;
            let summary = DocumentSummarizer::new(&client)
                .with_chunking(config.chunk_tokens, config.chunk_threshold)
                .summarize(&text, model)
                .await?;
            info!(
                token_count = summary.token_count,
                chunked = summary.chunked,
                "Summary generated"
            );
            Ok(json!(summary))
        }
        DocRequest::Fetch { url } => {
            let text = DocumentFetcher::new()?.fetch(&url).await?;
            Ok(json!({ "text": text }))
        }
        DocRequest::Tokens { text } => Ok(json!({ "token_count": calculate_tokens(&text)? })),
        DocRequest::Chunk { text, max_tokens } => {
            let chunks = chunk_text(&text, max_tokens.unwrap_or(config.chunk_tokens))?;
            let chunks: Vec<Value> = chunks
                .into_iter()
                .map(|c| json!({ "token_count": c.token_count(), "text": c.text }))
                .collect();
            Ok(json!({ "chunks": chunks }))
        }
        DocRequest::Time { place, retries } => {
            let maps = GoogleMapsClient::new(&config.maps_base_url, config.require_maps_key()?)?;
            let resolved = PlaceTimeResolver::new(maps)
                .with_retries(retries.unwrap_or(config.time_retries))
                .resolve(&place)
                .await?;
            Ok(json!({
                "place": resolved.place,
                "local_time": resolved.formatted_local_time(),
                "time_zone_id": resolved.time_zone_id,
                "time_zone_name": resolved.time_zone_name,
            }))
        }
    }
}

fn chat_client(config: &AppConfig) -> Result<ChatClient, DocError> {
    ChatClient::new(
        config.require_openai_key()?,
        config.openai_org_id.clone(),
        &config.openai_base_url,
    )
}
