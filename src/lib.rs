/// docdesk - document generation, summarization and place-time lookups behind one Lambda.
///
/// # Architecture
///
/// Every action is a single request-scoped sequence of outbound calls:
/// - `features::generate` writes a short document for a keyword via a chat model
/// - `features::summarize` summarizes a document, chunking it by token budget when long
/// - `text` tokenizes and chunks text and loads linked or uploaded documents
/// - `geo` resolves a place name to its current local time (geocoding, then time zone)
/// - `api` routes Lambda payloads to those actions and renders the results
///
/// The system uses:
/// - AWS Lambda for serverless execution, SSM Parameter Store for secrets
/// - tiktoken-rs for exact token counts
/// - reqwest for the `OpenAI` and Google Maps web services
/// - Tokio for async runtime, tokio-retry for the bounded lookup retry
///
/// # Example
///
/// ```no_run
/// use docdesk::geo::{GoogleMapsClient, PlaceTimeResolver};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     docdesk::setup_logging();
///
///     let maps = GoogleMapsClient::new("https://maps.googleapis.com/maps/api", "dummy_key")?;
///     let resolved = PlaceTimeResolver::new(maps).resolve("Seoul, South Korea").await?;
///     println!(
///         "{}: {} ({})",
///         resolved.place,
///         resolved.formatted_local_time(),
///         resolved.time_zone_name
///     );
///
///     let chunks = docdesk::text::chunk_text("A long document...", 2000)?;
///     println!("{} chunk(s)", chunks.len());
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod api;
pub mod core;
pub mod errors;
pub mod features;
pub mod geo;
pub mod text;

pub use errors::{DocError, Service};

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. Calling it more than once is harmless.
///
/// # Example
///
/// ```
/// docdesk::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
