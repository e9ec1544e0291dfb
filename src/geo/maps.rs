//! Geocoding and time zone lookups against the Google Maps web services.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::errors::{DocError, Service};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneResponse {
    pub status: String,
    #[serde(default)]
    pub time_zone_id: Option<String>,
    #[serde(default)]
    pub time_zone_name: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// The two lookups behind a place-to-time resolution.
///
/// Implementations return the service's payload as-is; status interpretation
/// belongs to the caller. Transport failures are `ServiceUnavailable`, undecodable
/// payloads `InvalidResponse`.
#[async_trait]
pub trait MapsApi: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodeResponse, DocError>;

    async fn timezone(
        &self,
        location: LatLng,
        timestamp: i64,
    ) -> Result<TimezoneResponse, DocError>;
}

#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GoogleMapsClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, DocError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DocError::ServiceUnavailable {
                service: Service::Geocoding,
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        service: Service,
        path_and_query: &str,
    ) -> Result<T, DocError> {
        debug!(%service, request = %path_and_query, "Maps lookup");
        let url = format!(
            "{}/{path_and_query}&key={}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DocError::ServiceUnavailable {
                service,
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocError::ServiceUnavailable {
                service,
                reason: format!("HTTP {status}"),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DocError::InvalidResponse {
                service,
                reason: e.without_url().to_string(),
            })
    }
}

#[async_trait]
impl MapsApi for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<GeocodeResponse, DocError> {
        let path = format!("geocode/json?address={}", urlencoding::encode(address));
        self.get_json(Service::Geocoding, &path).await
    }

    async fn timezone(
        &self,
        location: LatLng,
        timestamp: i64,
    ) -> Result<TimezoneResponse, DocError> {
        let path = format!(
            "timezone/json?location={},{}&timestamp={timestamp}",
            location.lat, location.lng
        );
        self.get_json(Service::TimeZone, &path).await
    }
}
