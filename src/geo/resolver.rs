//! Place name → current local time, with bounded retry.
//!
//! One attempt runs `Geocoding → TimezoneLookup → Resolved`. A transient failure
//! (see [`DocError::is_transient`]) sends the call back to `Geocoding` after a fixed
//! backoff until the retry budget is spent, at which point the call is `Failed`.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, info, warn};

use super::maps::{GeocodeResponse, LatLng, MapsApi, TimezoneResponse};
use crate::errors::{DocError, Service};

pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    Start,
    Geocoding,
    TimezoneLookup,
    Resolved,
    Retry,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ResolvedTime {
    pub place: String,
    pub local_time: DateTime<Tz>,
    pub time_zone_id: String,
    pub time_zone_name: String,
}

impl ResolvedTime {
    /// `YYYY-MM-DD HH:MM:SS` in the resolved zone.
    #[must_use]
    pub fn formatted_local_time(&self) -> String {
        self.local_time.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

pub struct PlaceTimeResolver<M> {
    maps: M,
    retries: u32,
    backoff: Duration,
}

impl<M: MapsApi> PlaceTimeResolver<M> {
    pub fn new(maps: M) -> Self {
        Self {
            maps,
            retries: DEFAULT_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn maps(&self) -> &M {
        &self.maps
    }

    /// Resolves `place` against the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt, naming the failing step.
    pub async fn resolve(&self, place: &str) -> Result<ResolvedTime, DocError> {
        self.resolve_with_clock(place, Utc::now).await
    }

    /// Resolves `place` as if every attempt ran at `now`.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt, naming the failing step.
    pub async fn resolve_at(
        &self,
        place: &str,
        now: DateTime<Utc>,
    ) -> Result<ResolvedTime, DocError> {
        self.resolve_with_clock(place, || now).await
    }

    async fn resolve_with_clock<C>(&self, place: &str, clock: C) -> Result<ResolvedTime, DocError>
    where
        C: Fn() -> DateTime<Utc>,
    {
        let place = place.trim();
        if place.is_empty() {
            return Err(DocError::InvalidInput("place must not be empty".to_string()));
        }
        debug!(stage = ?ResolveStage::Start, %place, retries = self.retries);

        let attempts = AtomicU32::new(0);
        let strategy = FixedInterval::new(self.backoff).take(self.retries as usize);

        let result = RetryIf::start(
            strategy,
            || {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                if attempt > 0 {
                    info!(stage = ?ResolveStage::Retry, %place, attempt, "Retrying place time lookup");
                }
                self.attempt(place, clock())
            },
            |e: &DocError| {
                let transient = e.is_transient();
                if transient {
                    warn!(%place, error = %e, "Transient place time failure");
                }
                transient
            },
        )
        .await;

        match &result {
            Ok(resolved) => info!(
                stage = ?ResolveStage::Resolved,
                %place,
                time_zone_id = %resolved.time_zone_id,
                attempts = attempts.load(Ordering::SeqCst),
                "Resolved place time"
            ),
            Err(e) => warn!(
                stage = ?ResolveStage::Failed,
                %place,
                error = %e,
                attempts = attempts.load(Ordering::SeqCst),
                "Place time lookup failed"
            ),
        }
        result
    }

    async fn attempt(&self, place: &str, now: DateTime<Utc>) -> Result<ResolvedTime, DocError> {
        debug!(stage = ?ResolveStage::Geocoding, %place);
        let location = location_from(self.maps.geocode(place).await?)?;

        debug!(stage = ?ResolveStage::TimezoneLookup, lat = location.lat, lng = location.lng);
        let (time_zone_id, time_zone_name) =
            zone_from(self.maps.timezone(location, now.timestamp()).await?)?;

        let zone: Tz = time_zone_id
            .parse()
            .map_err(|e| DocError::InvalidResponse {
                service: Service::TimeZone,
                reason: format!("unknown time zone id {time_zone_id}: {e}"),
            })?;

        Ok(ResolvedTime {
            place: place.to_string(),
            local_time: now.with_timezone(&zone),
            time_zone_id,
            time_zone_name,
        })
    }
}

fn location_from(response: GeocodeResponse) -> Result<LatLng, DocError> {
    if response.status != "OK" {
        return Err(DocError::BadStatus {
            service: Service::Geocoding,
            status: response.status,
            message: response.error_message,
        });
    }
    response
        .results
        .first()
        .map(|r| r.geometry.location)
        .ok_or_else(|| DocError::InvalidResponse {
            service: Service::Geocoding,
            reason: "status OK without results".to_string(),
        })
}

fn zone_from(response: TimezoneResponse) -> Result<(String, String), DocError> {
    if response.status != "OK" {
        return Err(DocError::BadStatus {
            service: Service::TimeZone,
            status: response.status,
            message: response.error_message,
        });
    }
    match (response.time_zone_id, response.time_zone_name) {
        (Some(id), Some(name)) => Ok((id, name)),
        _ => Err(DocError::InvalidResponse {
            service: Service::TimeZone,
            reason: "status OK without timeZoneId/timeZoneName".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::maps::{GeocodeResult, Geometry};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Replays scripted outcomes; once a script runs dry the last entry repeats.
    struct ScriptedMaps {
        geocodes: Mutex<VecDeque<Result<GeocodeResponse, DocError>>>,
        zones: Mutex<VecDeque<Result<TimezoneResponse, DocError>>>,
        geocode_calls: AtomicUsize,
        timezone_calls: AtomicUsize,
    }

    impl ScriptedMaps {
        fn new(
            geocodes: Vec<Result<GeocodeResponse, DocError>>,
            zones: Vec<Result<TimezoneResponse, DocError>>,
        ) -> Self {
            Self {
                geocodes: Mutex::new(geocodes.into()),
                zones: Mutex::new(zones.into()),
                geocode_calls: AtomicUsize::new(0),
                timezone_calls: AtomicUsize::new(0),
            }
        }
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T, DocError>>>) -> Result<T, DocError>
    where
        T: Clone,
    {
        let mut queue = queue.lock().unwrap();
        if queue.len() > 1 {
            return queue.pop_front().unwrap();
        }
        match queue.front().unwrap() {
            Ok(v) => Ok(v.clone()),
            Err(_) => Err(transport_error()),
        }
    }

    #[async_trait]
    impl MapsApi for ScriptedMaps {
        async fn geocode(&self, _address: &str) -> Result<GeocodeResponse, DocError> {
            self.geocode_calls.fetch_add(1, Ordering::SeqCst);
            next(&self.geocodes)
        }

        async fn timezone(
            &self,
            _location: LatLng,
            _timestamp: i64,
        ) -> Result<TimezoneResponse, DocError> {
            self.timezone_calls.fetch_add(1, Ordering::SeqCst);
            next(&self.zones)
        }
    }

    fn transport_error() -> DocError {
        DocError::ServiceUnavailable {
            service: Service::Geocoding,
            reason: "connection reset".to_string(),
        }
    }

    fn seoul_geocode() -> GeocodeResponse {
        GeocodeResponse {
            status: "OK".to_string(),
            results: vec![GeocodeResult {
                geometry: Geometry {
                    location: LatLng {
                        lat: 37.5665,
                        lng: 126.978,
                    },
                },
            }],
            error_message: None,
        }
    }

    fn seoul_zone() -> TimezoneResponse {
        TimezoneResponse {
            status: "OK".to_string(),
            time_zone_id: Some("Asia/Seoul".to_string()),
            time_zone_name: Some("Korean Standard Time".to_string()),
            error_message: None,
        }
    }

    fn status_only_geocode(status: &str) -> GeocodeResponse {
        GeocodeResponse {
            status: status.to_string(),
            results: Vec::new(),
            error_message: Some("nope".to_string()),
        }
    }

    fn resolver(maps: ScriptedMaps, retries: u32) -> PlaceTimeResolver<ScriptedMaps> {
        PlaceTimeResolver::new(maps)
            .with_retries(retries)
            .with_backoff(Duration::from_millis(1))
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 3, 4, 5).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_local_time_in_returned_zone() {
        let r = resolver(
            ScriptedMaps::new(vec![Ok(seoul_geocode())], vec![Ok(seoul_zone())]),
            2,
        );
        let resolved = r.resolve_at("Seoul, South Korea", fixed_now()).await.unwrap();

        assert_eq!(resolved.time_zone_id, "Asia/Seoul");
        assert_eq!(resolved.time_zone_name, "Korean Standard Time");
        assert_eq!(resolved.local_time.timezone(), chrono_tz::Asia::Seoul);
        assert_eq!(resolved.formatted_local_time(), "2024-03-01 12:04:05");
    }

    #[tokio::test]
    async fn test_geocode_bad_status_skips_timezone_call() {
        let r = resolver(
            ScriptedMaps::new(
                vec![Ok(status_only_geocode("ZERO_RESULTS"))],
                vec![Ok(seoul_zone())],
            ),
            2,
        );
        let err = r.resolve_at("Atlantis", fixed_now()).await.unwrap_err();

        match err {
            DocError::BadStatus {
                service: Service::Geocoding,
                status,
                message,
            } => {
                assert_eq!(status, "ZERO_RESULTS");
                assert_eq!(message.as_deref(), Some("nope"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(r.maps().geocode_calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.maps().timezone_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timezone_bad_status_is_reported() {
        let zone = TimezoneResponse {
            status: "INVALID_REQUEST".to_string(),
            time_zone_id: None,
            time_zone_name: None,
            error_message: None,
        };
        let r = resolver(
            ScriptedMaps::new(vec![Ok(seoul_geocode())], vec![Ok(zone)]),
            2,
        );
        let err = r.resolve_at("Seoul", fixed_now()).await.unwrap_err();
        assert!(matches!(
            err,
            DocError::BadStatus {
                service: Service::TimeZone,
                ..
            }
        ));
        assert_eq!(r.maps().timezone_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retries_fails_on_first_transport_error() {
        let r = resolver(
            ScriptedMaps::new(vec![Err(transport_error())], vec![Ok(seoul_zone())]),
            0,
        );
        let err = r.resolve_at("Seoul", fixed_now()).await.unwrap_err();
        assert!(matches!(err, DocError::ServiceUnavailable { .. }));
        assert_eq!(r.maps().geocode_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_two_transient_failures_then_success() {
        let r = resolver(
            ScriptedMaps::new(
                vec![
                    Err(transport_error()),
                    Err(transport_error()),
                    Ok(seoul_geocode()),
                ],
                vec![Ok(seoul_zone())],
            ),
            2,
        );
        let resolved = r.resolve_at("Seoul", fixed_now()).await.unwrap();
        assert_eq!(resolved.time_zone_id, "Asia/Seoul");
        // One initial attempt plus exactly two retries.
        assert_eq!(r.maps().geocode_calls.load(Ordering::SeqCst), 3);
        assert_eq!(r.maps().timezone_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_reports_last_error() {
        let r = resolver(
            ScriptedMaps::new(vec![Err(transport_error())], vec![Ok(seoul_zone())]),
            2,
        );
        assert!(r.resolve_at("Seoul", fixed_now()).await.is_err());
        assert_eq!(r.maps().geocode_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transient_status_is_retried() {
        let r = resolver(
            ScriptedMaps::new(
                vec![Ok(status_only_geocode("UNKNOWN_ERROR")), Ok(seoul_geocode())],
                vec![Ok(seoul_zone())],
            ),
            1,
        );
        assert!(r.resolve_at("Seoul", fixed_now()).await.is_ok());
        assert_eq!(r.maps().geocode_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_zone_id_is_invalid_response() {
        let mut zone = seoul_zone();
        zone.time_zone_id = Some("Mars/Olympus_Mons".to_string());
        let r = resolver(
            ScriptedMaps::new(vec![Ok(seoul_geocode())], vec![Ok(zone)]),
            0,
        );
        let err = r.resolve_at("Seoul", fixed_now()).await.unwrap_err();
        assert!(matches!(
            err,
            DocError::InvalidResponse {
                service: Service::TimeZone,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_blank_place_is_rejected_without_lookup() {
        let r = resolver(
            ScriptedMaps::new(vec![Ok(seoul_geocode())], vec![Ok(seoul_zone())]),
            2,
        );
        assert!(matches!(
            r.resolve("   ").await,
            Err(DocError::InvalidInput(_))
        ));
        assert_eq!(r.maps().geocode_calls.load(Ordering::SeqCst), 0);
    }
}
