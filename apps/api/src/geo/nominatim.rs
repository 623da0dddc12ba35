//! Nominatim (OpenStreetMap) forward geocoder.
//!
//! Pacing is not handled here: callers go through `CoordinateResolver`, which
//! enforces the provider's one-request-per-second policy and caches results.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::geo::{GeoPoint, GeocodeError, Geocoder};

const MAX_ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    query_suffix: String,
}

impl NominatimGeocoder {
    pub fn new(endpoint: String, user_agent: &str, query_suffix: String) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            query_suffix,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, GeocodeError> {
        Self::new(
            config.nominatim_url.clone(),
            &config.geocoder_user_agent,
            config.geocode_query_suffix.clone(),
        )
    }

    fn query_for(&self, zone: &str) -> String {
        build_query(zone, &self.query_suffix)
    }
}

fn build_query(zone: &str, suffix: &str) -> String {
    let suffix = suffix.trim();
    if suffix.is_empty() {
        zone.to_string()
    } else {
        format!("{zone}, {suffix}")
    }
}

/// Picks the first place of a search response. An empty array is "not found".
fn parse_places(body: &str) -> Result<Option<GeoPoint>, GeocodeError> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };
    let latitude = place
        .lat
        .parse::<f64>()
        .map_err(|e| GeocodeError::Parse(format!("lat '{}': {e}", place.lat)))?;
    let longitude = place
        .lon
        .parse::<f64>()
        .map_err(|e| GeocodeError::Parse(format!("lon '{}': {e}", place.lon)))?;
    Ok(Some(GeoPoint {
        latitude,
        longitude,
    }))
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    /// Retries transport errors, 429 and 5xx with linear backoff (2s, 4s).
    async fn geocode(&self, zone: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let query = self.query_for(zone);
        let mut last_error: Option<GeocodeError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = Duration::from_secs(2 * u64::from(attempt));
                warn!(
                    zone,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Geocoding failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .get(&self.endpoint)
                .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(GeocodeError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 || status.is_server_error() {
                last_error = Some(GeocodeError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                return Err(GeocodeError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let point = parse_places(&body)?;
            debug!(zone, found = point.is_some(), "Geocoder answered");
            return Ok(point);
        }

        Err(last_error.unwrap_or(GeocodeError::Api {
            status: 0,
            message: format!("no response after {MAX_ATTEMPTS} attempts"),
        }))
    }
}
