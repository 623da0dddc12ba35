//! Coordinate resolution — the boundary to the external geocoding provider.
//!
//! Nothing in the ingestion or assignment core calls into this module; it only
//! annotates zones with coordinates for the spatial views.

pub mod coordinates;
pub mod nominatim;
pub mod refresh;
pub mod resolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoder returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unparseable geocoder response: {0}")]
    Parse(String),
}

/// A forward geocoder. `Ok(None)` means the provider answered but knows no such place.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, zone: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}
