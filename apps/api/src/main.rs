mod assignment;
mod config;
mod db;
mod errors;
mod extract;
mod geo;
mod ingest;
mod models;
mod monitoring;
mod routes;
mod state;
mod views;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assignment::memory::MemoryStore;
use crate::assignment::postgres::PgReliefStore;
use crate::assignment::store::ReliefStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::geo::nominatim::NominatimGeocoder;
use crate::geo::resolver::CoordinateResolver;
use crate::ingest::index::{IncidentIndex, IncidentIndexHandle};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting relief API v{}", env!("CARGO_PKG_VERSION"));

    // Entity store
    let store: Arc<dyn ReliefStore> = match &config.database_url {
        Some(url) => Arc::new(PgReliefStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; relief and monitoring records are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    // Incident index from the report and coordinates files
    let index = IncidentIndex::load(&config.reports_path, &config.coordinates_path)?;

    // Geocoder, seeded with every point already on disk
    let geocoder = NominatimGeocoder::from_config(&config)?;
    let resolver = CoordinateResolver::new(Arc::new(geocoder), config.geocode_min_interval);
    resolver.seed(index.coordinates.iter()).await;
    info!(
        "Coordinate resolver ready ({} ms between provider calls)",
        config.geocode_min_interval.as_millis()
    );

    let state = AppState::new(
        config.clone(),
        IncidentIndexHandle::new(index),
        store,
        resolver,
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
