use std::sync::Arc;

use crate::assignment::engine::AssignmentEngine;
use crate::assignment::store::ReliefStore;
use crate::config::Config;
use crate::geo::resolver::CoordinateResolver;
use crate::ingest::index::IncidentIndexHandle;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Current records, severity and coordinates. Swapped wholesale on reload.
    pub incidents: Arc<IncidentIndexHandle>,
    /// Postgres when `DATABASE_URL` is set, in-memory otherwise.
    pub store: Arc<dyn ReliefStore>,
    pub engine: AssignmentEngine,
    pub coordinates: Arc<CoordinateResolver>,
}

impl AppState {
    pub fn new(
        config: Config,
        incidents: IncidentIndexHandle,
        store: Arc<dyn ReliefStore>,
        coordinates: CoordinateResolver,
    ) -> Self {
        Self {
            config,
            incidents: Arc::new(incidents),
            engine: AssignmentEngine::new(store.clone()),
            store,
            coordinates: Arc::new(coordinates),
        }
    }
}
