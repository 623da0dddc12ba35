use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::geo::{GeoPoint, Geocoder};

/// Cached, paced front for a `Geocoder`.
///
/// Each zone reaches the provider at most once per process lifetime (misses and
/// failures are cached as `None`), and provider calls are serialized with at
/// least `min_interval` between them. Never returns an error.
pub struct CoordinateResolver {
    geocoder: Arc<dyn Geocoder>,
    cache: RwLock<HashMap<String, Option<GeoPoint>>>,
    /// Held for the whole provider round-trip; stores when the last call finished.
    last_call: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl CoordinateResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, min_interval: Duration) -> Self {
        Self {
            geocoder,
            cache: RwLock::new(HashMap::new()),
            last_call: Mutex::new(None),
            min_interval,
        }
    }

    /// Pre-populates the cache, e.g. from the coordinates file. Only known points
    /// are seeded so that zones recorded as unknown can be retried once.
    pub async fn seed<'a, I>(&self, known: I)
    where
        I: IntoIterator<Item = (&'a String, &'a Option<GeoPoint>)>,
    {
        let mut cache = self.cache.write().await;
        for (zone, point) in known {
            if let Some(point) = point {
                cache.insert(zone.clone(), Some(*point));
            }
        }
    }

    pub async fn cached(&self, zone: &str) -> Option<Option<GeoPoint>> {
        self.cache.read().await.get(zone).copied()
    }

    pub async fn resolve(&self, zone: &str) -> Option<GeoPoint> {
        if let Some(hit) = self.cached(zone).await {
            return hit;
        }

        let mut last_call = self.last_call.lock().await;

        // Another task may have resolved this zone while we waited for the lock.
        if let Some(hit) = self.cached(zone).await {
            return hit;
        }

        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(zone, wait_ms = wait.as_millis() as u64, "Pacing geocoder call");
                tokio::time::sleep(wait).await;
            }
        }

        let point = match self.geocoder.geocode(zone).await {
            Ok(point) => point,
            Err(e) => {
                warn!(zone, "Geocoding failed: {e}");
                None
            }
        };
        *last_call = Some(Instant::now());

        self.cache.write().await.insert(zone.to_string(), point);
        point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeocodeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeocoder {
        calls: AtomicUsize,
        call_times: std::sync::Mutex<Vec<Instant>>,
    }

    impl CountingGeocoder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                call_times: std::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Geocoder for CountingGeocoder {
        async fn geocode(&self, zone: &str) -> Result<Option<GeoPoint>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().unwrap().push(Instant::now());
            match zone {
                "Nowhere" => Ok(None),
                "Broken" => Err(GeocodeError::Parse("bad payload".to_string())),
                _ => Ok(Some(GeoPoint {
                    latitude: 10.0,
                    longitude: 20.0,
                })),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zone_is_resolved_once() {
        let geocoder = Arc::new(CountingGeocoder::new());
        let resolver = CoordinateResolver::new(geocoder.clone(), Duration::from_secs(1));

        let first = resolver.resolve("Assam").await;
        let second = resolver.resolve("Assam").await;
        assert_eq!(first, second);
        assert!(first.is_some());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_and_misses_are_cached_as_none() {
        let geocoder = Arc::new(CountingGeocoder::new());
        let resolver = CoordinateResolver::new(geocoder.clone(), Duration::from_secs(1));

        assert_eq!(resolver.resolve("Nowhere").await, None);
        assert_eq!(resolver.resolve("Broken").await, None);
        assert_eq!(resolver.resolve("Broken").await, None);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.cached("Broken").await, Some(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_spaced_by_min_interval() {
        let geocoder = Arc::new(CountingGeocoder::new());
        let resolver = Arc::new(CoordinateResolver::new(
            geocoder.clone(),
            Duration::from_secs(1),
        ));

        let mut handles = Vec::new();
        for zone in ["Assam", "Bihar", "Kerala"] {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move { resolver.resolve(zone).await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        let times = geocoder.call_times.lock().unwrap().clone();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_points_skip_the_provider() {
        let geocoder = Arc::new(CountingGeocoder::new());
        let resolver = CoordinateResolver::new(geocoder.clone(), Duration::from_secs(1));

        let known: HashMap<String, Option<GeoPoint>> = [
            (
                "Goa".to_string(),
                Some(GeoPoint {
                    latitude: 15.3,
                    longitude: 74.1,
                }),
            ),
            ("Atlantis".to_string(), None),
        ]
        .into_iter()
        .collect();
        resolver.seed(&known).await;

        assert_eq!(resolver.resolve("Goa").await.unwrap().latitude, 15.3);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(resolver.cached("Atlantis").await, None);
    }
}
