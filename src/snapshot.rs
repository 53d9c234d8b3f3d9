//! The combined transit view served to the display applet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::citibike::{self, BikeStationSnapshot};
use crate::error::UnknownRouteError;
use crate::fetch::HttpClient;
use crate::mta::{Aggregator, StationRequest, StationSnapshot};

/// Trains for every configured station plus the bike dock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitSnapshot {
    pub trains: Vec<StationSnapshot>,
    pub citibike: BikeStationSnapshot,
}

/// Produces live [`TransitSnapshot`]s for a fixed set of stations.
pub struct TransitSource {
    aggregator: Aggregator,
    bike_client: Arc<dyn HttpClient>,
    bike_status_url: String,
    stations: Vec<StationRequest>,
    citibike_station_id: String,
}

impl TransitSource {
    pub fn new(
        aggregator: Aggregator,
        bike_client: Arc<dyn HttpClient>,
        stations: Vec<StationRequest>,
        citibike_station_id: impl Into<String>,
    ) -> Self {
        Self {
            aggregator,
            bike_client,
            bike_status_url: citibike::CITIBIKE_STATION_STATUS_URL.to_string(),
            stations,
            citibike_station_id: citibike_station_id.into(),
        }
    }

    pub fn with_bike_status_url(mut self, url: impl Into<String>) -> Self {
        self.bike_status_url = url.into();
        self
    }

    /// Fetches trains and bikes concurrently. An unavailable bike feed
    /// reports zero bikes.
    #[tracing::instrument(skip(self))]
    pub async fn live_snapshot(&self) -> Result<TransitSnapshot, UnknownRouteError> {
        let (trains, bikes) = tokio::join!(
            self.aggregator.snapshot(&self.stations),
            citibike::get_bike_counts(
                self.bike_client.as_ref(),
                &self.bike_status_url,
                &self.citibike_station_id,
            ),
        );

        Ok(TransitSnapshot {
            trains: trains?,
            citibike: bikes.unwrap_or_default(),
        })
    }
}

/// Keeps the last live snapshot for a short time so bursts of requests do
/// not each hit the feeds.
pub struct SnapshotCache {
    ttl: Duration,
    entry: Mutex<Option<(Instant, TransitSnapshot)>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: Mutex::new(None),
        }
    }

    /// The cached snapshot if it is younger than the TTL, else the result of
    /// `refresh`, which is cached on success. Concurrent callers wait for a
    /// single refresh.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<TransitSnapshot, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TransitSnapshot, E>>,
    {
        let mut entry = self.entry.lock().await;
        if let Some((fetched_at, snapshot)) = entry.as_ref()
            && fetched_at.elapsed() < self.ttl
        {
            debug!("serving cached transit snapshot");
            return Ok(snapshot.clone());
        }

        let snapshot = refresh().await?;
        *entry = Some((Instant::now(), snapshot.clone()));
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MockClient;
    use crate::mta::MtaEndpoints;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BIKES_URL: &str = "http://gbfs.test/station_status.json";

    fn snapshot(regular: i64) -> TransitSnapshot {
        TransitSnapshot {
            trains: vec![],
            citibike: BikeStationSnapshot { regular, ebike: 0 },
        }
    }

    #[tokio::test]
    async fn test_cache_serves_fresh_entry() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let result: Result<_, ()> = cache
                .get_or_refresh(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(snapshot(1))
                })
                .await;
            assert_eq!(result.unwrap(), snapshot(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_expires() {
        let cache = SnapshotCache::new(Duration::ZERO);

        let first: Result<_, ()> = cache.get_or_refresh(|| async { Ok(snapshot(1)) }).await;
        let second: Result<_, ()> = cache.get_or_refresh(|| async { Ok(snapshot(2)) }).await;

        assert_eq!(first.unwrap().citibike.regular, 1);
        assert_eq!(second.unwrap().citibike.regular, 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_store_failures() {
        let cache = SnapshotCache::new(Duration::from_secs(60));

        let failed = cache.get_or_refresh(|| async { Err("down") }).await;
        assert!(failed.is_err());

        let ok: Result<_, &str> = cache.get_or_refresh(|| async { Ok(snapshot(3)) }).await;
        assert_eq!(ok.unwrap().citibike.regular, 3);
    }

    #[tokio::test]
    async fn test_live_snapshot_without_bike_feed_reports_zero() {
        let client = Arc::new(MockClient::new().respond(BIKES_URL, 503, ""));
        let aggregator = Aggregator::new(client.clone(), MtaEndpoints::default());
        let source = TransitSource::new(aggregator, client.clone(), vec![], "100")
            .with_bike_status_url(BIKES_URL);

        let snapshot = source.live_snapshot().await.unwrap();

        assert!(snapshot.trains.is_empty());
        assert_eq!(snapshot.citibike, BikeStationSnapshot::default());
        // no stations means no feed requests, only the bike lookup
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_live_snapshot_unknown_route() {
        let client = Arc::new(MockClient::new());
        let aggregator = Aggregator::new(client.clone(), MtaEndpoints::default());
        let source = TransitSource::new(
            aggregator,
            client,
            vec![StationRequest::new("A01", ["B", "NOPE"])],
            "100",
        );

        let err = source.live_snapshot().await.unwrap_err();
        assert_eq!(err.route, "NOPE");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_value(snapshot(4)).unwrap();
        assert_eq!(json["citibike"]["regular"], 4);
        assert_eq!(json["citibike"]["ebike"], 0);
        assert!(json["trains"].as_array().unwrap().is_empty());
    }
}
