use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::debug;

use super::feed::{MtaEndpoints, fetch_alerts, fetch_trip_updates};
use super::routes::feeds_for;
use super::types::{Departure, ServiceAlert, StationSnapshot};
use crate::error::UnknownRouteError;
use crate::fetch::HttpClient;
use crate::parser::{RawAlert, RawTripUpdate};

/// A station and the routes whose departures it should list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRequest {
    pub station_id: String,
    pub routes: BTreeSet<String>,
}

impl StationRequest {
    pub fn new<I, S>(station_id: impl Into<String>, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            station_id: station_id.into(),
            routes: routes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Builds station snapshots from the realtime feeds.
///
/// Every call fetches fresh data; nothing is retained between calls.
pub struct Aggregator {
    client: Arc<dyn HttpClient>,
    endpoints: MtaEndpoints,
}

impl Aggregator {
    pub fn new(client: Arc<dyn HttpClient>, endpoints: MtaEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// Snapshot of a single station.
    pub async fn get_station_snapshot(
        &self,
        station_id: &str,
        routes: &BTreeSet<String>,
    ) -> Result<StationSnapshot, UnknownRouteError> {
        let request = StationRequest {
            station_id: station_id.to_string(),
            routes: routes.clone(),
        };
        let mut snapshots = self.snapshot(std::slice::from_ref(&request)).await?;
        Ok(snapshots.remove(0))
    }

    /// Snapshots of several stations from one round of fetches.
    ///
    /// The alert feed is fetched once and each distinct trip-update feed is
    /// fetched once, all concurrently. A feed that fails contributes no
    /// departures; only an unknown route fails the call, before anything is
    /// fetched.
    #[tracing::instrument(skip_all, fields(stations = stations.len()))]
    pub async fn snapshot(&self, stations: &[StationRequest]) -> Result<Vec<StationSnapshot>, UnknownRouteError> {
        let mut feeds = BTreeSet::new();
        for station in stations {
            feeds.extend(feeds_for(&station.routes)?);
        }

        let (alerts, trip_updates) = if feeds.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            let client = self.client.as_ref();
            let feed_urls: Vec<String> = feeds
                .iter()
                .map(|feed| self.endpoints.feed_url(*feed))
                .collect();
            debug!(feeds = feed_urls.len(), "Fetching realtime feeds");

            let (alerts, per_feed) = tokio::join!(
                fetch_alerts(client, &self.endpoints.alerts_url),
                join_all(feed_urls.iter().map(|url| fetch_trip_updates(client, url))),
            );
            (alerts, per_feed.into_iter().flatten().collect())
        };

        let now = Utc::now();
        Ok(stations
            .iter()
            .map(|station| {
                build_station_snapshot(
                    &station.station_id,
                    &station.routes,
                    &alerts,
                    &trip_updates,
                    now,
                )
            })
            .collect())
    }
}

/// Assembles one station's snapshot from already-fetched feed data.
///
/// Alerts are kept when they inform a requested route, one entry per such
/// route. Departures are the station's stops of requested routes, flagged
/// when their route has a delay alert, with uncatchable ones dropped,
/// ordered by time (ties keep feed order).
pub fn build_station_snapshot(
    station_id: &str,
    routes: &BTreeSet<String>,
    alerts: &[RawAlert],
    trip_updates: &[RawTripUpdate],
    now: DateTime<Utc>,
) -> StationSnapshot {
    let alerts: Vec<ServiceAlert> = alerts
        .iter()
        .flat_map(|alert| {
            alert
                .routes
                .iter()
                .filter(move |route| routes.contains(*route))
                .map(move |route| ServiceAlert {
                    route: route.clone(),
                    text: alert.text.clone(),
                    cause: alert.cause,
                    effect: alert.effect,
                })
        })
        .collect();

    let routes_with_delay: HashSet<&str> = alerts
        .iter()
        .filter(|alert| alert.is_delay())
        .map(|alert| alert.route.as_str())
        .collect();

    let mut departures: Vec<Departure> = trip_updates
        .iter()
        .filter(|update| routes.contains(&update.route_id))
        .flat_map(|update| {
            let has_delay = routes_with_delay.contains(update.route_id.as_str());
            update
                .stop_times
                .iter()
                .filter(move |stop| stop.stop_id == station_id)
                .map(move |stop| Departure::new(update.route_id.clone(), stop.time, has_delay, now))
        })
        .filter(Departure::is_catchable)
        .collect();

    departures.sort_by_key(|departure| departure.scheduled_time);

    StationSnapshot {
        station_id: station_id.to_string(),
        routes: routes.iter().cloned().collect(),
        alerts,
        departures,
    }
}
