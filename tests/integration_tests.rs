use async_trait::async_trait;
use chrono::Utc;
use prost::Message;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tidbyt_transit::fetch::HttpClient;
use tidbyt_transit::gtfs_rt::alert::Effect;
use tidbyt_transit::gtfs_rt::translated_string::Translation;
use tidbyt_transit::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
use tidbyt_transit::gtfs_rt::{
    Alert, EntitySelector, FeedEntity, FeedHeader, FeedMessage, TranslatedString, TripDescriptor,
    TripUpdate,
};
use tidbyt_transit::mta::{Aggregator, MtaEndpoints, StationRequest};

const BASE_URL: &str = "http://mta.test/gtfs";
const ALERTS_URL: &str = "http://mta.test/alerts";
const BDFM_URL: &str = "http://mta.test/gtfs-bdfm";
const NQRW_URL: &str = "http://mta.test/gtfs-nqrw";

/// Serves fixed responses by exact URL and counts requests.
#[derive(Default)]
struct FeedServer {
    responses: HashMap<String, (u16, Vec<u8>)>,
    hits: Mutex<Vec<String>>,
}

impl FeedServer {
    fn with(mut self, url: &str, status: u16, body: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), (status, body));
        self
    }

    fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for FeedServer {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        let url = req.url().to_string();
        self.hits.lock().unwrap().push(url.clone());

        let (status, body) = self.responses.get(&url).cloned().unwrap_or((404, Vec::new()));
        let response = http::Response::builder().status(status).body(body).unwrap();
        Ok(reqwest::Response::from(response))
    }
}

fn endpoints() -> MtaEndpoints {
    MtaEndpoints {
        base_url: BASE_URL.to_string(),
        alerts_url: ALERTS_URL.to_string(),
    }
}

fn feed(entity: Vec<FeedEntity>) -> Vec<u8> {
    FeedMessage {
        header: FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(Utc::now().timestamp() as u64),
            ..Default::default()
        },
        entity,
    }
    .encode_to_vec()
}

/// A trip of `route` stopping at each `(stop, seconds from now)`.
fn trip(id: &str, route: &str, stops: &[(&str, i64)]) -> FeedEntity {
    let now = Utc::now().timestamp();
    FeedEntity {
        id: id.to_string(),
        trip_update: Some(TripUpdate {
            trip: TripDescriptor {
                route_id: Some(route.to_string()),
                ..Default::default()
            },
            stop_time_update: stops
                .iter()
                .map(|(stop, offset)| StopTimeUpdate {
                    stop_id: Some(stop.to_string()),
                    departure: Some(StopTimeEvent {
                        time: Some(now + offset),
                        ..Default::default()
                    }),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn alert(id: &str, routes: &[&str], text: &str, effect: Effect) -> FeedEntity {
    FeedEntity {
        id: id.to_string(),
        alert: Some(Alert {
            informed_entity: routes
                .iter()
                .map(|route| EntitySelector {
                    route_id: Some(route.to_string()),
                    ..Default::default()
                })
                .collect(),
            effect: Some(effect as i32),
            header_text: Some(TranslatedString {
                translation: vec![Translation {
                    text: text.to_string(),
                    language: Some("en".to_string()),
                }],
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn routes(routes: &[&str]) -> BTreeSet<String> {
    routes.iter().map(|r| r.to_string()).collect()
}

#[tokio::test]
async fn test_station_snapshot_end_to_end() {
    let server = Arc::new(
        FeedServer::default()
            .with(
                BDFM_URL,
                200,
                feed(vec![
                    trip("b1", "B", &[("D26N", 60), ("D28N", 240)]),
                    trip("b2", "B", &[("D26N", 19 * 60)]),
                    trip("d1", "D", &[("D26N", 7 * 60)]),
                ]),
            )
            .with(NQRW_URL, 200, feed(vec![trip("q1", "Q", &[("D26N", 5 * 60)])]))
            .with(
                ALERTS_URL,
                200,
                feed(vec![alert(
                    "a1",
                    &["B", "D"],
                    "Southbound B trains are running with delays",
                    Effect::UnknownEffect,
                )]),
            ),
    );
    let aggregator = Aggregator::new(server.clone(), endpoints());

    let snapshot = aggregator
        .get_station_snapshot("D26N", &routes(&["B", "Q"]))
        .await
        .unwrap();

    assert_eq!(snapshot.station_id, "D26N");
    assert_eq!(snapshot.routes, vec!["B", "Q"]);

    // the one-minute B departure is uncatchable and the D is not requested
    let departures: Vec<(&str, bool)> = snapshot
        .departures
        .iter()
        .map(|d| (d.route.as_str(), d.has_delay))
        .collect();
    assert_eq!(departures, vec![("Q", false), ("B", true)]);
    assert!((snapshot.departures[1].wait_minutes - 19.0).abs() < 0.5);

    assert_eq!(snapshot.alerts.len(), 1);
    assert_eq!(snapshot.alerts[0].route, "B");

    assert_eq!(server.hits(BDFM_URL), 1);
    assert_eq!(server.hits(NQRW_URL), 1);
    assert_eq!(server.hits(ALERTS_URL), 1);
}

#[tokio::test]
async fn test_failed_feed_contributes_nothing() {
    let server = Arc::new(
        FeedServer::default()
            .with(BDFM_URL, 503, b"Service Unavailable".to_vec())
            .with(NQRW_URL, 200, feed(vec![trip("q1", "Q", &[("D26N", 5 * 60)])]))
            .with(ALERTS_URL, 200, feed(vec![])),
    );
    let aggregator = Aggregator::new(server.clone(), endpoints());

    let snapshot = aggregator
        .get_station_snapshot("D26N", &routes(&["B", "Q"]))
        .await
        .unwrap();

    assert_eq!(snapshot.departures.len(), 1);
    assert_eq!(snapshot.departures[0].route, "Q");
    assert!(snapshot.alerts.is_empty());
}

#[tokio::test]
async fn test_alert_feed_down_still_lists_departures() {
    let server = Arc::new(
        FeedServer::default()
            .with(BDFM_URL, 200, feed(vec![trip("b1", "B", &[("D26N", 10 * 60)])]))
            .with(ALERTS_URL, 500, Vec::new()),
    );
    let aggregator = Aggregator::new(server, endpoints());

    let snapshot = aggregator
        .get_station_snapshot("D26N", &routes(&["B"]))
        .await
        .unwrap();

    assert_eq!(snapshot.departures.len(), 1);
    assert!(!snapshot.departures[0].has_delay);
}

#[tokio::test]
async fn test_significant_delays_effect_marks_route() {
    let server = Arc::new(
        FeedServer::default()
            .with(BDFM_URL, 200, feed(vec![trip("b1", "B", &[("D26N", 6 * 60)])]))
            .with(NQRW_URL, 200, feed(vec![trip("q1", "Q", &[("D26N", 8 * 60)])]))
            .with(
                ALERTS_URL,
                200,
                feed(vec![alert("a1", &["Q"], "Trains rerouted", Effect::SignificantDelays)]),
            ),
    );
    let aggregator = Aggregator::new(server, endpoints());

    let snapshot = aggregator
        .get_station_snapshot("D26N", &routes(&["B", "Q"]))
        .await
        .unwrap();

    let delayed: Vec<(&str, bool)> = snapshot
        .departures
        .iter()
        .map(|d| (d.route.as_str(), d.has_delay))
        .collect();
    assert_eq!(delayed, vec![("B", false), ("Q", true)]);
}

#[tokio::test]
async fn test_stations_sharing_a_feed_fetch_it_once() {
    let server = Arc::new(
        FeedServer::default()
            .with(
                BDFM_URL,
                200,
                feed(vec![
                    trip("b1", "B", &[("D26N", 5 * 60), ("D24N", 9 * 60)]),
                    trip("f1", "F", &[("D24N", 3 * 60)]),
                ]),
            )
            .with(ALERTS_URL, 200, feed(vec![])),
    );
    let aggregator = Aggregator::new(server.clone(), endpoints());

    let snapshots = aggregator
        .snapshot(&[
            StationRequest::new("D26N", ["B"]),
            StationRequest::new("D24N", ["B", "F"]),
        ])
        .await
        .unwrap();

    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].departures.len(), 1);
    let second: Vec<&str> = snapshots[1].departures.iter().map(|d| d.route.as_str()).collect();
    assert_eq!(second, vec!["F", "B"]);

    assert_eq!(server.hits(BDFM_URL), 1);
    assert_eq!(server.hits(ALERTS_URL), 1);
}

#[tokio::test]
async fn test_unknown_route_fails_before_fetching() {
    let server = Arc::new(FeedServer::default());
    let aggregator = Aggregator::new(server.clone(), endpoints());

    let err = aggregator
        .get_station_snapshot("D26N", &routes(&["B", "Y"]))
        .await
        .unwrap_err();

    assert_eq!(err.route, "Y");
    assert_eq!(server.total_hits(), 0);
}

#[tokio::test]
async fn test_no_requested_routes_fetches_nothing() {
    let server = Arc::new(FeedServer::default());
    let aggregator = Aggregator::new(server.clone(), endpoints());

    let snapshot = aggregator
        .get_station_snapshot("A01", &BTreeSet::new())
        .await
        .unwrap();

    assert_eq!(snapshot.station_id, "A01");
    assert!(snapshot.routes.is_empty());
    assert!(snapshot.departures.is_empty());
    assert!(snapshot.alerts.is_empty());
    assert_eq!(server.total_hits(), 0);
}
