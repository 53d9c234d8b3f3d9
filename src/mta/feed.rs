//! Fetching realtime feeds.
//!
//! A feed that cannot be fetched or decoded yields nothing for this round:
//! the failure is logged and the caller proceeds with the remaining feeds.

use tracing::{debug, warn};

use super::routes::Feed;
use crate::error::FeedFetchError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::gtfs_rt::FeedMessage;
use crate::parser::{self, RawAlert, RawTripUpdate};

// https://api.mta.info/#/subwayRealTimeFeeds
pub const MTA_BASE_URL: &str = "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs";
// https://api.mta.info/#/serviceAlerts
pub const MTA_SUBWAY_ALERTS_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/camsys%2Fsubway-alerts";

/// Where the trip-update and alert feeds are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MtaEndpoints {
    pub base_url: String,
    pub alerts_url: String,
}

impl Default for MtaEndpoints {
    fn default() -> Self {
        Self {
            base_url: MTA_BASE_URL.to_string(),
            alerts_url: MTA_SUBWAY_ALERTS_URL.to_string(),
        }
    }
}

impl MtaEndpoints {
    pub fn feed_url(&self, feed: Feed) -> String {
        feed.url(&self.base_url)
    }
}

/// Fetches and decodes one feed.
pub async fn fetch_feed<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<FeedMessage, FeedFetchError> {
    let bytes = fetch_bytes(client, url).await?;
    debug!(bytes = bytes.len(), "Feed bytes received, parsing");
    parser::parse_feed(&bytes).map_err(|source| FeedFetchError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Trip updates of the feed at `url`; empty if the feed is unavailable.
#[tracing::instrument(skip(client))]
pub async fn fetch_trip_updates<C: HttpClient + ?Sized>(client: &C, url: &str) -> Vec<RawTripUpdate> {
    match fetch_feed(client, url).await {
        Ok(feed) => {
            debug!(entity_count = feed.entity.len(), "Feed parsed successfully");
            parser::trip_updates(&feed)
        }
        Err(e) => {
            warn!(error = %e, "failed to fetch feed, skipping");
            Vec::new()
        }
    }
}

/// Service alerts of the alert feed at `url`; empty if it is unavailable.
#[tracing::instrument(skip(client))]
pub async fn fetch_alerts<C: HttpClient + ?Sized>(client: &C, url: &str) -> Vec<RawAlert> {
    match fetch_feed(client, url).await {
        Ok(feed) => parser::alerts(&feed),
        Err(e) => {
            warn!(error = %e, "failed to fetch service alerts, skipping");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MockClient;
    use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
    use crate::gtfs_rt::{FeedEntity, FeedHeader, TripDescriptor, TripUpdate};
    use prost::Message;

    const URL: &str = "http://feeds.test/nyct%2Fgtfs-bdfm";

    fn encoded_feed() -> Vec<u8> {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                ..Default::default()
            },
            entity: vec![FeedEntity {
                id: "1".to_string(),
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        route_id: Some("B".to_string()),
                        ..Default::default()
                    },
                    stop_time_update: vec![StopTimeUpdate {
                        stop_id: Some("D26N".to_string()),
                        arrival: Some(StopTimeEvent {
                            time: Some(42),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            }],
        }
        .encode_to_vec()
    }

    #[test]
    fn test_default_endpoints() {
        let endpoints = MtaEndpoints::default();
        assert_eq!(endpoints.feed_url(Feed::Numbered), MTA_BASE_URL);
        assert_eq!(
            endpoints.feed_url(Feed::Nassau),
            format!("{MTA_BASE_URL}-jz")
        );
    }

    #[tokio::test]
    async fn test_fetch_trip_updates() {
        let client = MockClient::new().respond(URL, 200, encoded_feed());
        let updates = fetch_trip_updates(&client, URL).await;

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].route_id, "B");
        assert_eq!(updates[0].stop_times[0].time, 42);
    }

    #[tokio::test]
    async fn test_non_success_status_yields_nothing() {
        let client = MockClient::new().respond(URL, 503, "unavailable");
        assert!(fetch_trip_updates(&client, URL).await.is_empty());
        assert!(fetch_alerts(&client, URL).await.is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_body_yields_nothing() {
        let client = MockClient::new().respond(URL, 200, vec![0xFF, 0xFE, 0x00, 0x01]);

        let err = fetch_feed(&client, URL).await.unwrap_err();
        assert!(matches!(err, FeedFetchError::Decode { .. }));
        assert!(fetch_trip_updates(&client, URL).await.is_empty());
    }
}
