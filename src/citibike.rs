//! Bike-share station availability from the GBFS `station_status` feed.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::fetch::{HttpClient, get_json};

pub const CITIBIKE_STATION_STATUS_URL: &str = "https://gbfs.citibikenyc.com/gbfs/en/station_status.json";

#[derive(Deserialize)]
struct StationStatusResponse {
    data: StationStatusData,
}

#[derive(Deserialize)]
struct StationStatusData {
    stations: Vec<StationStatus>,
}

#[derive(Deserialize)]
struct StationStatus {
    station_id: String,
    num_bikes_available: i64,
    #[serde(default)]
    num_ebikes_available: i64,
}

/// Bikes available at one dock station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BikeStationSnapshot {
    /// Non-electric bikes.
    pub regular: i64,
    pub ebike: i64,
}

impl From<&StationStatus> for BikeStationSnapshot {
    fn from(status: &StationStatus) -> Self {
        Self {
            regular: status.num_bikes_available - status.num_ebikes_available,
            ebike: status.num_ebikes_available,
        }
    }
}

/// Bike counts for `station_id`, or `None` when the feed is unavailable or
/// does not list the station.
#[tracing::instrument(skip(client, url))]
pub async fn get_bike_counts<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    station_id: &str,
) -> Option<BikeStationSnapshot> {
    let response: StationStatusResponse = match get_json(client, url, &[]).await {
        Ok(response) => response,
        Err(e @ FetchError::Status { .. }) => {
            debug!(error = %e, "failed to fetch bike-share data");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "failed to fetch bike-share data");
            return None;
        }
    };

    let counts = response
        .data
        .stations
        .iter()
        .find(|station| station.station_id == station_id)
        .map(BikeStationSnapshot::from);

    if counts.is_none() {
        debug!("bike-share station not listed");
    }
    counts
}
