//! Realtime subway data: route registry, feed fetching and per-station
//! aggregation of departures and service alerts.

pub mod aggregate;
pub mod feed;
pub mod routes;
pub mod types;

pub use aggregate::{Aggregator, StationRequest, build_station_snapshot};
pub use feed::MtaEndpoints;
pub use routes::{Feed, feed_for, feeds_for};
pub use types::{
    AlertCause, AlertEffect, Departure, MIN_CATCHABLE_WAIT_MINUTES, ServiceAlert, StationSnapshot,
};
