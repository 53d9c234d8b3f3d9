//! Protobuf parser for GTFS Realtime feeds.
//!
//! Decodes a [`FeedMessage`] and flattens it into the few fields the rest of
//! the crate needs, so nothing outside this module depends on the generated
//! schema types.

use prost::Message;

use crate::gtfs_rt::trip_update::StopTimeUpdate;
use crate::gtfs_rt::{self, FeedMessage, alert};
use crate::mta::{AlertCause, AlertEffect};

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid protobuf for a `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, prost::DecodeError> {
    FeedMessage::decode(bytes)
}

/// A predicted stop of one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStopTime {
    pub stop_id: String,
    /// Unix epoch seconds.
    pub time: i64,
}

/// The stops a trip of `route_id` is predicted to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTripUpdate {
    pub route_id: String,
    pub stop_times: Vec<RawStopTime>,
}

/// A service alert with the routes it informs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAlert {
    /// Informed routes in feed order, each listed once.
    pub routes: Vec<String>,
    pub text: String,
    pub cause: AlertCause,
    pub effect: AlertEffect,
}

/// Extracts the trip updates of a feed.
///
/// Entities without a trip update or a route id are skipped, as are stop
/// time updates without a stop id or a time.
pub fn trip_updates(feed: &FeedMessage) -> Vec<RawTripUpdate> {
    feed.entity
        .iter()
        .filter_map(|entity| entity.trip_update.as_ref())
        .filter_map(|trip_update| {
            let route_id = trip_update.trip.route_id.clone()?;
            let stop_times = trip_update
                .stop_time_update
                .iter()
                .filter_map(|update| {
                    Some(RawStopTime {
                        stop_id: update.stop_id.clone()?,
                        time: departure_time(update)?,
                    })
                })
                .collect();

            Some(RawTripUpdate {
                route_id,
                stop_times,
            })
        })
        .collect()
}

/// The departure time of a stop time update, falling back to its arrival
/// time. Feeds are inconsistent about which of the two they populate.
pub fn departure_time(update: &StopTimeUpdate) -> Option<i64> {
    update
        .departure
        .as_ref()
        .and_then(|event| event.time)
        .or_else(|| update.arrival.as_ref().and_then(|event| event.time))
}

/// Extracts the service alerts of a feed.
pub fn alerts(feed: &FeedMessage) -> Vec<RawAlert> {
    feed.entity
        .iter()
        .filter_map(|entity| entity.alert.as_ref())
        .map(|alert| {
            let mut routes: Vec<String> = Vec::new();
            for route in alert
                .informed_entity
                .iter()
                .filter_map(|informed| informed.route_id.as_ref())
            {
                if !routes.contains(route) {
                    routes.push(route.clone());
                }
            }

            RawAlert {
                routes,
                text: header_text(alert),
                cause: cause(alert.cause()),
                effect: effect(alert.effect()),
            }
        })
        .collect()
}

/// English header text: the first translation tagged `en` or untagged,
/// otherwise the first translation.
fn header_text(alert: &gtfs_rt::Alert) -> String {
    let Some(header) = &alert.header_text else {
        return String::new();
    };

    header
        .translation
        .iter()
        .find(|t| t.language.as_deref().is_none_or(|lang| lang == "en"))
        .or_else(|| header.translation.first())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

fn cause(cause: alert::Cause) -> AlertCause {
    match cause {
        alert::Cause::UnknownCause => AlertCause::UnknownCause,
        alert::Cause::OtherCause => AlertCause::OtherCause,
        alert::Cause::TechnicalProblem => AlertCause::TechnicalProblem,
        alert::Cause::Strike => AlertCause::Strike,
        alert::Cause::Demonstration => AlertCause::Demonstration,
        alert::Cause::Accident => AlertCause::Accident,
        alert::Cause::Holiday => AlertCause::Holiday,
        alert::Cause::Weather => AlertCause::Weather,
        alert::Cause::Maintenance => AlertCause::Maintenance,
        alert::Cause::Construction => AlertCause::Construction,
        alert::Cause::PoliceActivity => AlertCause::PoliceActivity,
        alert::Cause::MedicalEmergency => AlertCause::MedicalEmergency,
    }
}

fn effect(effect: alert::Effect) -> AlertEffect {
    match effect {
        alert::Effect::NoService => AlertEffect::NoService,
        alert::Effect::ReducedService => AlertEffect::ReducedService,
        alert::Effect::SignificantDelays => AlertEffect::SignificantDelays,
        alert::Effect::Detour => AlertEffect::Detour,
        alert::Effect::AdditionalService => AlertEffect::AdditionalService,
        alert::Effect::ModifiedService => AlertEffect::ModifiedService,
        alert::Effect::OtherEffect => AlertEffect::OtherEffect,
        alert::Effect::UnknownEffect => AlertEffect::UnknownEffect,
        alert::Effect::StopMoved => AlertEffect::StopMoved,
        alert::Effect::NoEffect => AlertEffect::NoEffect,
        alert::Effect::AccessibilityIssue => AlertEffect::AccessibilityIssue,
    }
}
