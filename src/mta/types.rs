//! Data types produced by the transit aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Riders cannot reach the platform for anything departing sooner than this.
pub const MIN_CATCHABLE_WAIT_MINUTES: f64 = 2.0;

/// Why a service alert was raised, as published in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCause {
    UnknownCause,
    OtherCause,
    TechnicalProblem,
    Strike,
    Demonstration,
    Accident,
    Holiday,
    Weather,
    Maintenance,
    Construction,
    PoliceActivity,
    MedicalEmergency,
}

/// What a service alert does to service, as published in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertEffect {
    NoService,
    ReducedService,
    SignificantDelays,
    Detour,
    AdditionalService,
    ModifiedService,
    OtherEffect,
    UnknownEffect,
    StopMoved,
    NoEffect,
    AccessibilityIssue,
}

/// A service alert as it applies to one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceAlert {
    pub route: String,
    #[serde(rename = "alert_text")]
    pub text: String,
    pub cause: AlertCause,
    pub effect: AlertEffect,
}

impl ServiceAlert {
    /// Whether this alert signals delays on its route.
    ///
    /// Besides the explicit `SIGNIFICANT_DELAYS` effect, any alert whose text
    /// mentions "delay" counts. The text match is loose (it also matches
    /// "no delays expected") and is kept as the agreed business rule.
    pub fn is_delay(&self) -> bool {
        self.effect == AlertEffect::SignificantDelays || self.text.to_lowercase().contains("delay")
    }
}

/// A predicted departure of a route's train from a station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Departure {
    pub route: String,
    /// Unix epoch seconds.
    #[serde(rename = "time")]
    pub scheduled_time: i64,
    #[serde(rename = "has_delays")]
    pub has_delay: bool,
    #[serde(rename = "wait_time_minutes")]
    pub wait_minutes: f64,
}

impl Departure {
    /// Builds a departure, deriving the wait (never negative) from `now`.
    pub fn new(route: impl Into<String>, scheduled_time: i64, has_delay: bool, now: DateTime<Utc>) -> Self {
        let wait_secs = scheduled_time.saturating_sub(now.timestamp()) as f64
            - f64::from(now.timestamp_subsec_millis()) / 1000.0;
        Self {
            route: route.into(),
            scheduled_time,
            has_delay,
            wait_minutes: (wait_secs / 60.0).max(0.0),
        }
    }

    pub fn is_catchable(&self) -> bool {
        self.wait_minutes >= MIN_CATCHABLE_WAIT_MINUTES
    }
}

/// Alerts and upcoming departures for the requested routes at one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSnapshot {
    pub station_id: String,
    /// Requested routes, sorted and deduplicated.
    pub routes: Vec<String>,
    pub alerts: Vec<ServiceAlert>,
    /// Catchable departures, ordered by scheduled time.
    pub departures: Vec<Departure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn alert(text: &str, effect: AlertEffect) -> ServiceAlert {
        ServiceAlert {
            route: "B".to_string(),
            text: text.to_string(),
            cause: AlertCause::UnknownCause,
            effect,
        }
    }

    #[test]
    fn test_is_delay_by_effect() {
        assert!(alert("Trains rerouted", AlertEffect::SignificantDelays).is_delay());
    }

    #[test]
    fn test_is_delay_by_text_case_insensitive() {
        assert!(alert("Expect DELAYS on the line", AlertEffect::UnknownEffect).is_delay());
        assert!(alert("Trains are delayed", AlertEffect::Detour).is_delay());
    }

    #[test]
    fn test_is_not_delay() {
        assert!(!alert("Trains are rerouted", AlertEffect::Detour).is_delay());
    }

    #[test]
    fn test_wait_minutes_derived_from_now() {
        let departure = Departure::new("Q", 1_700_000_000 + 19 * 60, false, now());
        assert_eq!(departure.wait_minutes, 19.0);
        assert!(departure.is_catchable());
    }

    #[test]
    fn test_wait_minutes_never_negative() {
        let departure = Departure::new("Q", 1_700_000_000 - 300, false, now());
        assert_eq!(departure.wait_minutes, 0.0);
        assert!(!departure.is_catchable());
    }

    #[test]
    fn test_wait_minutes_at_extreme_times() {
        let far_future = Departure::new("Q", i64::MAX, false, now());
        assert!(far_future.wait_minutes.is_finite());
        assert!(far_future.wait_minutes > 0.0);
        assert!(far_future.is_catchable());

        let far_past = Departure::new("Q", i64::MIN, false, now());
        assert_eq!(far_past.wait_minutes, 0.0);
        assert!(!far_past.is_catchable());
    }

    #[test]
    fn test_wait_minutes_counts_subsecond_now() {
        let now = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
        let departure = Departure::new("Q", 1_700_000_000 + 60, false, now);
        assert!((departure.wait_minutes - 59.5 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_catchable_boundary_is_inclusive() {
        let exactly_two = Departure::new("B", 1_700_000_000 + 120, false, now());
        assert!(exactly_two.is_catchable());

        let just_under = Departure::new("B", 1_700_000_000 + 119, false, now());
        assert!(!just_under.is_catchable());
    }

    #[test]
    fn test_departure_serializes_with_display_field_names() {
        let departure = Departure::new("B", 1_700_000_000 + 300, true, now());
        let json = serde_json::to_value(&departure).unwrap();
        assert_eq!(json["route"], "B");
        assert_eq!(json["time"], 1_700_000_300);
        assert_eq!(json["has_delays"], true);
        assert_eq!(json["wait_time_minutes"], 5.0);
    }

    #[test]
    fn test_alert_serializes_enum_names() {
        let json = serde_json::to_value(alert("x", AlertEffect::SignificantDelays)).unwrap();
        assert_eq!(json["alert_text"], "x");
        assert_eq!(json["cause"], "UNKNOWN_CAUSE");
        assert_eq!(json["effect"], "SIGNIFICANT_DELAYS");
    }
}
