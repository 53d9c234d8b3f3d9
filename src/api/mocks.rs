//! Canned responses for developing and testing the display applet without
//! live feeds.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::citibike::BikeStationSnapshot;
use crate::mta::{AlertCause, AlertEffect, Departure, ServiceAlert, StationSnapshot};
use crate::snapshot::TransitSnapshot;
use crate::weather::{TemperatureUnit, WeatherCondition, WeatherData, WeatherMeta, WeatherResponse};

/// 2021-10-01T04:40:00Z
const MOCK_NOW: i64 = 1_633_063_200;

const REROUTE_TEXT: &str = "Southbound [B][D] trains are rerouted on the [C] and [F] lines from 59 St-Columbus Circle to 2 Av/Coney Island-Stillwell Av.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitMock {
    Basic,
    LongWaitTimes,
    ZeroBikes,
    ZeroTrainsAtStation1,
    ZeroTrainsAtStation2,
    ZeroTrains,
}

impl TransitMock {
    pub const ALL: [TransitMock; 6] = [
        TransitMock::Basic,
        TransitMock::LongWaitTimes,
        TransitMock::ZeroBikes,
        TransitMock::ZeroTrainsAtStation1,
        TransitMock::ZeroTrainsAtStation2,
        TransitMock::ZeroTrains,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TransitMock::Basic => "basic",
            TransitMock::LongWaitTimes => "long_wait_times",
            TransitMock::ZeroBikes => "zero_bikes",
            TransitMock::ZeroTrainsAtStation1 => "zero_trains_at_station_1",
            TransitMock::ZeroTrainsAtStation2 => "zero_trains_at_station_2",
            TransitMock::ZeroTrains => "zero_trains",
        }
    }

    pub fn snapshot(self) -> TransitSnapshot {
        let bikes = BikeStationSnapshot { regular: 5, ebike: 12 };
        let basic_a01 = || {
            station(
                "A01",
                &["B", "Q"],
                vec![reroute_alert()],
                &[("Q", 2, false), ("B", 19, true)],
            )
        };
        let basic_a02 = || station("A02", &["2", "3"], vec![], &[("2", 3, false), ("3", 8, false)]);

        let (trains, citibike) = match self {
            TransitMock::Basic => (vec![basic_a01(), basic_a02()], bikes),
            TransitMock::LongWaitTimes => (
                vec![
                    station(
                        "A01",
                        &["B", "Q"],
                        vec![reroute_alert()],
                        &[("Q", 12, true), ("B", 19, true)],
                    ),
                    station("A02", &["2", "3"], vec![], &[("2", 33, false), ("3", 45, false)]),
                ],
                bikes,
            ),
            TransitMock::ZeroBikes => (
                vec![basic_a01(), basic_a02()],
                BikeStationSnapshot::default(),
            ),
            TransitMock::ZeroTrainsAtStation1 => (
                vec![
                    station("A01", &["B", "Q"], vec![reroute_alert()], &[]),
                    basic_a02(),
                ],
                bikes,
            ),
            TransitMock::ZeroTrainsAtStation2 => (
                vec![basic_a01(), station("A02", &["2", "3"], vec![], &[])],
                bikes,
            ),
            TransitMock::ZeroTrains => (
                vec![
                    station("A01", &["B", "Q"], vec![], &[]),
                    station("A02", &["2", "3"], vec![], &[]),
                ],
                bikes,
            ),
        };

        TransitSnapshot { trains, citibike }
    }
}

fn station(
    station_id: &str,
    routes: &[&str],
    alerts: Vec<ServiceAlert>,
    departures: &[(&str, i64, bool)],
) -> StationSnapshot {
    StationSnapshot {
        station_id: station_id.to_string(),
        routes: routes.iter().map(|r| r.to_string()).collect(),
        alerts,
        departures: departures
            .iter()
            .map(|&(route, wait_minutes, has_delay)| Departure {
                route: route.to_string(),
                scheduled_time: MOCK_NOW + wait_minutes * 60,
                has_delay,
                wait_minutes: wait_minutes as f64,
            })
            .collect(),
    }
}

fn reroute_alert() -> ServiceAlert {
    ServiceAlert {
        route: "B".to_string(),
        text: REROUTE_TEXT.to_string(),
        cause: AlertCause::UnknownCause,
        effect: AlertEffect::UnknownEffect,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherMock {
    Sunny,
    Cloudy,
    ClearNight,
    SingleDigitTemperature,
    ColdAndSnowy,
    NoWeather,
}

impl WeatherMock {
    pub const ALL: [WeatherMock; 6] = [
        WeatherMock::Sunny,
        WeatherMock::Cloudy,
        WeatherMock::ClearNight,
        WeatherMock::SingleDigitTemperature,
        WeatherMock::ColdAndSnowy,
        WeatherMock::NoWeather,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeatherMock::Sunny => "sunny",
            WeatherMock::Cloudy => "cloudy",
            WeatherMock::ClearNight => "clear_night",
            WeatherMock::SingleDigitTemperature => "single_digit_temperature",
            WeatherMock::ColdAndSnowy => "cold_and_snowy",
            WeatherMock::NoWeather => "no_weather",
        }
    }

    pub fn response(self) -> WeatherResponse {
        let weather = |temperature_celsius: f64, condition, unit| WeatherResponse {
            data: Some(WeatherData {
                temperature_celsius,
                condition,
            }),
            meta: Some(WeatherMeta {
                requested_temperature_unit: unit,
            }),
        };

        match self {
            WeatherMock::Sunny => weather(12.0, WeatherCondition::Sunny, TemperatureUnit::F),
            WeatherMock::Cloudy => weather(12.0, WeatherCondition::Cloudy, TemperatureUnit::F),
            WeatherMock::ClearNight => weather(12.0, WeatherCondition::ClearNight, TemperatureUnit::F),
            WeatherMock::SingleDigitTemperature => weather(3.0, WeatherCondition::Clear, TemperatureUnit::C),
            WeatherMock::ColdAndSnowy => weather(-20.0, WeatherCondition::Snowy, TemperatureUnit::F),
            WeatherMock::NoWeather => WeatherResponse { data: None, meta: None },
        }
    }
}

/// An unrecognised mock name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMock {
    pub name: String,
    pub expected: Vec<&'static str>,
}

impl fmt::Display for UnknownMock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown mock '{}', expected one of: {}",
            self.name,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for UnknownMock {}

impl FromStr for TransitMock {
    type Err = UnknownMock;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mock| mock.name() == s)
            .ok_or_else(|| UnknownMock {
                name: s.to_string(),
                expected: Self::ALL.iter().map(|mock| mock.name()).collect(),
            })
    }
}

impl FromStr for WeatherMock {
    type Err = UnknownMock;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mock| mock.name() == s)
            .ok_or_else(|| UnknownMock {
                name: s.to_string(),
                expected: Self::ALL.iter().map(|mock| mock.name()).collect(),
            })
    }
}
