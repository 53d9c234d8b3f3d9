//! Settings read from the environment (and `.env`, loaded by the binary).
//!
//! Values are read through a lookup function so the parsing rules can be
//! tested without touching the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::api::mocks::{TransitMock, WeatherMock};
use crate::error::ConfigError;
use crate::mta::{MtaEndpoints, StationRequest, feeds_for};
use crate::weather::TemperatureUnit;

#[derive(Debug, Clone)]
pub struct Settings {
    pub tidbyt: TidbytSettings,
    pub transit: TransitSettings,
    pub weather: WeatherSettings,
    pub api: ApiSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            tidbyt: TidbytSettings::from_lookup(&lookup)?,
            transit: TransitSettings::from_lookup(&lookup)?,
            weather: WeatherSettings::from_lookup(&lookup)?,
            api: ApiSettings::from_lookup(&lookup)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TidbytSettings {
    pub api_key: String,
    pub device_id: String,
    pub installation_id: String,
    pub pixlet_path: String,
    pub app_path: PathBuf,
    pub enable_push: bool,
    pub push_interval: Duration,
}

impl TidbytSettings {
    /// Loads only the device settings, for commands that do not need the
    /// transit configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let push_secs: f64 = parse_or(lookup, "TIDBYT_PUSH_INTERVAL", 10.0)?;
        let push_interval = Duration::try_from_secs_f64(push_secs)
            .ok()
            .filter(|interval| !interval.is_zero())
            .ok_or_else(|| {
                invalid(
                    "TIDBYT_PUSH_INTERVAL",
                    &push_secs.to_string(),
                    "must be a positive number of seconds",
                )
            })?;

        Ok(Self {
            api_key: required(lookup, "TIDBYT_API_KEY")?,
            device_id: required(lookup, "TIDBYT_DEVICE_ID")?,
            installation_id: optional(lookup, "TIDBYT_INSTALLATION_ID").unwrap_or_else(|| "TrainsAndBikes".to_string()),
            pixlet_path: optional(lookup, "PIXLET_PATH").unwrap_or_else(|| "pixlet".to_string()),
            app_path: optional(lookup, "TIDBYT_APP_PATH")
                .unwrap_or_else(|| "tidbyt_app/trains_and_bikes.star".to_string())
                .into(),
            enable_push: parse_bool(lookup, "TIDBYT_ENABLE_PUSH")?,
            push_interval,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TransitSettings {
    pub stations: Vec<StationRequest>,
    pub citibike_station_id: String,
    pub mta_api_key: Option<String>,
    pub endpoints: MtaEndpoints,
}

impl TransitSettings {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut stations = Vec::new();
        for n in 1.. {
            let Some(station_id) = optional(lookup, &format!("MTA_STATION_ID{n}")) else {
                break;
            };
            let routes_key = format!("MTA_STATION_ROUTES{n}");
            let routes = required(lookup, &routes_key)?;
            let routes: Vec<&str> = routes
                .split(',')
                .map(str::trim)
                .filter(|route| !route.is_empty())
                .collect();
            feeds_for(&routes)?;
            stations.push(StationRequest::new(station_id, routes));
        }
        if stations.is_empty() {
            return Err(ConfigError::Missing("MTA_STATION_ID1".to_string()));
        }

        let defaults = MtaEndpoints::default();
        Ok(Self {
            stations,
            citibike_station_id: required(lookup, "CITIBIKE_STATION_ID")?,
            mta_api_key: optional(lookup, "MTA_API_KEY"),
            endpoints: MtaEndpoints {
                base_url: optional(lookup, "MTA_BASE_URL").unwrap_or(defaults.base_url),
                alerts_url: optional(lookup, "MTA_ALERTS_URL").unwrap_or(defaults.alerts_url),
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct WeatherSettings {
    /// Latitude and longitude.
    pub coordinates: Option<(f64, f64)>,
    pub temperature_unit: TemperatureUnit,
}

impl WeatherSettings {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let coordinates = match optional(lookup, "WEATHER_COORDINATES") {
            Some(value) => Some(parse_coordinates(&value)?),
            None => None,
        };

        Ok(Self {
            coordinates,
            temperature_unit: parse_or(lookup, "TEMPERATURE_UNIT", TemperatureUnit::F)?,
        })
    }
}

fn parse_coordinates(value: &str) -> Result<(f64, f64), ConfigError> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [latitude, longitude] = parts.as_slice() else {
        return Err(invalid(
            "WEATHER_COORDINATES",
            value,
            "expected two comma-separated numbers",
        ));
    };
    let parse = |part: &str| {
        part.parse::<f64>()
            .map_err(|e| invalid("WEATHER_COORDINATES", value, &e.to_string()))
    };
    Ok((parse(*latitude)?, parse(*longitude)?))
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub addr: SocketAddr,
    /// Where the display applet should reach this server.
    pub api_url: Option<String>,
    pub transit_mock: Option<TransitMock>,
    pub weather_mock: Option<WeatherMock>,
}

impl ApiSettings {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            addr: parse_or(lookup, "API_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?,
            api_url: optional(lookup, "API_URL"),
            transit_mock: parse_optional(lookup, "TRANSIT_MOCK")?,
            weather_mock: parse_optional(lookup, "WEATHER_MOCK")?,
        })
    }
}

/// A set, non-blank value.
fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    optional(lookup, key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| invalid(key, &value, &e.to_string()))
        })
        .transpose()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

fn parse_bool<F>(lookup: &F, key: &str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = optional(lookup, key) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, &value, "expected a boolean")),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
