//! Current conditions from the Open-Meteo forecast API.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FetchError;
use crate::fetch::{HttpClient, get_json};

// https://open-meteo.com/en/docs
pub const OPEN_METEO_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,is_day,precipitation,weather_code,wind_speed_10m";

/// The `current` block of a forecast response. Units are the API defaults
/// (°C, km/h, mm).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: f64,
    #[serde(default)]
    pub apparent_temperature: Option<f64>,
    #[serde(deserialize_with = "bool_from_int")]
    pub is_day: bool,
    #[serde(default)]
    pub precipitation: Option<f64>,
    pub weather_code: u8,
    #[serde(default)]
    pub wind_speed_10m: Option<f64>,
}

fn bool_from_int<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(u8::deserialize(deserializer)? != 0)
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

/// Fetches current conditions at the given coordinates.
#[tracing::instrument(skip(client, url))]
pub async fn get_current_weather<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    latitude: f64,
    longitude: f64,
) -> Result<CurrentWeather, FetchError> {
    let query = [
        ("latitude", latitude.to_string()),
        ("longitude", longitude.to_string()),
        ("current", CURRENT_FIELDS.to_string()),
    ];
    let response: ForecastResponse = get_json(client, url, &query).await?;
    Ok(response.current)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherCondition {
    Sunny,
    ClearNight,
    Clear,
    Cloudy,
    Foggy,
    Rainy,
    Snowy,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    /// Maps a WMO weather interpretation code.
    pub fn from_code(code: u8, is_day: bool) -> Self {
        match code {
            0 if is_day => WeatherCondition::Sunny,
            0 => WeatherCondition::ClearNight,
            1 => WeatherCondition::Clear,
            2 | 3 => WeatherCondition::Cloudy,
            45 | 48 => WeatherCondition::Foggy,
            51..=67 | 80..=82 => WeatherCondition::Rainy,
            71..=77 | 85 | 86 => WeatherCondition::Snowy,
            95..=99 => WeatherCondition::Thunderstorm,
            _ => WeatherCondition::Unknown,
        }
    }
}

/// Unit the display should show temperatures in. Temperatures are always
/// served in Celsius; the display converts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TemperatureUnit {
    #[default]
    F,
    C,
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "F" => Ok(TemperatureUnit::F),
            "C" => Ok(TemperatureUnit::C),
            other => Err(format!("expected F or C, got '{other}'")),
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureUnit::F => f.write_str("F"),
            TemperatureUnit::C => f.write_str("C"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherData {
    pub temperature_celsius: f64,
    pub condition: WeatherCondition,
}

impl From<&CurrentWeather> for WeatherData {
    fn from(current: &CurrentWeather) -> Self {
        Self {
            temperature_celsius: current.temperature_2m,
            condition: WeatherCondition::from_code(current.weather_code, current.is_day),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherMeta {
    pub requested_temperature_unit: TemperatureUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherResponse {
    pub data: Option<WeatherData>,
    pub meta: Option<WeatherMeta>,
}

/// Live weather for the configured location.
pub struct WeatherSource {
    client: Arc<dyn HttpClient>,
    url: String,
    coordinates: Option<(f64, f64)>,
    unit: TemperatureUnit,
}

impl WeatherSource {
    pub fn new(client: Arc<dyn HttpClient>, coordinates: Option<(f64, f64)>, unit: TemperatureUnit) -> Self {
        Self {
            client,
            url: OPEN_METEO_FORECAST_URL.to_string(),
            coordinates,
            unit,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Current weather. Without coordinates, or when the lookup fails,
    /// `data` is empty; `meta` is always present.
    pub async fn current(&self) -> WeatherResponse {
        let data = match self.coordinates {
            Some((latitude, longitude)) => {
                match get_current_weather(self.client.as_ref(), &self.url, latitude, longitude).await {
                    Ok(current) => Some(WeatherData::from(&current)),
                    Err(e) => {
                        warn!(error = %e, "failed to fetch weather");
                        None
                    }
                }
            }
            None => None,
        };

        WeatherResponse {
            data,
            meta: Some(WeatherMeta {
                requested_temperature_unit: self.unit,
            }),
        }
    }
}
