use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use super::mocks::{TransitMock, WeatherMock};
use super::{ApiError, AppState};
use crate::snapshot::TransitSnapshot;
use crate::weather::WeatherResponse;

#[derive(Debug, Deserialize)]
pub struct MockQuery {
    pub mock: Option<String>,
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /transit
pub async fn transit(
    Query(query): Query<MockQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TransitSnapshot>, ApiError> {
    let mock = match query.mock {
        Some(name) => Some(name.parse::<TransitMock>()?),
        None => state.transit_mock,
    };
    if let Some(mock) = mock {
        debug!(mock = mock.name(), "returning mock transit data");
        return Ok(Json(mock.snapshot()));
    }

    let snapshot = state
        .cache
        .get_or_refresh(|| state.transit.live_snapshot())
        .await?;
    Ok(Json(snapshot))
}

/// GET /transit-mocks
pub async fn list_transit_mocks() -> Json<Vec<&'static str>> {
    Json(TransitMock::ALL.iter().map(|mock| mock.name()).collect())
}

/// GET /weather
pub async fn weather(
    Query(query): Query<MockQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let mock = match query.mock {
        Some(name) => Some(name.parse::<WeatherMock>()?),
        None => state.weather_mock,
    };
    if let Some(mock) = mock {
        debug!(mock = mock.name(), "returning mock weather data");
        return Ok(Json(mock.response()));
    }

    Ok(Json(state.weather.current().await))
}

/// GET /weather-mocks
pub async fn list_weather_mocks() -> Json<Vec<&'static str>> {
    Json(WeatherMock::ALL.iter().map(|mock| mock.name()).collect())
}
