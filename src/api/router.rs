use axum::{Router, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::mocks::{TransitMock, WeatherMock};
use crate::snapshot::{SnapshotCache, TransitSource};
use crate::weather::WeatherSource;

/// How long a live transit snapshot is served before refetching.
pub const TRANSIT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Application state shared across handlers
pub struct AppState {
    pub transit: TransitSource,
    pub weather: WeatherSource,
    pub cache: SnapshotCache,
    /// Served instead of live data when a request names no mock.
    pub transit_mock: Option<TransitMock>,
    pub weather_mock: Option<WeatherMock>,
}

impl AppState {
    pub fn new(transit: TransitSource, weather: WeatherSource) -> Self {
        AppState {
            transit,
            weather,
            cache: SnapshotCache::new(TRANSIT_CACHE_TTL),
            transit_mock: None,
            weather_mock: None,
        }
    }

    pub fn with_mocks(mut self, transit_mock: Option<TransitMock>, weather_mock: Option<WeatherMock>) -> Self {
        self.transit_mock = transit_mock;
        self.weather_mock = weather_mock;
        self
    }
}

/// Create the REST API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/transit", get(handlers::transit))
        .route("/transit-mocks", get(handlers::list_transit_mocks))
        .route("/weather", get(handlers::weather))
        .route("/weather-mocks", get(handlers::list_weather_mocks))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
