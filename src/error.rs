//! Error types shared across the library.
//!
//! Steady-state errors ([`FeedFetchError`], [`RenderError`], [`PushError`])
//! are contained by their callers: a failed feed contributes nothing to a
//! snapshot and a failed render/push only ends one scheduler cycle.
//! [`UnknownRouteError`] and [`ConfigError`] are configuration errors and
//! propagate out of setup.

use reqwest::StatusCode;
use thiserror::Error;

/// An HTTP exchange that did not produce a usable body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("invalid JSON for {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// HTTP status of a non-2xx response, if that is what failed.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure to obtain one realtime feed. Recovered locally by the fetcher.
#[derive(Debug, Error)]
pub enum FeedFetchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to decode feed from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: prost::DecodeError,
    },
}

/// A route code with no entry in the route registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown route '{route}'")]
pub struct UnknownRouteError {
    pub route: String,
}

/// The external renderer could not produce an image.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch renderer '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare applet '{path}': {source}")]
    Applet {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// `code` is -1 when the process was terminated by a signal.
    #[error("renderer returned non-zero exit code {code}: {stderr}")]
    Exit { code: i32, stderr: String },
}

/// The device API rejected or never received a push.
#[derive(Debug, Error)]
#[error("push to device '{device_id}' failed: {source}")]
pub struct PushError {
    pub device_id: String,
    #[source]
    pub source: FetchError,
}

/// Missing or invalid settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error(transparent)]
    UnknownRoute(#[from] UnknownRouteError),
}
