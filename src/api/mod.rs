//! HTTP API read by the display applet.

mod error;
mod handlers;
pub mod mocks;
mod router;

pub use error::ApiError;
pub use router::{AppState, TRANSIT_CACHE_TTL, create_router};
