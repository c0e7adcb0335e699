//! JSON API for Capsule.
//!
//! Thin adapter over the delivery engine:
//! - Letter status and open endpoints (content itself is served elsewhere)
//! - The two cron trigger endpoints ("process scheduled", "process
//!   recurring") that an external scheduler hits on its own cadence

mod error;
mod routes;

pub use error::WebError;
pub use routes::{AppState, create_router};
