//! HTTP and WebSocket front end for the `teen_patti` room engine.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
