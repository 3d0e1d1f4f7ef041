//! HTTP/WebSocket front end for a shared loto table.
//!
//! The binary wires these pieces together: configuration from the
//! environment, logging, optional Prometheus metrics and the axum router
//! in front of one [`loto::TableActor`].

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
