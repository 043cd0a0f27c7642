//! HTTP server layer
//!
//! Axum server with:
//! - `/healthz` liveness check (no store access)
//! - `/` customer listing page
//! - Request tracing
//! - Graceful shutdown

pub mod extractors;
pub mod routes;
pub mod server;

pub use server::{build_router, run_server, AppState, ServerConfig};
