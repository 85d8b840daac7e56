//! HTTP server: webhook ingest and latest-state read endpoints.
//!
//! Single port. `POST /sbwebhook` always answers `{"status":"ok"}`; failures
//! are only visible in the logs.

mod app;

pub use app::{build_router, run_server, serve, AppState};
