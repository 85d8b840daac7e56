//! Form relay core library — Sendbird form-submission webhook ingest, transcript
//! fetch and formatting, automation webhook forwarding, and the HTTP server.

pub mod automation;
pub mod chat;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod state;
pub mod transcript;
