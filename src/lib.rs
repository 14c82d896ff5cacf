//! Library crate for lanmap-rs exposing the discovery, classification and
//! job-orchestration modules.
pub mod classify;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod netdetect;
pub mod oui;
pub mod ports;
pub mod probe;
pub mod scanner;
pub mod server;
pub mod store;
pub mod types;
