//! Compass daemon library - exposes modules for testing.

pub mod assembler;
pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod orchestrator;
pub mod providers;
pub mod routes;
pub mod server;
pub mod synthesizer;
pub mod vision;
