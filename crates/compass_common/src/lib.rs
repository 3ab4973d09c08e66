//! Shared types for Compass components.
//!
//! Everything that crosses the wire between `compassd` and its callers lives
//! here: the request, the capability toggles, sources, diagnostics and the
//! assembled response.

pub mod diagnostics;
pub mod error;
pub mod request;
pub mod response;
pub mod source;
pub mod tools;

pub use diagnostics::{Diagnostics, ToolOutcome, ToolTraceEntry};
pub use error::CompassError;
pub use request::{QueryRequest, ValidatedRequest};
pub use response::{ErrorResponse, HealthResponse, QueryResponse, ToolsResponse};
pub use source::{Source, SNIPPET_MAX_CHARS};
pub use tools::{Capability, PartialToolSettings, ToolSettings};

/// Default address compassd listens on
pub const DEFAULT_ADDR: &str = "127.0.0.1:7870";

/// Crate version, shared by daemon health and client banner
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
