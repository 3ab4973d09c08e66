//! Assembled answer.

use crate::diagnostics::Diagnostics;
use crate::source::Source;
use crate::tools::{Capability, ToolSettings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub plan: Vec<String>,
    pub sources: Vec<Source>,
    pub diagnostics: Diagnostics,
}

impl QueryResponse {
    /// Distinct capabilities represented in `sources`, in enumeration order
    pub fn source_kinds(&self) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|cap| self.sources.iter().any(|s| s.kind == *cap))
            .collect()
    }

    pub fn sources_of(&self, cap: Capability) -> impl Iterator<Item = &Source> {
        self.sources.iter().filter(move |s| s.kind == cap)
    }
}

/// Error body for non-2xx replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Capability catalogue served by the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsResponse {
    /// Every capability, in enumeration order
    pub tools: Vec<Capability>,
    /// Capabilities that have an adapter wired in
    pub configured: Vec<Capability>,
    /// Set used when a request omits `enabledTools`
    pub defaults: ToolSettings,
}
