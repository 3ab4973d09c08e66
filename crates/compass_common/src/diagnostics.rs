//! Diagnostic trace returned alongside every answer.
//!
//! Records which stages ran, which tools were attempted and how each ended.
//! `steps` and `tool_trace` are append-only for the lifetime of a request.

use crate::tools::Capability;
use serde::{Deserialize, Serialize};

/// Terminal state of one tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    /// Provider answered with at least one source
    Ok,
    /// Provider answered with no sources
    Empty,
    /// Provider was unreachable or returned an unusable payload
    Error,
    /// Adapter timeout or request deadline expired first
    Timeout,
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::Empty)
    }
}

impl std::fmt::Display for ToolOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Empty => "empty",
            Self::Error => "error",
            Self::Timeout => "timeout",
        };
        write!(f, "{}", s)
    }
}

/// One line of the tool trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolTraceEntry {
    pub tool: Capability,
    pub outcome: ToolOutcome,
    pub source_count: usize,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl std::fmt::Display for ToolTraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ({} sources, {}ms)",
            self.tool, self.outcome, self.source_count, self.elapsed_ms
        )?;
        if let Some(detail) = &self.detail {
            write!(f, " - {}", detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub steps: Vec<String>,
    pub tool_trace: Vec<ToolTraceEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_bias: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl Diagnostics {
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or(&[])
    }

    pub fn trace_for(&self, tool: Capability) -> Option<&ToolTraceEntry> {
        self.tool_trace.iter().find(|t| t.tool == tool)
    }
}
