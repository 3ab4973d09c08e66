//! Per-request diagnostics accumulator.
//!
//! Threaded through every stage as `&mut`. Append-only; nothing here can fail
//! the request. Steps and errors are mirrored to the log.

use compass_common::{Capability, Diagnostics, ToolOutcome, ToolTraceEntry};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct DiagnosticsRecorder {
    steps: Vec<String>,
    tool_trace: Vec<ToolTraceEntry>,
    vision_bias: Option<Vec<String>>,
    errors: Vec<String>,
}

impl DiagnosticsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarse orchestration milestone
    pub fn step(&mut self, step: impl Into<String>) {
        let step = step.into();
        info!("[step] {}", step);
        self.steps.push(step);
    }

    pub fn trace(&mut self, entry: ToolTraceEntry) {
        info!("[tool] {}", entry);
        self.tool_trace.push(entry);
    }

    /// Non-fatal failure attributed to a tool
    pub fn error(&mut self, tool: Capability, cause: impl std::fmt::Display) {
        let message = format!("{} {}", tool, cause);
        warn!("[error] {}", message);
        self.errors.push(message);
    }

    pub fn set_vision_bias(&mut self, bias: Vec<String>) {
        self.vision_bias = Some(bias);
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn finish(self) -> Diagnostics {
        Diagnostics {
            steps: self.steps,
            tool_trace: self.tool_trace,
            vision_bias: self.vision_bias,
            errors: if self.errors.is_empty() {
                None
            } else {
                Some(self.errors)
            },
        }
    }
}

/// Trace entry for a finished tool
pub fn trace_entry(
    tool: Capability,
    outcome: ToolOutcome,
    source_count: usize,
    elapsed_ms: u64,
    detail: Option<String>,
) -> ToolTraceEntry {
    ToolTraceEntry {
        tool,
        outcome,
        source_count,
        elapsed_ms,
        detail,
    }
}
