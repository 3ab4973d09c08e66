//! Compass CLI library - exposes modules for testing.

pub mod cli;
pub mod client;
pub mod prefs;
pub mod render;

use anyhow::Result;
use compass_common::QueryRequest;
use prefs::{parse_tool_list, Preferences};

/// Per-invocation overrides for `ask`
#[derive(Debug, Default)]
pub struct AskOverrides {
    pub vision: Option<String>,
    pub no_vision: bool,
    pub tools: Option<String>,
}

/// Build the wire request from the query, remembered prefs and flags.
/// Flags win over prefs; tools are always sent explicitly.
pub fn build_request(query: &str, prefs: &Preferences, overrides: &AskOverrides) -> Result<QueryRequest> {
    let tools = match &overrides.tools {
        Some(list) => parse_tool_list(list)?,
        None => prefs.tools,
    };

    let mut request = QueryRequest::new(query).with_tools(tools);
    let vision = if overrides.no_vision {
        None
    } else {
        overrides
            .vision
            .as_deref()
            .or_else(|| prefs.vision_text())
    };
    if let Some(vision) = vision {
        request = request.with_vision(vision);
    }
    Ok(request)
}
