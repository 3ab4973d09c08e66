//! Incoming query request and its boundary validation.

use crate::error::CompassError;
use crate::tools::{PartialToolSettings, ToolSettings};
use serde::{Deserialize, Serialize};

/// Request body as it arrives on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Missing field deserializes as empty so it fails validation, not parsing
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_tools: Option<PartialToolSettings>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_vision(mut self, vision: impl Into<String>) -> Self {
        self.vision = Some(vision.into());
        self
    }

    pub fn with_tools(mut self, tools: ToolSettings) -> Self {
        self.enabled_tools = Some(tools.into());
        self
    }

    /// Check the request and resolve the capability map.
    ///
    /// `defaults` applies when `enabledTools` is omitted. When the map is
    /// present, any key it leaves out is disabled.
    pub fn validate(self, defaults: ToolSettings) -> Result<ValidatedRequest, CompassError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(CompassError::Validation(
                "query must not be empty".to_string(),
            ));
        }

        let tools = match self.enabled_tools {
            Some(partial) => partial.resolve(ToolSettings::none()),
            None => defaults,
        };

        Ok(ValidatedRequest {
            query: query.to_string(),
            vision: self.vision,
            tools,
        })
    }
}

/// A request that passed the boundary; the only input the orchestrator accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub query: String,
    /// Echoed as given
    pub vision: Option<String>,
    pub tools: ToolSettings,
}

impl ValidatedRequest {
    /// Vision text if it has any content
    pub fn vision_text(&self) -> Option<&str> {
        self.vision.as_deref().filter(|v| !v.trim().is_empty())
    }
}
