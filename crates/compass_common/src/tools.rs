//! Capability toggles.
//!
//! The four capabilities are a closed set. `ToolSettings` has one field per
//! capability so a typo in a request can never silently switch a tool off;
//! the wire form (`PartialToolSettings`) ignores unknown keys and leaves the
//! defaulting decision to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One information-gathering channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Search,
    Knowledge,
    Community,
    System,
}

impl Capability {
    /// Fixed enumeration order used for dispatch and trace output
    pub const ALL: [Capability; 4] = [
        Capability::Search,
        Capability::Knowledge,
        Capability::Community,
        Capability::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Knowledge => "knowledge",
            Self::Community => "community",
            Self::System => "system",
        }
    }

    /// Tie-break rank when two sources share a confidence (lower wins).
    /// knowledge > search > community > system
    pub fn priority(&self) -> u8 {
        match self {
            Self::Knowledge => 0,
            Self::Search => 1,
            Self::Community => 2,
            Self::System => 3,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "search" => Ok(Self::Search),
            "knowledge" => Ok(Self::Knowledge),
            "community" => Ok(Self::Community),
            "system" => Ok(Self::System),
            other => Err(format!(
                "unknown tool '{}' (expected search, knowledge, community or system)",
                other
            )),
        }
    }
}

/// Resolved on/off state for every capability. Keys missing from a stored
/// table stay enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub search: bool,
    pub knowledge: bool,
    pub community: bool,
    pub system: bool,
}

impl ToolSettings {
    pub fn all_enabled() -> Self {
        Self {
            search: true,
            knowledge: true,
            community: true,
            system: true,
        }
    }

    pub fn none() -> Self {
        Self {
            search: false,
            knowledge: false,
            community: false,
            system: false,
        }
    }

    /// Enable exactly the listed capabilities
    pub fn only(caps: &[Capability]) -> Self {
        let mut settings = Self::none();
        for cap in caps {
            settings.set(*cap, true);
        }
        settings
    }

    pub fn is_enabled(&self, cap: Capability) -> bool {
        match cap {
            Capability::Search => self.search,
            Capability::Knowledge => self.knowledge,
            Capability::Community => self.community,
            Capability::System => self.system,
        }
    }

    pub fn set(&mut self, cap: Capability, on: bool) {
        match cap {
            Capability::Search => self.search = on,
            Capability::Knowledge => self.knowledge = on,
            Capability::Community => self.community = on,
            Capability::System => self.system = on,
        }
    }

    /// Enabled capabilities in fixed enumeration order
    pub fn enabled(&self) -> Vec<Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(|cap| self.is_enabled(*cap))
            .collect()
    }

    pub fn enabled_count(&self) -> usize {
        self.enabled().len()
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::all_enabled()
    }
}

/// Wire form of the capability map. Unknown keys are dropped by serde.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialToolSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<bool>,
}

impl PartialToolSettings {
    /// Fill missing keys from `fallback`
    pub fn resolve(&self, fallback: ToolSettings) -> ToolSettings {
        ToolSettings {
            search: self.search.unwrap_or(fallback.search),
            knowledge: self.knowledge.unwrap_or(fallback.knowledge),
            community: self.community.unwrap_or(fallback.community),
            system: self.system.unwrap_or(fallback.system),
        }
    }
}

impl From<ToolSettings> for PartialToolSettings {
    fn from(settings: ToolSettings) -> Self {
        Self {
            search: Some(settings.search),
            knowledge: Some(settings.knowledge),
            community: Some(settings.community),
            system: Some(settings.system),
        }
    }
}
