//! Remembered client preferences: vision text and default tools.
//!
//! Stored as TOML at `<config dir>/compass/prefs.toml` unless `$COMPASS_PREFS`
//! points elsewhere. The daemon never reads this file; the client merges it
//! into each request.

use anyhow::{anyhow, bail, Context, Result};
use compass_common::{Capability, ToolSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment override for the preferences file
pub const PREFS_ENV: &str = "COMPASS_PREFS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<String>,

    #[serde(default)]
    pub tools: ToolSettings,
}

impl Preferences {
    /// Default location, honoring `$COMPASS_PREFS`
    pub fn path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(PREFS_ENV) {
            return Ok(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("compass").join("prefs.toml"))
            .ok_or_else(|| anyhow!("No config directory; set {}", PREFS_ENV))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// A missing file means nothing has been remembered yet
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Remembered vision, if it has any content
    pub fn vision_text(&self) -> Option<&str> {
        self.vision.as_deref().filter(|v| !v.trim().is_empty())
    }
}

/// Parse `search,knowledge`, `all` or `none` into a full tool set.
/// Anything not listed is disabled.
pub fn parse_tool_list(list: &str) -> Result<ToolSettings> {
    let list = list.trim();
    match list {
        "all" => return Ok(ToolSettings::all_enabled()),
        "none" | "" => return Ok(ToolSettings::none()),
        _ => {}
    }

    let mut tools = ToolSettings::none();
    for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let cap: Capability = name.parse().map_err(|e: String| anyhow!(e))?;
        if tools.is_enabled(cap) {
            bail!("{} listed twice", cap);
        }
        tools.set(cap, true);
    }
    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_list() {
        let tools = parse_tool_list("search, system").unwrap();
        assert_eq!(tools.enabled(), vec![Capability::Search, Capability::System]);
        assert_eq!(parse_tool_list("all").unwrap(), ToolSettings::all_enabled());
        assert_eq!(parse_tool_list("none").unwrap(), ToolSettings::none());
    }

    #[test]
    fn test_parse_tool_list_rejects_unknown_and_duplicates() {
        assert!(parse_tool_list("search,teleport").is_err());
        assert!(parse_tool_list("search,search").is_err());
    }

    #[test]
    fn test_blank_vision_is_not_text() {
        let prefs = Preferences {
            vision: Some("  ".into()),
            ..Preferences::default()
        };
        assert_eq!(prefs.vision_text(), None);
    }
}
