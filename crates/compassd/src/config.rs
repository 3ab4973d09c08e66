//! Configuration management for compassd.
//!
//! Loads settings from the first config file found, or uses defaults.
//! Every field has its own serde default so partial files are fine.

use anyhow::{Context, Result};
use compass_common::{CompassError, ToolSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// System-wide config file path
pub const CONFIG_PATH: &str = "/etc/compass/config.toml";

/// Environment override for the config file path
pub const CONFIG_ENV: &str = "COMPASS_CONFIG";

/// Upper bound on vision keywords; bias stays a handful of terms
pub const MAX_VISION_KEYWORDS: usize = 10;

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address; localhost only by default
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_bind_addr() -> String {
    compass_common::DEFAULT_ADDR.to_string()
}

fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Orchestration limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Overall dispatcher deadline; pending adapters become timeouts after this
    #[serde(default = "default_request_deadline")]
    pub request_deadline_ms: u64,

    /// Maximum bias keywords pulled from the vision text
    #[serde(default = "default_vision_keyword_cap")]
    pub vision_keyword_cap: usize,

    /// Maximum sources kept after ranking
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Number of top sources named in the summary
    #[serde(default = "default_summary_top_n")]
    pub summary_top_n: usize,
}

fn default_request_deadline() -> u64 {
    12_000
}

fn default_vision_keyword_cap() -> usize {
    6
}

fn default_max_sources() -> usize {
    20
}

fn default_summary_top_n() -> usize {
    3
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            request_deadline_ms: default_request_deadline(),
            vision_keyword_cap: default_vision_keyword_cap(),
            max_sources: default_max_sources(),
            summary_top_n: default_summary_top_n(),
        }
    }
}

impl OrchestratorConfig {
    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    /// Reject limits the pipeline cannot honor
    pub fn validate(&self) -> std::result::Result<(), CompassError> {
        if self.request_deadline_ms == 0 {
            return Err(CompassError::Config(
                "orchestrator.request_deadline_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_sources == 0 {
            return Err(CompassError::Config(
                "orchestrator.max_sources must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_VISION_KEYWORDS).contains(&self.vision_keyword_cap) {
            return Err(CompassError::Config(format!(
                "orchestrator.vision_keyword_cap must be between 1 and {}, got {}",
                MAX_VISION_KEYWORDS, self.vision_keyword_cap
            )));
        }
        if self.summary_top_n == 0 {
            return Err(CompassError::Config(
                "orchestrator.summary_top_n must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Capability set used when a request omits `enabledTools`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_true")]
    pub search: bool,
    #[serde(default = "default_true")]
    pub knowledge: bool,
    #[serde(default = "default_true")]
    pub community: bool,
    #[serde(default = "default_true")]
    pub system: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search: true,
            knowledge: true,
            community: true,
            system: true,
        }
    }
}

impl ToolsConfig {
    pub fn to_settings(&self) -> ToolSettings {
        ToolSettings {
            search: self.search,
            knowledge: self.knowledge,
            community: self.community,
            system: self.system,
        }
    }
}

/// Web search provider (SearxNG JSON API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProviderConfig {
    #[serde(default = "default_search_url")]
    pub base_url: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_search_url() -> String {
    "http://127.0.0.1:8888".to_string()
}

fn default_provider_timeout() -> u64 {
    6_000
}

fn default_max_results() -> usize {
    5
}

impl Default for SearchProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_url(),
            timeout_ms: default_provider_timeout(),
            max_results: default_max_results(),
        }
    }
}

/// Structured knowledge provider (MediaWiki search API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeProviderConfig {
    #[serde(default = "default_knowledge_url")]
    pub base_url: String,
    #[serde(default = "default_provider_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_knowledge_url() -> String {
    "https://en.wikipedia.org".to_string()
}

impl Default for KnowledgeProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_knowledge_url(),
            timeout_ms: default_provider_timeout(),
            max_results: default_max_results(),
        }
    }
}

/// Community discussion provider (Stack Exchange API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityProviderConfig {
    #[serde(default = "default_community_url")]
    pub base_url: String,
    /// Stack Exchange site slug
    #[serde(default = "default_community_site")]
    pub site: String,
    /// Optional API key; raises the anonymous quota
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_provider_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_community_url() -> String {
    "https://api.stackexchange.com".to_string()
}

fn default_community_site() -> String {
    "askubuntu".to_string()
}

impl Default for CommunityProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_community_url(),
            site: default_community_site(),
            api_key: None,
            timeout_ms: default_provider_timeout(),
            max_results: default_max_results(),
        }
    }
}

/// Local playbook corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemProviderConfig {
    /// TOML corpus on disk; the built-in corpus is used when unset
    #[serde(default)]
    pub playbook_path: Option<PathBuf>,
    #[serde(default = "default_system_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_system_timeout() -> u64 {
    2_000
}

impl Default for SystemProviderConfig {
    fn default() -> Self {
        Self {
            playbook_path: None,
            timeout_ms: default_system_timeout(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub search: SearchProviderConfig,
    #[serde(default)]
    pub knowledge: KnowledgeProviderConfig,
    #[serde(default)]
    pub community: CommunityProviderConfig,
    #[serde(default)]
    pub system: SystemProviderConfig,
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Default capability set
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Config {
    /// Load config from the first path that parses, or return defaults.
    ///
    /// Order: explicit path, `$COMPASS_CONFIG`, /etc/compass/config.toml,
    /// user config dir.
    pub fn load(explicit: Option<&Path>) -> Self {
        for path in Self::candidate_paths(explicit) {
            if !path.exists() {
                continue;
            }
            match Self::load_from_path(&path) {
                Ok(config) => return config,
                Err(e) => warn!("Ignoring config {}: {}", path.display(), e),
            }
        }
        info!("No config file found, using defaults");
        Config::default()
    }

    fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = explicit {
            paths.push(path.to_path_buf());
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(env_path));
        }
        paths.push(PathBuf::from(CONFIG_PATH));
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("compass").join("config.toml"));
        }
        paths
    }

    /// Load and validate config from a specific path
    pub fn load_from_path(path: &Path) -> std::result::Result<Self, CompassError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CompassError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), CompassError> {
        self.orchestrator.validate()
    }

    /// Write the default config (for first-time setup)
    pub fn save_default(path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }
}
