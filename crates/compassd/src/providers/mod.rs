//! Provider adapters.
//!
//! One adapter per capability. Each turns a query into a call against one
//! external source and maps the reply into `Source` records. Adapters never
//! trust the provider's schema: payloads are read as `serde_json::Value` and
//! checked field by field.
//!
//! ## Usage
//!
//! Production code builds a `ProviderSet` from config. Tests build one from
//! `FakeProvider`s so no network is touched.

pub mod community;
pub mod fake;
pub mod knowledge;
pub mod search;
pub mod system;

use crate::config::Config;
use crate::vision;
use anyhow::{Context, Result};
use async_trait::async_trait;
use compass_common::{Capability, Source};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub use community::CommunityAdapter;
pub use fake::{FakeBehavior, FakeProvider};
pub use knowledge::KnowledgeAdapter;
pub use search::SearchAdapter;
pub use system::SystemAdapter;

// ============================================================================
// Contract
// ============================================================================

/// Why an adapter produced no sources
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timeout after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Adapter task panicked or was cancelled
    #[error("adapter crashed: {0}")]
    Crashed(String),
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

/// What an adapter receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderQuery {
    /// Validated user query
    pub query: String,
    /// Vision bias keywords
    pub bias: Vec<String>,
}

impl ProviderQuery {
    pub fn new(query: impl Into<String>, bias: Vec<String>) -> Self {
        Self {
            query: query.into(),
            bias,
        }
    }

    /// Query plus up to `max_terms` bias keywords
    pub fn composed(&self, max_terms: usize) -> String {
        vision::compose_query(&self.query, &self.bias, max_terms)
    }
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Capability this adapter serves; every emitted source carries it
    fn capability(&self) -> Capability;

    /// Adapter-local bound on one `fetch`
    fn timeout(&self) -> Duration;

    /// Query the provider. Zero results is `Ok(vec![])`, not an error.
    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<Source>, ProviderError>;
}

// ============================================================================
// Provider set
// ============================================================================

/// Adapters keyed by capability; read-only once built
#[derive(Clone, Default)]
pub struct ProviderSet {
    adapters: BTreeMap<Capability, Arc<dyn ProviderAdapter>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own capability, replacing any previous one
    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.capability(), adapter);
        self
    }

    pub fn get(&self, cap: Capability) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&cap).cloned()
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        self.adapters.keys().copied().collect()
    }

    /// Real adapters sharing one HTTP client
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = http_client()?;
        let providers = &config.providers;
        Ok(Self::new()
            .with(Arc::new(SearchAdapter::new(http.clone(), providers.search.clone())))
            .with(Arc::new(KnowledgeAdapter::new(
                http.clone(),
                providers.knowledge.clone(),
            )))
            .with(Arc::new(CommunityAdapter::new(http, providers.community.clone())))
            .with(Arc::new(SystemAdapter::new(providers.system.clone()))))
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Client shared by the network adapters. Compressed bodies (Stack Exchange
/// always gzips) are decoded transparently.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("compass/", env!("CARGO_PKG_VERSION")))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .build()
        .context("Failed to build HTTP client")
}

/// GET a URL and parse the body as JSON. Non-2xx is `Unavailable`.
pub(crate) async fn get_json(
    http: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
    timeout: Duration,
) -> Result<serde_json::Value, ProviderError> {
    let response = http
        .get(url)
        .query(params)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ProviderError::from_reqwest(e, timeout))?;

    if !response.status().is_success() {
        return Err(ProviderError::Unavailable(format!("HTTP {}", response.status())));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_reqwest(e, timeout))?;

    serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

/// Exact phrase match scores 1.0; otherwise term coverage, capped at 0.8
pub fn match_score(text: &str, query: &str) -> f64 {
    let haystack = text.to_lowercase();
    let phrase = query.trim().to_lowercase();
    if !phrase.is_empty() && haystack.contains(&phrase) {
        return 1.0;
    }

    let terms = vision::tokenize(query);
    if terms.is_empty() {
        return 0.0;
    }
    let words = vision::tokenize(text);
    let hits = terms.iter().filter(|t| words.contains(t)).count();
    0.8 * hits as f64 / terms.len() as f64
}

/// Position signal: 1.0 for the first result, decaying toward 0
pub fn rank_decay(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    1.0 - index as f64 / (total as f64 + 1.0)
}

/// Drop tags and decode the handful of entities providers actually send
pub fn strip_html(text: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"));
    tag.replace_all(text, "")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Read a string field, treating blanks as missing
pub(crate) fn str_field<'a>(item: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_score_exact_beats_partial() {
        let exact = match_score("How to build a local voice assistant", "local voice assistant");
        let partial = match_score("Voice recognition on Linux", "local voice assistant");
        let none = match_score("Gardening tips", "local voice assistant");
        assert_eq!(exact, 1.0);
        assert!(partial > none);
        assert!(partial < exact);
        assert_eq!(none, 0.0);
    }

    #[test]
    fn test_rank_decay_monotonic() {
        let scores: Vec<f64> = (0..5).map(|i| rank_decay(i, 5)).collect();
        assert_eq!(scores[0], 1.0);
        assert!(scores.windows(2).all(|w| w[0] > w[1]));
        assert!(scores[4] > 0.0);
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html(r#"a <span class="searchmatch">voice</span> &amp; &quot;speech&quot;"#),
            r#"a voice & "speech""#
        );
    }

    #[test]
    fn test_provider_query_composed() {
        let q = ProviderQuery::new("voice assistant", vec!["privacy".into(), "ubuntu".into()]);
        assert_eq!(q.composed(1), "voice assistant privacy");
        assert_eq!(q.composed(5), "voice assistant privacy ubuntu");
    }

    #[test]
    fn test_provider_error_display() {
        assert_eq!(
            ProviderError::Timeout(Duration::from_millis(250)).to_string(),
            "timeout after 250ms"
        );
        assert!(ProviderError::Timeout(Duration::ZERO).is_timeout());
    }
}
