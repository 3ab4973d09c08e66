//! Normalized result item produced by any provider adapter.

use crate::tools::Capability;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snippets longer than this are cut at a char boundary and suffixed with an ellipsis
pub const SNIPPET_MAX_CHARS: usize = 280;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Unique within one response; stamped by the dispatcher
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Capability,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub snippet: String,
    /// Ranking signal in [0, 1]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl Source {
    pub fn new(kind: Capability, title: impl Into<String>, snippet: impl AsRef<str>) -> Self {
        Self {
            id: String::new(),
            kind,
            title: title.into(),
            url: None,
            snippet: truncate_snippet(snippet.as_ref()),
            confidence: 0.0,
            metadata: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key)?.as_str()
    }

    /// Title and snippet, for keyword matching
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.snippet)
    }
}

/// Clamp into [0, 1]; NaN and infinities collapse to 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Collapse whitespace and cap length
pub fn truncate_snippet(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SNIPPET_MAX_CHARS {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(SNIPPET_MAX_CHARS - 1).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(1.7), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert_eq!(clamp_confidence(f64::INFINITY), 0.0);
        assert_eq!(clamp_confidence(0.42), 0.42);
    }

    #[test]
    fn test_truncate_snippet_long() {
        let long = "word ".repeat(200);
        let snippet = truncate_snippet(&long);
        assert!(snippet.chars().count() <= SNIPPET_MAX_CHARS);
        assert!(snippet.ends_with('…'));
    }

    #[test]
    fn test_truncate_snippet_collapses_whitespace() {
        assert_eq!(truncate_snippet("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_serializes_type_field() {
        let source = Source::new(Capability::Knowledge, "Rust", "A language").with_confidence(0.5);
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "knowledge");
        assert!(json.get("url").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_meta_str() {
        let source = Source::new(Capability::System, "t", "s").with_meta("firstStep", "do it");
        assert_eq!(source.meta_str("firstStep"), Some("do it"));
        assert_eq!(source.meta_str("missing"), None);
    }
}
