//! Community discussion adapter backed by the Stack Exchange API.

use super::{get_json, match_score, str_field, strip_html, ProviderAdapter, ProviderError, ProviderQuery};
use crate::config::CommunityProviderConfig;
use async_trait::async_trait;
use compass_common::{Capability, Source};
use std::time::Duration;
use tracing::debug;

/// Q&A search is literal; one bias term at most
const BIAS_TERMS: usize = 1;

/// Vote count treated as "fully endorsed"
const VOTE_CEILING: f64 = 100.0;

pub struct CommunityAdapter {
    http: reqwest::Client,
    config: CommunityProviderConfig,
}

impl CommunityAdapter {
    pub fn new(http: reqwest::Client, config: CommunityProviderConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl ProviderAdapter for CommunityAdapter {
    fn capability(&self) -> Capability {
        Capability::Community
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<Source>, ProviderError> {
        let url = format!(
            "{}/2.3/search/advanced",
            self.config.base_url.trim_end_matches('/')
        );
        let q = query.composed(BIAS_TERMS);
        debug!("community: GET {} q={:?} site={}", url, q, self.config.site);

        let mut params = vec![
            ("q", q),
            ("site", self.config.site.clone()),
            ("order", "desc".to_string()),
            ("sort", "relevance".to_string()),
            ("filter", "withbody".to_string()),
            ("pagesize", self.config.max_results.to_string()),
        ];
        if let Some(key) = &self.config.api_key {
            params.push(("key", key.clone()));
        }

        let body = get_json(&self.http, &url, &params, self.timeout()).await?;
        parse_results(&body, &self.config.site, &query.query, self.config.max_results)
    }
}

/// Map a `{ "items": [...] }` payload into sources
pub fn parse_results(
    body: &serde_json::Value,
    site: &str,
    query: &str,
    max_results: usize,
) -> Result<Vec<Source>, ProviderError> {
    if let Some(message) = str_field(body, "error_message") {
        return Err(ProviderError::Unavailable(format!("api error: {}", message)));
    }

    let items = body
        .get("items")
        .and_then(|i| i.as_array())
        .ok_or_else(|| ProviderError::Malformed("missing 'items' array".to_string()))?;

    let sources = items
        .iter()
        .filter(|item| str_field(item, "title").is_some() && str_field(item, "link").is_some())
        .take(max_results)
        .filter_map(|item| {
            let title = strip_html(str_field(item, "title")?);
            let link = str_field(item, "link")?;
            let is_answered = item.get("is_answered").and_then(|v| v.as_bool()).unwrap_or(false);
            let answers = item.get("answer_count").and_then(|v| v.as_u64()).unwrap_or(0);
            let votes = item.get("score").and_then(|v| v.as_i64()).unwrap_or(0);
            let tags: Vec<String> = item
                .get("tags")
                .and_then(|t| t.as_array())
                .map(|t| t.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default();

            let snippet = match str_field(item, "body") {
                Some(html) => strip_html(html),
                None => describe_thread(&tags, answers, is_answered),
            };

            let relevance = match_score(&format!("{} {}", title, tags.join(" ")), query);
            let answered = if is_answered { 1.0 } else { 0.0 };
            let confidence = 0.5 * relevance + 0.25 * answered + 0.25 * vote_signal(votes);

            Some(
                Source::new(Capability::Community, title, snippet)
                    .with_url(link)
                    .with_confidence(confidence)
                    .with_meta("site", site)
                    .with_meta("answerCount", answers)
                    .with_meta("isAnswered", is_answered)
                    .with_meta("tags", tags),
            )
        })
        .collect();

    Ok(sources)
}

fn describe_thread(tags: &[String], answers: u64, is_answered: bool) -> String {
    let mut parts = Vec::new();
    if !tags.is_empty() {
        parts.push(format!("Tags: {}", tags.join(", ")));
    }
    parts.push(format!("{} answers", answers));
    if is_answered {
        parts.push("answered".to_string());
    }
    parts.join(" · ")
}

/// Log-scaled vote count in [0, 1]; negative scores count as zero
fn vote_signal(votes: i64) -> f64 {
    let votes = votes.max(0) as f64;
    ((votes + 1.0).ln() / (VOTE_CEILING + 1.0).ln()).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_results() {
        let body = json!({
            "items": [
                {"title": "How do I run a voice assistant offline?", "link": "https://askubuntu.com/q/1",
                 "is_answered": true, "answer_count": 4, "score": 37, "tags": ["voice", "offline"],
                 "owner": {"display_name": "someone", "user_id": 99}},
                {"title": "Mic not detected", "link": "https://askubuntu.com/q/2",
                 "is_answered": false, "answer_count": 0, "score": -2}
            ],
            "has_more": false,
            "quota_remaining": 290
        });
        let sources = parse_results(&body, "askubuntu", "voice assistant", 5).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].snippet, "Tags: voice, offline · 4 answers · answered");
        let meta = sources[0].metadata.as_ref().unwrap();
        assert_eq!(meta["site"], "askubuntu");
        assert_eq!(meta["isAnswered"], true);
        assert!(!meta.contains_key("owner"));
        assert!(sources[0].confidence > sources[1].confidence);
        assert!(sources.iter().all(|s| (0.0..=1.0).contains(&s.confidence)));
    }

    #[test]
    fn test_body_used_as_snippet() {
        let body = json!({"items": [
            {"title": "Q", "link": "https://x", "body": "<p>I tried <code>arecord</code></p>"}
        ]});
        let sources = parse_results(&body, "askubuntu", "q", 5).unwrap();
        assert_eq!(sources[0].snippet, "I tried arecord");
    }

    #[test]
    fn test_api_error_is_unavailable() {
        let body = json!({"error_id": 502, "error_name": "throttle_violation", "error_message": "too many requests"});
        let err = parse_results(&body, "askubuntu", "x", 5).unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[test]
    fn test_missing_items_is_malformed() {
        let err = parse_results(&json!([1, 2, 3]), "askubuntu", "x", 5).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn test_vote_signal_bounds() {
        assert_eq!(vote_signal(-10), 0.0);
        assert_eq!(vote_signal(0), 0.0);
        assert!(vote_signal(10) < vote_signal(50));
        assert_eq!(vote_signal(10_000), 1.0);
    }
}
