//! Web search adapter backed by a SearxNG instance's JSON API.

use super::{get_json, match_score, rank_decay, str_field, strip_html, ProviderAdapter, ProviderError, ProviderQuery};
use crate::config::SearchProviderConfig;
use async_trait::async_trait;
use compass_common::{Capability, Source};
use std::time::Duration;
use tracing::debug;

/// Bias keywords appended to the web query
const BIAS_TERMS: usize = 3;

pub struct SearchAdapter {
    http: reqwest::Client,
    config: SearchProviderConfig,
}

impl SearchAdapter {
    pub fn new(http: reqwest::Client, config: SearchProviderConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl ProviderAdapter for SearchAdapter {
    fn capability(&self) -> Capability {
        Capability::Search
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<Source>, ProviderError> {
        let q = query.composed(BIAS_TERMS);
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        debug!("search: GET {} q={:?}", url, q);

        let body = get_json(
            &self.http,
            &url,
            &[("q", q), ("format", "json".to_string())],
            self.timeout(),
        )
        .await?;

        parse_results(&body, &query.query, self.config.max_results)
    }
}

/// Map a SearxNG `{ "results": [...] }` payload into sources
pub fn parse_results(
    body: &serde_json::Value,
    query: &str,
    max_results: usize,
) -> Result<Vec<Source>, ProviderError> {
    let results = body
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| ProviderError::Malformed("missing 'results' array".to_string()))?;

    let usable: Vec<&serde_json::Value> = results
        .iter()
        .filter(|item| str_field(item, "title").is_some() && str_field(item, "url").is_some())
        .take(max_results)
        .collect();

    let total = usable.len();
    let sources = usable
        .into_iter()
        .enumerate()
        .filter_map(|(rank, item)| {
            let title = strip_html(str_field(item, "title")?);
            let url = str_field(item, "url")?;
            let snippet = strip_html(str_field(item, "content").unwrap_or(""));
            let relevance = match_score(&format!("{} {}", title, snippet), query);
            let confidence = 0.6 * relevance + 0.4 * rank_decay(rank, total);

            let mut source = Source::new(Capability::Search, title, snippet)
                .with_url(url)
                .with_confidence(confidence)
                .with_meta("rank", rank + 1);
            if let Some(engine) = str_field(item, "engine") {
                source = source.with_meta("engine", engine);
            }
            Some(source)
        })
        .collect();

    Ok(sources)
}
