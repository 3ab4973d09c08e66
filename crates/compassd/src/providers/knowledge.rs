//! Structured knowledge adapter backed by the MediaWiki search API.

use super::{get_json, match_score, rank_decay, str_field, strip_html, ProviderAdapter, ProviderError, ProviderQuery};
use crate::config::KnowledgeProviderConfig;
use async_trait::async_trait;
use compass_common::{Capability, Source};
use std::time::Duration;
use tracing::debug;

/// Encyclopedic search drifts quickly with extra terms
const BIAS_TERMS: usize = 2;

pub struct KnowledgeAdapter {
    http: reqwest::Client,
    config: KnowledgeProviderConfig,
}

impl KnowledgeAdapter {
    pub fn new(http: reqwest::Client, config: KnowledgeProviderConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl ProviderAdapter for KnowledgeAdapter {
    fn capability(&self) -> Capability {
        Capability::Knowledge
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<Source>, ProviderError> {
        let base = self.config.base_url.trim_end_matches('/');
        let url = format!("{}/w/api.php", base);
        let q = query.composed(BIAS_TERMS);
        debug!("knowledge: GET {} srsearch={:?}", url, q);

        let body = get_json(
            &self.http,
            &url,
            &[
                ("action", "query".to_string()),
                ("list", "search".to_string()),
                ("format", "json".to_string()),
                ("srsearch", q),
                ("srlimit", self.config.max_results.to_string()),
            ],
            self.timeout(),
        )
        .await?;

        parse_results(&body, base, &query.query, self.config.max_results)
    }
}

/// Map a `{ "query": { "search": [...] } }` payload into sources
pub fn parse_results(
    body: &serde_json::Value,
    base_url: &str,
    query: &str,
    max_results: usize,
) -> Result<Vec<Source>, ProviderError> {
    if let Some(err) = body.get("error") {
        let info = str_field(err, "info").unwrap_or("unknown error");
        return Err(ProviderError::Unavailable(format!("api error: {}", info)));
    }

    let hits = body
        .get("query")
        .and_then(|q| q.get("search"))
        .and_then(|s| s.as_array())
        .ok_or_else(|| ProviderError::Malformed("missing 'query.search' array".to_string()))?;

    let usable: Vec<&serde_json::Value> = hits
        .iter()
        .filter(|hit| str_field(hit, "title").is_some())
        .take(max_results)
        .collect();

    let total = usable.len();
    let sources = usable
        .into_iter()
        .enumerate()
        .filter_map(|(rank, hit)| {
            let title = str_field(hit, "title")?;
            let snippet = strip_html(str_field(hit, "snippet").unwrap_or(""));
            let relevance = match_score(&format!("{} {}", title, snippet), query)
                .max(match_score(query, title));
            let confidence = 0.7 * relevance + 0.3 * rank_decay(rank, total);

            let mut source =
                Source::new(Capability::Knowledge, title, snippet).with_confidence(confidence);
            if let Some(url) = page_url(base_url, title) {
                source = source.with_url(url);
            }
            if let Some(page_id) = hit.get("pageid").and_then(|v| v.as_u64()) {
                source = source.with_meta("pageId", page_id);
            }
            if let Some(words) = hit.get("wordcount").and_then(|v| v.as_u64()) {
                source = source.with_meta("wordCount", words);
            }
            Some(source)
        })
        .collect();

    Ok(sources)
}

/// `<base>/wiki/<Title_With_Underscores>`, with the title percent-encoded as one segment
fn page_url(base_url: &str, title: &str) -> Option<String> {
    let mut url = reqwest::Url::parse(base_url).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push("wiki")
        .push(&title.replace(' ', "_"));
    Some(url.to_string())
}
