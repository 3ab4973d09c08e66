//! System playbook adapter.
//!
//! Matches the query against a local corpus of operational playbooks. The
//! corpus is a TOML file of `[[playbook]]` tables; a built-in corpus ships
//! with the daemon and a configured file replaces it. No network involved,
//! but the file is still treated as untrusted input.

use super::{ProviderAdapter, ProviderError, ProviderQuery};
use crate::config::SystemProviderConfig;
use crate::vision;
use async_trait::async_trait;
use compass_common::{Capability, Source};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

const BUILTIN_CORPUS: &str = include_str!("../../playbooks/default.toml");

/// Field weights for token overlap
const TAG_WEIGHT: f64 = 3.0;
const TITLE_WEIGHT: f64 = 2.0;
const SUMMARY_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Deserialize)]
pub struct Playbook {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub local_first: bool,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl Playbook {
    fn is_usable(&self) -> bool {
        !self.id.trim().is_empty() && !self.title.trim().is_empty() && !self.steps.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct Corpus {
    #[serde(default)]
    playbook: Vec<Playbook>,
}

/// Parse a corpus, dropping entries without id, title or steps
pub fn parse_corpus(text: &str) -> Result<Vec<Playbook>, ProviderError> {
    let corpus: Corpus =
        toml::from_str(text).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    let total = corpus.playbook.len();
    let usable: Vec<Playbook> = corpus.playbook.into_iter().filter(Playbook::is_usable).collect();
    if usable.len() < total {
        warn!("system: skipped {} incomplete playbooks", total - usable.len());
    }
    Ok(usable)
}

pub struct SystemAdapter {
    config: SystemProviderConfig,
}

impl SystemAdapter {
    pub fn new(config: SystemProviderConfig) -> Self {
        Self { config }
    }

    async fn load_corpus(&self) -> Result<Vec<Playbook>, ProviderError> {
        match &self.config.playbook_path {
            Some(path) => load_corpus_file(path).await,
            None => parse_corpus(BUILTIN_CORPUS),
        }
    }
}

async fn load_corpus_file(path: &Path) -> Result<Vec<Playbook>, ProviderError> {
    debug!("system: reading playbooks from {}", path.display());
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ProviderError::Unavailable(format!("{}: {}", path.display(), e)))?;
    parse_corpus(&text)
}

#[async_trait]
impl ProviderAdapter for SystemAdapter {
    fn capability(&self) -> Capability {
        Capability::System
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<Source>, ProviderError> {
        let corpus = self.load_corpus().await?;
        let composed = query.composed(query.bias.len());
        Ok(match_playbooks(&corpus, &composed, self.config.max_results))
    }
}

/// Query terms, with hyphenated terms also split into their parts
fn query_terms(text: &str) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    for term in vision::content_terms(text) {
        if term.contains('-') {
            terms.extend(
                term.split('-')
                    .filter(|p| p.chars().count() >= 2)
                    .map(String::from),
            );
        }
        terms.insert(term);
    }
    terms
}

fn playbook_score(playbook: &Playbook, terms: &BTreeSet<String>) -> f64 {
    if terms.is_empty() {
        return 0.0;
    }
    let tags: BTreeSet<String> = playbook
        .tags
        .iter()
        .flat_map(|t| vision::tokenize(t))
        .collect();
    let title: BTreeSet<String> = vision::tokenize(&playbook.title).into_iter().collect();
    let summary: BTreeSet<String> = vision::tokenize(&playbook.summary).into_iter().collect();

    let weighted: f64 = terms
        .iter()
        .map(|t| {
            let mut w = 0.0;
            if tags.contains(t) {
                w += TAG_WEIGHT;
            }
            if title.contains(t) {
                w += TITLE_WEIGHT;
            }
            if summary.contains(t) {
                w += SUMMARY_WEIGHT;
            }
            w
        })
        .sum();

    // Three strong hits (tag + title) saturate the score
    (weighted / (3.0 * (TAG_WEIGHT + TITLE_WEIGHT))).min(1.0)
}

/// Rank playbooks against the query; only playbooks with some overlap are returned
pub fn match_playbooks(corpus: &[Playbook], query: &str, max_results: usize) -> Vec<Source> {
    let terms = query_terms(query);

    let mut scored: Vec<(&Playbook, f64)> = corpus
        .iter()
        .map(|p| (p, playbook_score(p, &terms)))
        .filter(|(_, score)| *score > 0.0)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));

    scored
        .into_iter()
        .take(max_results)
        .map(|(playbook, score)| {
            let mut source = Source::new(Capability::System, &playbook.title, &playbook.summary)
                .with_confidence(score)
                .with_meta("playbookId", playbook.id.as_str())
                .with_meta("localFirst", playbook.local_first)
                .with_meta("stepCount", playbook.steps.len());
            if let Some(first) = playbook.steps.first() {
                source = source.with_meta("firstStep", first.as_str());
            }
            source
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_corpus_parses() {
        let corpus = parse_corpus(BUILTIN_CORPUS).unwrap();
        assert!(corpus.len() >= 8);
        let mut ids: Vec<&str> = corpus.iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), corpus.len(), "playbook ids must be unique");
    }

    #[test]
    fn test_voice_assistant_matches_voice_playbook() {
        let corpus = parse_corpus(BUILTIN_CORPUS).unwrap();
        let sources = match_playbooks(&corpus, "plan a local voice assistant privacy-first ubuntu", 5);
        assert!(!sources.is_empty());
        assert_eq!(sources[0].meta_str("playbookId"), Some("local-voice-assistant"));
        assert!(sources[0].meta_str("firstStep").is_some());
        assert!(sources.iter().all(|s| s.kind == Capability::System));
        assert!(sources.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_no_overlap_is_empty() {
        let corpus = parse_corpus(BUILTIN_CORPUS).unwrap();
        assert!(match_playbooks(&corpus, "sourdough starter hydration", 5).is_empty());
    }

    #[test]
    fn test_incomplete_playbooks_skipped() {
        let text = r#"
[[playbook]]
id = "ok"
title = "Fine"
steps = ["do it"]

[[playbook]]
id = "no-steps"
title = "Missing steps"
"#;
        let corpus = parse_corpus(text).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus[0].id, "ok");
    }

    #[test]
    fn test_bad_toml_is_malformed() {
        let err = parse_corpus("[[playbook]\nid =").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_configured_file_replaces_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playbooks.toml");
        std::fs::write(
            &path,
            "[[playbook]]\nid = \"garden\"\ntitle = \"Sourdough starter\"\ntags = [\"sourdough\"]\nsteps = [\"feed it\"]\n",
        )
        .unwrap();

        let adapter = SystemAdapter::new(SystemProviderConfig {
            playbook_path: Some(path),
            ..Default::default()
        });
        let sources = adapter
            .fetch(&ProviderQuery::new("sourdough starter", vec![]))
            .await
            .unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].meta_str("firstStep"), Some("feed it"));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let adapter = SystemAdapter::new(SystemProviderConfig {
            playbook_path: Some("/nonexistent/compass/playbooks.toml".into()),
            ..Default::default()
        });
        let err = adapter.fetch(&ProviderQuery::new("x y", vec![])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }
}
