//! Orchestrator: one request in, one response out.
//!
//! vision -> dispatcher -> synthesizer -> assembler, all under a tracing span
//! keyed by a fresh request id. Provider failures never surface here; they are
//! already folded into diagnostics by the dispatcher. The only error this
//! returns is a broken response invariant.

use crate::assembler;
use crate::config::{Config, OrchestratorConfig};
use crate::diagnostics::DiagnosticsRecorder;
use crate::dispatcher::ToolDispatcher;
use crate::providers::ProviderSet;
use crate::synthesizer::{Synthesis, Synthesizer, MAX_PLAN_STEPS, MIN_PLAN_STEPS};
use crate::vision;
use compass_common::{Capability, CompassError, QueryResponse, ToolSettings, ValidatedRequest};
use std::collections::HashSet;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub struct Orchestrator {
    dispatcher: ToolDispatcher,
    synthesizer: Synthesizer,
    config: OrchestratorConfig,
    default_tools: ToolSettings,
    configured: Vec<Capability>,
}

impl Orchestrator {
    pub fn new(
        providers: ProviderSet,
        config: OrchestratorConfig,
        default_tools: ToolSettings,
    ) -> Self {
        let configured = providers.capabilities();
        Self {
            dispatcher: ToolDispatcher::new(providers, config.request_deadline()),
            synthesizer: Synthesizer::new(config.max_sources, config.summary_top_n),
            config,
            default_tools,
            configured,
        }
    }

    pub fn from_config(config: &Config, providers: ProviderSet) -> Self {
        Self::new(
            providers,
            config.orchestrator.clone(),
            config.tools.to_settings(),
        )
    }

    /// Tools used when a request omits `enabledTools`
    pub fn default_tools(&self) -> ToolSettings {
        self.default_tools
    }

    /// Capabilities that have an adapter
    pub fn configured(&self) -> &[Capability] {
        &self.configured
    }

    pub async fn answer(&self, request: ValidatedRequest) -> Result<QueryResponse, CompassError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("query", %request_id);
        self.answer_inner(request).instrument(span).await
    }

    async fn answer_inner(&self, request: ValidatedRequest) -> Result<QueryResponse, CompassError> {
        let mut recorder = DiagnosticsRecorder::new();
        recorder.step(format!(
            "accepted query with {} of {} tools enabled",
            request.tools.enabled_count(),
            Capability::ALL.len()
        ));

        let bias = match request.vision_text() {
            Some(text) => {
                let bias = vision::extract_bias(text, self.config.vision_keyword_cap);
                if bias.is_empty() {
                    recorder.step("vision supplied but yielded no keywords");
                } else {
                    recorder.step(format!("extracted vision bias: {}", bias.join(", ")));
                }
                recorder.set_vision_bias(bias.clone());
                bias
            }
            None => Vec::new(),
        };

        let sources = self
            .dispatcher
            .dispatch(&request.query, &bias, request.tools, &mut recorder)
            .await;

        let synthesis = self
            .synthesizer
            .synthesize(&request.query, &bias, sources, &mut recorder);
        check_invariants(&synthesis)?;

        let error_count = recorder.error_count();
        let Synthesis {
            summary,
            plan,
            sources,
        } = synthesis;
        let response = assembler::assemble(&request, summary, plan, sources, recorder.finish());

        info!(
            sources = response.sources.len(),
            errors = error_count,
            "answered query"
        );
        Ok(response)
    }
}

/// Unique ids, confidences in range, plan length in bounds
fn check_invariants(synthesis: &Synthesis) -> Result<(), CompassError> {
    let mut seen = HashSet::new();
    for source in &synthesis.sources {
        if !seen.insert(source.id.as_str()) {
            return Err(CompassError::Orchestration(format!(
                "duplicate source id {}",
                source.id
            )));
        }
        if !(0.0..=1.0).contains(&source.confidence) {
            return Err(CompassError::Orchestration(format!(
                "source {} has confidence {} outside [0, 1]",
                source.id, source.confidence
            )));
        }
    }

    let steps = synthesis.plan.len();
    if !(MIN_PLAN_STEPS..=MAX_PLAN_STEPS).contains(&steps) {
        return Err(CompassError::Orchestration(format!(
            "plan has {} steps, expected {} to {}",
            steps, MIN_PLAN_STEPS, MAX_PLAN_STEPS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_common::Source;

    fn synthesis(sources: Vec<Source>, steps: usize) -> Synthesis {
        Synthesis {
            summary: "s".into(),
            plan: (0..steps).map(|i| format!("step {}", i)).collect(),
            sources,
        }
    }

    fn with_id(id: &str, confidence: f64) -> Source {
        Source {
            id: id.into(),
            confidence,
            ..Source::new(Capability::Search, "t", "s")
        }
    }

    #[test]
    fn test_invariants_accept_valid() {
        let ok = synthesis(vec![with_id("search-1", 0.5), with_id("search-2", 1.0)], 4);
        assert!(check_invariants(&ok).is_ok());
    }

    #[test]
    fn test_invariants_reject_duplicate_ids() {
        let dup = synthesis(vec![with_id("search-1", 0.5), with_id("search-1", 0.4)], 4);
        assert!(matches!(
            check_invariants(&dup),
            Err(CompassError::Orchestration(_))
        ));
    }

    #[test]
    fn test_invariants_reject_bad_confidence_and_plan() {
        assert!(check_invariants(&synthesis(vec![with_id("a", 1.5)], 4)).is_err());
        assert!(check_invariants(&synthesis(Vec::new(), 2)).is_err());
        assert!(check_invariants(&synthesis(Vec::new(), 8)).is_err());
    }
}
