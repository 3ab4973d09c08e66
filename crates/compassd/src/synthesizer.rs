//! Synthesizer: ranking, summary and plan.
//!
//! Everything here is deterministic given the same query, bias and sources.
//! Ordering: confidence descending, then capability priority
//! (knowledge > search > community > system), then arrival order.

use crate::diagnostics::DiagnosticsRecorder;
use crate::vision;
use compass_common::source::clamp_confidence;
use compass_common::{Capability, Source};

/// Share of the final score taken from vision affinity
const BIAS_WEIGHT: f64 = 0.15;

/// Plan length bounds
pub const MIN_PLAN_STEPS: usize = 3;
pub const MAX_PLAN_STEPS: usize = 7;

/// Output of one synthesis pass
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub summary: String,
    pub plan: Vec<String>,
    pub sources: Vec<Source>,
}

pub struct Synthesizer {
    max_sources: usize,
    summary_top_n: usize,
}

impl Synthesizer {
    pub fn new(max_sources: usize, summary_top_n: usize) -> Self {
        Self {
            max_sources: max_sources.max(1),
            summary_top_n,
        }
    }

    pub fn synthesize(
        &self,
        query: &str,
        bias: &[String],
        sources: Vec<Source>,
        recorder: &mut DiagnosticsRecorder,
    ) -> Synthesis {
        let ranked = rank(sources, bias, self.max_sources);
        if ranked.is_empty() {
            recorder.step("no external sources were available; answering from query and vision");
        } else {
            recorder.step(format!("ranked {} sources", ranked.len()));
        }

        let summary = summarize(query, bias, &ranked, self.summary_top_n);
        let plan = plan(query, bias, &ranked);
        recorder.step(format!("synthesized plan with {} steps", plan.len()));

        Synthesis {
            summary,
            plan,
            sources: ranked,
        }
    }
}

/// Re-score against the vision bias and sort
pub fn rank(mut sources: Vec<Source>, bias: &[String], max_sources: usize) -> Vec<Source> {
    if !bias.is_empty() {
        for source in &mut sources {
            let affinity = vision::bias_affinity(&source.text(), bias);
            source.confidence =
                clamp_confidence((1.0 - BIAS_WEIGHT) * source.confidence + BIAS_WEIGHT * affinity);
        }
    }
    for source in &mut sources {
        source.confidence = round3(source.confidence);
    }

    // sort_by is stable: equal keys keep arrival order
    sources.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.kind.priority().cmp(&b.kind.priority()))
    });
    sources.truncate(max_sources);
    sources
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// One paragraph from the query and the strongest sources
pub fn summarize(query: &str, bias: &[String], ranked: &[Source], top_n: usize) -> String {
    if ranked.is_empty() {
        let mut summary = format!(
            "No external sources were available for \"{}\", so this answer is drawn from the query alone",
            query
        );
        if bias.is_empty() {
            summary.push('.');
        } else {
            summary.push_str(&format!(", shaped by your vision ({}).", bias.join(", ")));
        }
        summary.push_str(" Treat the plan as a starting point and re-run with tools enabled to ground it.");
        return summary;
    }

    let counts: Vec<String> = Capability::ALL
        .iter()
        .filter_map(|cap| {
            let n = ranked.iter().filter(|s| s.kind == *cap).count();
            (n > 0).then(|| format!("{} {}", n, cap))
        })
        .collect();

    let leads: Vec<String> = ranked
        .iter()
        .take(top_n.max(1))
        .map(|s| format!("\"{}\" ({}, {:.0}%)", s.title, s.kind, s.confidence * 100.0))
        .collect();

    let mut summary = format!(
        "Found {} sources for \"{}\" ({}). Strongest leads: {}.",
        ranked.len(),
        query,
        counts.join(", "),
        leads.join("; ")
    );
    if !bias.is_empty() {
        summary.push_str(&format!(" Ranking leaned toward your vision: {}.", bias.join(", ")));
    }
    summary
}

/// 3 to 7 concrete steps
pub fn plan(query: &str, bias: &[String], ranked: &[Source]) -> Vec<String> {
    let mut steps = Vec::new();

    if bias.is_empty() {
        steps.push(format!("Pin down the goal: {}.", query));
    } else {
        steps.push(format!(
            "Pin down the goal: {}, with {} as guiding constraints.",
            query,
            bias.join(", ")
        ));
    }

    if ranked.is_empty() {
        steps.push(
            "Break the goal into the smallest piece you can try today and list what it depends on."
                .to_string(),
        );
        if !bias.is_empty() {
            steps.push(format!(
                "Rule out options that conflict with your vision ({}).",
                bias.join(", ")
            ));
        }
        steps.push("Try that piece locally and note anything that blocks you.".to_string());
        steps.push("Re-run this query with tools enabled to pull in external sources.".to_string());
    } else {
        let mut by_priority = Capability::ALL.to_vec();
        by_priority.sort_by_key(|c| c.priority());
        for cap in by_priority {
            if let Some(top) = ranked.iter().find(|s| s.kind == cap) {
                steps.push(source_step(top));
            }
        }
        if bias.is_empty() {
            steps.push("Build a minimal working version and check it against the goal.".to_string());
        } else {
            steps.push(format!(
                "Build a minimal working version and check it against your vision ({}).",
                bias.join(", ")
            ));
        }
    }

    steps.push("Write down what worked and what to revisit next.".to_string());

    steps.truncate(MAX_PLAN_STEPS);
    steps
}

/// Step referencing the top source of one capability
fn source_step(source: &Source) -> String {
    match source.kind {
        Capability::Knowledge => format!("Read up on the fundamentals in \"{}\".", source.title),
        Capability::Search => match source.url.as_deref().and_then(host_of) {
            Some(host) => format!(
                "Compare current options, starting with \"{}\" ({}).",
                source.title, host
            ),
            None => format!("Compare current options, starting with \"{}\".", source.title),
        },
        Capability::Community => format!(
            "Scan \"{}\" for pitfalls others hit in practice.",
            source.title
        ),
        Capability::System => {
            let local_first = source
                .metadata
                .as_ref()
                .and_then(|m| m.get("localFirst"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let lead = if local_first {
                "Work locally first with the playbook"
            } else {
                "Follow the playbook"
            };
            match source.meta_str("firstStep") {
                Some(first) => format!("{} \"{}\": {}.", lead, source.title, first.trim_end_matches('.')),
                None => format!("{} \"{}\" on this machine.", lead, source.title),
            }
        }
    }
}

fn host_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.trim_start_matches("www.").to_string())
}
