//! Tool dispatcher.
//!
//! Fans out one task per enabled capability and joins them behind an
//! all-settled barrier bounded by the request deadline. Every enabled tool
//! gets exactly one trace entry, whatever happened to it. The trace is written
//! after the barrier, in fixed capability order, so it does not depend on
//! completion order.

use crate::diagnostics::{trace_entry, DiagnosticsRecorder};
use crate::providers::{ProviderAdapter, ProviderError, ProviderQuery, ProviderSet};
use compass_common::source::{clamp_confidence, truncate_snippet};
use compass_common::{Capability, Source, ToolOutcome, ToolSettings};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

/// Result of one adapter invocation
#[derive(Debug)]
struct Settled {
    capability: Capability,
    outcome: Result<Vec<Source>, ProviderError>,
    elapsed_ms: u64,
}

/// Aborts the wrapped task when dropped, so abandoning the outer task
/// also stops the adapter call it owns.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run one adapter under its own timeout. Panics surface as `Crashed`.
async fn run_adapter(adapter: Arc<dyn ProviderAdapter>, query: Arc<ProviderQuery>) -> Settled {
    let capability = adapter.capability();
    let limit = adapter.timeout();
    let start = Instant::now();

    let mut task = AbortOnDrop(tokio::spawn(async move { adapter.fetch(&query).await }));

    let outcome = match tokio::time::timeout(limit, &mut task.0).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ProviderError::Crashed(join_err.to_string())),
        Err(_) => Err(ProviderError::Timeout(limit)),
    };

    Settled {
        capability,
        outcome,
        elapsed_ms: start.elapsed().as_millis() as u64,
    }
}

pub struct ToolDispatcher {
    providers: ProviderSet,
    deadline: Duration,
}

impl ToolDispatcher {
    pub fn new(providers: ProviderSet, deadline: Duration) -> Self {
        Self {
            providers,
            deadline,
        }
    }

    /// Query every enabled adapter concurrently and merge their sources.
    ///
    /// Sources come back concatenated in capability order with ids stamped as
    /// `<capability>-<n>`. No cross-adapter ranking happens here.
    pub async fn dispatch(
        &self,
        query: &str,
        bias: &[String],
        tools: ToolSettings,
        recorder: &mut DiagnosticsRecorder,
    ) -> Vec<Source> {
        let enabled = tools.enabled();
        let skipped: Vec<Capability> = Capability::ALL
            .iter()
            .copied()
            .filter(|cap| !tools.is_enabled(*cap))
            .collect();

        if enabled.is_empty() {
            recorder.step("no tools selected");
            return Vec::new();
        }
        if !skipped.is_empty() {
            recorder.step(format!("skipped disabled tools: {}", join_caps(&skipped)));
        }

        let provider_query = Arc::new(ProviderQuery::new(query, bias.to_vec()));
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.deadline;

        let mut join_set = JoinSet::new();
        let mut settled: BTreeMap<Capability, Settled> = BTreeMap::new();

        for cap in &enabled {
            match self.providers.get(*cap) {
                Some(adapter) => {
                    join_set.spawn(run_adapter(adapter, Arc::clone(&provider_query)));
                }
                None => {
                    settled.insert(
                        *cap,
                        Settled {
                            capability: *cap,
                            outcome: Err(ProviderError::Unavailable(
                                "no adapter configured".to_string(),
                            )),
                            elapsed_ms: 0,
                        },
                    );
                }
            }
        }
        recorder.step(format!(
            "dispatched {} tools: {}",
            enabled.len(),
            join_caps(&enabled)
        ));

        let mut deadline_hit = false;
        loop {
            match tokio::time::timeout_at(deadline, join_set.join_next()).await {
                Ok(Some(Ok(result))) => {
                    debug!("{} settled in {}ms", result.capability, result.elapsed_ms);
                    settled.insert(result.capability, result);
                }
                Ok(Some(Err(join_err))) => {
                    // run_adapter contains adapter panics; reaching this means the
                    // wrapper itself died. The tool is reported as crashed below.
                    warn!("dispatcher task failed: {}", join_err);
                }
                Ok(None) => break,
                Err(_) => {
                    deadline_hit = true;
                    join_set.abort_all();
                    break;
                }
            }
        }

        if deadline_hit {
            recorder.step(format!(
                "request deadline of {}ms exceeded; {} tools abandoned",
                self.deadline.as_millis(),
                enabled.len() - settled.len()
            ));
        }

        let mut sources = Vec::new();
        let mut ok = 0;
        for cap in &enabled {
            let result = settled.remove(cap).unwrap_or_else(|| Settled {
                capability: *cap,
                outcome: Err(if deadline_hit {
                    ProviderError::Timeout(self.deadline)
                } else {
                    ProviderError::Crashed("task ended without a result".to_string())
                }),
                elapsed_ms: started.elapsed().as_millis() as u64,
            });

            match result.outcome {
                Ok(found) => {
                    ok += 1;
                    let normalized = normalize(*cap, found);
                    let outcome = if normalized.is_empty() {
                        ToolOutcome::Empty
                    } else {
                        ToolOutcome::Ok
                    };
                    recorder.trace(trace_entry(
                        *cap,
                        outcome,
                        normalized.len(),
                        result.elapsed_ms,
                        None,
                    ));
                    sources.extend(normalized);
                }
                Err(err) => {
                    let outcome = if err.is_timeout() {
                        ToolOutcome::Timeout
                    } else {
                        ToolOutcome::Error
                    };
                    recorder.trace(trace_entry(
                        *cap,
                        outcome,
                        0,
                        result.elapsed_ms,
                        Some(err.to_string()),
                    ));
                    recorder.error(*cap, &err);
                }
            }
        }

        recorder.step(format!(
            "tools settled: {} succeeded, {} failed, {} sources",
            ok,
            enabled.len() - ok,
            sources.len()
        ));
        sources
    }
}

/// Force the producing capability, stamp ids, clamp scores
fn normalize(cap: Capability, found: Vec<Source>) -> Vec<Source> {
    found
        .into_iter()
        .filter(|s| !s.title.trim().is_empty())
        .enumerate()
        .map(|(i, mut source)| {
            if source.kind != cap {
                warn!("{} adapter emitted a {} source; retagging", cap, source.kind);
                source.kind = cap;
            }
            source.id = format!("{}-{}", cap, i + 1);
            source.confidence = clamp_confidence(source.confidence);
            source.snippet = truncate_snippet(&source.snippet);
            source
        })
        .collect()
}

fn join_caps(caps: &[Capability]) -> String {
    caps.iter()
        .map(Capability::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
