//! Fake provider for deterministic testing.
//!
//! Returns pre-configured outcomes without touching the network, optionally
//! after a delay so timeout and deadline paths can be exercised.
//!
//! ## Example
//!
//! ```rust,ignore
//! let fake = FakeProvider::returning(Capability::Search, vec![
//!     FakeProvider::source(Capability::Search, "Result", 0.8),
//! ]);
//! let slow = FakeProvider::new(Capability::Knowledge, FakeBehavior::Fail(
//!     ProviderError::Unavailable("down".into()),
//! )).with_delay(Duration::from_secs(5));
//! ```

use super::{ProviderAdapter, ProviderError, ProviderQuery};
use async_trait::async_trait;
use compass_common::{Capability, Source};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake does once its delay has elapsed
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Return these sources (may be empty)
    Sources(Vec<Source>),
    /// Return this error
    Fail(ProviderError),
    /// Panic inside the adapter task
    Panic,
}

pub struct FakeProvider {
    capability: Capability,
    behavior: FakeBehavior,
    delay: Duration,
    timeout: Duration,
    /// Queries received, for assertions
    calls: Arc<Mutex<Vec<ProviderQuery>>>,
}

impl FakeProvider {
    pub fn new(capability: Capability, behavior: FakeBehavior) -> Self {
        Self {
            capability,
            behavior,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn returning(capability: Capability, sources: Vec<Source>) -> Self {
        Self::new(capability, FakeBehavior::Sources(sources))
    }

    pub fn empty(capability: Capability) -> Self {
        Self::new(capability, FakeBehavior::Sources(Vec::new()))
    }

    pub fn failing(capability: Capability, error: ProviderError) -> Self {
        Self::new(capability, FakeBehavior::Fail(error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Convenience source with a title-derived snippet
    pub fn source(capability: Capability, title: &str, confidence: f64) -> Source {
        Source::new(capability, title, format!("About {}", title.to_lowercase()))
            .with_url(format!("https://{}.example/{}", capability, title.replace(' ', "-")))
            .with_confidence(confidence)
    }

    /// Handle to the recorded queries; stays valid after the fake is moved into a set
    pub fn calls(&self) -> Arc<Mutex<Vec<ProviderQuery>>> {
        Arc::clone(&self.calls)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ProviderAdapter for FakeProvider {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, query: &ProviderQuery) -> Result<Vec<Source>, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(query.clone());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            FakeBehavior::Sources(sources) => Ok(sources.clone()),
            FakeBehavior::Fail(error) => Err(error.clone()),
            FakeBehavior::Panic => panic!("fake {} provider panicked", self.capability),
        }
    }
}
