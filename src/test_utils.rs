//! Test utilities for accessgate
//!
//! Provides an in-process [`FakeTransport`] and page fixtures so the
//! authorization flow can be exercised without network I/O.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::access::fetcher::{DocumentTransport, FetchOptions};
use crate::document::Document;
use crate::error::Result;

#[derive(Debug, Clone)]
enum FakeOutcome {
    Respond(String),
    Fail(String),
}

/// In-process [`DocumentTransport`] for tests.
///
/// Records every call, optionally sleeps before answering, and counts
/// how many calls ran to completion (including ones nobody awaited).
#[derive(Debug, Clone)]
pub struct FakeTransport {
    outcome: FakeOutcome,
    delay: Duration,
    calls: Arc<Mutex<Vec<(String, FetchOptions)>>>,
    completed: Arc<AtomicUsize>,
}

impl FakeTransport {
    /// A transport answering every call with `html`
    pub fn responding(html: &str) -> Self {
        Self::with_outcome(FakeOutcome::Respond(html.to_string()))
    }

    /// A transport failing every call with `message`
    pub fn failing(message: &str) -> Self {
        Self::with_outcome(FakeOutcome::Fail(message.to_string()))
    }

    fn with_outcome(outcome: FakeOutcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<(String, FetchOptions)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    /// Calls that ran to completion
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DocumentTransport for FakeTransport {
    async fn fetch_document(&self, url: &str, options: FetchOptions) -> Result<Document> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((url.to_string(), options));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        match &self.outcome {
            FakeOutcome::Respond(html) => Ok(Document::parse(html.as_str())),
            FakeOutcome::Fail(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}

/// A live page with a state marker and sections `1/1` and `1/2`
///
/// Pass `None` to omit the state marker.
pub fn live_page(state: Option<&str>) -> Document {
    let meta = state
        .map(|s| format!(r#"<meta name="i-amp-access-state" content="{}">"#, s))
        .unwrap_or_default();
    Document::parse(format!(
        r#"<html><head>{}</head><body>
<div i-amp-access-id="1/1">locked 1</div>
<div i-amp-access-id="1/2">locked 2</div>
</body></html>"#,
        meta
    ))
}

/// A service response with the given result JSON and sections `1/1`,
/// `1/2` and the unmatched `a3`
pub fn service_response(result_json: &str) -> String {
    format!(
        r#"<html><head>
<script id="amp-access-data" type="application/json">{}</script>
</head><body>
<div i-amp-access-id="1/1">a1</div>
<div i-amp-access-id="1/2">a2</div>
<div i-amp-access-id="a3">a3</div>
</body></html>"#,
        result_json
    )
}
