//! Custom-event entry point.
//!
//! The reporter is always safe to call: an ineligible page load (or a call
//! made before install) goes through a logging stub that resolves
//! successfully and touches the network not at all. The real path validates
//! the event name before any request is built, coerces meta values to
//! strings, and fans out one JSON report per target domain.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use sitepulse_core::config::TagConfig;
use sitepulse_core::context::PageContext;
use sitepulse_core::eligibility::is_eligible;
use sitepulse_core::error::{PulseError, PulseResult};
use sitepulse_transport::Transport;

use crate::dispatch::Dispatcher;

/// Options for one event call.
#[derive(Debug, Clone, Default)]
pub struct EventOptions {
    /// Event duration, defaults to 0.
    pub duration: Option<u64>,
    /// Arbitrary metadata; every value is coerced to a string before
    /// serialization (`1` → `"1"`, `true` → `"true"`).
    pub meta: HashMap<String, Value>,
}

impl EventOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.meta.insert(key.to_string(), value);
        self
    }
}

pub struct EventReporter {
    inner: Option<Arc<Dispatcher>>,
}

impl EventReporter {
    /// Gate on eligibility. An ineligible page load yields the logging stub
    /// rather than nothing, so the host's call sites never change.
    pub fn install(
        config: TagConfig,
        ctx: Arc<dyn PageContext>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        if is_eligible(ctx.as_ref(), &config) {
            Self {
                inner: Some(Arc::new(Dispatcher::new(config, ctx, transport))),
            }
        } else {
            info!("event reporting disabled for this page load, calls degrade to a logging stub");
            Self::stub()
        }
    }

    /// The pre-install state of the public callable: logs every call and
    /// resolves successfully without network activity.
    pub fn stub() -> Self {
        Self { inner: None }
    }

    pub fn is_stub(&self) -> bool {
        self.inner.is_none()
    }

    /// Report a custom event. Resolves `()` when the primary domain's
    /// dispatch succeeds; rejects with a descriptive error on validation or
    /// transport failure. Mirror-domain dispatches are best-effort.
    pub async fn event(&self, name: &str, options: EventOptions) -> PulseResult<()> {
        let Some(dispatcher) = &self.inner else {
            info!(name = %name, options = ?options, "event call (stub)");
            return Ok(());
        };

        if name.is_empty() {
            return Err(PulseError::Validation(
                "the event name must be a non-empty string; \
                 usage: event(\"name\", EventOptions::new().with_duration(42))"
                    .to_string(),
            ));
        }

        let duration = options.duration.unwrap_or(0);
        let meta = coerce_meta(options.meta);
        dispatcher.event(name, duration, &meta).await
    }
}

/// Stringify every meta value. String values pass through unquoted; every
/// other JSON value uses its compact rendering.
fn coerce_meta(meta: HashMap<String, Value>) -> HashMap<String, String> {
    meta.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitepulse_core::config::ReporterKind;
    use sitepulse_core::context::StaticContext;
    use sitepulse_transport::capture_transport;

    fn ctx() -> Arc<StaticContext> {
        Arc::new(StaticContext::new().with_url("https://a.com/x"))
    }

    fn reporter_with_capture() -> (EventReporter, Arc<sitepulse_transport::CaptureTransport>) {
        let transport = capture_transport();
        let reporter = EventReporter::install(
            TagConfig::defaults(ReporterKind::Event),
            ctx(),
            transport.clone(),
        );
        (reporter, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_name_rejects_without_network() {
        let (reporter, transport) = reporter_with_capture();
        let result = reporter.event("", EventOptions::new()).await;
        match result {
            Err(PulseError::Validation(message)) => {
                assert!(message.contains("non-empty"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(transport.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_meta_values_coerced_to_strings() {
        let (reporter, transport) = reporter_with_capture();
        let options = EventOptions::new()
            .with_meta("a", json!(1))
            .with_meta("b", json!(true))
            .with_meta("c", json!("plain"));
        reporter.event("signup", options).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["event_meta"]["a"], "1");
        assert_eq!(body["event_meta"]["b"], "true");
        assert_eq!(body["event_meta"]["c"], "plain");
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_defaults_to_zero() {
        let (reporter, transport) = reporter_with_capture();
        reporter.event("signup", EventOptions::new()).await.unwrap();
        let body: Value =
            serde_json::from_str(transport.requests()[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["event_duration"], 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stub_resolves_without_network() {
        let transport = capture_transport();
        let ctx = StaticContext::new().with_do_not_track(true);
        let reporter = EventReporter::install(
            TagConfig::defaults(ReporterKind::Event),
            Arc::new(ctx),
            transport.clone(),
        );
        assert!(reporter.is_stub());

        // The stub resolves even for input the real path would reject.
        reporter.event("", EventOptions::new()).await.unwrap();
        reporter.event("anything", EventOptions::new()).await.unwrap();
        assert_eq!(transport.count(), 0);
    }
}
