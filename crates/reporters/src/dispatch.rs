//! Per-domain dispatch — one reporting invocation fans out into one request
//! per target domain, issued in declared order (primary first).
//!
//! The caller-visible completion corresponds to the primary domain only.
//! Mirror dispatches are spawned best-effort: their failures are logged per
//! domain and never abort the other sends, and nothing may depend on their
//! completion order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use sitepulse_core::builder::{build_event, build_hit, build_session, target_domains};
use sitepulse_core::config::TagConfig;
use sitepulse_core::context::PageContext;
use sitepulse_core::error::{PulseError, PulseResult};
use sitepulse_core::rewrite::cache_buster;
use sitepulse_transport::{OutboundRequest, Transport};

pub struct Dispatcher {
    config: TagConfig,
    ctx: Arc<dyn PageContext>,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(config: TagConfig, ctx: Arc<dyn PageContext>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            ctx,
            transport,
        }
    }

    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    /// One page-view report per target domain.
    pub async fn hit(&self) -> PulseResult<()> {
        let nc = cache_buster();
        let requests = target_domains(&self.config)
            .map(|target| {
                let report = build_hit(self.ctx.as_ref(), &self.config, target);
                OutboundRequest::get(report.request_url(&self.config.endpoint, nc))
            })
            .collect();
        self.fan_out(requests).await
    }

    /// One event report per target domain. `meta` values are already
    /// string-coerced by the caller.
    pub async fn event(
        &self,
        name: &str,
        duration: u64,
        meta: &HashMap<String, String>,
    ) -> PulseResult<()> {
        let mut requests = Vec::with_capacity(self.config.domains.len() + 1);
        for target in target_domains(&self.config) {
            let report = build_event(self.ctx.as_ref(), &self.config, target, name, duration, meta);
            let body = serde_json::to_string(&report)?;
            requests.push(OutboundRequest::post_json(self.config.endpoint.clone(), body));
        }
        self.fan_out(requests).await
    }

    /// One minimal session ping per target domain.
    pub async fn session(&self) -> PulseResult<()> {
        let nc = cache_buster();
        let requests = target_domains(&self.config)
            .map(|target| {
                let report = build_session(self.ctx.as_ref(), &self.config, target);
                OutboundRequest::get(report.request_url(&self.config.endpoint, nc))
            })
            .collect();
        self.fan_out(requests).await
    }

    /// Issue every request in order, then await the primary's outcome.
    /// Mirrors are detached tasks by the time the primary resolves, so a
    /// primary failure cannot abort them.
    async fn fan_out(&self, requests: Vec<OutboundRequest>) -> PulseResult<()> {
        let mut requests = requests.into_iter();
        let Some(primary) = requests.next() else {
            return Ok(());
        };
        let primary_send = self.transport.send(primary);

        for (idx, request) in requests.enumerate() {
            let domain = self.config.domains.get(idx).cloned().unwrap_or_default();
            let send = self.transport.send(request);
            tokio::spawn(async move {
                if let Err(error) = send.await {
                    warn!(domain = %domain, error = %error, "mirror dispatch failed");
                }
            });
        }

        primary_send
            .await
            .map(|_| ())
            .map_err(|e| PulseError::Transport(e.to_string()))
    }
}
