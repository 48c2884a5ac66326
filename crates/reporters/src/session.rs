//! Session keep-alive: a repeating timer that extends the visitor's session
//! with a minimal ping per target domain on every tick.
//!
//! The loop starts immediately on eligibility pass and runs for the page
//! lifetime; it never stops on navigation. The host ends it through the
//! returned [`SessionHandle`] (idempotent) or by dropping the handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use sitepulse_core::config::TagConfig;
use sitepulse_core::context::PageContext;
use sitepulse_core::eligibility::is_eligible;
use sitepulse_transport::Transport;

use crate::dispatch::Dispatcher;

pub struct SessionReporter;

impl SessionReporter {
    /// Gate on eligibility and start the keep-alive loop at
    /// `config.interval_ms`. `None` means tracking is suppressed and no
    /// timer was started. The first ping lands one full interval after
    /// start.
    pub fn start(
        config: TagConfig,
        ctx: Arc<dyn PageContext>,
        transport: Arc<dyn Transport>,
    ) -> Option<SessionHandle> {
        if !is_eligible(ctx.as_ref(), &config) {
            info!("session reporting disabled for this page load");
            return None;
        }

        let period = Duration::from_millis(config.interval_ms);
        let dispatcher = Dispatcher::new(config, ctx, transport);
        let (stop, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval yields immediately once; consume that so the
            // first ping lands a full period after start.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(error) = dispatcher.session().await {
                            warn!(error = %error, "session ping failed");
                        }
                    }
                    result = stopped.changed() => {
                        if result.is_err() || *stopped.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("session keep-alive stopped");
        });

        Some(SessionHandle { stop, task })
    }
}

/// Cancellation capability for the keep-alive loop.
pub struct SessionHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Stop the loop. Idempotent: the second and later calls are no-ops,
    /// and no further pings fire after the first.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Stop the loop and wait for it to wind down.
    pub async fn stopped(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitepulse_core::config::ReporterKind;
    use sitepulse_core::context::StaticContext;
    use sitepulse_transport::capture_transport;

    fn config(interval_ms: u64) -> TagConfig {
        let mut config = TagConfig::defaults(ReporterKind::Session);
        config.interval_ms = interval_ms;
        config
    }

    fn ctx() -> Arc<StaticContext> {
        Arc::new(StaticContext::new().with_url("https://a.com/x"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_at_interval() {
        let transport = capture_transport();
        let handle = SessionReporter::start(config(60_000), ctx(), transport.clone()).unwrap();

        // Nothing before the first interval elapses.
        tokio::time::sleep(Duration::from_millis(59_000)).await;
        assert_eq!(transport.count(), 0);

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(transport.count(), 1);

        tokio::time::sleep(Duration::from_millis(120_000)).await;
        assert_eq!(transport.count(), 3);

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_pings() {
        let transport = capture_transport();
        let handle = SessionReporter::start(config(1_000), ctx(), transport.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let before = transport.count();
        assert_eq!(before, 3);

        handle.stop();
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(transport.count(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let transport = capture_transport();
        let handle = SessionReporter::start(config(1_000), ctx(), transport.clone()).unwrap();

        handle.stop();
        handle.stop();
        handle.stop();
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(transport.count(), 0);
        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_tick_pings_every_domain() {
        let transport = capture_transport();
        let mut config = config(1_000);
        config.domains = vec!["b.com".to_string(), "c.com".to_string()];
        let handle = SessionReporter::start(config, ctx(), transport.clone()).unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(transport.count(), 3);

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_ineligible_page_starts_nothing() {
        let ctx = Arc::new(StaticContext::new().with_opt_out(true));
        assert!(SessionReporter::start(config(1_000), ctx, capture_transport()).is_none());
    }
}
