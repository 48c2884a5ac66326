//! Page-view reporter. Fires once at arm time (deferred until the page
//! content model is ready) and once per navigation change delivered by the
//! embedder.
//!
//! Observer lifecycle: install is the uninitialized state; [`observe`]
//! arms the reporter and stays armed for the page lifetime — there is no
//! terminal state. Fires are non-exclusive: each one is an independent task,
//! never queued or debounced, so overlapping navigations overlap on the wire
//! too.
//!
//! [`observe`]: HitReporter::observe

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use sitepulse_core::config::TagConfig;
use sitepulse_core::context::{PageContext, PageEvent};
use sitepulse_core::eligibility::is_eligible;
use sitepulse_core::error::PulseResult;
use sitepulse_transport::Transport;

use crate::dispatch::Dispatcher;

pub struct HitReporter {
    dispatcher: Arc<Dispatcher>,
    content_ready: bool,
}

impl HitReporter {
    /// Gate on eligibility and build the reporter. `None` means tracking is
    /// suppressed for this page load and nothing was installed.
    pub fn install(
        config: TagConfig,
        ctx: Arc<dyn PageContext>,
        transport: Arc<dyn Transport>,
    ) -> Option<Self> {
        if !is_eligible(ctx.as_ref(), &config) {
            info!("page view reporting disabled for this page load");
            return None;
        }
        let content_ready = ctx.content_ready();
        Some(Self {
            dispatcher: Arc::new(Dispatcher::new(config, ctx, transport)),
            content_ready,
        })
    }

    /// Report one page view across all target domains; completion reflects
    /// the primary domain's dispatch.
    pub async fn hit(&self) -> PulseResult<()> {
        self.dispatcher.hit().await
    }

    /// Arm the reporter: fire the initial page view (deferred until
    /// [`PageEvent::ContentReady`] when the content model was not ready at
    /// install time) and one view per [`PageEvent::Navigated`]. The task
    /// runs until the embedder drops the channel.
    pub fn observe(&self, mut events: mpsc::Receiver<PageEvent>) -> JoinHandle<()> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let mut initial_fired = self.content_ready;
        tokio::spawn(async move {
            if initial_fired {
                fire(&dispatcher);
            }
            while let Some(event) = events.recv().await {
                match event {
                    PageEvent::ContentReady => {
                        if !initial_fired {
                            initial_fired = true;
                            fire(&dispatcher);
                        }
                    }
                    PageEvent::Navigated => fire(&dispatcher),
                }
            }
        })
    }
}

/// One fire is one detached task; overlapping fires are allowed.
fn fire(dispatcher: &Arc<Dispatcher>) {
    let dispatcher = Arc::clone(dispatcher);
    tokio::spawn(async move {
        if let Err(error) = dispatcher.hit().await {
            warn!(error = %error, "page view dispatch failed");
        }
    });
}
