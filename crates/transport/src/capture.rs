//! Inert transports: a capture implementation that records requests for
//! assertions, and a no-op that drops them.

use std::sync::Mutex;

use futures::future::BoxFuture;

use crate::{OutboundRequest, SendAck, Transport, TransportError};

/// Records every request instead of sending it. Sends always resolve
/// [`SendAck::Delivered`].
#[derive(Default)]
pub struct CaptureTransport {
    requests: Mutex<Vec<OutboundRequest>>,
}

impl CaptureTransport {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().expect("capture mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().expect("capture mutex poisoned").len()
    }

    pub fn clear(&self) {
        self.requests.lock().expect("capture mutex poisoned").clear();
    }
}

impl Transport for CaptureTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<SendAck, TransportError>> {
        self.requests.lock().expect("capture mutex poisoned").push(request);
        Box::pin(async { Ok(SendAck::Delivered) })
    }
}

/// Drops every request.
pub struct NoopTransport;

impl Transport for NoopTransport {
    fn send(&self, _request: OutboundRequest) -> BoxFuture<'static, Result<SendAck, TransportError>> {
        Box::pin(async { Ok(SendAck::Queued) })
    }
}
