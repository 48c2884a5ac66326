//! Transport capability for the SitePulse reporters — "attempt a send,
//! report queued or failed".
//!
//! Two wire strategies satisfy the same contract:
//!
//! - [`BeaconTransport`] — fire-and-forget: the send resolves as soon as the
//!   request is accepted onto an internal queue; delivery is best-effort and
//!   its outcome is not observable by the caller.
//! - [`CallbackHttpTransport`] — performs the request and resolves only once
//!   a response (or failure) arrives.
//!
//! [`capture_transport`] and [`noop_transport`] provide inert
//! implementations for tests and disabled wiring.

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;

pub mod beacon;
pub mod capture;
pub mod http;

pub use beacon::BeaconTransport;
pub use capture::{CaptureTransport, NoopTransport};
pub use http::CallbackHttpTransport;

/// HTTP method of an outbound report request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One fully assembled report request: everything a transport needs to put
/// it on the wire.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Full URL including any query string.
    pub url: String,
    /// JSON body for POST-style reports.
    pub body: Option<String>,
}

impl OutboundRequest {
    pub fn get(url: String) -> Self {
        Self {
            method: Method::Get,
            url,
            body: None,
        }
    }

    pub fn post_json(url: String, body: String) -> Self {
        Self {
            method: Method::Post,
            url,
            body: Some(body),
        }
    }
}

/// How far a successful send got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendAck {
    /// Accepted for best-effort delivery; no completion signal will follow.
    Queued,
    /// The collection endpoint answered with a success status.
    Delivered,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request queue refused the report: {0}")]
    QueueRefused(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("collection endpoint returned status {0}")]
    Status(u16),
}

/// Object-safe send capability. Implementations must not panic on failure;
/// every outcome is reported through the returned future.
pub trait Transport: Send + Sync {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<SendAck, TransportError>>;
}

/// Transport that drops every request, for inert wiring.
pub fn noop_transport() -> Arc<dyn Transport> {
    Arc::new(NoopTransport)
}

/// In-memory transport that records every request, for tests.
pub fn capture_transport() -> Arc<CaptureTransport> {
    Arc::new(CaptureTransport::new())
}
