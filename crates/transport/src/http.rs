//! Callback-style transport: performs the request and reports the real
//! outcome — `Delivered` on a 2xx response, an error on network failure or
//! any other status.

use futures::future::BoxFuture;
use tracing::debug;

use crate::{Method, OutboundRequest, SendAck, Transport, TransportError};

pub struct CallbackHttpTransport {
    client: reqwest::Client,
}

impl CallbackHttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Reuse an existing client (connection pool, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for CallbackHttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for CallbackHttpTransport {
    fn send(&self, request: OutboundRequest) -> BoxFuture<'static, Result<SendAck, TransportError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let builder = match request.method {
                Method::Get => client.get(&request.url),
                Method::Post => client.post(&request.url),
            };
            let builder = match request.body {
                Some(body) => builder
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body),
                None => builder,
            };

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;
            let status = response.status();
            if status.is_success() {
                debug!(url = %request.url, status = %status, "report delivered");
                Ok(SendAck::Delivered)
            } else {
                Err(TransportError::Status(status.as_u16()))
            }
        })
    }
}
