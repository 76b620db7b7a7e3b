// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote API boundary.
//!
//! Every submission carries the idempotency key of the operation it
//! replays. The server must treat a repeated key as a no-op that returns
//! the original confirmation; that contract is what makes it safe to retry
//! an item whose previous attempt timed out after the server accepted it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tq_core::protocol::{ClientMessage, ServerMessage};
use tq_core::{IdempotencyKey, OpKind, QueueItem};

use crate::transport::{Transport, TransportError, WebSocketTransport};

/// Why a submission did not produce a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No answer within the send timeout. The server may still have
    /// accepted the operation.
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Connection refused, reset or closed.
    #[error("network error: {0}")]
    Network(String),

    /// The server refused the operation.
    #[error("rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The server answered with something we could not use.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ApiError {
    /// True for failures that say nothing about the operation itself.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::Network(_))
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Malformed(msg) => ApiError::Protocol(msg),
            other => ApiError::Network(other.to_string()),
        }
    }
}

/// Result type for remote API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// One delivery attempt of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub key: IdempotencyKey,
    pub kind: OpKind,
    pub payload: serde_json::Value,
}

impl Submission {
    /// Builds the submission that replays a queued item.
    pub fn for_item(item: &QueueItem) -> Self {
        Submission { key: item.idempotency_key, kind: item.kind, payload: item.payload.clone() }
    }
}

/// The server's acknowledgment that the operation exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Server-side record identifier.
    pub record_id: String,
    /// True when the server had already accepted this key.
    pub replayed: bool,
}

/// The server-side half of sale creation.
pub trait RemoteApi: Send + Sync {
    /// Submit one operation and wait for the server's answer.
    fn submit(
        &self,
        submission: Submission,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Confirmation>> + Send + '_>>;
}

impl<A: RemoteApi + ?Sized> RemoteApi for Arc<A> {
    fn submit(
        &self,
        submission: Submission,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Confirmation>> + Send + '_>> {
        (**self).submit(submission)
    }
}

/// [`RemoteApi`] over a message [`Transport`].
///
/// Connects lazily on first use and again after the transport drops the
/// connection. Submissions are serialized over the single connection;
/// answers for other keys (late replies to attempts that already timed
/// out) are skipped.
pub struct WebSocketApi<T: Transport = WebSocketTransport> {
    url: String,
    transport: Mutex<T>,
}

impl WebSocketApi<WebSocketTransport> {
    /// Creates an API client for the server at `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_transport(url, WebSocketTransport::new())
    }
}

impl<T: Transport> WebSocketApi<T> {
    /// Creates an API client over a custom transport (for testing).
    pub fn with_transport(url: impl Into<String>, transport: T) -> Self {
        WebSocketApi { url: url.into(), transport: Mutex::new(transport) }
    }
}

impl<T: Transport> RemoteApi for WebSocketApi<T> {
    fn submit(
        &self,
        submission: Submission,
    ) -> Pin<Box<dyn Future<Output = ApiResult<Confirmation>> + Send + '_>> {
        Box::pin(async move {
            let mut transport = self.transport.lock().await;
            if !transport.is_connected() {
                transport.connect(&self.url).await?;
            }

            let key = submission.key;
            transport
                .send(ClientMessage::submit(key, submission.kind, submission.payload))
                .await?;

            loop {
                match transport.recv().await? {
                    Some(ServerMessage::Accepted { key: answered, record_id, replayed })
                        if answered == key =>
                    {
                        return Ok(Confirmation { record_id, replayed });
                    }
                    Some(ServerMessage::Rejected { key: answered, code, message })
                        if answered == key =>
                    {
                        return Err(ApiError::Rejected { code, message });
                    }
                    Some(ServerMessage::Error { message }) => {
                        // Start the next submission on a fresh connection
                        if let Err(e) = transport.disconnect().await {
                            tracing::debug!(error = %e, "disconnect after server error failed");
                        }
                        return Err(ApiError::Protocol(message));
                    }
                    Some(other) => {
                        tracing::debug!(?other, %key, "skipping unrelated server message");
                    }
                    None => return Err(ApiError::Network("connection closed by server".into())),
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
