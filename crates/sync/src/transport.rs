// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the sale server connection.
//!
//! [`Transport`] moves protocol messages; it knows nothing about
//! idempotency or retries. [`WebSocketTransport`] is the production
//! implementation; tests swap in an in-memory one.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tq_core::protocol::{ClientMessage, ServerMessage};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// A frame could not be encoded or decoded.
    #[error("malformed message: {0}")]
    Malformed(String),
}

impl TransportError {
    /// True for errors that mean the connection is gone.
    pub fn is_connection_loss(&self) -> bool {
        !matches!(self, TransportError::Malformed(_))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Message transport to the sale server.
pub trait Transport: Send + Sync {
    /// Connect to the server at `url`.
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()>;

    /// Close the connection, if any.
    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    /// Send one message.
    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()>;

    /// Wait for the next message.
    ///
    /// Returns `None` once the server has closed the connection.
    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
///
/// Any I/O error drops the socket, so the next [`Transport::connect`]
/// starts fresh.
#[derive(Default)]
pub struct WebSocketTransport {
    sink: Option<SplitSink<Socket, Message>>,
    stream: Option<SplitStream<Socket>>,
}

impl WebSocketTransport {
    /// Create a disconnected transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn drop_socket(&mut self) {
        self.sink = None;
        self.stream = None;
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            let (socket, _) = tokio_tungstenite::connect_async(&url)
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            tracing::debug!(%url, "connected to sale server");
            let (sink, stream) = socket.split();
            self.sink = Some(sink);
            self.stream = Some(stream);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut sink) = self.sink.take() {
                // Best effort: the peer may already be gone
                let _ = sink.close().await;
            }
            self.stream = None;
            Ok(())
        })
    }

    fn send(&mut self, msg: ClientMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let json = msg
                .to_json()
                .map_err(|e| TransportError::Malformed(e.to_string()))?;
            let sink = self.sink.as_mut().ok_or(TransportError::ConnectionClosed)?;

            // send() flushes, so a dead socket surfaces here rather than on recv
            if let Err(e) = sink.send(Message::Text(json.into())).await {
                tracing::debug!(error = %e, "websocket send failed, dropping connection");
                self.drop_socket();
                return Err(TransportError::SendFailed(e.to_string()));
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<ServerMessage>> {
        Box::pin(async move {
            let stream = self.stream.as_mut().ok_or(TransportError::ConnectionClosed)?;

            let outcome = loop {
                match stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        break ServerMessage::from_json(&text)
                            .map(Some)
                            .map_err(|e| TransportError::Malformed(e.to_string()));
                    }
                    // Ping/pong and binary frames carry no protocol messages
                    Some(Ok(Message::Close(_))) | None => break Ok(None),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break Err(TransportError::ReceiveFailed(e.to_string())),
                }
            };

            match &outcome {
                Ok(None) => self.drop_socket(),
                Err(e) if e.is_connection_loss() => self.drop_socket(),
                _ => {}
            }
            outcome
        })
    }

    fn is_connected(&self) -> bool {
        self.sink.is_some()
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
