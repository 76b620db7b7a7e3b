// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reachability probe feeding the connectivity monitor.
//!
//! The probe periodically opens a TCP connection to the sale server and
//! reports whether it succeeded. It says nothing about whether the server
//! will accept a sale, only whether a send is worth trying.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_util::sync::CancellationToken;

use crate::connectivity::ConnectivityMonitor;

/// Derives the `host:port` to probe from a server URL.
///
/// Returns `None` for URLs without a host. The port defaults to 443 for
/// `wss`/`https` and 80 otherwise.
pub fn probe_target(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let host = uri.host()?;
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("wss") | Some("https") => 443,
        _ => 80,
    });
    Some(format!("{host}:{port}"))
}

/// True if a TCP connection to `addr` opens within `timeout`.
pub async fn check_reachable(addr: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::trace!(%addr, error = %e, "probe connect failed");
            false
        }
        Err(_) => {
            tracing::trace!(%addr, "probe connect timed out");
            false
        }
    }
}

/// Periodic reachability check.
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    addr: String,
    interval: Duration,
    timeout: Duration,
}

impl ReachabilityProbe {
    pub fn new(addr: impl Into<String>, interval: Duration, timeout: Duration) -> Self {
        ReachabilityProbe { addr: addr.into(), interval, timeout }
    }

    /// Probe for the server at `url`, or `None` if the URL has no host.
    pub fn for_url(url: &str, interval: Duration, timeout: Duration) -> Option<Self> {
        probe_target(url).map(|addr| Self::new(addr, interval, timeout))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Runs one check and reports it.
    pub async fn probe_once(&self, monitor: &ConnectivityMonitor) -> bool {
        let online = check_reachable(&self.addr, self.timeout).await;
        monitor.report(online);
        online
    }

    /// Spawns the probe loop. It checks immediately, then every `interval`,
    /// until `cancel` fires.
    pub fn spawn(self, monitor: ConnectivityMonitor, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::debug!(addr = %self.addr, "reachability probe started");
            loop {
                let online = tokio::select! {
                    _ = cancel.cancelled() => break,
                    online = check_reachable(&self.addr, self.timeout) => online,
                };
                monitor.report(online);

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            tracing::debug!(addr = %self.addr, "reachability probe stopped");
        })
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
