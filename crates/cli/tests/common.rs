// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tq_core::protocol::{ClientMessage, ServerMessage};

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Nothing listens on port 1, so the till starts offline.
pub const UNREACHABLE_URL: &str = "ws://127.0.0.1:1";

/// A `tillq` command bound to `state`, isolated from the caller's env.
pub fn tillq(state: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("tillq");
    cmd.arg("--state-dir")
        .arg(state.path())
        .env_remove("TILLQ_STATE_DIR")
        .env_remove("TILLQ_REMOTE_URL")
        .env("RUST_LOG", "debug");
    cmd
}

/// A state dir whose config points at an unreachable server.
pub fn offline_till() -> TempDir {
    let temp = TempDir::new().unwrap();
    let config = format!(
        "[remote]\nurl = \"{UNREACHABLE_URL}\"\nsend_timeout_ms = 500\n\n\
         [probe]\ninterval_ms = 100\ntimeout_ms = 200\n"
    );
    std::fs::write(temp.path().join("config.toml"), config).unwrap();
    temp
}

/// Records a sale and asserts it succeeded.
pub fn record(state: &TempDir, item: &str, total: &str) {
    tillq(state).args(["record", "--item", item, "--total", total]).assert().success();
}

/// Starts a sale server that accepts every submission, numbering records
/// `sale-1`, `sale-2`, ... Returns its URL.
pub fn start_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            let next = Arc::new(AtomicUsize::new(1));
            while let Ok((stream, _)) = listener.accept().await {
                let next = Arc::clone(&next);
                tokio::spawn(async move {
                    // Reachability probes connect and hang up without a handshake
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    while let Some(Ok(msg)) = ws.next().await {
                        let Message::Text(text) = msg else { continue };
                        let reply = match ClientMessage::from_json(&text) {
                            Ok(ClientMessage::Submit { key, .. }) => {
                                let n = next.fetch_add(1, Ordering::SeqCst);
                                ServerMessage::accepted(key, format!("sale-{n}"), false)
                            }
                            Ok(ClientMessage::Ping { id }) => ServerMessage::pong(id),
                            Err(e) => ServerMessage::error(e.to_string()),
                        };
                        let json = reply.to_json().unwrap();
                        if ws.send(Message::Text(json.into())).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
    });

    format!("ws://{addr}")
}
