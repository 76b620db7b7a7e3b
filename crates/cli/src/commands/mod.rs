// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod list;
pub mod logout;
pub mod record;
pub mod run;
pub mod status;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use tq_core::{JsonFileStore, OperationQueue, SharedQueue};
use tq_sync::{
    check_reachable, probe_target, Connectivity, ConnectivityMonitor, NotificationSink, SyncEngine,
    WebSocketApi,
};

use crate::config::Config;
use crate::error::Result;

/// Everything a command needs to know about the till.
#[derive(Debug, Clone)]
pub struct Context {
    pub state_dir: PathBuf,
    pub config: Config,
}

impl Context {
    /// Loads the config under `state_dir`, applying `TILLQ_REMOTE_URL`.
    pub fn load(state_dir: PathBuf) -> Result<Self> {
        let config = Config::load(&state_dir)?.with_remote_url(crate::env::remote_url())?;
        Ok(Context { state_dir, config })
    }

    /// Opens the persisted queue, locking it for this process.
    pub fn open_queue(&self) -> Result<SharedQueue> {
        let store = JsonFileStore::open(&self.state_dir, &self.config.queue.namespace)?;
        Ok(SharedQueue::new(OperationQueue::open(store)?))
    }

    /// Connectivity as seen by one reachability check.
    pub async fn probe_monitor(&self) -> ConnectivityMonitor {
        match probe_target(&self.config.remote.url) {
            Some(addr) => {
                let online = check_reachable(&addr, self.config.probe.timeout()).await;
                tracing::debug!(%addr, online, "initial reachability check");
                ConnectivityMonitor::new(if online {
                    Connectivity::Online
                } else {
                    Connectivity::Offline
                })
            }
            None => ConnectivityMonitor::assume_online(),
        }
    }

    /// An engine talking to the configured server.
    pub fn engine(
        &self,
        queue: SharedQueue,
        monitor: ConnectivityMonitor,
        sink: Arc<dyn NotificationSink>,
    ) -> SyncEngine {
        let api = Arc::new(WebSocketApi::new(self.config.remote.url.clone()));
        SyncEngine::new(queue, api, monitor, sink, self.config.engine_config())
    }
}

/// Runtime for commands that talk to the network.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

/// "1 sale" / "3 sales".
pub fn sales(n: usize) -> String {
    if n == 1 {
        "1 sale".to_string()
    } else {
        format!("{n} sales")
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
