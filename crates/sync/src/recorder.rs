// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Recording a sale: send now, or queue for later.

use tq_core::{IdempotencyKey, ItemId, Result, SaleRequest};

use crate::api::{ApiError, Confirmation, Submission};
use crate::engine::SyncEngine;
use crate::notify::SyncEvent;

/// Where a recorded sale ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    /// The server confirmed it directly.
    Sent(Confirmation),
    /// It is in the offline queue under this id.
    Queued(ItemId),
}

/// Entry point for new sales.
///
/// A sale goes straight to the server only when the monitor says online and
/// nothing older is waiting in the queue; otherwise it joins the tail of the
/// queue so sales reach the server in the order they were rung up. A direct
/// send that fails is queued under the key it was sent with, so a server
/// that did accept it answers the later replay with the original record.
#[derive(Debug, Clone)]
pub struct SaleRecorder {
    engine: SyncEngine,
}

impl SaleRecorder {
    pub fn new(engine: SyncEngine) -> Self {
        SaleRecorder { engine }
    }

    /// Records `sale`.
    ///
    /// Fails only when the sale is invalid or could not be persisted; in the
    /// latter case it was NOT queued.
    pub async fn record(&self, sale: SaleRequest) -> Result<Recorded> {
        sale.validate()?;
        let kind = sale.kind();
        let payload = sale.to_payload()?;
        let key = IdempotencyKey::generate();

        let queue = self.engine.queue();
        if self.engine.monitor().is_online() && queue.is_empty() {
            let submission = Submission { key, kind, payload: payload.clone() };
            match self.send(submission).await {
                Ok(confirmation) => {
                    tracing::info!(%key, record_id = %confirmation.record_id, "sale sent");
                    return Ok(Recorded::Sent(confirmation));
                }
                Err(e) => tracing::warn!(%key, error = %e, "direct send failed, queuing sale"),
            }
        }

        let id = queue.enqueue_with_key(kind, payload, key)?;
        let pending = queue.len();
        tracing::info!(%id, pending, "sale queued");
        self.engine.sink().notify(SyncEvent::SaleQueued { id, pending });
        Ok(Recorded::Queued(id))
    }

    async fn send(&self, submission: Submission) -> std::result::Result<Confirmation, ApiError> {
        let timeout = self.engine.config().send_timeout;
        match tokio::time::timeout(timeout, self.engine.api().submit(submission)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
