// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity state and edge-triggered transitions.
//!
//! The monitor holds one boolean. Signals are fed in with
//! [`ConnectivityMonitor::report`]; only a change of state produces a
//! [`Transition`], so a flapping source reporting "online" twice emits a
//! single `BecameOnline`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

const TRANSITION_CAPACITY: usize = 16;

/// Last known network state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_online(self) -> bool {
        self == Connectivity::Online
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Online => write!(f, "online"),
            Connectivity::Offline => write!(f, "offline"),
        }
    }
}

/// A change of connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BecameOnline,
    BecameOffline,
}

struct Inner {
    online: AtomicBool,
    tx: broadcast::Sender<Transition>,
}

/// Shared connectivity state. Clones observe the same state.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Arc<Inner>,
}

impl ConnectivityMonitor {
    /// Creates a monitor starting in `initial`.
    pub fn new(initial: Connectivity) -> Self {
        let (tx, _) = broadcast::channel(TRANSITION_CAPACITY);
        ConnectivityMonitor {
            inner: Arc::new(Inner { online: AtomicBool::new(initial.is_online()), tx }),
        }
    }

    /// Monitor for hosts without a reachability signal.
    ///
    /// Assumes online; sends that fail are queued anyway.
    pub fn assume_online() -> Self {
        tracing::warn!("no connectivity signal available, assuming online");
        Self::new(Connectivity::Online)
    }

    /// Monitor seeded from an optional host signal.
    pub fn from_signal(signal: Option<bool>) -> Self {
        match signal {
            Some(true) => Self::new(Connectivity::Online),
            Some(false) => Self::new(Connectivity::Offline),
            None => Self::assume_online(),
        }
    }

    pub fn current_status(&self) -> Connectivity {
        if self.is_online() {
            Connectivity::Online
        } else {
            Connectivity::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::Acquire)
    }

    /// Feeds one signal in.
    ///
    /// Returns the transition it caused, or `None` if the state already
    /// matched.
    pub fn report(&self, online: bool) -> Option<Transition> {
        let was_online = self.inner.online.swap(online, Ordering::AcqRel);
        if was_online == online {
            return None;
        }

        let transition =
            if online { Transition::BecameOnline } else { Transition::BecameOffline };
        tracing::info!(?transition, "connectivity changed");
        // No receivers is fine: the state is still recorded
        let _ = self.inner.tx.send(transition);
        Some(transition)
    }

    /// Registers for transitions from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription { rx: self.inner.tx.subscribe() }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

impl fmt::Debug for ConnectivityMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectivityMonitor")
            .field("status", &self.current_status())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle for receiving transitions. Dropping it unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<Transition>,
}

impl Subscription {
    /// Waits for the next transition.
    ///
    /// Returns `None` once every monitor handle is gone. A subscriber that
    /// fell behind skips the transitions it missed.
    pub async fn next_transition(&mut self) -> Option<Transition> {
        loop {
            match self.rx.recv().await {
                Ok(transition) => return Some(transition),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "connectivity subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns a pending transition without waiting.
    pub fn try_next(&mut self) -> Option<Transition> {
        loop {
            match self.rx.try_recv() {
                Ok(transition) => return Some(transition),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Explicitly tears the subscription down.
    pub fn unsubscribe(self) {}
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
