//! Tracking requests that are waiting for their reply.
//!
//! When a request is sent, a oneshot sender is stored under its id. The
//! reader task takes it out again when the matching reply arrives. A caller
//! that gives up removes its own entry, so a late reply finds nothing and is
//! dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;
use wire::{MessageId, Reply};

use crate::error::BridgeError;

#[derive(Default)]
struct Inner {
    pending: HashMap<MessageId, oneshot::Sender<Reply>>,
    closed: bool,
}

#[derive(Clone, Default)]
pub(crate) struct PendingRequests {
    inner: Arc<Mutex<Inner>>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // entries stay consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a caller for `id`.
    ///
    /// The returned guard removes the entry again when dropped, which covers
    /// callers that are cancelled or time out.
    pub(crate) fn register(
        &self,
        id: MessageId,
        reply_tx: oneshot::Sender<Reply>,
    ) -> Result<PendingGuard, BridgeError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(BridgeError::Closed);
        }
        inner.pending.insert(id, reply_tx);
        Ok(PendingGuard {
            requests: self.clone(),
            id,
        })
    }

    /// Deliver `reply` to its caller.
    ///
    /// Returns the reply back if nobody is waiting for it.
    pub(crate) fn complete(&self, reply: Reply) -> Result<(), Reply> {
        let Some(reply_tx) = self.lock().pending.remove(&reply.id) else {
            return Err(reply);
        };
        reply_tx.send(reply)
    }

    /// Fail every waiting caller and refuse new registrations.
    pub(crate) fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.pending.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().pending.len()
    }
}

pub(crate) struct PendingGuard {
    requests: PendingRequests,
    id: MessageId,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.requests.lock().pending.remove(&self.id).is_some() {
            tracing::debug!(id = self.id, "request abandoned before its reply arrived");
        }
    }
}
