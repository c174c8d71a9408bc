//! Correlation of in-flight calls with their replies
//!
//! This module owns the lifecycle of an outstanding call between issuance
//! and resolution.
//!
//! # Call Lifecycle
//!
//! 1. **Allocate ID**: take the next sequence id from the atomic counter
//! 2. **Register**: create a oneshot channel keyed by the id
//! 3. **Publish**: the call envelope goes out over the broker
//! 4. **Wait**: the caller awaits the oneshot receiver
//! 5. **Resolve**: the reply dispatcher matches the id and fills the slot
//! 6. **Return**: the caller decodes the reply and returns to the user
//!
//! Oneshot channels give each entry single-assignment semantics for free:
//! the slot is filled exactly once, and a duplicate or late reply simply
//! finds no entry (it was removed on first resolution) and is dropped by
//! the dispatcher. Entries that never resolve are failed in bulk by
//! `fail_all` at shutdown, so no caller blocks forever.
//!
//! The table is private to one client codec instance. Multiple clients in
//! one process each run their own table; ids are scoped per table.

use jroq_core::{Error, ReplyEnvelope, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{oneshot, Mutex};

/// One outstanding call waiting for its reply.
struct PendingCall {
    /// Single-assignment response slot
    tx: oneshot::Sender<Result<ReplyEnvelope>>,
    /// When the call was registered, for reply-latency traces
    issued_at: Instant,
}

/// Table of in-flight calls keyed by sequence id.
#[derive(Clone, Default)]
pub(crate) struct CorrelationTable {
    pending: Arc<Mutex<HashMap<u64, PendingCall>>>,
    counter: Arc<AtomicU64>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next sequence id.
    ///
    /// Safe under concurrent calls: no two outstanding calls ever share an
    /// id, and ids are not reused for the lifetime of the table.
    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Register an entry for `id` and return the receiver the caller waits
    /// on.
    pub async fn register(&self, id: u64) -> oneshot::Receiver<Result<ReplyEnvelope>> {
        let (tx, rx) = oneshot::channel();
        let entry = PendingCall {
            tx,
            issued_at: Instant::now(),
        };
        self.pending.lock().await.insert(id, entry);
        rx
    }

    /// Deliver a reply to the waiting caller, removing the entry.
    ///
    /// Returns false when no entry is outstanding for the id: the call
    /// already resolved, timed out, or was never issued by this codec. The
    /// caller treats that as a normal race, not an error.
    pub async fn resolve(&self, id: u64, reply: ReplyEnvelope) -> bool {
        let entry = self.pending.lock().await.remove(&id);
        match entry {
            Some(entry) => {
                tracing::trace!(
                    id,
                    elapsed_ms = entry.issued_at.elapsed().as_millis() as u64,
                    "reply matched"
                );
                // The caller may have stopped waiting; a dead receiver is fine.
                let _ = entry.tx.send(Ok(reply));
                true
            }
            None => false,
        }
    }

    /// Remove an entry without waking the caller.
    ///
    /// Used on publish failure and timeout, where the caller already has its
    /// error and the entry must not leak.
    pub async fn discard(&self, id: u64) {
        self.pending.lock().await.remove(&id);
    }

    /// Fail every outstanding entry with the given error. Used at shutdown.
    pub async fn fail_all(&self, error: Error) {
        let mut pending = self.pending.lock().await;
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "failing outstanding calls");
        }
        for (_, entry) in pending.drain() {
            let _ = entry.tx.send(Err(error.clone()));
        }
    }

    /// Number of calls currently awaiting a reply.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
