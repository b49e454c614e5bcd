// the per-connection handle and its bounded outbox.

use bytes::Bytes;
use event_hub_core::UserId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// A live streaming endpoint for a specific user. Identity is by allocation
/// (`Arc::ptr_eq` on the handles the table stores), not by any field here —
/// two `Client`s for the same user are always distinct connections.
pub struct Client {
    user_id: UserId,
    shard: usize,
    // `None` once closed; dropping the sender is what makes the paired
    // receiver observe end-of-stream, which a flag alone cannot do.
    sender: Mutex<Option<mpsc::Sender<Bytes>>>,
    closed: AtomicBool,
}

/// Returned by `ClientTable::register`: the handle the hub keeps, and the
/// receiving half the connection edge (out of scope for this crate) drains.
pub struct RegisteredClient {
    pub client: std::sync::Arc<Client>,
    pub receiver: mpsc::Receiver<Bytes>,
}

impl Client {
    pub(crate) fn new(user_id: UserId, shard: usize, capacity: usize) -> RegisteredClient {
        let (sender, receiver) = mpsc::channel(capacity);
        let client = std::sync::Arc::new(Client {
            user_id,
            shard,
            sender: Mutex::new(Some(sender)),
            closed: AtomicBool::new(false),
        });
        RegisteredClient { client, receiver }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn shard(&self) -> usize {
        self.shard
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Non-blocking send. Returns `true` on successful enqueue, `false` if
    /// the outbox is full or has been closed — in both cases the payload is
    /// simply dropped for this connection; the caller is responsible for
    /// counting the drop. Never panics, including the race where `close`
    /// runs concurrently with this call (the lock gives the race a single
    /// winner rather than the caller needing to catch a send-on-closed
    /// error from the channel).
    pub(crate) fn try_send(&self, payload: Bytes) -> bool {
        match self.sender.lock().unwrap().as_ref() {
            Some(sender) => sender.try_send(payload).is_ok(),
            None => false,
        }
    }

    /// Closes the outbox. Idempotent: only the first call has any effect,
    /// matching the invariant that closure happens exactly once regardless
    /// of how many paths might race to unregister the same client. Dropping
    /// the sender (rather than merely flipping a flag) is what lets the
    /// paired receiver observe end-of-stream.
    pub(crate) fn close(&self) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.sender.lock().unwrap().take();
        }
    }
}
