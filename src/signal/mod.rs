//! Durable single-slot broadcast used to propagate "verification completed"
//! across execution contexts (browser tabs of the same profile).
//!
//! The slot is a read-clear queue of depth one: a second write before the
//! first consumption overwrites, which is fine because the signal carries no
//! payload beyond "completed". Live notifications carry the writer's
//! [`ContextId`] so the writing context can ignore its own broadcast; the
//! writer already ran the completion effect locally. The concrete substrate
//! (browser storage, a pub/sub bus) lives behind the trait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

/// Identifies one execution context (one mounted login surface) for the
/// lifetime of the process.
pub type ContextId = u64;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique [`ContextId`].
#[must_use]
pub fn next_context_id() -> ContextId {
    NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub trait CompletionChannel: Send + Sync {
    /// Publish a completion on behalf of `writer`. Also notifies every live
    /// subscriber, the writer's own included; filtering is the subscriber's
    /// job.
    fn write(&self, writer: ContextId);
    /// Drain the slot. Returns true exactly once per write; a consumed slot
    /// yields false until the next write.
    fn take(&self) -> bool;
    /// Change notifications for writes, each tagged with the writer.
    fn subscribe(&self) -> broadcast::Receiver<ContextId>;
}

/// In-memory channel backing tests and single-process targets.
#[derive(Debug)]
pub struct MemoryChannel {
    slot: Mutex<bool>,
    notify: broadcast::Sender<ContextId>,
}

impl MemoryChannel {
    #[must_use]
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(8);
        Self {
            slot: Mutex::new(false),
            notify,
        }
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionChannel for MemoryChannel {
    fn write(&self, writer: ContextId) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = true;
        }
        // No receivers is fine; the slot still holds the signal for peeks.
        let _ = self.notify.send(writer);
        debug!(writer, "completion signal written");
    }

    fn take(&self) -> bool {
        self.slot
            .lock()
            .map(|mut slot| std::mem::take(&mut *slot))
            .unwrap_or(false)
    }

    fn subscribe(&self) -> broadcast::Receiver<ContextId> {
        self.notify.subscribe()
    }
}
