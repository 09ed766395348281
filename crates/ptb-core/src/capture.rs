//! Pending free-text captures.
//!
//! A capture says "the next free-text message from this user feeds this continuation".
//! There is at most one per user. Each capture gets a fresh [`CaptureId`]; its timeout
//! only removes the entry if the id still matches, so a reply and an expiry racing for
//! the same capture produce exactly one effect.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    domain::{ChatId, MessageRef, ServerId, UserId},
    messaging::port::MessagingPort,
    render::render,
    timeout::TimeoutGuard,
};

/// How long a prompt waits for its answer.
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(15);

pub const TIMEOUT_NOTICE: &str = "Время ожидания истекло.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CaptureId(u64);

/// What the captured text is for, with everything needed to finish the flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Continuation {
    /// New API key; `profile` is the profile screen to re-render afterwards.
    ApiKey { profile: Option<MessageRef> },
    ConsoleCommand { server: ServerId },
    Rename { server: ServerId },
}

/// A resolved capture, handed back to the caller to run.
#[derive(Clone, Debug)]
pub struct CaptureInvocation {
    pub id: CaptureId,
    pub user_id: UserId,
    /// The prompt message asking for the text.
    pub prompt: MessageRef,
    pub continuation: Continuation,
    pub text: String,
}

struct PendingCapture {
    id: CaptureId,
    prompt: MessageRef,
    continuation: Continuation,
    guard: TimeoutGuard,
}

struct CaptureInner {
    messenger: Arc<dyn MessagingPort>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<UserId, PendingCapture>>,
}

/// Owner of all pending captures.
///
/// Timers hold only a weak handle and ask the manager to expire a specific capture id;
/// the manager is the only writer of the map.
#[derive(Clone)]
pub struct CaptureManager {
    inner: Arc<CaptureInner>,
}

impl CaptureManager {
    pub fn new(messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            inner: Arc::new(CaptureInner {
                messenger,
                next_id: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a capture for `user_id`, replacing (and cancelling) any previous one.
    ///
    /// The capture is bound to the chat of `prompt`. After `timeout` without a reply
    /// the user is told the wait expired and `prompt` is deleted.
    pub async fn begin(
        &self,
        user_id: UserId,
        prompt: MessageRef,
        continuation: Continuation,
        timeout: Duration,
    ) -> CaptureId {
        let id = CaptureId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let weak = Arc::downgrade(&self.inner);

        // Arm under the lock so the timer cannot observe the map before the insert.
        let mut map = self.inner.pending.lock().await;
        let guard = TimeoutGuard::arm(timeout, move || async move {
            if let Some(inner) = weak.upgrade() {
                CaptureManager { inner }.expire(user_id, id).await;
            }
        });
        let previous = map.insert(
            user_id,
            PendingCapture {
                id,
                prompt,
                continuation,
                guard,
            },
        );
        drop(map);

        if let Some(prev) = previous {
            prev.guard.cancel();
            debug!(
                user_id = user_id.0,
                replaced = prev.id.0,
                capture_id = id.0,
                "capture replaced"
            );
        }
        debug!(user_id = user_id.0, capture_id = id.0, "capture armed");
        id
    }

    /// Consume the user's pending capture with `text`.
    ///
    /// Returns `None` when the user has no capture, or has one opened in another chat;
    /// the caller then ignores the message.
    pub async fn resolve(
        &self,
        user_id: UserId,
        chat_id: ChatId,
        text: impl Into<String>,
    ) -> Option<CaptureInvocation> {
        let pending = {
            let mut map = self.inner.pending.lock().await;
            if map.get(&user_id)?.prompt.chat_id != chat_id {
                return None;
            }
            map.remove(&user_id)?
        };
        pending.guard.cancel();
        debug!(user_id = user_id.0, capture_id = pending.id.0, "capture resolved");

        Some(CaptureInvocation {
            id: pending.id,
            user_id,
            prompt: pending.prompt,
            continuation: pending.continuation,
            text: text.into(),
        })
    }

    /// Timer path. No-op unless `id` is still the user's current capture.
    async fn expire(&self, user_id: UserId, id: CaptureId) -> bool {
        let pending = {
            let mut map = self.inner.pending.lock().await;
            match map.get(&user_id) {
                Some(p) if p.id == id => map.remove(&user_id),
                _ => None,
            }
        };
        let Some(pending) = pending else {
            debug!(user_id = user_id.0, capture_id = id.0, "stale timeout ignored");
            return false;
        };

        info!(user_id = user_id.0, capture_id = id.0, "capture expired");
        let messenger = self.inner.messenger.as_ref();
        let chat_id = pending.prompt.chat_id;
        if let Err(e) = render(messenger, chat_id, None, TIMEOUT_NOTICE, None).await {
            warn!(chat_id = chat_id.0, "failed to send timeout notice: {e}");
        }
        if let Err(e) = messenger.delete_message(pending.prompt).await {
            warn!(chat_id = chat_id.0, "failed to delete expired prompt: {e}");
        }
        true
    }

    #[cfg(test)]
    pub(crate) async fn pending_count(&self) -> usize {
        self.inner.pending.lock().await.len()
    }
}
