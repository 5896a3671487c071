//! Transient inline messages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A message that clears itself after a delay.
///
/// Each [`FlashMessage::show`] supersedes the previous one: the timer of an
/// older message never clears a newer message.
#[derive(Debug, Clone, Default)]
pub struct FlashMessage {
    inner: Arc<FlashInner>,
}

#[derive(Debug, Default)]
struct FlashInner {
    message: Mutex<Option<String>>,
    generation: AtomicU64,
}

impl FlashMessage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message` now and clear it after `ttl`.
    ///
    /// Must be called within a Tokio runtime.
    pub fn show(&self, message: impl Into<String>, ttl: Duration) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.slot() = Some(message.into());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if inner.generation.load(Ordering::SeqCst) == generation {
                *lock(&inner.message) = None;
            }
        });
    }

    /// The visible message, if any.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.slot().clone()
    }

    /// Clear the message immediately.
    pub fn clear(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        *self.slot() = None;
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        lock(&self.inner.message)
    }
}

fn lock(message: &Mutex<Option<String>>) -> std::sync::MutexGuard<'_, Option<String>> {
    message
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
