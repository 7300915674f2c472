//! Cancellation of blocking waits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

/// Something parked on a condition that a cancellation must interrupt.
pub(crate) trait Wake: Send + Sync {
    fn wake(&self);
}

/// A cancellation signal shared between a waiting thread and its canceller.
///
/// Pass a token to [`RingBuffer::put_cancellable`] or
/// [`RingBuffer::get_cancellable`]; calling [`cancel`](Self::cancel) from any
/// thread makes those waits fail with [`Error::Cancelled`]. A token stays
/// cancelled once fired.
///
/// [`RingBuffer::put_cancellable`]: crate::RingBuffer::put_cancellable
/// [`RingBuffer::get_cancellable`]: crate::RingBuffer::get_cancellable
/// [`Error::Cancelled`]: crate::Error::Cancelled
///
/// # Example
///
/// ```
/// use giztoy_ringbuf::{CancelToken, Error, FullPolicy, RingBuffer};
/// use std::thread;
///
/// let buf = RingBuffer::<i32>::with_policy(1, FullPolicy::Block).unwrap();
/// let token = CancelToken::new();
///
/// let waiter = {
///     let buf = buf.clone();
///     let token = token.clone();
///     thread::spawn(move || buf.get_cancellable(&token))
/// };
///
/// token.cancel();
/// assert_eq!(waiter.join().unwrap(), Err(Error::Cancelled));
/// ```
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    waiters: Mutex<Waiters>,
}

#[derive(Default)]
struct Waiters {
    next_id: u64,
    entries: Vec<(u64, Weak<dyn Wake>)>,
}

/// Keeps a waker registered on a token until dropped.
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl CancelToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every current and future wait using this token.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let entries = std::mem::take(&mut self.inner.waiters.lock().entries);
        debug!(waiters = entries.len(), "cancel token fired");
        for (_, waker) in entries {
            if let Some(waker) = waker.upgrade() {
                waker.wake();
            }
        }
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Registers a waker to be called on cancellation.
    ///
    /// Must happen before the waiter first checks `is_cancelled`, otherwise a
    /// cancel landing in between is missed.
    pub(crate) fn register(&self, waker: Weak<dyn Wake>) -> Registration<'_> {
        let mut waiters = self.inner.waiters.lock();
        let id = waiters.next_id;
        waiters.next_id += 1;
        waiters.entries.push((id, waker));
        Registration { token: self, id }
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.inner.waiters.lock().entries.len()
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        let mut waiters = self.token.inner.waiters.lock();
        waiters.entries.retain(|(id, _)| *id != self.id);
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
