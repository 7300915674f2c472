//! Bounded ring buffer implementation.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::cancel::{CancelToken, Registration, Wake};
use crate::config::{Config, FullPolicy};
use crate::error::{Error, Rejected, Result};

/// A thread-safe bounded ring buffer.
///
/// `RingBuffer<T>` is a fixed-capacity FIFO shared between producer and
/// consumer threads. Cloning a `RingBuffer` yields another handle to the same
/// buffer. What happens when the buffer is full is chosen once, at
/// construction, by a [`FullPolicy`]:
///
/// | Policy      | `put` when full            | `get` when empty   |
/// |-------------|----------------------------|--------------------|
/// | `Reject`    | fails with `BufferFull`    | `Ok(None)`         |
/// | `Overwrite` | drops the oldest element   | `Ok(None)`         |
/// | `Block`     | waits for space            | waits for data     |
///
/// [`close`](Self::close) is one-way: it discards the contents, wakes every
/// waiter, and makes all later `put`/`get`/`peek`/`clear` calls fail with
/// [`Error::Closed`]. Size queries keep working and report an empty buffer.
///
/// # Example
///
/// ```
/// use giztoy_ringbuf::{Error, RingBuffer};
///
/// let buf = RingBuffer::new(3).unwrap();
/// buf.put("a").unwrap();
/// buf.put("b").unwrap();
/// buf.put("c").unwrap();
///
/// let rejected = buf.put("d").unwrap_err();
/// assert_eq!(rejected.kind(), Error::BufferFull);
///
/// assert_eq!(buf.get().unwrap(), Some("a"));
/// buf.put(rejected.into_inner()).unwrap();
/// assert_eq!(buf.to_string(), "[b, c, d]");
/// ```
pub struct RingBuffer<T> {
    inner: Arc<RingBufferInner<T>>,
}

struct RingBufferInner<T> {
    state: Mutex<RingBufferState<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
    policy: FullPolicy,
}

struct RingBufferState<T> {
    buf: Vec<Option<T>>,
    head: usize,  // write position
    tail: usize,  // read position
    count: usize, // occupied slots
    closed: bool,
    dropped: u64,
}

/// How long a blocking operation may park.
#[derive(Clone, Copy)]
struct Wait<'a> {
    deadline: Option<Instant>,
    cancel: Option<&'a CancelToken>,
}

impl<'a> Wait<'a> {
    const FOREVER: Wait<'static> = Wait {
        deadline: None,
        cancel: None,
    };

    fn timeout(timeout: Duration) -> Self {
        Wait {
            // An unrepresentable deadline is as good as none.
            deadline: Instant::now().checked_add(timeout),
            cancel: None,
        }
    }

    fn cancellable(token: &'a CancelToken) -> Self {
        Wait {
            deadline: None,
            cancel: Some(token),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    /// Parks on `cond` once. The caller re-checks its predicate afterwards.
    fn park<S>(&self, cond: &Condvar, guard: &mut MutexGuard<'_, S>) -> Result<()> {
        match self.deadline {
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return Err(Error::Timeout);
                }
                cond.wait_until(guard, deadline);
            }
            None => cond.wait(guard),
        }
        Ok(())
    }
}

impl<T> RingBufferState<T> {
    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn is_full(&self) -> bool {
        self.count == self.buf.len()
    }

    fn push(&mut self, item: T) {
        let head = self.head;
        self.buf[head] = Some(item);
        self.head = (head + 1) % self.capacity();
        self.count += 1;
    }

    fn pop(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let tail = self.tail;
        let item = self.buf[tail].take();
        self.tail = (tail + 1) % self.capacity();
        self.count -= 1;
        item
    }

    fn front(&self) -> Option<&T> {
        if self.count == 0 {
            return None;
        }
        self.buf[self.tail].as_ref()
    }

    fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.capacity();
        (0..self.count).filter_map(move |i| self.buf[(self.tail + i) % capacity].as_ref())
    }

    fn reset(&mut self) {
        for slot in &mut self.buf {
            *slot = None;
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }
}

impl<T> Clone for RingBuffer<T> {
    fn clone(&self) -> Self {
        RingBuffer {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send> Wake for RingBufferInner<T> {
    fn wake(&self) {
        // Taking the lock orders this wake-up after any waiter that has
        // checked its token but not yet parked.
        let _state = self.state.lock();
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

impl<T> RingBuffer<T> {
    /// Creates a RingBuffer with the specified capacity and the reject policy.
    ///
    /// Fails with [`Error::InvalidArgument`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(Config::new(capacity))
    }

    /// Creates a RingBuffer with the specified capacity and full policy.
    pub fn with_policy(capacity: usize, policy: FullPolicy) -> Result<Self> {
        Self::with_config(Config::new(capacity).full_policy(policy))
    }

    /// Creates a RingBuffer from a [`Config`].
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let mut buf = Vec::with_capacity(config.capacity);
        buf.resize_with(config.capacity, || None);

        Ok(RingBuffer {
            inner: Arc::new(RingBufferInner {
                state: Mutex::new(RingBufferState {
                    buf,
                    head: 0,
                    tail: 0,
                    count: 0,
                    closed: false,
                    dropped: 0,
                }),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
                capacity: config.capacity,
                policy: config.full_policy,
            }),
        })
    }

    /// Returns the number of elements currently in the buffer.
    pub fn len(&self) -> usize {
        self.inner.state.lock().count
    }

    /// Alias of [`len`](Self::len).
    pub fn size(&self) -> usize {
        self.len()
    }

    /// Returns the buffer capacity.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Returns the full policy chosen at construction.
    pub fn policy(&self) -> FullPolicy {
        self.inner.policy
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the buffer is full.
    pub fn is_full(&self) -> bool {
        self.inner.state.lock().is_full()
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Returns how many elements the overwrite policy has discarded.
    pub fn dropped(&self) -> u64 {
        self.inner.state.lock().dropped
    }

    /// Adds an element to the buffer.
    ///
    /// When the buffer is full the outcome depends on the policy: `Reject`
    /// fails with [`Error::BufferFull`], `Overwrite` discards the oldest
    /// element, `Block` waits until a consumer makes room. A refused item
    /// is handed back inside the [`Rejected`] error.
    pub fn put(&self, item: T) -> std::result::Result<(), Rejected<T>> {
        self.put_with(item, Wait::FOREVER)
    }

    /// Adds a possibly-absent element, refusing `None` with [`Error::NullItem`].
    pub fn put_opt(&self, item: Option<T>) -> std::result::Result<(), Rejected<Option<T>>> {
        match item {
            Some(item) => self.put(item).map_err(|rejected| rejected.map(Some)),
            None => Err(Rejected::new(None, Error::NullItem)),
        }
    }

    /// Like [`put`](Self::put), but a blocking wait gives up after `timeout`
    /// with [`Error::Timeout`].
    pub fn put_timeout(&self, item: T, timeout: Duration) -> std::result::Result<(), Rejected<T>> {
        self.put_with(item, Wait::timeout(timeout))
    }

    /// Removes and returns the oldest element.
    ///
    /// On an empty buffer the `Block` policy waits for data; the other
    /// policies return `Ok(None)`.
    pub fn get(&self) -> Result<Option<T>> {
        self.get_with(Wait::FOREVER)
    }

    /// Like [`get`](Self::get), but a blocking wait gives up after `timeout`
    /// with [`Error::Timeout`].
    pub fn get_timeout(&self, timeout: Duration) -> Result<Option<T>> {
        self.get_with(Wait::timeout(timeout))
    }

    /// Removes every element in FIFO order.
    pub fn drain(&self) -> Result<Vec<T>> {
        let mut state = self.inner.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }
        let mut items = Vec::with_capacity(state.count);
        while let Some(item) = state.pop() {
            items.push(item);
        }
        self.inner.not_full.notify_all();
        Ok(items)
    }

    /// Removes all elements.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }
        state.reset();
        self.inner.not_full.notify_all();
        Ok(())
    }

    /// Closes the buffer.
    ///
    /// Discards the contents and wakes every blocked `put` and `get`, which
    /// then fail with [`Error::Closed`]. Calling it again does nothing.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }
        let discarded = state.count;
        state.closed = true;
        state.reset();
        self.inner.not_full.notify_all();
        self.inner.not_empty.notify_all();
        debug!(capacity = self.inner.capacity, discarded, "ring buffer closed");
    }

    fn put_with(&self, item: T, wait: Wait<'_>) -> std::result::Result<(), Rejected<T>> {
        let mut state = self.inner.state.lock();

        loop {
            if state.closed {
                return Err(Rejected::new(item, Error::Closed));
            }
            if wait.is_cancelled() {
                // Hand a possibly consumed wake-up to the next producer.
                if !state.is_full() {
                    self.inner.not_full.notify_one();
                }
                return Err(Rejected::new(item, Error::Cancelled));
            }
            if !state.is_full() {
                break;
            }

            match self.inner.policy {
                FullPolicy::Reject => return Err(Rejected::new(item, Error::BufferFull)),
                FullPolicy::Overwrite => {
                    drop(state.pop());
                    state.dropped += 1;
                    trace!(dropped = state.dropped, "ring buffer full, oldest element overwritten");
                    break;
                }
                FullPolicy::Block => {
                    if let Err(err) = wait.park(&self.inner.not_full, &mut state) {
                        trace!(%err, "put gave up waiting for space");
                        return Err(Rejected::new(item, err));
                    }
                }
            }
        }

        state.push(item);
        self.inner.not_empty.notify_one();
        Ok(())
    }

    fn get_with(&self, wait: Wait<'_>) -> Result<Option<T>> {
        let mut state = self.inner.state.lock();

        loop {
            if state.closed {
                return Err(Error::Closed);
            }
            if wait.is_cancelled() {
                // Hand a possibly consumed wake-up to the next consumer.
                if state.count > 0 {
                    self.inner.not_empty.notify_one();
                }
                return Err(Error::Cancelled);
            }
            if let Some(item) = state.pop() {
                self.inner.not_full.notify_one();
                return Ok(Some(item));
            }
            if !self.inner.policy.is_blocking() {
                return Ok(None);
            }
            if let Err(err) = wait.park(&self.inner.not_empty, &mut state) {
                trace!(%err, "get gave up waiting for data");
                return Err(err);
            }
        }
    }
}

impl<T: Send + 'static> RingBuffer<T> {
    /// Like [`put`](Self::put), but a blocking wait can be aborted through
    /// `token`, failing with [`Error::Cancelled`].
    ///
    /// A token that is already cancelled fails the call straight away.
    pub fn put_cancellable(
        &self,
        item: T,
        token: &CancelToken,
    ) -> std::result::Result<(), Rejected<T>> {
        let _registration = self.register(token);
        self.put_with(item, Wait::cancellable(token))
    }

    /// Like [`get`](Self::get), but a blocking wait can be aborted through
    /// `token`, failing with [`Error::Cancelled`].
    pub fn get_cancellable(&self, token: &CancelToken) -> Result<Option<T>> {
        let _registration = self.register(token);
        self.get_with(Wait::cancellable(token))
    }

    fn register<'a>(&self, token: &'a CancelToken) -> Option<Registration<'a>> {
        if !self.inner.policy.is_blocking() {
            return None;
        }
        let waker: Weak<dyn Wake> = Arc::downgrade(&self.inner) as Weak<dyn Wake>;
        Some(token.register(waker))
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Returns a copy of the oldest element without removing it.
    pub fn peek(&self) -> Result<Option<T>> {
        let state = self.inner.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }
        Ok(state.front().cloned())
    }

    /// Returns a copy of all elements in FIFO order.
    pub fn to_vec(&self) -> Vec<T> {
        let state = self.inner.state.lock();
        state.iter().cloned().collect()
    }
}

impl<T: fmt::Display> fmt::Display for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.write_str("[")?;
        for (i, item) in state.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", item)?;
        }
        f.write_str("]")
    }
}

impl<T> fmt::Debug for RingBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("RingBuffer")
            .field("capacity", &self.inner.capacity)
            .field("len", &state.count)
            .field("policy", &self.inner.policy)
            .field("closed", &state.closed)
            .finish()
    }
}
