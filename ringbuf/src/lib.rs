//! Bounded thread-safe ring buffer.
//!
//! This crate provides [`RingBuffer<T>`], a fixed-capacity FIFO for handing
//! items from producer threads to consumer threads. What `put` does on a full
//! buffer is chosen at construction with a [`FullPolicy`]:
//!
//! - [`FullPolicy::Reject`]: fail with [`Error::BufferFull`], the caller retries
//! - [`FullPolicy::Overwrite`]: drop the oldest element and keep going
//! - [`FullPolicy::Block`]: wait for space (and make `get` wait for data)
//!
//! # Reject
//!
//! ```
//! use giztoy_ringbuf::{Error, RingBuffer};
//!
//! let buf = RingBuffer::new(2).unwrap();
//! buf.put(1).unwrap();
//! buf.put(2).unwrap();
//!
//! let rejected = buf.put(3).unwrap_err();
//! assert_eq!(rejected.kind(), Error::BufferFull);
//! assert_eq!(rejected.into_inner(), 3);
//! ```
//!
//! # Overwrite
//!
//! ```
//! use giztoy_ringbuf::{FullPolicy, RingBuffer};
//!
//! let buf = RingBuffer::with_policy(3, FullPolicy::Overwrite).unwrap();
//! for i in 1..=5 {
//!     buf.put(i).unwrap(); // Overwrites 1, 2
//! }
//! assert_eq!(buf.to_vec(), vec![3, 4, 5]);
//! assert_eq!(buf.dropped(), 2);
//! ```
//!
//! # Block
//!
//! ```
//! use giztoy_ringbuf::{FullPolicy, RingBuffer};
//! use std::thread;
//!
//! let buf = RingBuffer::with_policy(4, FullPolicy::Block).unwrap();
//! let producer_buf = buf.clone();
//!
//! // Producer thread (waits whenever the buffer is full)
//! let producer = thread::spawn(move || {
//!     for i in 0..10 {
//!         producer_buf.put(i).unwrap();
//!     }
//! });
//!
//! let items: Vec<i32> = (0..10).map(|_| buf.get().unwrap().unwrap()).collect();
//! producer.join().unwrap();
//! assert_eq!(items, (0..10).collect::<Vec<_>>());
//! ```
//!
//! # Closing
//!
//! [`RingBuffer::close`] discards the contents and wakes every blocked
//! caller; from then on `put`, `get`, `peek`, `clear` and `drain` fail with
//! [`Error::Closed`]. Blocking waits can also be bounded with
//! [`RingBuffer::put_timeout`]/[`RingBuffer::get_timeout`] or aborted with a
//! [`CancelToken`].
//!
//! # Thread Safety
//!
//! `RingBuffer<T>` is `Send + Sync` for `T: Send`. `Clone` shares the
//! underlying buffer via `Arc`.

mod cancel;
mod config;
mod error;
mod ring_buffer;

pub use cancel::CancelToken;
pub use config::{Config, FullPolicy};
pub use error::{Error, Rejected, Result};
pub use ring_buffer::RingBuffer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RingBuffer<i32>>();
        assert_send_sync::<RingBuffer<String>>();
        assert_send_sync::<CancelToken>();
        assert_send_sync::<Error>();
    }

    #[test]
    fn test_buffer_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<RingBuffer<i32>>();
        assert_clone::<CancelToken>();
    }
}
