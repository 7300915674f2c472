//! Error types for ring buffer operations.

use std::error::Error as StdError;
use std::fmt;

/// Result type alias for ring buffer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Ring buffer operation error.
///
/// Every failure is local and synchronous: the buffer never retries on the
/// caller's behalf. An empty buffer under a non-blocking policy is not an
/// error, `get` and `peek` report it as `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A constructor argument was out of range.
    #[error("ringbuf: invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// An absent item was offered to the buffer.
    #[error("ringbuf: item cannot be null")]
    NullItem,

    /// The buffer is at capacity and the policy rejects new items.
    #[error("ringbuf: buffer is full")]
    BufferFull,

    /// The buffer has been closed.
    #[error("ringbuf: closed")]
    Closed,

    /// A blocking wait was cancelled through its token.
    #[error("ringbuf: wait cancelled")]
    Cancelled,

    /// A timed wait expired.
    #[error("ringbuf: wait timed out")]
    Timeout,
}

/// A refused `put`.
///
/// Carries the item back to the caller together with the reason it was
/// refused, so a `BufferFull` can be retried without cloning.
pub struct Rejected<T> {
    item: T,
    error: Error,
}

impl<T> Rejected<T> {
    pub(crate) fn new(item: T, error: Error) -> Self {
        Rejected { item, error }
    }

    /// Returns the reason the item was refused.
    pub fn kind(&self) -> Error {
        self.error
    }

    /// Returns the refused item.
    pub fn into_inner(self) -> T {
        self.item
    }

    /// Splits into the refused item and the reason.
    pub fn into_parts(self) -> (T, Error) {
        (self.item, self.error)
    }

    /// Maps the carried item, keeping the reason.
    pub fn map<U, F>(self, f: F) -> Rejected<U>
    where
        F: FnOnce(T) -> U,
    {
        Rejected {
            item: f(self.item),
            error: self.error,
        }
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T> StdError for Rejected<T> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<Rejected<T>> for Error {
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Closed.to_string(), "ringbuf: closed");
        assert_eq!(Error::BufferFull.to_string(), "ringbuf: buffer is full");
        assert_eq!(
            Error::InvalidArgument("capacity must be greater than 0").to_string(),
            "ringbuf: invalid argument: capacity must be greater than 0"
        );
    }

    #[test]
    fn test_rejected_returns_item() {
        let rejected = Rejected::new("Item 3".to_string(), Error::BufferFull);
        assert_eq!(rejected.kind(), Error::BufferFull);
        assert_eq!(rejected.to_string(), "ringbuf: buffer is full");
        assert_eq!(rejected.into_inner(), "Item 3");
    }

    #[test]
    fn test_rejected_converts_to_error() {
        fn fails() -> Result<()> {
            Err(Rejected::new(7, Error::Closed))?;
            Ok(())
        }
        assert_eq!(fails(), Err(Error::Closed));
    }

    #[test]
    fn test_rejected_map() {
        let rejected = Rejected::new(1, Error::Timeout).map(Some);
        let (item, err) = rejected.into_parts();
        assert_eq!(item, Some(1));
        assert_eq!(err, Error::Timeout);
    }

    #[test]
    fn test_rejected_source() {
        let rejected = Rejected::new((), Error::Cancelled);
        let source = rejected.source().map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("ringbuf: wait cancelled"));
    }
}
