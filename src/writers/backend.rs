use crate::logger_error::BackendError;
use crate::{Entry, SeverityMask};
use std::cell::RefCell;
use std::sync::{Arc, Mutex};

/// The object a backend designates as synchronization point for its writes.
///
/// A backend may replace its lock target during its lifetime, e.g. when a file backend
/// switches to a new file; the logger therefore asks for the current target on every write.
pub type LockTarget = Arc<Mutex<()>>;

/// Creates a fresh, unshared lock target.
#[must_use]
pub fn new_lock_target() -> LockTarget {
    Arc::new(Mutex::new(()))
}

/// A single log sink.
///
/// Backends are shared between threads, so all methods take `&self`;
/// implementations use internal mutability where they need state.
pub trait Backend: Sync + Send {
    /// Prepares the backend for writing; returns true if it is ready.
    ///
    /// Must be idempotent. The logger calls it once, while it is built.
    fn open(&self) -> bool;

    /// Releases the output stream, if any; returns true on success.
    ///
    /// Must be idempotent.
    fn close(&self) -> bool;

    /// Flushes buffered output; may be a no-op.
    ///
    /// # Errors
    ///
    /// `std::io::Error`
    fn flush(&self) -> std::io::Result<()>;

    /// Writes out one log entry.
    ///
    /// Whether a failure is returned or swallowed is up to the backend.
    ///
    /// # Errors
    ///
    /// `BackendError`
    fn write_entry(&self, entry: &Entry) -> Result<(), BackendError>;

    /// Releases all resources. The logger calls it exactly once, when it is disposed.
    fn dispose(&self) {
        self.close();
    }

    /// The severities this backend accepts.
    fn severity_mask(&self) -> SeverityMask;

    /// Whether concurrent calls of `write_entry` must be serialized by the caller.
    fn requires_lock(&self) -> bool {
        false
    }

    /// The current synchronization point; only used if `requires_lock()` is true.
    fn lock_target(&self) -> LockTarget;
}

// Hands out a thread-local buffer for assembling the bytes of one entry.
//
// A recursive call on the same thread (e.g. from a Display implementation that logs)
// finds the buffer borrowed and gets a temporary one instead.
pub(crate) fn buffer_with<F, R>(f: F) -> R
where
    F: FnOnce(&mut Vec<u8>) -> R,
{
    thread_local! {
        static BUFFER: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(200));
    }
    BUFFER.with(|tl_buf| match tl_buf.try_borrow_mut() {
        Ok(mut buffer) => {
            buffer.clear();
            let result = f(&mut *buffer);
            buffer.clear();
            result
        }
        Err(_e) => f(&mut Vec::with_capacity(200)),
    })
}
