use crate::logger_error::BackendError;
use crate::writers::{new_lock_target, Backend, LockTarget};
use crate::{Entry, SeverityMask};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A [`Backend`](trait.Backend.html) that drops everything it gets.
///
/// It can sleep for a fixed time per entry, to simulate a slow sink,
/// and it can claim to need locking, to create lock contention in the logger.
///
/// ```rust
/// use sinklog::writers::DiscardBackend;
///
/// // negative delays are taken by magnitude
/// let slow = DiscardBackend::new().with_delay_millis(-5).pretend_lock(true);
/// ```
#[allow(clippy::module_name_repetitions)]
pub struct DiscardBackend {
    delay: Option<Duration>,
    pretend_lock: bool,
    severity_mask: SeverityMask,
    lock_target: LockTarget,
    writes: AtomicU64,
}

impl Default for DiscardBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscardBackend {
    /// A backend that accepts all severities, does not sleep, and needs no lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delay: None,
            pretend_lock: false,
            severity_mask: SeverityMask::ALL,
            lock_target: new_lock_target(),
            writes: AtomicU64::new(0),
        }
    }

    /// Sleep this long in every write.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = if delay == Duration::from_millis(0) {
            None
        } else {
            Some(delay)
        };
        self
    }

    /// Sleep this many milliseconds in every write; the sign is ignored.
    #[must_use]
    pub fn with_delay_millis(self, millis: i64) -> Self {
        self.with_delay(Duration::from_millis(millis.unsigned_abs()))
    }

    /// Decides if the backend declares that it requires locking (default: false).
    #[must_use]
    pub fn pretend_lock(mut self, pretend: bool) -> Self {
        self.pretend_lock = pretend;
        self
    }

    /// Restricts the severities this backend accepts.
    #[must_use]
    pub fn severity_mask(mut self, mask: SeverityMask) -> Self {
        self.severity_mask = mask;
        self
    }

    /// The configured delay per write.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay.unwrap_or_else(|| Duration::from_millis(0))
    }

    /// How many entries were written so far.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Backend for DiscardBackend {
    fn open(&self) -> bool {
        true
    }

    fn close(&self) -> bool {
        true
    }

    fn flush(&self) -> std::io::Result<()> {
        Ok(())
    }

    fn write_entry(&self, _entry: &Entry) -> Result<(), BackendError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn severity_mask(&self) -> SeverityMask {
        self.severity_mask
    }

    fn requires_lock(&self) -> bool {
        self.pretend_lock
    }

    fn lock_target(&self) -> LockTarget {
        LockTarget::clone(&self.lock_target)
    }
}
