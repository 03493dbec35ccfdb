//! An optional, process-wide default logger.
//!
//! Nothing in `sinklog` uses this handle implicitly; components that want a logger
//! without having one passed in can fetch it here.
//!
//! ```rust
//! use std::sync::Arc;
//! use sinklog::writers::DiscardBackend;
//! use sinklog::{global, LoggerBuilder};
//!
//! let logger = global::init_default(|| {
//!     LoggerBuilder::new()
//!         .backend(Arc::new(DiscardBackend::new()))
//!         .build()
//! })
//! .unwrap();
//! assert!(Arc::ptr_eq(&logger, &global::default_logger().unwrap()));
//! ```

use crate::{Logger, LoggerError};
use std::sync::{Arc, Mutex};

lazy_static::lazy_static! {
    static ref DEFAULT: Mutex<Option<Arc<Logger>>> = Mutex::new(None);
}

/// Returns the default logger, creating it with `init` if there is none yet.
///
/// Initialization runs at most once at a time; concurrent callers wait and then get
/// the same logger. A disposed default logger is replaced.
///
/// # Errors
///
/// Whatever `init` returns, or `LoggerError::Poison`.
pub fn init_default<F>(init: F) -> Result<Arc<Logger>, LoggerError>
where
    F: FnOnce() -> Result<Logger, LoggerError>,
{
    let mut slot = DEFAULT.lock().map_err(|_| LoggerError::Poison)?;
    if let Some(ref logger) = *slot {
        if !logger.is_disposed() {
            return Ok(Arc::clone(logger));
        }
    }
    let logger = Arc::new(init()?);
    *slot = Some(Arc::clone(&logger));
    Ok(logger)
}

/// The default logger, if it was initialized and not taken.
#[must_use]
pub fn default_logger() -> Option<Arc<Logger>> {
    DEFAULT
        .lock()
        .ok()
        .and_then(|slot| slot.as_ref().map(Arc::clone))
}

/// Removes the default logger and returns it.
#[must_use]
pub fn take_default() -> Option<Arc<Logger>> {
    DEFAULT.lock().ok().and_then(|mut slot| slot.take())
}
