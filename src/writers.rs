//! Contains the trait ([`Backend`](trait.Backend.html)) that every log sink implements,
//! and three concrete implementations
//! for writing to files
//! ([`FileBackend`](struct.FileBackend.html)),
//! to stdout or stderr
//! ([`ConsoleBackend`](struct.ConsoleBackend.html)),
//! or to nowhere
//! ([`DiscardBackend`](struct.DiscardBackend.html)).
//! You can also use your own implementations of [`Backend`](trait.Backend.html).
//!
//! Each backend has its own severity mask; a log call reaches a backend only if
//! both the logger's filter and the backend's mask contain its severity.
//!
//! In the following example, all messages go to the console, and only critical messages
//! are additionally written to a file per day:
//!
//! ```rust
//! use std::sync::Arc;
//! use sinklog::writers::{ConsoleBackend, FileBackend};
//! use sinklog::{LoggerBuilder, SeverityMask};
//!
//! let alerts = FileBackend::builder("log_files/doc/alerts_%{%Y-%m-%d}.log")
//!     .severity_mask(SeverityMask::CRITICAL)
//!     .try_build()
//!     .unwrap();
//!
//! let logger = LoggerBuilder::new()
//!     .backend(Arc::new(ConsoleBackend::stderr().build()))
//!     .backend(Arc::new(alerts))
//!     .build()
//!     .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e));
//!
//! logger.info("doc", "only on the console").unwrap();
//! ```

mod backend;
mod console_backend;
mod discard_backend;
mod file_backend;

pub use self::backend::{new_lock_target, Backend, LockTarget};
pub use self::console_backend::{ColorMode, ConsoleBackend, ConsoleBackendBuilder, ConsoleStream};
pub use self::discard_backend::DiscardBackend;
pub use self::file_backend::{FailurePolicy, FileBackend, FileBackendBuilder};
