#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::unused_self)]
#![allow(clippy::module_name_repetitions)]

//! A logging façade that renders each message once and fans it out to
//! independently configured backends.
//!
//! Messages carry a component name, a [`Severity`](enum.Severity.html), and optionally an
//! [`ErrorReport`](struct.ErrorReport.html). A [`Logger`](struct.Logger.html) filters them with
//! its [`SeverityMask`](struct.SeverityMask.html), and passes each accepted message to every
//! backend whose own mask accepts it:
//!
//! ```rust
//! use std::sync::Arc;
//! use sinklog::writers::{ConsoleBackend, FileBackend};
//! use sinklog::{LoggerBuilder, SeverityMask};
//!
//! let logger = Arc::new(
//!     LoggerBuilder::with_env_or_str("defaults")
//!         .backend(Arc::new(ConsoleBackend::stderr().build()))
//!         .backend(Arc::new(
//!             FileBackend::builder("log_files/doc/critical_%{%Y-%m-%d}.log")
//!                 .severity_mask(SeverityMask::CRITICAL)
//!                 .try_build()
//!                 .unwrap(),
//!         ))
//!         .build()
//!         .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e)),
//! );
//!
//! let net = logger.component("net").unwrap();
//! net.info("listening").unwrap();
//! ```
//!
//! See
//!
//! * [`LoggerBuilder`](struct.LoggerBuilder.html) for all configuration options,
//! * the [writers](writers/index.html) module for the available backends,
//! * [`Logger::attach_panic_hook`](struct.Logger.html#method.attach_panic_hook) for logging
//!   panics, and the trip latch that keeps a dying process from logging further,
//! * [`LogBridge`](struct.LogBridge.html) for routing the macros of the `log` crate,
//! * the [global](global/index.html) module for an optional process-wide default logger.
//!
//! Console output is colored by default if it goes to a terminal; switch off the
//! default feature `colors` to get rid of the `yansi` and `atty` dependencies.
//! The colors can be adapted with the environment variable `SINKLOG_PALETTE`,
//! see [`Palette`](struct.Palette.html).

mod builder;
mod component;
mod entry;
mod error_report;
mod formats;
mod lockup;
mod log_bridge;
mod logger;
mod logger_error;
mod panic_hook;
mod severity;

pub mod global;
pub mod writers;

pub use crate::builder::{LoggerBuilder, FILTER_ENV_VAR};
pub use crate::component::ComponentLogger;
pub use crate::entry::Entry;
pub use crate::error_report::ErrorReport;
#[cfg(feature = "colors")]
pub use crate::formats::Palette;
pub use crate::formats::{LineFormat, DEFAULT_DATE_FORMAT, DEFAULT_LINE_TEMPLATE};
pub use crate::lockup::debugger_attached;
pub use crate::log_bridge::LogBridge;
pub use crate::logger::Logger;
pub use crate::logger_error::{BackendError, InvalidArgument, LoggerError};
pub use crate::panic_hook::HookHandle;
pub use crate::severity::{Severity, SeverityMask};
