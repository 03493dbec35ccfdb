use crate::{ErrorReport, Logger, LoggerError, Severity};
use std::sync::Arc;

/// A [`Logger`](struct.Logger.html) bound to a fixed component name.
///
/// Obtained with [`Logger::component`](struct.Logger.html#method.component);
/// cheap to clone.
///
/// ```rust
/// use std::sync::Arc;
/// use sinklog::writers::DiscardBackend;
/// use sinklog::LoggerBuilder;
///
/// let logger = Arc::new(
///     LoggerBuilder::new()
///         .backend(Arc::new(DiscardBackend::new()))
///         .build()
///         .unwrap(),
/// );
/// let db = logger.component("db").unwrap();
/// let line = db.warning("pool exhausted").unwrap().unwrap();
/// assert!(line.contains("\tdb\t[Warning]\tpool exhausted"));
/// ```
#[derive(Clone)]
pub struct ComponentLogger {
    core: Arc<Logger>,
    name: String,
}

impl ComponentLogger {
    pub(crate) fn new(core: Arc<Logger>, name: String) -> Self {
        Self { core, name }
    }

    /// The component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying logger.
    #[must_use]
    pub fn logger(&self) -> &Arc<Logger> {
        &self.core
    }

    /// See [`Logger::log`](struct.Logger.html#method.log).
    ///
    /// # Errors
    ///
    /// See [`Logger::log`](struct.Logger.html#method.log).
    pub fn log(
        &self,
        severity: Severity,
        message: &str,
        error: Option<&ErrorReport>,
    ) -> Result<Option<String>, LoggerError> {
        self.core.log(&self.name, severity, message, error)
    }

    /// Logs with severity `Critical`.
    ///
    /// # Errors
    ///
    /// See [`Logger::log`](struct.Logger.html#method.log).
    pub fn critical(&self, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(Severity::Critical, message, None)
    }

    /// Logs with severity `Error`.
    ///
    /// # Errors
    ///
    /// See [`Logger::log`](struct.Logger.html#method.log).
    pub fn error(&self, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(Severity::Error, message, None)
    }

    /// Logs with severity `Warning`.
    ///
    /// # Errors
    ///
    /// See [`Logger::log`](struct.Logger.html#method.log).
    pub fn warning(&self, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(Severity::Warning, message, None)
    }

    /// Logs with severity `Info`.
    ///
    /// # Errors
    ///
    /// See [`Logger::log`](struct.Logger.html#method.log).
    pub fn info(&self, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(Severity::Info, message, None)
    }

    /// Logs with severity `Debug`.
    ///
    /// # Errors
    ///
    /// See [`Logger::log`](struct.Logger.html#method.log).
    pub fn debug(&self, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(Severity::Debug, message, None)
    }

    /// Logs with severity `Trace`.
    ///
    /// # Errors
    ///
    /// See [`Logger::log`](struct.Logger.html#method.log).
    pub fn trace(&self, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(Severity::Trace, message, None)
    }
}
