use crate::logger_error::LoggerError;
use crate::SeverityMask;
use chrono::Local;
use std::sync::Mutex;

use super::{Config, FailurePolicy, FileBackend, PathTemplate, State};

/// Builder for `FileBackend`.
#[allow(clippy::module_name_repetitions)]
pub struct FileBackendBuilder {
    template: String,
    config: Config,
}

/// Simple methods for influencing the behavior of the `FileBackend`.
impl FileBackendBuilder {
    pub(crate) fn new(template: String) -> FileBackendBuilder {
        FileBackendBuilder {
            template,
            config: Config::default(),
        }
    }

    /// Restricts the severities this backend writes. By default, it writes all of them.
    #[must_use]
    pub fn severity_mask(mut self, mask: SeverityMask) -> Self {
        self.config.severity_mask = mask;
        self
    }

    /// Defines what happens if a log file cannot be opened or written.
    ///
    /// The default is [`FailurePolicy::Propagate`](enum.FailurePolicy.html).
    #[must_use]
    pub fn on_failure(mut self, policy: FailurePolicy) -> Self {
        self.config.on_failure = policy;
        self
    }

    /// Defines whether the logger must serialize writes to this backend.
    ///
    /// By default it does; switching it off is only sensible if the logger is used
    /// from a single thread.
    #[must_use]
    pub fn requires_lock(mut self, requires_lock: bool) -> Self {
        self.config.requires_lock = requires_lock;
        self
    }

    /// Makes the `FileBackend` print an info message to stdout
    /// when a new file is used for log-output.
    #[must_use]
    pub fn print_message(mut self) -> Self {
        self.config.print_message = true;
        self
    }

    /// Use Windows line endings, rather than just `\n`.
    #[must_use]
    pub fn use_windows_line_ending(mut self) -> Self {
        self.config.use_windows_line_ending = true;
        self
    }

    /// Produces the `FileBackend`.
    ///
    /// The template is resolved once with the current time, and the resulting example path
    /// is checked, so that malformed templates are detected here rather than at the first write.
    /// No file is opened yet.
    ///
    /// # Errors
    ///
    /// `LoggerError::InvalidArgument` if the template is malformed or resolves to an invalid path.
    pub fn try_build(self) -> Result<FileBackend, LoggerError> {
        let template = PathTemplate::parse(&self.template)?;
        template.validate(Local::now())?;
        Ok(FileBackend::new(template, self.config, Mutex::new(State::new())))
    }
}
