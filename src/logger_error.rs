use std::path::PathBuf;
use thiserror::Error;

/// Describes errors of `sinklog`.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// The logger was configured or called with an invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),

    /// The logger was already disposed.
    #[error("The logger has already been disposed")]
    Disposed,

    /// A backend failed to write the log entry and was configured to propagate the failure.
    #[error("Log cannot be written: {0}")]
    Backend(#[from] BackendError),

    /// Some synchronization object is poisoned.
    #[error("Some synchronization object is poisoned")]
    Poison,

    /// The `log` bridge could not be installed.
    #[error("Log bridge cannot be installed: {0}")]
    Log(#[from] log::SetLoggerError),
}

impl LoggerError {
    /// Returns true for all kinds of configuration errors.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// The individual causes of [`LoggerError::InvalidArgument`](enum.LoggerError.html).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidArgument {
    /// No backend collection was provided at all.
    #[error("no backend collection was provided")]
    NoBackends,

    /// The backend collection was empty.
    #[error("the backend collection is empty")]
    EmptyBackends,

    /// The backend collection contains a missing entry.
    #[error("the backend at index {0} is missing")]
    NullBackend(usize),

    /// A backend refused to open.
    #[error("the backend at index {0} could not be opened")]
    OpenFailed(usize),

    /// The same backend instance was given more than once.
    #[error("the backend at index {0} is listed more than once")]
    DuplicateBackend(usize),

    /// A raw severity value is not exactly one known severity flag.
    #[error("0x{0:X} is not a single known severity")]
    InvalidSeverity(u32),

    /// The component name of a log call was empty.
    #[error("the component name must not be empty")]
    EmptyComponent,

    /// A file path template is malformed, or resolves to an invalid path.
    #[error("invalid path template {template:?}: {reason}")]
    PathTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A line template is malformed.
    #[error("invalid line template {template:?}: {reason}")]
    LineTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A date format contains an unknown or malformed specifier.
    #[error("invalid date format {0:?}")]
    DateFormat(String),

    /// A severity or filter specification could not be parsed.
    #[error("cannot parse severity specification {0:?}")]
    SeveritySpec(String),
}

/// Failure of a single backend write.
///
/// Backends decide themselves whether a failure is returned at all;
/// a returned error is passed unchanged to the caller of the log call.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Writing to an already open stream failed; the backend stays usable.
    #[error("writing failed with {0}")]
    Write(#[source] std::io::Error),

    /// The stream for a newly resolved path could not be opened.
    #[error("cannot open log file {path:?}")]
    Unrecoverable {
        /// The path that was to be opened.
        path: PathBuf,
        /// The cause.
        #[source]
        source: std::io::Error,
    },
}
