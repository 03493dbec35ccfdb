use crate::formats::{LineFormat, DEFAULT_DATE_FORMAT, DEFAULT_LINE_TEMPLATE};
use crate::logger::{Logger, Parts};
use crate::logger_error::{InvalidArgument, LoggerError};
use crate::writers::Backend;
use crate::SeverityMask;
use chrono::Local;
use std::fmt::Write;
use std::sync::Arc;

/// Name of the environment variable that is read by
/// [`LoggerBuilder::with_env_or_str`](struct.LoggerBuilder.html#method.with_env_or_str).
pub const FILTER_ENV_VAR: &str = "SINKLOG_FILTER";

/// The entry-point for using `sinklog`.
///
/// `LoggerBuilder` collects the backends and the configuration, and validates all of it
/// in [`build`](#method.build):
///
/// ```rust
/// use std::sync::Arc;
/// use sinklog::writers::{ConsoleBackend, FileBackend};
/// use sinklog::{LoggerBuilder, SeverityMask};
///
/// let logger = LoggerBuilder::with_env_or_str("info+")
///     .backend(Arc::new(ConsoleBackend::stderr().build()))
///     .backend(Arc::new(
///         FileBackend::builder("log_files/doc/builder_%{%Y-%m-%d}.log")
///             .try_build()
///             .unwrap(),
///     ))
///     .line_template("{0} {3}: {4}")
///     .utc(true)
///     .build()
///     .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e));
/// ```
///
/// Configuration errors, like a malformed filter or line template, are kept until `build`,
/// which then reports the first of them.
pub struct LoggerBuilder {
    backends: Option<Vec<Option<Arc<dyn Backend>>>>,
    filter: SeverityMask,
    line_template: String,
    date_format: String,
    utc: bool,
    thread_safe: bool,
    auto_lockup: bool,
    debugger_probe: fn() -> bool,
    parse_err: Option<InvalidArgument>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a `LoggerBuilder` and define the initial filter.
impl LoggerBuilder {
    /// Creates a builder without backends, with filter `SeverityMask::DEFAULTS`
    /// ("Info or higher").
    #[must_use]
    pub fn new() -> Self {
        Self {
            backends: None,
            filter: SeverityMask::DEFAULTS,
            line_template: DEFAULT_LINE_TEMPLATE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            utc: false,
            thread_safe: true,
            auto_lockup: false,
            debugger_probe: crate::debugger_attached,
            parse_err: None,
        }
    }

    /// Creates a builder whose filter is read from the environment variable `SINKLOG_FILTER`,
    /// or parsed from the given string if the variable is not set.
    ///
    /// See [`SeverityMask`](struct.SeverityMask.html#impl-FromStr) for the syntax.
    #[must_use]
    pub fn with_env_or_str<S: AsRef<str>>(s: S) -> Self {
        let spec = std::env::var(FILTER_ENV_VAR).unwrap_or_else(|_| s.as_ref().to_string());
        Self::new().filter_str(&spec)
    }
}

/// Simple methods for influencing the behavior of the `Logger`.
impl LoggerBuilder {
    /// Adds a backend. Backends are called in the order they are added.
    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backends
            .get_or_insert_with(Vec::new)
            .push(Some(backend));
        self
    }

    /// Adds a collection of backends, in which entries may be missing.
    ///
    /// `build` fails if the resulting collection is empty or has a missing entry.
    #[must_use]
    pub fn backends<I>(mut self, backends: I) -> Self
    where
        I: IntoIterator<Item = Option<Arc<dyn Backend>>>,
    {
        self.backends
            .get_or_insert_with(Vec::new)
            .extend(backends);
        self
    }

    /// Sets the initial filter; unknown bits are stripped.
    #[must_use]
    pub fn filter(mut self, filter: SeverityMask) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the initial filter from its textual form, e.g. `"warning+"` or `"error,critical"`.
    ///
    /// A malformed specification is reported by `build`.
    #[must_use]
    pub fn filter_str(mut self, spec: &str) -> Self {
        match spec.parse::<SeverityMask>() {
            Ok(filter) => self.filter = filter,
            Err(_) => self.remember(InvalidArgument::SeveritySpec(spec.to_string())),
        }
        self
    }

    /// Sets the line template, see [`LineFormat`](struct.LineFormat.html).
    #[must_use]
    pub fn line_template<S: Into<String>>(mut self, template: S) -> Self {
        self.line_template = template.into();
        self
    }

    /// Sets the `chrono` format for field `{0}` of the line template.
    #[must_use]
    pub fn date_format<S: Into<String>>(mut self, format: S) -> Self {
        self.date_format = format.into();
        self
    }

    /// Decides if timestamps are taken in UTC (true) or local time (false, the default).
    #[must_use]
    pub fn utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    /// Decides if writes to backends that require a lock are serialized (default: true).
    #[must_use]
    pub fn thread_safe(mut self, thread_safe: bool) -> Self {
        self.thread_safe = thread_safe;
        self
    }

    /// Decides if logging a `Critical` entry triggers the
    /// [lockup](struct.Logger.html#method.lockup) (default: false).
    #[must_use]
    pub fn auto_lockup(mut self, auto_lockup: bool) -> Self {
        self.auto_lockup = auto_lockup;
        self
    }

    /// Replaces the check that decides if the lockup halts the thread (false)
    /// or returns (true).
    ///
    /// The default is [`debugger_attached`](fn.debugger_attached.html).
    #[must_use]
    pub fn debugger_probe(mut self, probe: fn() -> bool) -> Self {
        self.debugger_probe = probe;
        self
    }

    /// Validates the configuration, opens all backends, and produces the `Logger`.
    ///
    /// The backend collection is checked in this order:
    /// it must have been provided, must not be empty, must not have missing entries,
    /// every backend must open successfully, and no backend may be given twice.
    ///
    /// # Errors
    ///
    /// `LoggerError::InvalidArgument`, with a distinct cause for each check.
    pub fn build(self) -> Result<Logger, LoggerError> {
        if let Some(e) = self.parse_err {
            return Err(e.into());
        }
        let line_format = LineFormat::parse(&self.line_template)?;
        validate_date_format(&self.date_format)?;

        let backends = self.backends.ok_or(InvalidArgument::NoBackends)?;
        if backends.is_empty() {
            return Err(InvalidArgument::EmptyBackends.into());
        }
        let backends = backends
            .into_iter()
            .enumerate()
            .map(|(idx, backend)| backend.ok_or(InvalidArgument::NullBackend(idx)))
            .collect::<Result<Vec<_>, _>>()?;
        for (idx, backend) in backends.iter().enumerate() {
            if !backend.open() {
                return Err(InvalidArgument::OpenFailed(idx).into());
            }
        }
        for (idx, backend) in backends.iter().enumerate() {
            if backends[..idx].iter().any(|other| same_backend(other, backend)) {
                return Err(InvalidArgument::DuplicateBackend(idx).into());
            }
        }

        Ok(Logger::new(Parts {
            backends,
            filter: self.filter,
            line_format,
            date_format: self.date_format,
            utc: self.utc,
            thread_safe: self.thread_safe,
            auto_lockup: self.auto_lockup,
            debugger_probe: self.debugger_probe,
        }))
    }

    // Keeps the first error only.
    fn remember(&mut self, e: InvalidArgument) {
        if self.parse_err.is_none() {
            self.parse_err = Some(e);
        }
    }
}

// Identity, not equality; the vtable part of the pointer is ignored.
fn same_backend(a: &Arc<dyn Backend>, b: &Arc<dyn Backend>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const u8,
        Arc::as_ptr(b) as *const u8,
    )
}

fn validate_date_format(format: &str) -> Result<(), InvalidArgument> {
    let mut probe = String::new();
    write!(probe, "{}", Local::now().format(format))
        .map_err(|_| InvalidArgument::DateFormat(format.to_string()))
}
