mod builder;
mod config;
mod path_template;
mod state;

pub use self::builder::FileBackendBuilder;

use self::config::Config;
use self::path_template::PathTemplate;
use super::backend::buffer_with;
use crate::logger_error::BackendError;
use crate::writers::{Backend, LockTarget};
use crate::{Entry, SeverityMask};
use state::State;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What a [`FileBackend`](struct.FileBackend.html) does when a log file
/// cannot be opened or written.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failures are silently dropped.
    ///
    /// If a new file cannot be opened, the previous file is used further,
    /// or nothing is written if there is none. Use with care: log lines can get lost unnoticed.
    Ignore,
    /// Failures are returned to the caller of the log call.
    Propagate,
    /// Like `Propagate` for write failures, but if a file cannot be opened,
    /// the process is aborted immediately.
    Abort,
}

/// A [`Backend`](trait.Backend.html) that writes to files whose paths are computed
/// from a template.
///
/// The template can contain placeholders that are replaced for each entry:
///
/// * `%{<format>}` is replaced by the entry's timestamp, formatted with the given
///   [`chrono` format string](https://docs.rs/chrono/latest/chrono/format/strftime/index.html),
/// * `#{sev}` is replaced by the severity name, e.g. `Warning`,
/// * `#{sevint}` is replaced by the severity flag value, e.g. `4`.
///
/// Whenever the resolved path differs from the path of the currently open file,
/// the backend opens the new file (creating missing directories) and closes the old one.
/// With `"log_files/app_%{%Y-%m-%d}.log"`, you thus get one file per day;
/// with `"log_files/app_#{sev}.log"`, you get one file per severity.
///
/// Files are opened lazily, at the first write, and always in append mode.
///
/// ```rust
/// use sinklog::writers::{FailurePolicy, FileBackend};
/// use sinklog::SeverityMask;
///
/// let backend = FileBackend::builder("log_files/doc/%{%Y-%m}/app_#{sev}.log")
///     .severity_mask(SeverityMask::WARNING_OR_HIGHER)
///     .on_failure(FailurePolicy::Propagate)
///     .try_build()
///     .unwrap();
/// ```
#[allow(clippy::module_name_repetitions)]
pub struct FileBackend {
    template: PathTemplate,
    config: Config,
    // `Backend::write_entry()` takes `&self`,
    // so we need internal mutability and thread-safety.
    state: Mutex<State>,
}
impl FileBackend {
    pub(crate) fn new(template: PathTemplate, config: Config, state: Mutex<State>) -> FileBackend {
        FileBackend {
            template,
            config,
            state,
        }
    }

    /// Instantiates a builder for `FileBackend`.
    #[must_use]
    pub fn builder<S: Into<String>>(template: S) -> FileBackendBuilder {
        FileBackendBuilder::new(template.into())
    }

    /// The path template.
    #[must_use]
    pub fn path_template(&self) -> &str {
        self.template.template()
    }

    /// The path of the currently open file, if any.
    #[must_use]
    pub fn current_path(&self) -> Option<PathBuf> {
        self.state().current_path()
    }

    // A poisoned state is still consistent: every mutation is a single assignment.
    fn state(&self) -> MutexGuard<State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked(&self, result: std::io::Result<()>) -> Result<(), BackendError> {
        match result {
            Ok(()) => Ok(()),
            Err(_) if self.config.on_failure == FailurePolicy::Ignore => Ok(()),
            Err(e) => Err(BackendError::Write(e)),
        }
    }
}

impl Backend for FileBackend {
    fn open(&self) -> bool {
        // files are opened lazily, at the first write
        true
    }

    fn close(&self) -> bool {
        self.state().close();
        true
    }

    fn flush(&self) -> std::io::Result<()> {
        self.state().flush()
    }

    fn write_entry(&self, entry: &Entry) -> Result<(), BackendError> {
        let path = match self.template.resolve(entry.timestamp, entry.severity) {
            Ok(path) => path,
            Err(_) => {
                return self.checked(Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "resolving the path template failed",
                )))
            }
        };
        let line_ending = self.config.line_ending();

        let mut state = self.state();
        if state.is_disposed() {
            return Ok(());
        }
        let stream = state.get_or_create_stream(path, &self.config)?;

        buffer_with(|buffer| {
            buffer.extend_from_slice(entry.line.as_bytes());
            buffer.extend_from_slice(line_ending);
            self.checked(stream.write_all(buffer))?;

            if let Some(error) = entry.error {
                buffer.clear();
                let text = error.render();
                if self.config.use_windows_line_ending {
                    buffer.extend_from_slice(text.replace('\n', "\r\n").as_bytes());
                } else {
                    buffer.extend_from_slice(text.as_bytes());
                }
                self.checked(stream.write_all(buffer))?;
            }
            Ok(())
        })
    }

    fn dispose(&self) {
        self.state().dispose();
    }

    fn severity_mask(&self) -> SeverityMask {
        self.config.severity_mask
    }

    fn requires_lock(&self) -> bool {
        self.config.requires_lock
    }

    fn lock_target(&self) -> LockTarget {
        self.state().lock_target()
    }
}
