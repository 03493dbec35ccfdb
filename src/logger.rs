use crate::logger_error::{InvalidArgument, LoggerError};
use crate::panic_hook::{self, HookHandle};
use crate::writers::Backend;
use crate::{lockup, ComponentLogger, Entry, ErrorReport, LineFormat, Severity, SeverityMask};
use chrono::{DateTime, FixedOffset, Local, Utc};
use std::cell::RefCell;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

// States of the trip latch.
const UNTRIPPED: u8 = 0;
const TRIPPING: u8 = 1;
const TRIPPED: u8 = 2;

/// The logging engine: filters each call, renders its line once, and hands it to every
/// backend whose mask accepts the severity.
///
/// A `Logger` is built with a [`LoggerBuilder`](struct.LoggerBuilder.html); its backend list
/// cannot be changed afterwards. It can be shared freely between threads, e.g. in an `Arc`.
///
/// ```rust
/// use std::sync::Arc;
/// use sinklog::writers::DiscardBackend;
/// use sinklog::{LoggerBuilder, Severity, SeverityMask};
///
/// let logger = LoggerBuilder::new()
///     .backend(Arc::new(DiscardBackend::new()))
///     .filter(SeverityMask::WARNING_OR_HIGHER)
///     .build()
///     .unwrap();
///
/// assert_eq!(logger.info("net", "connected").unwrap(), None);
/// assert!(logger.warning("net", "slow handshake").unwrap().is_some());
/// ```
pub struct Logger {
    backends: RwLock<Vec<Arc<dyn Backend>>>,
    filter: AtomicU32,
    disposed: AtomicBool,
    trip: AtomicU8,
    started: Instant,
    line_format: LineFormat,
    date_format: String,
    utc: bool,
    thread_safe: bool,
    auto_lockup: bool,
    debugger_probe: fn() -> bool,
    hook: Mutex<Option<u64>>,
}

// The validated configuration, as produced by the builder.
pub(crate) struct Parts {
    pub backends: Vec<Arc<dyn Backend>>,
    pub filter: SeverityMask,
    pub line_format: LineFormat,
    pub date_format: String,
    pub utc: bool,
    pub thread_safe: bool,
    pub auto_lockup: bool,
    pub debugger_probe: fn() -> bool,
}

impl Logger {
    pub(crate) fn new(parts: Parts) -> Self {
        Self {
            backends: RwLock::new(parts.backends),
            filter: AtomicU32::new(SeverityMask::from_bits_truncate(parts.filter.bits()).bits()),
            disposed: AtomicBool::new(false),
            trip: AtomicU8::new(UNTRIPPED),
            started: Instant::now(),
            line_format: parts.line_format,
            date_format: parts.date_format,
            utc: parts.utc,
            thread_safe: parts.thread_safe,
            auto_lockup: parts.auto_lockup,
            debugger_probe: parts.debugger_probe,
            hook: Mutex::new(None),
        }
    }

    /// Logs a message, optionally with an error payload.
    ///
    /// Returns the rendered line, or `None` if the call was filtered out
    /// or suppressed by the trip latch.
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed` if the logger is disposed,
    /// `LoggerError::InvalidArgument` if the component name is empty,
    /// `LoggerError::Backend` if a backend propagated a write failure
    /// (backends after the failing one are then not called),
    /// `LoggerError::Poison` if the backend list is poisoned.
    pub fn log(
        &self,
        component: &str,
        severity: Severity,
        message: &str,
        error: Option<&ErrorReport>,
    ) -> Result<Option<String>, LoggerError> {
        self.log_inner(component, severity.bits(), message, error, false)
    }

    /// Like [`log`](#method.log), but takes the severity as raw flag value.
    ///
    /// # Errors
    ///
    /// `LoggerError::InvalidArgument` if `bits` is not exactly one known severity flag,
    /// and all errors of [`log`](#method.log).
    pub fn log_bits(
        &self,
        component: &str,
        bits: u32,
        message: &str,
        error: Option<&ErrorReport>,
    ) -> Result<Option<String>, LoggerError> {
        self.log_inner(component, bits, message, error, false)
    }

    // The log pipeline. With `bypass_latch`, the caller has already moved the latch
    // to its final state and owns the one remaining pass.
    fn log_inner(
        &self,
        component: &str,
        bits: u32,
        message: &str,
        error: Option<&ErrorReport>,
        bypass_latch: bool,
    ) -> Result<Option<String>, LoggerError> {
        self.check_disposed()?;
        if !bypass_latch && !self.pass_trip_latch() {
            return Ok(None);
        }
        let severity = Severity::from_bits(bits).ok_or(InvalidArgument::InvalidSeverity(bits))?;
        if component.is_empty() {
            return Err(InvalidArgument::EmptyComponent.into());
        }
        if !self.mask().has(severity) {
            return Ok(None);
        }

        let timestamp: DateTime<FixedOffset> = if self.utc {
            Utc::now().into()
        } else {
            Local::now().into()
        };
        let elapsed_secs = self.started.elapsed().as_secs_f64();
        let line = self.line_format.render(
            &self.format_timestamp(&timestamp),
            elapsed_secs,
            component,
            severity,
            message,
        );

        {
            let entry = Entry {
                component,
                timestamp: &timestamp,
                elapsed_secs,
                severity,
                line: &line,
                error,
            };
            let _writing = WritingGuard::enter(self);
            let backends = self.backends.read().map_err(|_| LoggerError::Poison)?;
            for backend in backends.iter() {
                if !backend.severity_mask().has(severity) {
                    continue;
                }
                if self.thread_safe && backend.requires_lock() {
                    write_locked(&**backend, &entry)?;
                } else {
                    backend.write_entry(&entry)?;
                }
            }
        }

        if self.auto_lockup && severity == Severity::Critical {
            self.lockup()?;
        }
        Ok(Some(line))
    }

    /// Logs with severity `Critical`.
    ///
    /// # Errors
    ///
    /// See [`log`](#method.log).
    pub fn critical(&self, component: &str, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(component, Severity::Critical, message, None)
    }

    /// Logs with severity `Error`.
    ///
    /// # Errors
    ///
    /// See [`log`](#method.log).
    pub fn error(&self, component: &str, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(component, Severity::Error, message, None)
    }

    /// Logs with severity `Warning`.
    ///
    /// # Errors
    ///
    /// See [`log`](#method.log).
    pub fn warning(&self, component: &str, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(component, Severity::Warning, message, None)
    }

    /// Logs with severity `Info`.
    ///
    /// # Errors
    ///
    /// See [`log`](#method.log).
    pub fn info(&self, component: &str, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(component, Severity::Info, message, None)
    }

    /// Logs with severity `Debug`.
    ///
    /// # Errors
    ///
    /// See [`log`](#method.log).
    pub fn debug(&self, component: &str, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(component, Severity::Debug, message, None)
    }

    /// Logs with severity `Trace`.
    ///
    /// # Errors
    ///
    /// See [`log`](#method.log).
    pub fn trace(&self, component: &str, message: &str) -> Result<Option<String>, LoggerError> {
        self.log(component, Severity::Trace, message, None)
    }

    /// Returns a view on this logger that logs with a fixed component name.
    ///
    /// # Errors
    ///
    /// `LoggerError::InvalidArgument` if the name is empty,
    /// `LoggerError::Disposed` if the logger is disposed.
    pub fn component<S: Into<String>>(
        self: &Arc<Self>,
        name: S,
    ) -> Result<ComponentLogger, LoggerError> {
        self.check_disposed()?;
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidArgument::EmptyComponent.into());
        }
        Ok(ComponentLogger::new(Arc::clone(self), name))
    }

    /// The current filter.
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed`
    pub fn severity_filter(&self) -> Result<SeverityMask, LoggerError> {
        self.check_disposed()?;
        Ok(self.mask())
    }

    /// Replaces the filter; unknown bits are stripped.
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed`
    pub fn set_severity_filter(&self, filter: SeverityMask) -> Result<(), LoggerError> {
        self.check_disposed()?;
        self.filter.store(
            SeverityMask::from_bits_truncate(filter.bits()).bits(),
            Ordering::SeqCst,
        );
        Ok(())
    }

    /// Flushes all backends.
    ///
    /// All backends are flushed even if some fail; the first failure is returned.
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed`, `LoggerError::Poison`,
    /// or `LoggerError::Backend` with the first flush failure.
    pub fn flush(&self) -> Result<(), LoggerError> {
        self.check_disposed()?;
        let backends = self.backends.read().map_err(|_| LoggerError::Poison)?;
        let mut result = Ok(());
        for backend in backends.iter() {
            if let Err(e) = backend.flush() {
                if result.is_ok() {
                    result = Err(LoggerError::Backend(crate::BackendError::Write(e)));
                }
            }
        }
        result
    }

    /// Time since the logger was built.
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed`
    pub fn elapsed(&self) -> Result<Duration, LoggerError> {
        self.check_disposed()?;
        Ok(self.started.elapsed())
    }

    /// Arms the trip latch: the next log call still goes through,
    /// all later ones are discarded until [`untrip`](#method.untrip) is called.
    ///
    /// Has no effect if the latch is already armed or tripped.
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed`
    pub fn trip(&self) -> Result<(), LoggerError> {
        self.check_disposed()?;
        self.trip
            .compare_exchange(UNTRIPPED, TRIPPING, Ordering::SeqCst, Ordering::SeqCst)
            .ok();
        Ok(())
    }

    /// Resets the trip latch, so that log calls are processed again.
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed`
    pub fn untrip(&self) -> Result<(), LoggerError> {
        self.check_disposed()?;
        self.trip.store(UNTRIPPED, Ordering::SeqCst);
        Ok(())
    }

    /// Returns true if the trip latch is armed or tripped.
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed`
    pub fn is_tripped(&self) -> Result<bool, LoggerError> {
        self.check_disposed()?;
        Ok(self.trip.load(Ordering::SeqCst) != UNTRIPPED)
    }

    /// Flushes all backends, writes a banner to stderr, and halts the calling thread for good,
    /// unless a debugger is attached; in that case, the method returns.
    ///
    /// Called automatically after a `Critical` entry if the logger was built with
    /// [`auto_lockup`](struct.LoggerBuilder.html#method.auto_lockup).
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed`
    pub fn lockup(&self) -> Result<(), LoggerError> {
        self.check_disposed()?;
        match self.backends.read() {
            Ok(backends) => {
                for backend in backends.iter() {
                    if let Err(e) = backend.flush() {
                        eprintln!("[sinklog] flushing a backend failed during lockup: {}", e);
                    }
                }
            }
            Err(_) => eprintln!("[sinklog] backend list is poisoned, cannot flush"),
        }
        lockup::write_banner(self.started.elapsed().as_secs_f64());
        if (self.debugger_probe)() {
            return Ok(());
        }
        lockup::halt()
    }

    /// Logs an error that nobody handled, e.g. a panic.
    ///
    /// If `terminating` is true, the trip latch is tripped first and the entry is logged
    /// as `Critical`, exactly once: no later call reaches the backends until
    /// [`untrip`](#method.untrip). If the latch was already tripped, the entry is discarded.
    /// Otherwise, it is logged as `Error`.
    ///
    /// # Errors
    ///
    /// See [`log`](#method.log).
    pub fn report_unhandled(
        &self,
        context: &str,
        message: &str,
        error: Option<&ErrorReport>,
        terminating: bool,
    ) -> Result<Option<String>, LoggerError> {
        if terminating {
            self.check_disposed()?;
            // take the single pass ourselves, so that no concurrent call can consume it
            if self.trip.swap(TRIPPED, Ordering::SeqCst) == TRIPPED {
                return Ok(None);
            }
            self.log_inner(context, Severity::Critical.bits(), message, error, true)
        } else {
            self.log(context, Severity::Error, message, error)
        }
    }

    /// Routes panics of any thread into this logger, see
    /// [`report_unhandled`](#method.report_unhandled).
    ///
    /// Attaching again returns the existing registration.
    /// The registration ends with [`HookHandle::detach`](struct.HookHandle.html#method.detach)
    /// or when the logger is disposed.
    ///
    /// # Errors
    ///
    /// `LoggerError::Disposed`, `LoggerError::Poison`.
    pub fn attach_panic_hook(self: &Arc<Self>) -> Result<HookHandle, LoggerError> {
        self.check_disposed()?;
        let mut hook = self.hook.lock().map_err(|_| LoggerError::Poison)?;
        let id = match *hook {
            Some(id) if panic_hook::is_registered(id) => id,
            _ => panic_hook::register(self),
        };
        *hook = Some(id);
        Ok(HookHandle::new(id))
    }

    /// Detaches the panic hook, disposes all backends, and releases them.
    ///
    /// All later calls fail with `LoggerError::Disposed`. Calling it again has no effect.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let hook = self
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(id) = hook {
            panic_hook::unregister(id);
        }
        let backends = std::mem::take(
            &mut *self
                .backends
                .write()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for backend in backends {
            backend.dispose();
        }
    }

    // True while the current thread is passing an entry to this logger's backends.
    pub(crate) fn is_writing_on_current_thread(&self) -> bool {
        let this = self as *const Logger as usize;
        WRITING.with(|writing| writing.borrow().contains(&this))
    }

    /// Returns true if the logger is disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn check_disposed(&self) -> Result<(), LoggerError> {
        if self.is_disposed() {
            Err(LoggerError::Disposed)
        } else {
            Ok(())
        }
    }

    fn mask(&self) -> SeverityMask {
        SeverityMask::from_bits_truncate(self.filter.load(Ordering::SeqCst))
    }

    // Returns false if the call must be discarded.
    // An armed latch lets exactly one call through and then trips.
    fn pass_trip_latch(&self) -> bool {
        match self.trip.load(Ordering::SeqCst) {
            UNTRIPPED => true,
            TRIPPING => self
                .trip
                .compare_exchange(TRIPPING, TRIPPED, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok(),
            _ => false,
        }
    }

    fn format_timestamp(&self, timestamp: &DateTime<FixedOffset>) -> String {
        let mut s = String::with_capacity(32);
        // the format was validated when the logger was built
        write!(s, "{}", timestamp.format(&self.date_format)).ok();
        s
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.dispose();
    }
}

thread_local! {
    // Loggers whose backends the current thread is writing to.
    static WRITING: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

// Marks the current thread as writing to a logger's backends; cleared on drop,
// including while unwinding out of a panicking backend.
struct WritingGuard(usize);

impl WritingGuard {
    fn enter(logger: &Logger) -> Self {
        let this = logger as *const Logger as usize;
        WRITING.with(|writing| writing.borrow_mut().push(this));
        WritingGuard(this)
    }
}

impl Drop for WritingGuard {
    fn drop(&mut self) {
        WRITING.with(|writing| {
            let mut writing = writing.borrow_mut();
            if let Some(pos) = writing.iter().rposition(|this| *this == self.0) {
                writing.remove(pos);
            }
        });
    }
}

// Writes while holding the backend's current lock target.
// If the backend replaced its target while we were waiting, the stale one is dropped
// and the current one is locked instead.
fn write_locked(backend: &dyn Backend, entry: &Entry) -> Result<(), LoggerError> {
    loop {
        let target = backend.lock_target();
        let _guard = target.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::ptr_eq(&target, &backend.lock_target()) {
            return backend.write_entry(entry).map_err(LoggerError::Backend);
        }
    }
}
