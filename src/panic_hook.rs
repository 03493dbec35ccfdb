//! Routes panics into the loggers that asked for it.
//!
//! A single hook is installed into `std::panic` on first use; it chains the hook that was
//! installed before. Loggers are held weakly, so that a registration never keeps a logger alive.

use crate::{ErrorReport, Logger};
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[derive(Default)]
struct Registry {
    installed: bool,
    next_id: u64,
    entries: Vec<(u64, Weak<Logger>)>,
}

lazy_static::lazy_static! {
    static ref REGISTRY: Mutex<Registry> = Mutex::new(Registry::default());
}

fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

// Registers the logger, or returns its existing registration.
pub(crate) fn register(logger: &Arc<Logger>) -> u64 {
    let mut registry = registry();
    registry.entries.retain(|(_, weak)| weak.strong_count() > 0);
    if let Some((id, _)) = registry
        .entries
        .iter()
        .find(|(_, weak)| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(logger)))
    {
        return *id;
    }

    if !registry.installed {
        install();
        registry.installed = true;
    }
    registry.next_id += 1;
    let id = registry.next_id;
    registry.entries.push((id, Arc::downgrade(logger)));
    id
}

// Removes a registration; unknown ids are ignored.
pub(crate) fn unregister(id: u64) {
    registry().entries.retain(|(entry_id, _)| *entry_id != id);
}

pub(crate) fn is_registered(id: u64) -> bool {
    registry().entries.iter().any(|(entry_id, _)| *entry_id == id)
}

fn install() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = payload_text(info.payload());
        let location = info.location().map(ToString::to_string);
        dispatch(&message, location);
        previous(info);
    }));
}

fn dispatch(message: &str, location: Option<String>) {
    // upgrade under the lock, log without it
    let loggers: Vec<Arc<Logger>> = registry()
        .entries
        .iter()
        .filter_map(|(_, weak)| weak.upgrade())
        .collect();
    if loggers.is_empty() {
        return;
    }

    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("<unnamed>");
    let context = format!("thread '{}'", thread_name);
    let terminating = is_terminating(thread_name);

    let mut report = ErrorReport::new("panic", message);
    if let Some(location) = location {
        report = report.location(location);
    }

    for logger in loggers {
        // the panic came out of one of this logger's backends; its locks may be held
        if logger.is_writing_on_current_thread() {
            eprintln!(
                "[sinklog] panic of {} raised while writing a log entry, not logged: {}",
                context, message
            );
            continue;
        }
        if let Err(e) = logger.report_unhandled(&context, message, Some(&report), terminating) {
            eprintln!("[sinklog] cannot log panic of {}: {}", context, e);
        }
    }
}

// A panic ends the process if it unwinds out of main, or if panics abort.
fn is_terminating(thread_name: &str) -> bool {
    cfg!(panic = "abort") || thread_name == "main"
}

fn payload_text(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Registration of a logger in the process-wide panic hook.
///
/// Returned by [`Logger::attach_panic_hook`](struct.Logger.html#method.attach_panic_hook).
/// Dropping the handle does not detach the hook; call [`detach`](#method.detach),
/// or dispose the logger.
#[derive(Debug)]
pub struct HookHandle {
    id: u64,
}

impl HookHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self { id }
    }

    /// Stops routing panics to the logger. Calling it more than once has no effect.
    pub fn detach(&self) {
        unregister(self.id);
    }

    /// Returns true until the registration is detached or the logger is disposed.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        is_registered(self.id)
    }
}
