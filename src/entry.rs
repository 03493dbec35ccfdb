use crate::{ErrorReport, Severity};
use chrono::{DateTime, FixedOffset};

/// Everything a backend gets to see of a single accepted log call.
///
/// The entry only lives for the duration of the call; the logger renders the line once
/// and hands the same entry to every backend, so that all outputs share one timestamp.
#[derive(Clone, Copy, Debug)]
pub struct Entry<'a> {
    /// The name of the emitting component.
    pub component: &'a str,
    /// Wall-clock time of the call, in local time or UTC, as configured in the logger.
    pub timestamp: &'a DateTime<FixedOffset>,
    /// Seconds since the logger was built.
    pub elapsed_secs: f64,
    /// The severity of the call.
    pub severity: Severity,
    /// The formatted line, without line ending.
    pub line: &'a str,
    /// The optional error payload.
    pub error: Option<&'a ErrorReport>,
}
