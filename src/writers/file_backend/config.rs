use super::FailurePolicy;
use crate::SeverityMask;

// The immutable configuration of a FileBackend.
pub(crate) struct Config {
    pub(crate) severity_mask: SeverityMask,
    pub(crate) on_failure: FailurePolicy,
    pub(crate) requires_lock: bool,
    pub(crate) print_message: bool,
    pub(crate) use_windows_line_ending: bool,
}
impl Config {
    pub fn default() -> Self {
        Self {
            severity_mask: SeverityMask::ALL,
            on_failure: FailurePolicy::Propagate,
            requires_lock: true,
            print_message: false,
            use_windows_line_ending: false,
        }
    }

    pub fn line_ending(&self) -> &'static [u8] {
        if self.use_windows_line_ending {
            b"\r\n"
        } else {
            b"\n"
        }
    }
}
