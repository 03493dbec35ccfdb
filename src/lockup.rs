use std::io::Write;

const RULE: &str =
    "================================================================================";

// The banner that is written to stderr before the calling thread is halted.
pub(crate) fn banner(elapsed_secs: f64) -> String {
    format!(
        "{rule}\n\
         UNRECOVERABLE ERROR after {elapsed:.2}s\n\
         A critical error was logged and the logger is configured to lock up.\n\
         This thread is halted; attach a debugger to inspect it.\n\
         {rule}\n",
        rule = RULE,
        elapsed = elapsed_secs
    )
}

pub(crate) fn write_banner(elapsed_secs: f64) {
    let stderr = std::io::stderr();
    let mut stderr = stderr.lock();
    stderr.write_all(banner(elapsed_secs).as_bytes()).ok();
    stderr.flush().ok();
}

// Parks the calling thread for good. Spurious wakeups are absorbed.
pub(crate) fn halt() -> ! {
    loop {
        std::thread::park();
    }
}

/// The default debugger probe: returns true if a tracer is attached to the process.
///
/// On Linux, this looks at `TracerPid` in `/proc/self/status`; on other platforms,
/// it always returns false.
#[must_use]
pub fn debugger_attached() -> bool {
    #[cfg(target_os = "linux")]
    {
        procfs::process::Process::myself()
            .and_then(|process| process.status())
            .map_or(false, |status| status.tracerpid != 0)
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}
