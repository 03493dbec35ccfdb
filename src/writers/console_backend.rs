use super::backend::buffer_with;
use crate::logger_error::BackendError;
use crate::writers::{Backend, LockTarget};
use crate::{Entry, SeverityMask};
#[cfg(feature = "colors")]
use crate::Palette;
use std::io::Write;

/// The stream a [`ConsoleBackend`](struct.ConsoleBackend.html) writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleStream {
    /// Standard output.
    StdOut,
    /// Standard error.
    StdErr,
}
impl ConsoleStream {
    fn lock_target(self) -> LockTarget {
        match self {
            Self::StdOut => LockTarget::clone(&STDOUT_LOCK),
            Self::StdErr => LockTarget::clone(&STDERR_LOCK),
        }
    }

    #[cfg(feature = "colors")]
    fn is_tty(self) -> bool {
        match self {
            Self::StdOut => atty::is(atty::Stream::Stdout),
            Self::StdErr => atty::is(atty::Stream::Stderr),
        }
    }

    fn write_all(self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Self::StdOut => std::io::stdout().write_all(buf),
            Self::StdErr => std::io::stderr().write_all(buf),
        }
    }

    fn flush(self) -> std::io::Result<()> {
        match self {
            Self::StdOut => std::io::stdout().flush(),
            Self::StdErr => std::io::stderr().flush(),
        }
    }
}

// All console backends on the same stream synchronize on the same target.
lazy_static::lazy_static! {
    static ref STDOUT_LOCK: LockTarget = crate::writers::new_lock_target();
    static ref STDERR_LOCK: LockTarget = crate::writers::new_lock_target();
}

/// Decides if a [`ConsoleBackend`](struct.ConsoleBackend.html) colors its output.
///
/// Coloring is only available with feature `colors`; without it, all modes write plain text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    /// Colors are used if the stream is a tty.
    Auto,
    /// Colors are always used.
    Always,
    /// Colors are never used.
    Never,
}

/// A [`Backend`](trait.Backend.html) that writes to stdout or stderr,
/// optionally coloring each entry according to its severity.
///
/// The colors are taken from a [`Palette`](../struct.Palette.html),
/// which can be overridden with the environment variable `SINKLOG_PALETTE`.
#[allow(clippy::module_name_repetitions)]
pub struct ConsoleBackend {
    stream: ConsoleStream,
    severity_mask: SeverityMask,
    colored: bool,
    #[cfg_attr(not(feature = "colors"), allow(dead_code))]
    restore_color: bool,
    #[cfg(feature = "colors")]
    palette: Palette,
}

impl ConsoleBackend {
    /// Instantiates a builder for a `ConsoleBackend` that writes to stdout.
    #[must_use]
    pub fn stdout() -> ConsoleBackendBuilder {
        ConsoleBackendBuilder::new(ConsoleStream::StdOut)
    }

    /// Instantiates a builder for a `ConsoleBackend` that writes to stderr.
    #[must_use]
    pub fn stderr() -> ConsoleBackendBuilder {
        ConsoleBackendBuilder::new(ConsoleStream::StdErr)
    }

    /// The stream this backend is bound to.
    #[must_use]
    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }

    /// Returns true if this backend writes escape sequences.
    #[must_use]
    pub fn is_colored(&self) -> bool {
        self.colored
    }

    // Assembles the bytes of one entry: the line, the error chain, and the color sequences.
    pub(crate) fn render(&self, entry: &Entry, buffer: &mut Vec<u8>) {
        let mut text = String::with_capacity(entry.line.len() + 1);
        text.push_str(entry.line);
        text.push('\n');
        if let Some(error) = entry.error {
            text.push_str(&error.render());
        }

        #[cfg(feature = "colors")]
        {
            if self.colored {
                let style = self.palette.style(entry.severity);
                // write! into a Vec<u8> only fails if a Display impl fails
                if self.restore_color {
                    write!(buffer, "{}", style.paint(text)).ok();
                } else {
                    write!(buffer, "{}{}", Prefix(style), text).ok();
                }
                return;
            }
        }
        buffer.extend_from_slice(text.as_bytes());
    }
}

#[cfg(feature = "colors")]
struct Prefix(yansi::Style);
#[cfg(feature = "colors")]
impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt_prefix(f)
    }
}

impl Backend for ConsoleBackend {
    fn open(&self) -> bool {
        true
    }

    fn close(&self) -> bool {
        // the stream is not owned, only flushed
        self.stream.flush().ok();
        true
    }

    fn flush(&self) -> std::io::Result<()> {
        self.stream.flush()
    }

    fn write_entry(&self, entry: &Entry) -> Result<(), BackendError> {
        buffer_with(|buffer| {
            self.render(entry, buffer);
            self.stream.write_all(buffer).map_err(BackendError::Write)
        })
    }

    fn severity_mask(&self) -> SeverityMask {
        self.severity_mask
    }

    fn requires_lock(&self) -> bool {
        true
    }

    fn lock_target(&self) -> LockTarget {
        self.stream.lock_target()
    }
}

/// Builder for [`ConsoleBackend`](struct.ConsoleBackend.html).
#[allow(clippy::module_name_repetitions)]
pub struct ConsoleBackendBuilder {
    stream: ConsoleStream,
    severity_mask: SeverityMask,
    #[cfg_attr(not(feature = "colors"), allow(dead_code))]
    colors: ColorMode,
    restore_color: bool,
    #[cfg(feature = "colors")]
    palette: Option<Palette>,
}

impl ConsoleBackendBuilder {
    fn new(stream: ConsoleStream) -> Self {
        Self {
            stream,
            severity_mask: SeverityMask::ALL,
            colors: ColorMode::Auto,
            restore_color: true,
            #[cfg(feature = "colors")]
            palette: None,
        }
    }

    /// Restricts the severities this backend writes. By default, it writes all of them.
    #[must_use]
    pub fn severity_mask(mut self, mask: SeverityMask) -> Self {
        self.severity_mask = mask;
        self
    }

    /// Decides if colors are used; the default is `ColorMode::Auto`.
    #[must_use]
    pub fn colors(mut self, mode: ColorMode) -> Self {
        self.colors = mode;
        self
    }

    /// Decides if the color is reset after each entry (default: true).
    ///
    /// If set to false, the color of the last entry stays active on the terminal.
    #[must_use]
    pub fn restore_color(mut self, restore: bool) -> Self {
        self.restore_color = restore;
        self
    }

    /// Sets the colors explicitly.
    ///
    /// By default, the palette is read from `SINKLOG_PALETTE`, or the built-in palette is used.
    ///
    /// Only available with feature `colors`.
    #[cfg(feature = "colors")]
    #[must_use]
    pub fn palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Produces the `ConsoleBackend`.
    #[must_use]
    pub fn build(self) -> ConsoleBackend {
        #[cfg(feature = "colors")]
        let colored = {
            let wanted = match self.colors {
                ColorMode::Auto => self.stream.is_tty(),
                ColorMode::Always => true,
                ColorMode::Never => false,
            };
            wanted && !(cfg!(windows) && !yansi::Paint::enable_windows_ascii())
        };
        #[cfg(not(feature = "colors"))]
        let colored = false;

        ConsoleBackend {
            stream: self.stream,
            severity_mask: self.severity_mask,
            colored,
            restore_color: self.restore_color,
            #[cfg(feature = "colors")]
            palette: self.palette.unwrap_or_else(Palette::from_env_or_default),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ColorMode, ConsoleBackend, ConsoleStream};
    use crate::writers::Backend;
    use crate::{Entry, ErrorReport, Severity};
    use chrono::{DateTime, FixedOffset, Local};
    use std::sync::Arc;

    fn rendered(backend: &ConsoleBackend, severity: Severity, error: Option<&ErrorReport>) -> String {
        let now: DateTime<FixedOffset> = Local::now().into();
        let entry = Entry {
            component: "console",
            timestamp: &now,
            elapsed_secs: 0.5,
            severity,
            line: "the line",
            error,
        };
        let mut buffer = Vec::new();
        backend.render(&entry, &mut buffer);
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn plain_output() {
        let backend = ConsoleBackend::stdout().colors(ColorMode::Never).build();
        assert!(!backend.is_colored());
        assert_eq!(rendered(&backend, Severity::Error, None), "the line\n");

        let report = ErrorReport::new("Boom", "it broke");
        let text = rendered(&backend, Severity::Error, Some(&report));
        assert!(text.starts_with("the line\n-----"));
        assert!(text.contains("Type:      Boom\n"));
    }

    #[test]
    fn shares_lock_target_per_stream() {
        let out1 = ConsoleBackend::stdout().build();
        let out2 = ConsoleBackend::stdout().build();
        let err = ConsoleBackend::stderr().build();
        assert!(out1.requires_lock());
        assert_eq!(out1.stream(), ConsoleStream::StdOut);
        assert!(Arc::ptr_eq(&out1.lock_target(), &out2.lock_target()));
        assert!(!Arc::ptr_eq(&out1.lock_target(), &err.lock_target()));
    }

    #[test]
    fn open_and_close_are_idempotent() {
        let backend = ConsoleBackend::stderr().build();
        assert!(backend.open());
        assert!(backend.open());
        assert!(backend.close());
        assert!(backend.close());
    }

    #[cfg(feature = "colors")]
    #[test]
    fn colored_output() {
        use crate::Palette;
        use yansi::{Color, Style};

        let palette = Palette {
            error: Style::new(Color::Fixed(196)),
            ..Palette::default()
        };
        let restoring = ConsoleBackend::stderr()
            .colors(ColorMode::Always)
            .palette(palette)
            .build();
        if !restoring.is_colored() {
            // no ANSI support on this console
            return;
        }
        let text = rendered(&restoring, Severity::Error, None);
        assert!(text.starts_with("\u{1b}[38;5;196m"));
        assert!(text.contains("the line"));
        assert!(text.ends_with("\u{1b}[0m"));

        let sticky = ConsoleBackend::stderr()
            .colors(ColorMode::Always)
            .restore_color(false)
            .palette(palette)
            .build();
        let text = rendered(&sticky, Severity::Error, None);
        assert!(text.starts_with("\u{1b}[38;5;196m"));
        assert!(text.ends_with("the line\n"));
    }
}
