use std::fmt::{self, Write};

const RULE_WIDTH: usize = 80;

/// An error payload that can be attached to a log call.
///
/// A report describes one error and, optionally, the error that caused it;
/// backends render the whole chain below the log line.
///
/// ```rust
/// use sinklog::ErrorReport;
///
/// let report = ErrorReport::new("ConfigError", "missing key `port`")
///     .code(0x8007_0002)
///     .location("src/config.rs:42")
///     .data("file", "/etc/app.toml")
///     .caused_by(ErrorReport::new("io::Error", "No such file or directory"));
/// assert_eq!(report.chain().count(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorReport {
    type_name: String,
    message: String,
    code: u32,
    location: Option<String>,
    backtrace: Option<String>,
    data: Vec<(String, String)>,
    cause: Option<Box<ErrorReport>>,
}

impl ErrorReport {
    /// Creates a report with type name and message.
    pub fn new<T: Into<String>, M: Into<String>>(type_name: T, message: M) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Builds a report from a `std::error::Error`, following its `source()` chain.
    ///
    /// Rust errors do not expose their concrete type through `source()`,
    /// so only the outermost error gets its real type name.
    pub fn from_error<E: std::error::Error + 'static>(error: &E) -> Self {
        let mut report = Self::new(std::any::type_name::<E>(), error.to_string());
        report.cause = error.source().map(|src| Box::new(Self::from_source(src)));
        report
    }

    fn from_source(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut report = Self::new("caused by", error.to_string());
        report.cause = error.source().map(|src| Box::new(Self::from_source(src)));
        report
    }

    /// Sets the numeric diagnostic code.
    #[must_use]
    pub fn code(mut self, code: u32) -> Self {
        self.code = code;
        self
    }

    /// Sets the originating location.
    #[must_use]
    pub fn location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the stack or backtrace text.
    #[must_use]
    pub fn backtrace<S: Into<String>>(mut self, backtrace: S) -> Self {
        self.backtrace = Some(backtrace.into());
        self
    }

    /// Adds a key/value pair of diagnostic data.
    #[must_use]
    pub fn data<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.data.push((key.into(), value.into()));
        self
    }

    /// Appends `cause` at the end of the chain.
    #[must_use]
    pub fn caused_by(mut self, cause: ErrorReport) -> Self {
        self.push_cause(cause);
        self
    }

    fn push_cause(&mut self, cause: ErrorReport) {
        match self.cause {
            Some(ref mut next) => next.push_cause(cause),
            None => self.cause = Some(Box::new(cause)),
        }
    }

    /// The type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Iterates over this report and all its causes, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &ErrorReport> {
        std::iter::successors(Some(self), |r| r.cause.as_deref())
    }

    /// Renders the whole chain, framed by separator rules, with a trailing newline.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(512);
        // writing into a String cannot fail
        self.render_into(&mut out).ok();
        out
    }

    fn render_into(&self, w: &mut String) -> fmt::Result {
        let rule = "-".repeat(RULE_WIDTH);
        writeln!(w, "{}", rule)?;
        for (idx, report) in self.chain().enumerate() {
            if idx > 0 {
                writeln!(w, "Caused by:")?;
            }
            writeln!(w, "Type:      {}", report.type_name)?;
            writeln!(w, "Message:   {}", report.message)?;
            writeln!(w, "Code:      0x{:08X}", report.code)?;
            writeln!(
                w,
                "Location:  {}",
                report.location.as_deref().unwrap_or("<unknown>")
            )?;
            if let Some(ref backtrace) = report.backtrace {
                writeln!(w, "Backtrace:")?;
                for line in backtrace.lines() {
                    writeln!(w, "    {}", line)?;
                }
            }
            if !report.data.is_empty() {
                writeln!(w, "Data:")?;
                for (key, value) in &report.data {
                    writeln!(w, "    {} = {}", key, value)?;
                }
            }
        }
        writeln!(w, "{}", rule)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

#[cfg(test)]
mod test {
    use super::{ErrorReport, RULE_WIDTH};

    #[test]
    fn renders_chain_framed_by_rules() {
        let report = ErrorReport::new("Outer", "outer failed")
            .code(0xBEEF)
            .location("main.rs:1")
            .backtrace("frame 1\nframe 2")
            .data("user", "42")
            .caused_by(ErrorReport::new("Inner", "inner failed"));

        let text = report.render();
        let lines: Vec<&str> = text.lines().collect();
        let rule = "-".repeat(RULE_WIDTH);
        assert_eq!(lines.first(), Some(&rule.as_str()));
        assert_eq!(lines.last(), Some(&rule.as_str()));
        assert!(text.contains("Type:      Outer"));
        assert!(text.contains("Code:      0x0000BEEF"));
        assert!(text.contains("    frame 2"));
        assert!(text.contains("    user = 42"));
        assert!(text.contains("Caused by:\nType:      Inner"));
        assert!(text.contains("Code:      0x00000000"));
        assert!(text.find("Outer").unwrap() < text.find("Inner").unwrap());
    }

    #[test]
    fn from_std_error_walks_sources() {
        #[derive(Debug)]
        struct Wrapper(std::io::Error);
        impl std::fmt::Display for Wrapper {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("wrapper")
            }
        }
        impl std::error::Error for Wrapper {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Wrapper(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        let report = ErrorReport::from_error(&err);
        let messages: Vec<&str> = report.chain().map(ErrorReport::message).collect();
        assert_eq!(messages, vec!["wrapper", "disk"]);
        assert!(report.type_name().ends_with("Wrapper"));
    }
}
