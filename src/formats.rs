use crate::logger_error::InvalidArgument;
use crate::Severity;
use std::fmt::Write;
#[cfg(feature = "colors")]
use yansi::{Color, Style};

/// The line template that is used if none is configured:
/// timestamp, elapsed seconds, component, severity in brackets, and message, separated by tabs.
pub const DEFAULT_LINE_TEMPLATE: &str = "{0}\t{1}\t{2}\t[{3}]\t{4}";

/// The date format that is used if none is configured, e.g. `2020-01-27 14:41:08.123`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const DEFAULT_ELAPSED_PRECISION: usize = 2;

#[derive(Clone, Debug, PartialEq)]
enum Piece {
    Literal(String),
    Timestamp,
    Elapsed(usize),
    Component,
    Severity,
    Message,
}

/// A parsed line template.
///
/// The template contains literal text and up to five positional fields:
///
/// * `{0}` the formatted timestamp
/// * `{1}` the elapsed seconds since the logger was built; two decimals by default,
///   `{1:.N}` sets another precision
/// * `{2}` the component name
/// * `{3}` the severity name
/// * `{4}` the message
///
/// Fields can appear in any order, repeatedly, or not at all.
/// Literal braces are written as `{{` and `}}`.
///
/// ```rust
/// use sinklog::{LineFormat, Severity};
///
/// let format = LineFormat::parse("{3}: {2} says {4}").unwrap();
/// let line = format.render("", 0.0, "net", Severity::Info, "hello");
/// assert_eq!(line, "Info: net says hello");
/// ```
#[derive(Clone, Debug)]
pub struct LineFormat {
    template: String,
    pieces: Vec<Piece>,
}

impl Default for LineFormat {
    fn default() -> Self {
        // the default template is known to be valid
        Self::parse(DEFAULT_LINE_TEMPLATE).unwrap_or_else(|_| unreachable!())
    }
}

impl LineFormat {
    /// Parses a line template.
    ///
    /// # Errors
    ///
    /// `InvalidArgument::LineTemplate` if a brace is unbalanced or a field is unknown.
    pub fn parse(template: &str) -> Result<Self, InvalidArgument> {
        let bad = |reason: &str| InvalidArgument::LineTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(bad("unmatched '}'")),
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => field.push(c),
                            None => return Err(bad("unterminated field")),
                        }
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(parse_field(&field).ok_or_else(|| bad(&format!(
                        "unknown field {{{}}}",
                        field
                    )))?);
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(Self {
            template: template.to_string(),
            pieces,
        })
    }

    /// The template this format was parsed from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Renders a line.
    #[must_use]
    pub fn render(
        &self,
        timestamp: &str,
        elapsed_secs: f64,
        component: &str,
        severity: Severity,
        message: &str,
    ) -> String {
        let mut line = String::with_capacity(
            timestamp.len() + component.len() + message.len() + 32,
        );
        for piece in &self.pieces {
            match piece {
                Piece::Literal(s) => line.push_str(s),
                Piece::Timestamp => line.push_str(timestamp),
                Piece::Elapsed(precision) => {
                    // writing into a String cannot fail
                    write!(line, "{:.*}", *precision, elapsed_secs).ok();
                }
                Piece::Component => line.push_str(component),
                Piece::Severity => line.push_str(severity.name()),
                Piece::Message => line.push_str(message),
            }
        }
        line
    }
}

fn parse_field(field: &str) -> Option<Piece> {
    let (index, spec) = match field.find(':') {
        Some(pos) => (&field[..pos], Some(&field[pos + 1..])),
        None => (field, None),
    };
    match (index.trim(), spec) {
        ("0", None) => Some(Piece::Timestamp),
        ("1", None) => Some(Piece::Elapsed(DEFAULT_ELAPSED_PRECISION)),
        ("1", Some(spec)) => spec
            .strip_prefix('.')
            .and_then(|p| p.parse::<usize>().ok())
            .map(Piece::Elapsed),
        ("2", None) => Some(Piece::Component),
        ("3", None) => Some(Piece::Severity),
        ("4", None) => Some(Piece::Message),
        _ => None,
    }
}

/// The six foreground styles that a colored console backend uses, one per severity.
///
/// Only available with feature `colors`.
#[cfg(feature = "colors")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    /// Style for `Critical`.
    pub critical: Style,
    /// Style for `Error`.
    pub error: Style,
    /// Style for `Warning`.
    pub warning: Style,
    /// Style for `Info`.
    pub info: Style,
    /// Style for `Debug`.
    pub debug: Style,
    /// Style for `Trace`.
    pub trace: Style,
}

#[cfg(feature = "colors")]
impl Default for Palette {
    fn default() -> Palette {
        Palette {
            critical: Style::new(Color::Fixed(201)).bold(),
            error: Style::new(Color::Fixed(196)).bold(),
            warning: Style::new(Color::Fixed(208)).bold(),
            info: Style::new(Color::Unset),
            debug: Style::new(Color::Fixed(7)),
            trace: Style::new(Color::Fixed(8)),
        }
    }
}

#[cfg(feature = "colors")]
impl Palette {
    /// Name of the environment variable that overrides the default palette.
    pub const ENV_VAR: &'static str = "SINKLOG_PALETTE";

    /// Parses a palette from a semicolon-separated list of six entries,
    /// each either a color number (0..=255) or `-` for "no color",
    /// in the order critical, error, warning, info, debug, trace.
    /// Missing entries keep their default.
    ///
    /// # Errors
    ///
    /// `ParseIntError` if an entry is neither a number in range nor `-`.
    pub fn parse(palette: &str) -> Result<Palette, std::num::ParseIntError> {
        let mut items = palette.split(';');
        Ok(Palette {
            critical: parse_style(items.next().unwrap_or("201").trim())?.bold(),
            error: parse_style(items.next().unwrap_or("196").trim())?.bold(),
            warning: parse_style(items.next().unwrap_or("208").trim())?.bold(),
            info: parse_style(items.next().unwrap_or("-").trim())?,
            debug: parse_style(items.next().unwrap_or("7").trim())?,
            trace: parse_style(items.next().unwrap_or("8").trim())?,
        })
    }

    /// Reads the palette from `SINKLOG_PALETTE`, or falls back to the default palette.
    #[must_use]
    pub fn from_env_or_default() -> Palette {
        match std::env::var(Self::ENV_VAR) {
            Ok(value) => Self::parse(&value).unwrap_or_else(|e| {
                eprintln!("[sinklog] ignoring malformed {}: {}", Self::ENV_VAR, e);
                Palette::default()
            }),
            Err(_) => Palette::default(),
        }
    }

    /// The style for a severity.
    #[must_use]
    pub fn style(&self, severity: Severity) -> Style {
        match severity {
            Severity::Critical => self.critical,
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
            Severity::Debug => self.debug,
            Severity::Trace => self.trace,
        }
    }
}

#[cfg(feature = "colors")]
fn parse_style(input: &str) -> Result<Style, std::num::ParseIntError> {
    Ok(if input == "-" {
        Style::new(Color::Unset)
    } else {
        Style::new(Color::Fixed(input.parse()?))
    })
}

#[cfg(test)]
mod test {
    use super::{LineFormat, DEFAULT_LINE_TEMPLATE};
    use crate::Severity;

    #[test]
    fn default_template() {
        let format = LineFormat::default();
        assert_eq!(format.template(), DEFAULT_LINE_TEMPLATE);
        let line = format.render("2020-01-27", 1.5, "db", Severity::Error, "lost connection");
        assert_eq!(line, "2020-01-27\t1.50\tdb\t[Error]\tlost connection");
    }

    #[test]
    fn reordering_subsets_and_precision() {
        let format = LineFormat::parse("<{4}> from {2} after {1:.3}s").unwrap();
        let line = format.render("ignored", 0.25, "io", Severity::Debug, "done");
        assert_eq!(line, "<done> from io after 0.250s");

        let format = LineFormat::parse("{4}{4}").unwrap();
        assert_eq!(format.render("", 0.0, "", Severity::Info, "ab"), "abab");

        let format = LineFormat::parse("no fields at all").unwrap();
        assert_eq!(
            format.render("t", 0.0, "c", Severity::Info, "m"),
            "no fields at all"
        );
    }

    #[test]
    fn escaped_braces() {
        let format = LineFormat::parse("{{{3}}} {4}").unwrap();
        assert_eq!(
            format.render("", 0.0, "", Severity::Warning, "x"),
            "{Warning} x"
        );
    }

    #[test]
    fn malformed_templates() {
        for template in &["{5}", "{0", "}", "{x}", "{1:x}", "{2:.2}", "{}"] {
            assert!(
                LineFormat::parse(template).is_err(),
                "template {:?} was accepted",
                template
            );
        }
    }

    #[cfg(feature = "colors")]
    #[test]
    fn palette_parsing() {
        use super::Palette;
        use yansi::{Color, Style};

        let palette = Palette::parse("1;2;3;-;5").unwrap();
        assert_eq!(palette.critical, Style::new(Color::Fixed(1)).bold());
        assert_eq!(palette.info, Style::new(Color::Unset));
        assert_eq!(palette.trace, Style::new(Color::Fixed(8)));
        assert!(Palette::parse("red").is_err());
        assert!(Palette::parse("256").is_err());
    }
}
