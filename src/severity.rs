use crate::logger_error::{InvalidArgument, LoggerError};
use std::convert::TryFrom;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

/// The importance of a single log event.
///
/// Each variant is a distinct single-bit flag, so that levels can be combined into a
/// [`SeverityMask`](struct.SeverityMask.html).
/// The variants are ordered by significance, `Critical` being the most severe one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Severity {
    /// The program cannot continue.
    Critical = 0x01,
    /// An operation failed.
    Error = 0x02,
    /// Something unexpected happened, but the program can go on.
    Warning = 0x04,
    /// Normal operational messages.
    Info = 0x08,
    /// Details for developers.
    Debug = 0x10,
    /// Very detailed tracing.
    Trace = 0x20,
}

impl Severity {
    /// All severities, from the most to the least severe one.
    pub const ALL: [Severity; 6] = [
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Info,
        Severity::Debug,
        Severity::Trace,
    ];

    /// The display name, e.g. `"Warning"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
            Severity::Debug => "Debug",
            Severity::Trace => "Trace",
        }
    }

    /// The underlying flag value.
    #[inline]
    #[must_use]
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Returns the severity whose flag is exactly `bits`.
    ///
    /// Combined masks, zero, and unknown bits yield `None`.
    #[must_use]
    pub fn from_bits(bits: u32) -> Option<Severity> {
        Self::ALL.iter().copied().find(|s| s.bits() == bits)
    }

    /// The mask containing this severity and all more severe ones.
    #[must_use]
    pub fn or_higher(self) -> SeverityMask {
        Self::ALL
            .iter()
            .take_while(|s| **s <= self)
            .fold(SeverityMask::NONE, |acc, s| acc | *s)
    }
}

impl TryFrom<u32> for Severity {
    type Error = LoggerError;

    fn try_from(bits: u32) -> Result<Self, LoggerError> {
        Severity::from_bits(bits).ok_or(LoggerError::InvalidArgument(
            InvalidArgument::InvalidSeverity(bits),
        ))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Severity {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, LoggerError> {
        let s = s.trim();
        Severity::ALL
            .iter()
            .copied()
            .find(|sev| sev.name().eq_ignore_ascii_case(s))
            .or_else(|| match s.to_ascii_lowercase().as_str() {
                "crit" | "fatal" => Some(Severity::Critical),
                "err" => Some(Severity::Error),
                "warn" => Some(Severity::Warning),
                _ => None,
            })
            .ok_or_else(|| {
                LoggerError::InvalidArgument(InvalidArgument::SeveritySpec(s.to_string()))
            })
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Severity::Error,
            log::Level::Warn => Severity::Warning,
            log::Level::Info => Severity::Info,
            log::Level::Debug => Severity::Debug,
            log::Level::Trace => Severity::Trace,
        }
    }
}

impl From<Severity> for log::Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical | Severity::Error => log::Level::Error,
            Severity::Warning => log::Level::Warn,
            Severity::Info => log::Level::Info,
            Severity::Debug => log::Level::Debug,
            Severity::Trace => log::Level::Trace,
        }
    }
}

/// A set of severities, used as filter by the logger and by each backend.
///
/// Masks are built by combining [`Severity`](enum.Severity.html) values with `|`,
/// or by using one of the predefined constants.
/// Unknown bits are always stripped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct SeverityMask(u32);

impl SeverityMask {
    const KNOWN_BITS: u32 = 0x3F;

    /// Accepts nothing.
    pub const NONE: SeverityMask = SeverityMask(0);
    /// Only `Critical`.
    pub const CRITICAL: SeverityMask = SeverityMask(0x01);
    /// Only `Error`.
    pub const ERROR: SeverityMask = SeverityMask(0x02);
    /// Only `Warning`.
    pub const WARNING: SeverityMask = SeverityMask(0x04);
    /// Only `Info`.
    pub const INFO: SeverityMask = SeverityMask(0x08);
    /// Only `Debug`.
    pub const DEBUG: SeverityMask = SeverityMask(0x10);
    /// Only `Trace`.
    pub const TRACE: SeverityMask = SeverityMask(0x20);

    /// `Critical`.
    pub const CRITICAL_OR_HIGHER: SeverityMask = SeverityMask(0x01);
    /// `Error` and `Critical`.
    pub const ERROR_OR_HIGHER: SeverityMask = SeverityMask(0x03);
    /// `Warning`, `Error` and `Critical`.
    pub const WARNING_OR_HIGHER: SeverityMask = SeverityMask(0x07);
    /// `Info` and everything more severe.
    pub const INFO_OR_HIGHER: SeverityMask = SeverityMask(0x0F);
    /// `Debug` and everything more severe.
    pub const DEBUG_OR_HIGHER: SeverityMask = SeverityMask(0x1F);
    /// Everything.
    pub const TRACE_OR_HIGHER: SeverityMask = SeverityMask(0x3F);

    /// `Critical | Error | Warning | Info`, the default filter of a logger.
    pub const DEFAULTS: SeverityMask = SeverityMask(0x0F);
    /// All six severities.
    pub const ALL: SeverityMask = SeverityMask(0x3F);

    /// Creates a mask from raw bits, dropping bits that do not belong to any severity.
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> SeverityMask {
        SeverityMask(bits & Self::KNOWN_BITS)
    }

    /// The raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if the severity is contained.
    #[inline]
    #[must_use]
    pub fn has(self, severity: Severity) -> bool {
        self.0 & severity.bits() != 0
    }

    /// Returns true if both masks share at least one severity.
    #[inline]
    #[must_use]
    pub fn has_any(self, other: SeverityMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if no severity is contained.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the contained severities, most severe first.
    pub fn iter(self) -> impl Iterator<Item = Severity> {
        (0..Severity::ALL.len())
            .map(|idx| Severity::ALL[idx])
            .filter(move |s| self.has(*s))
    }
}

impl From<Severity> for SeverityMask {
    fn from(severity: Severity) -> Self {
        SeverityMask(severity.bits())
    }
}

impl BitOr for SeverityMask {
    type Output = SeverityMask;
    fn bitor(self, rhs: SeverityMask) -> SeverityMask {
        SeverityMask(self.0 | rhs.0)
    }
}

impl BitOr<Severity> for SeverityMask {
    type Output = SeverityMask;
    fn bitor(self, rhs: Severity) -> SeverityMask {
        SeverityMask(self.0 | rhs.bits())
    }
}

impl BitOr for Severity {
    type Output = SeverityMask;
    fn bitor(self, rhs: Severity) -> SeverityMask {
        SeverityMask(self.bits() | rhs.bits())
    }
}

impl BitOrAssign for SeverityMask {
    fn bitor_assign(&mut self, rhs: SeverityMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SeverityMask {
    type Output = SeverityMask;
    fn bitand(self, rhs: SeverityMask) -> SeverityMask {
        SeverityMask(self.0 & rhs.0)
    }
}

impl fmt::Display for SeverityMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for sev in self.iter() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(sev.name())?;
            first = false;
        }
        Ok(())
    }
}

/// Parses a filter specification.
///
/// Accepted forms, case-insensitive:
///
/// * `all`, `none`, `defaults`
/// * a severity name with a `+` suffix, meaning "this or higher", e.g. `warning+`
/// * a list of severity names separated by `,` or `|`, e.g. `error,critical`
impl FromStr for SeverityMask {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, LoggerError> {
        let spec = s.trim();
        match spec.to_ascii_lowercase().as_str() {
            "all" | "*" => return Ok(SeverityMask::ALL),
            "none" | "off" => return Ok(SeverityMask::NONE),
            "defaults" | "default" => return Ok(SeverityMask::DEFAULTS),
            _ => {}
        }
        if let Some(name) = spec.strip_suffix('+') {
            return Ok(name.parse::<Severity>()?.or_higher());
        }
        let mut mask = SeverityMask::NONE;
        for part in spec.split(|c| c == ',' || c == '|') {
            if part.trim().is_empty() {
                return Err(LoggerError::InvalidArgument(InvalidArgument::SeveritySpec(
                    s.to_string(),
                )));
            }
            mask |= SeverityMask::from(part.parse::<Severity>()?);
        }
        Ok(mask)
    }
}
