use crate::logger_error::InvalidArgument;
use crate::Severity;
use chrono::{DateTime, FixedOffset, TimeZone};
use std::fmt::Write;
use std::path::{Component, Path, PathBuf};

// Characters that are rejected in every path segment, on every platform.
const ILLEGAL_IN_PATH: &[char] = &['<', '>', '"', '|'];
// Characters that are additionally rejected in the file name.
const ILLEGAL_IN_FILE_NAME: &[char] = &[':', '*', '?', '\\'];

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Literal(String),
    DateTime(String),
    SeverityName,
    SeverityInt,
}

// A parsed file path template.
//
//   %{<strftime format>}  date/time of the entry, e.g. %{%Y-%m-%d}
//   #{sev}                severity name, e.g. Warning
//   #{sevint}             severity flag value, e.g. 4
#[derive(Clone, Debug)]
pub(crate) struct PathTemplate {
    template: String,
    tokens: Vec<Token>,
}

impl PathTemplate {
    pub(crate) fn parse(template: &str) -> Result<Self, InvalidArgument> {
        let bad = |reason: String| InvalidArgument::PathTemplate {
            template: template.to_string(),
            reason,
        };

        if template.trim().is_empty() {
            return Err(bad("template is empty".to_string()));
        }

        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = template;
        while !rest.is_empty() {
            let placeholder = rest.starts_with("%{") || rest.starts_with("#{");
            if !placeholder {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    literal.push(c);
                }
                rest = chars.as_str();
                continue;
            }
            let end = rest
                .find('}')
                .ok_or_else(|| bad(format!("unterminated placeholder at {:?}", rest)))?;
            let inner = &rest[2..end];
            let token = if rest.starts_with('%') {
                if inner.is_empty() {
                    return Err(bad("empty date format".to_string()));
                }
                Token::DateTime(inner.to_string())
            } else {
                match inner {
                    "sev" => Token::SeverityName,
                    "sevint" => Token::SeverityInt,
                    _ => return Err(bad(format!("unknown placeholder #{{{}}}", inner))),
                }
            };
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(token);
            rest = &rest[end + 1..];
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self {
            template: template.to_string(),
            tokens,
        })
    }

    pub(crate) fn template(&self) -> &str {
        &self.template
    }

    pub(crate) fn resolve(
        &self,
        timestamp: &DateTime<FixedOffset>,
        severity: Severity,
    ) -> Result<PathBuf, std::fmt::Error> {
        let mut path = String::with_capacity(self.template.len() + 16);
        for token in &self.tokens {
            match token {
                Token::Literal(s) => path.push_str(s),
                Token::DateTime(format) => write!(path, "{}", timestamp.format(format))?,
                Token::SeverityName => path.push_str(severity.name()),
                Token::SeverityInt => write!(path, "{}", severity.bits())?,
            }
        }
        Ok(PathBuf::from(path))
    }

    // Resolves an example path with the current time and checks that it is usable.
    pub(crate) fn validate<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Result<(), InvalidArgument>
    where
        DateTime<FixedOffset>: From<DateTime<Tz>>,
    {
        let bad = |reason: String| InvalidArgument::PathTemplate {
            template: self.template.clone(),
            reason,
        };
        let example = self
            .resolve(&DateTime::<FixedOffset>::from(now), Severity::Info)
            .map_err(|_| bad("a date format is invalid".to_string()))?;
        validate_path(&example).map_err(bad)
    }
}

fn validate_path(path: &Path) -> Result<(), String> {
    let text = path.to_string_lossy();
    let file_name = path
        .file_name()
        .filter(|_| !text.ends_with('/') && !text.ends_with(std::path::MAIN_SEPARATOR))
        .ok_or_else(|| format!("{:?} does not end with a file name", path))?;

    for component in path.components() {
        if let Component::Normal(segment) = component {
            let segment = segment.to_string_lossy();
            if let Some(c) = segment
                .chars()
                .find(|c| c.is_control() || ILLEGAL_IN_PATH.contains(c))
            {
                return Err(format!("{:?} contains the illegal character {:?}", segment, c));
            }
        }
    }

    let file_name = file_name.to_string_lossy();
    if let Some(c) = file_name.chars().find(|c| ILLEGAL_IN_FILE_NAME.contains(c)) {
        return Err(format!(
            "file name {:?} contains the illegal character {:?}",
            file_name, c
        ));
    }
    Ok(())
}
