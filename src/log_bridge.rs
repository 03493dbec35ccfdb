use crate::{Logger, LoggerError, Severity};
use std::sync::Arc;

// Component name for records without target.
const UNNAMED_TARGET: &str = "log";

/// Plugs a [`Logger`](struct.Logger.html) into the `log` crate, so that its macros
/// (`info!`, `warn!`, ...) end up in the logger's backends.
///
/// The record's target becomes the component name; `log::Level::Warn` maps to
/// `Severity::Warning`, the other levels map to their namesakes.
///
/// ```rust
/// use std::sync::Arc;
/// use sinklog::writers::DiscardBackend;
/// use sinklog::{LogBridge, LoggerBuilder};
///
/// let logger = Arc::new(
///     LoggerBuilder::new()
///         .backend(Arc::new(DiscardBackend::new()))
///         .build()
///         .unwrap(),
/// );
/// LogBridge::install(logger, log::LevelFilter::Info).unwrap();
/// log::info!(target: "doc", "routed through sinklog");
/// ```
pub struct LogBridge {
    logger: Arc<Logger>,
    level_filter: log::LevelFilter,
}

impl LogBridge {
    /// Creates a bridge without installing it.
    #[must_use]
    pub fn new(logger: Arc<Logger>, level_filter: log::LevelFilter) -> Self {
        Self {
            logger,
            level_filter,
        }
    }

    /// Installs a bridge as the `log` crate's global logger and sets its max level.
    ///
    /// # Errors
    ///
    /// `LoggerError::Log` if a global logger was already installed.
    pub fn install(logger: Arc<Logger>, level_filter: log::LevelFilter) -> Result<(), LoggerError> {
        log::set_boxed_logger(Box::new(Self::new(logger, level_filter)))?;
        log::set_max_level(level_filter);
        Ok(())
    }

    /// The logger records are forwarded to.
    #[must_use]
    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level_filter
            && self
                .logger
                .severity_filter()
                .map_or(false, |filter| filter.has(metadata.level().into()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let component = match record.target() {
            "" => UNNAMED_TARGET,
            target => target,
        };
        let severity = Severity::from(record.level());
        let message = record.args().to_string();
        if let Err(e) = self.logger.log(component, severity, &message, None) {
            eprintln!("[sinklog] cannot forward log record: {}", e);
        }
    }

    fn flush(&self) {
        if let Err(e) = self.logger.flush() {
            eprintln!("[sinklog] flushing failed with {}", e);
        }
    }
}

#[cfg(test)]
mod test {
    use super::LogBridge;
    use crate::writers::DiscardBackend;
    use crate::{LoggerBuilder, SeverityMask};
    use log::Log;
    use std::sync::Arc;

    #[test]
    fn forwards_enabled_records() {
        let backend = Arc::new(DiscardBackend::new());
        let logger = Arc::new(
            LoggerBuilder::new()
                .backend(Arc::clone(&backend) as Arc<dyn crate::writers::Backend>)
                .filter(SeverityMask::WARNING_OR_HIGHER)
                .build()
                .unwrap(),
        );
        let bridge = LogBridge::new(Arc::clone(&logger), log::LevelFilter::Trace);

        for level in &[log::Level::Error, log::Level::Warn, log::Level::Info] {
            bridge.log(
                &log::Record::builder()
                    .level(*level)
                    .target("bridge")
                    .args(format_args!("{} record", level))
                    .build(),
            );
        }
        assert_eq!(backend.writes(), 2);

        let narrow = LogBridge::new(logger, log::LevelFilter::Error);
        assert!(!narrow.enabled(
            &log::Metadata::builder()
                .level(log::Level::Warn)
                .target("bridge")
                .build()
        ));
    }
}
