use sinklog::writers::{Backend, LockTarget};
use sinklog::{BackendError, Entry, ErrorReport, LoggerBuilder, SeverityMask};
use std::sync::{Arc, Mutex};

pub struct RecordingBackend {
    mask: SeverityMask,
    lines: Mutex<Vec<String>>,
    lock_target: LockTarget,
}

impl RecordingBackend {
    fn new(mask: SeverityMask) -> Arc<Self> {
        Arc::new(Self {
            mask,
            lines: Mutex::new(Vec::new()),
            lock_target: sinklog::writers::new_lock_target(),
        })
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Backend for RecordingBackend {
    fn open(&self) -> bool {
        true
    }
    fn close(&self) -> bool {
        true
    }
    fn flush(&self) -> std::io::Result<()> {
        Ok(())
    }
    fn write_entry(&self, entry: &Entry) -> Result<(), BackendError> {
        self.lines.lock().unwrap().push(entry.line.to_string());
        Ok(())
    }
    fn severity_mask(&self) -> SeverityMask {
        self.mask
    }
    fn requires_lock(&self) -> bool {
        true
    }
    fn lock_target(&self) -> LockTarget {
        LockTarget::clone(&self.lock_target)
    }
}

#[test]
fn test_terminating_report_is_the_last_entry() {
    let all = RecordingBackend::new(SeverityMask::ALL);
    let critical = RecordingBackend::new(SeverityMask::CRITICAL);
    let warnings = RecordingBackend::new(SeverityMask::WARNING);
    let logger = LoggerBuilder::new()
        .backend(Arc::clone(&all) as Arc<dyn Backend>)
        .backend(Arc::clone(&critical) as Arc<dyn Backend>)
        .backend(Arc::clone(&warnings) as Arc<dyn Backend>)
        .line_template("{2}:{3}:{4}")
        .build()
        .unwrap();

    logger.info("app", "before").unwrap();
    let report = ErrorReport::new("panic", "index out of bounds");
    let line = logger
        .report_unhandled("thread 'main'", "index out of bounds", Some(&report), true)
        .unwrap();
    assert_eq!(
        line.as_deref(),
        Some("thread 'main':Critical:index out of bounds")
    );
    assert!(logger.is_tripped().unwrap());

    // everything afterwards is swallowed without touching a backend
    for _ in 0..3 {
        assert_eq!(logger.critical("app", "after").unwrap(), None);
        assert_eq!(logger.warning("app", "after").unwrap(), None);
        assert_eq!(logger.log_bits("app", 0x7, "after", None).unwrap(), None);
    }
    assert_eq!(
        all.lines(),
        vec!["app:Info:before", "thread 'main':Critical:index out of bounds"]
    );
    assert_eq!(
        critical.lines(),
        vec!["thread 'main':Critical:index out of bounds"]
    );
    assert!(warnings.lines().is_empty());

    logger.untrip().unwrap();
    assert!(logger.warning("app", "revived").unwrap().is_some());
    assert_eq!(warnings.lines(), vec!["app:Warning:revived"]);
}

#[test]
fn test_non_terminating_report_does_not_trip() {
    let all = RecordingBackend::new(SeverityMask::ALL);
    let logger = LoggerBuilder::new()
        .backend(Arc::clone(&all) as Arc<dyn Backend>)
        .line_template("{2}:{3}:{4}")
        .build()
        .unwrap();

    logger
        .report_unhandled("thread 'worker'", "oops", None, false)
        .unwrap();
    assert!(!logger.is_tripped().unwrap());
    logger.info("app", "still here").unwrap();
    assert_eq!(
        all.lines(),
        vec!["thread 'worker':Error:oops", "app:Info:still here"]
    );
}

#[test]
fn test_only_one_thread_gets_through_an_armed_latch() {
    let all = RecordingBackend::new(SeverityMask::ALL);
    let logger = Arc::new(
        LoggerBuilder::new()
            .backend(Arc::clone(&all) as Arc<dyn Backend>)
            .build()
            .unwrap(),
    );
    logger.trip().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|idx| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                logger
                    .error("racer", &format!("racer {}", idx))
                    .unwrap()
                    .is_some()
            })
        })
        .collect();
    let passed = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|passed| *passed)
        .count();
    assert_eq!(passed, 1);
    assert_eq!(all.lines().len(), 1);
}

#[test]
fn test_terminating_report_survives_concurrent_logging() {
    for _ in 0..100 {
        let all = RecordingBackend::new(SeverityMask::ALL);
        let logger = Arc::new(
            LoggerBuilder::new()
                .backend(Arc::clone(&all) as Arc<dyn Backend>)
                .line_template("{2}:{3}:{4}")
                .build()
                .unwrap(),
        );

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        logger.info("bystander", "noise").unwrap();
                    }
                })
            })
            .collect();
        let line = logger
            .report_unhandled("thread 'main'", "fatal", None, true)
            .unwrap();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(line.as_deref(), Some("thread 'main':Critical:fatal"));
        // calls that passed the latch before the report may still finish after it
        let lines = all.lines();
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("thread 'main'")).count(),
            1
        );
    }
}

#[test]
fn test_terminating_report_after_trip_is_discarded() {
    let all = RecordingBackend::new(SeverityMask::ALL);
    let logger = LoggerBuilder::new()
        .backend(Arc::clone(&all) as Arc<dyn Backend>)
        .line_template("{2}:{3}:{4}")
        .build()
        .unwrap();

    // an armed latch is taken over by the terminating report
    logger.trip().unwrap();
    assert!(logger
        .report_unhandled("thread 'main'", "first", None, true)
        .unwrap()
        .is_some());
    assert_eq!(logger.info("app", "after").unwrap(), None);

    // once tripped, further terminating reports are silent
    assert_eq!(
        logger
            .report_unhandled("thread 'main'", "second", None, true)
            .unwrap(),
        None
    );
    assert_eq!(all.lines(), vec!["thread 'main':Critical:first"]);
}

#[test]
fn test_invalid_severity_consumes_an_armed_latch() {
    let all = RecordingBackend::new(SeverityMask::ALL);
    let logger = LoggerBuilder::new()
        .backend(Arc::clone(&all) as Arc<dyn Backend>)
        .build()
        .unwrap();

    logger.trip().unwrap();
    match logger.log_bits("app", 0x3, "combined", None) {
        Err(e) => assert!(e.is_invalid_argument()),
        Ok(line) => panic!("combined severity was accepted: {:?}", line),
    }
    // the latch advanced before the severity was checked
    assert_eq!(logger.error("app", "after").unwrap(), None);
    assert!(all.lines().is_empty());
}
