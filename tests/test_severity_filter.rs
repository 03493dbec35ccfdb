use sinklog::writers::{Backend, DiscardBackend, LockTarget};
use sinklog::{BackendError, Entry, LoggerBuilder, Severity, SeverityMask};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct CountingBackend {
    mask: SeverityMask,
    count: AtomicUsize,
    lock_target: LockTarget,
}

impl CountingBackend {
    fn new(mask: SeverityMask) -> Self {
        Self {
            mask,
            count: AtomicUsize::new(0),
            lock_target: sinklog::writers::new_lock_target(),
        }
    }
}

impl Backend for CountingBackend {
    fn open(&self) -> bool {
        true
    }
    fn close(&self) -> bool {
        true
    }
    fn flush(&self) -> std::io::Result<()> {
        Ok(())
    }
    fn write_entry(&self, _entry: &Entry) -> Result<(), BackendError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn severity_mask(&self) -> SeverityMask {
        self.mask
    }
    fn lock_target(&self) -> LockTarget {
        LockTarget::clone(&self.lock_target)
    }
}

#[test]
fn test_every_filter_subset() {
    for bits in 0..=SeverityMask::ALL.bits() {
        let filter = SeverityMask::from_bits_truncate(bits);
        let backend = Arc::new(CountingBackend::new(SeverityMask::ALL));
        let logger = LoggerBuilder::new()
            .backend(Arc::clone(&backend) as Arc<dyn Backend>)
            .filter(filter)
            .build()
            .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e));

        for severity in &Severity::ALL {
            let result = logger
                .log("filter", *severity, "a message", None)
                .unwrap();
            assert_eq!(
                result.is_some(),
                bits & severity.bits() != 0,
                "filter {} and severity {}",
                filter,
                severity
            );
        }
        assert_eq!(
            backend.count.load(Ordering::SeqCst),
            bits.count_ones() as usize
        );
    }
}

#[test]
fn test_backend_mask_is_applied_after_filter() {
    let errors = Arc::new(CountingBackend::new(SeverityMask::ERROR_OR_HIGHER));
    let everything = Arc::new(CountingBackend::new(SeverityMask::ALL));
    let logger = LoggerBuilder::new()
        .backend(Arc::clone(&errors) as Arc<dyn Backend>)
        .backend(Arc::clone(&everything) as Arc<dyn Backend>)
        .filter(SeverityMask::DEBUG_OR_HIGHER)
        .build()
        .unwrap();

    for severity in &Severity::ALL {
        logger.log("mask", *severity, "msg", None).unwrap();
    }
    assert_eq!(errors.count.load(Ordering::SeqCst), 2);
    assert_eq!(everything.count.load(Ordering::SeqCst), 5);
}

#[test]
fn test_combined_and_unknown_severities_fail() {
    let configurations: Vec<Vec<Arc<dyn Backend>>> = vec![
        vec![Arc::new(DiscardBackend::new()) as Arc<dyn Backend>],
        vec![
            Arc::new(DiscardBackend::new().pretend_lock(true)) as Arc<dyn Backend>,
            Arc::new(CountingBackend::new(SeverityMask::CRITICAL)) as Arc<dyn Backend>,
        ],
        vec![Arc::new(CountingBackend::new(SeverityMask::NONE)) as Arc<dyn Backend>],
    ];

    for backends in configurations {
        let logger = LoggerBuilder::new()
            .backends(backends.into_iter().map(Some))
            .filter(SeverityMask::ALL)
            .build()
            .unwrap();
        for bits in (0..=0xFF_u32).chain(vec![0x100, 0x8000_0000, u32::max_value()]) {
            let result = logger.log_bits("raw", bits, "msg", None);
            if Severity::from_bits(bits).is_some() {
                assert!(result.is_ok(), "{:#x} was rejected", bits);
            } else {
                match result {
                    Err(e) => assert!(e.is_invalid_argument(), "{:#x}: {}", bits, e),
                    Ok(_) => panic!("{:#x} was accepted", bits),
                }
            }
        }
    }
}

#[test]
fn test_filter_from_text() {
    let backend = Arc::new(CountingBackend::new(SeverityMask::ALL));
    let logger = LoggerBuilder::new()
        .backend(Arc::clone(&backend) as Arc<dyn Backend>)
        .filter_str("error, debug")
        .build()
        .unwrap();
    assert_eq!(
        logger.severity_filter().unwrap(),
        SeverityMask::ERROR | SeverityMask::DEBUG
    );

    logger.set_severity_filter(SeverityMask::NONE).unwrap();
    for severity in &Severity::ALL {
        assert!(logger.log("off", *severity, "msg", None).unwrap().is_none());
    }
    assert_eq!(backend.count.load(Ordering::SeqCst), 0);
}
