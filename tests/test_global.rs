use sinklog::writers::DiscardBackend;
use sinklog::{global, LoggerBuilder, LoggerError};
use std::sync::Arc;

// The default handle is process-wide, so all checks run in a single test.
#[test]
fn test_default_logger() {
    assert!(global::default_logger().is_none());

    // a failing initialization leaves the handle empty
    match global::init_default(|| LoggerBuilder::new().build()) {
        Err(LoggerError::InvalidArgument(_)) => {}
        Err(e) => panic!("unexpected error {}", e),
        Ok(_) => panic!("a logger without backends was built"),
    }
    assert!(global::default_logger().is_none());

    let first = global::init_default(|| {
        LoggerBuilder::new()
            .backend(Arc::new(DiscardBackend::new()))
            .build()
    })
    .unwrap();

    // later initializers are not called
    let second = global::init_default(|| panic!("initialized twice")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &global::default_logger().unwrap()));

    // a disposed default is replaced
    first.dispose();
    let third = global::init_default(|| {
        LoggerBuilder::new()
            .backend(Arc::new(DiscardBackend::new()))
            .build()
    })
    .unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(third.info("global", "hello").unwrap().is_some());

    let taken = global::take_default().unwrap();
    assert!(Arc::ptr_eq(&taken, &third));
    assert!(global::default_logger().is_none());
    assert!(global::take_default().is_none());
}
