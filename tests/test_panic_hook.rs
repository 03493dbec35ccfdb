use sinklog::writers::{Backend, LockTarget};
use sinklog::{BackendError, Entry, LoggerBuilder, SeverityMask};
use std::sync::{Arc, Mutex};

pub struct RecordingBackend {
    entries: Mutex<Vec<(String, Option<String>)>>,
    lock_target: LockTarget,
}

impl RecordingBackend {
    fn lines(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(line, _)| line.clone())
            .collect()
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
        self.entries.lock().unwrap().push((
            entry.line.to_string(),
            entry.error.map(|e| e.type_name().to_string()),
        ));
        Ok(())
    }
    fn severity_mask(&self) -> SeverityMask {
        SeverityMask::ALL
    }
    fn lock_target(&self) -> LockTarget {
        LockTarget::clone(&self.lock_target)
    }
}

fn panic_in_thread(name: &str, message: &'static str) {
    let result = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || panic!("{}", message))
        .unwrap()
        .join();
    assert!(result.is_err());
}

// All panic hook checks share the process-wide hook, so they run in a single test.
#[test]
fn test_panic_hook() {
    let backend = Arc::new(RecordingBackend {
        entries: Mutex::new(Vec::new()),
        lock_target: sinklog::writers::new_lock_target(),
    });
    let logger = Arc::new(
        LoggerBuilder::new()
            .backend(Arc::clone(&backend) as Arc<dyn Backend>)
            .filter(SeverityMask::ALL)
            .line_template("{2}|{3}|{4}")
            .build()
            .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e)),
    );

    let handle = logger.attach_panic_hook().unwrap();
    let again = logger.attach_panic_hook().unwrap();
    assert!(handle.is_attached());
    assert!(again.is_attached());

    // a worker panic is logged as error, once, despite the double attach
    panic_in_thread("worker", "worker failed");
    assert_eq!(backend.lines(), vec!["thread 'worker'|Error|worker failed"]);
    assert_eq!(
        backend.entries.lock().unwrap()[0].1.as_deref(),
        Some("panic")
    );
    assert!(!logger.is_tripped().unwrap());

    // a panic on the main thread ends the process: it is logged as critical and trips the latch
    panic_in_thread("main", "main failed");
    assert_eq!(backend.lines().len(), 2);
    assert_eq!(backend.lines()[1], "thread 'main'|Critical|main failed");
    assert!(logger.is_tripped().unwrap());
    assert_eq!(logger.error("app", "during teardown").unwrap(), None);
    panic_in_thread("worker", "second worker failure");
    assert_eq!(backend.lines().len(), 2);
    logger.untrip().unwrap();

    // detaching is idempotent and affects all handles of the registration
    handle.detach();
    handle.detach();
    assert!(!handle.is_attached());
    assert!(!again.is_attached());
    panic_in_thread("worker", "unobserved");
    assert_eq!(backend.lines().len(), 2);

    // disposing releases the registration
    let handle = logger.attach_panic_hook().unwrap();
    assert!(handle.is_attached());
    panic_in_thread("worker", "observed again");
    assert_eq!(backend.lines().len(), 3);
    logger.dispose();
    assert!(!handle.is_attached());
    panic_in_thread("worker", "after dispose");
    assert_eq!(backend.lines().len(), 3);
}
