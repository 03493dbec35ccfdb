use super::{Config, FailurePolicy};
use crate::logger_error::BackendError;
use crate::writers::{new_lock_target, LockTarget};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

// Where the bytes go.
pub(crate) enum Stream {
    File(File),
    // fallback if no file could be opened and failures are ignored
    Null,
}
impl Stream {
    pub fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Self::File(f) => f.write_all(buf),
            Self::Null => Ok(()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::File(f) => f.flush(),
            Self::Null => Ok(()),
        }
    }
}

// The stream and the path it was opened for.
// `path` is None for the null fallback, so that the next write tries to open a file again.
struct Bound {
    path: Option<PathBuf>,
    stream: Stream,
}

// The mutable state of a FileBackend.
pub(crate) struct State {
    bound: Option<Bound>,
    lock_target: LockTarget,
    disposed: bool,
}
impl State {
    pub fn new() -> Self {
        Self {
            bound: None,
            lock_target: new_lock_target(),
            disposed: false,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn lock_target(&self) -> LockTarget {
        LockTarget::clone(&self.lock_target)
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        self.bound.as_ref().and_then(|b| b.path.clone())
    }

    // Returns the stream for the given resolved path.
    //
    // If the path differs from the one currently bound, the file for the new path is opened
    // (creating missing directories), and only then the previous stream is released.
    // A new lock target is installed with every new stream.
    pub fn get_or_create_stream(
        &mut self,
        path: PathBuf,
        config: &Config,
    ) -> Result<&mut Stream, BackendError> {
        let is_current = matches!(
            self.bound,
            Some(Bound { path: Some(ref current), .. }) if *current == path
        );

        if !is_current {
            match open_log_file(&path, config) {
                Ok(file) => {
                    self.bound = Some(Bound {
                        path: Some(path),
                        stream: Stream::File(file),
                    });
                    self.lock_target = new_lock_target();
                }
                Err(e) => match config.on_failure {
                    FailurePolicy::Abort => {
                        eprintln!(
                            "[sinklog] cannot open log file {} ({}), aborting",
                            path.display(),
                            e
                        );
                        std::process::abort();
                    }
                    FailurePolicy::Propagate => {
                        return Err(BackendError::Unrecoverable { path, source: e });
                    }
                    FailurePolicy::Ignore => {
                        // keep writing to the previous stream, if there is one
                    }
                },
            }
        }

        Ok(&mut self
            .bound
            .get_or_insert_with(|| Bound {
                path: None,
                stream: Stream::Null,
            })
            .stream)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self.bound {
            Some(ref mut bound) => bound.stream.flush(),
            None => Ok(()),
        }
    }

    pub fn close(&mut self) {
        if let Some(mut bound) = self.bound.take() {
            bound.stream.flush().ok();
        }
    }

    pub fn dispose(&mut self) {
        self.close();
        self.disposed = true;
    }
}

fn open_log_file(path: &Path, config: &Config) -> Result<File, std::io::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let log_file = OpenOptions::new().create(true).append(true).open(path)?;
    if config.print_message {
        println!("Log is written to {}", path.display());
    }
    Ok(log_file)
}
