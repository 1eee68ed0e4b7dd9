//! Log writer module
//!
//! Provides thread-safe log writing to files, stdout/stderr or an in-memory buffer.
//! Each `Engine` owns its writer; nothing here is process-global.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Log output target
enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to file
    File(File),
    /// Any other writer (in-memory buffers, sockets, ...)
    Writer(Box<dyn Write + Send>),
}

/// Thread-safe log writer with separate access and error targets
pub struct LogWriter {
    /// Access log target
    access: Mutex<LogTarget>,
    /// Error log target
    error: Mutex<LogTarget>,
}

impl LogWriter {
    /// Create a log writer with optional file paths (stdout/stderr when `None`)
    pub fn new(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        let access = match access_log_file {
            Some(path) => LogTarget::File(open_log_file(path)?),
            None => LogTarget::Stdout,
        };

        let error = match error_log_file {
            Some(path) => LogTarget::File(open_log_file(path)?),
            None => LogTarget::Stderr,
        };

        Ok(Self {
            access: Mutex::new(access),
            error: Mutex::new(error),
        })
    }

    /// Writer that prints access lines to stdout and errors to stderr
    pub fn stdio() -> Self {
        Self {
            access: Mutex::new(LogTarget::Stdout),
            error: Mutex::new(LogTarget::Stderr),
        }
    }

    /// Send every line (access and error) to the given writer
    pub fn from_writer(out: impl Write + Send + 'static) -> Self {
        let shared = SharedWriter(Arc::new(Mutex::new(Box::new(out))));
        Self {
            access: Mutex::new(LogTarget::Writer(Box::new(shared.clone()))),
            error: Mutex::new(LogTarget::Writer(Box::new(shared))),
        }
    }

    /// Writer backed by an in-memory buffer, returned alongside a handle to read it
    pub fn memory() -> (Self, MemoryLog) {
        let log = MemoryLog::default();
        (Self::from_writer(log.clone()), log)
    }

    /// Write to access log
    pub fn write_access(&self, message: &str) {
        write_to_target(&mut lock(&self.access), message);
    }

    /// Write to error log
    pub fn write_error(&self, message: &str) {
        write_to_target(&mut lock(&self.error), message);
    }

    /// Write info message (to access log target)
    pub fn write_info(&self, message: &str) {
        write_to_target(&mut lock(&self.access), message);
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::stdio()
    }
}

/// Shared in-memory log buffer
#[derive(Clone, Default)]
pub struct MemoryLog(Arc<Mutex<Vec<u8>>>);

impl MemoryLog {
    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.0)).into_owned()
    }
}

impl Write for MemoryLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One writer shared by the access and error targets
#[derive(Clone)]
struct SharedWriter(Arc<Mutex<Box<dyn Write + Send>>>);

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.0).flush()
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Write message to log target
fn write_to_target(target: &mut LogTarget, message: &str) {
    match target {
        LogTarget::Stdout => {
            println!("{message}");
        }
        LogTarget::Stderr => {
            eprintln!("{message}");
        }
        LogTarget::File(file) => {
            let _ = writeln!(file, "{message}");
        }
        LogTarget::Writer(out) => {
            let _ = writeln!(out, "{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_writer_collects_both_targets() {
        let (writer, log) = LogWriter::memory();
        writer.write_access("GET /user/info");
        writer.write_error("boom");
        let contents = log.contents();
        assert!(contents.contains("GET /user/info\n"));
        assert!(contents.contains("boom\n"));
    }

    #[test]
    fn test_file_writer_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/access.log");
        let path_str = path.to_str().unwrap();
        let writer = LogWriter::new(Some(path_str), None).unwrap();
        writer.write_access("first");
        writer.write_access("second");
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
