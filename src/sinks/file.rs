//! File sink

use crate::core::{Result, WriteSyncer};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends records to a file through a buffer
///
/// `sync` flushes the buffer and asks the OS to persist the file. Buffered
/// data is also flushed when the sink is dropped.
///
/// # Examples
///
/// ```no_run
/// use rust_structured_logger::sinks::FileSink;
///
/// let sink = FileSink::new("/var/log/app.log").unwrap();
/// ```
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WriteSyncer for FileSink {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.writer.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.writer.get_mut().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writes_are_buffered_until_sync() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::new(&path).unwrap();

        sink.write(b"first\n").unwrap();
        sink.sync().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\n");
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "existing\n").unwrap();

        {
            let sink = FileSink::new(&path).unwrap();
            sink.write(b"appended\n").unwrap();
        }
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "existing\nappended\n"
        );
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = FileSink::new(dir.path().join("missing").join("app.log"));
        assert!(result.is_err());
    }
}
