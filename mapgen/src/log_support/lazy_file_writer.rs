use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// A file writer that creates its file on the first write
#[derive(Clone)]
pub struct LazyFileWriter {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl LazyFileWriter {
    /// Writer appending to `path` once something is written
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: Arc::new(Mutex::new(None)),
        }
    }
}

/// Writer handed out per event
pub struct LazyWriter {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl LazyWriter {
    fn open(&self) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(&self.path)
    }
}

impl Write for LazyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file_guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("Mutex poisoned"))?;

        // Reopen when the file was never created or has been deleted since
        if file_guard.is_none() || !self.path.exists() {
            *file_guard = Some(self.open()?);
        }

        if let Some(Ok(bytes)) = file_guard.as_mut().map(|file| file.write(buf)) {
            return Ok(bytes);
        }
        let mut file = self.open()?;
        let bytes = file.write(buf)?;
        *file_guard = Some(file);
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file_guard = self
            .file
            .lock()
            .map_err(|_| io::Error::other("Mutex poisoned"))?;
        match file_guard.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LazyFileWriter {
    type Writer = LazyWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LazyWriter {
            path: self.path.clone(),
            file: Arc::clone(&self.file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_created_on_first_write() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("trace.log");
        let writer = LazyFileWriter::new(path.clone());

        let mut event_writer = writer.make_writer();
        assert!(!path.exists());

        event_writer.write_all(b"first\n").expect("write");
        event_writer.flush().expect("flush");
        assert!(path.exists());

        std::fs::remove_file(&path).expect("remove");
        writer.make_writer().write_all(b"second\n").expect("write after delete");
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "second\n"
        );
    }
}
