//! The single open output file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

struct OpenFile {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Owns at most one open file at a time.
///
/// Writes are buffered; they are only durable after [`FileSink::flush`],
/// [`FileSink::close`], or a switch to another file.
#[derive(Default)]
pub struct FileSink {
    current: Option<OpenFile>,
}

impl FileSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// File name of the open file, `None` when closed.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_ref().map(|file| file.name.as_str())
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|file| file.path.as_path())
    }

    /// Bytes written but not yet handed to the file.
    pub fn pending_bytes(&self) -> usize {
        self.current
            .as_ref()
            .map_or(0, |file| file.writer.buffer().len())
    }

    /// Open `path` for append, creating it if missing.
    ///
    /// A different open file is flushed and closed first. If that flush
    /// fails the old handle is still released and the new file is not opened.
    /// Parent directories are never created here.
    pub fn open_or_append(&mut self, path: &Path) -> Result<()> {
        if self.current_path() == Some(path) {
            return Ok(());
        }
        self.close()?;

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.current = Some(OpenFile {
            name,
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        });
        Ok(())
    }

    pub fn write(&mut self, text: &str) -> Result<()> {
        let file = self.current.as_mut().ok_or(Error::WriterClosed)?;
        file.writer.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        let file = self.current.as_mut().ok_or(Error::WriterClosed)?;
        file.writer.flush()?;
        Ok(())
    }

    /// Flush and release the open file. Closing an already closed sink is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(file) = self.current.take() else {
            return Ok(());
        };
        // into_inner flushes; the handle drops either way.
        file.writer.into_inner().map_err(|err| Error::Io(err.into_error()))?;
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
