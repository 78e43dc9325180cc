//! Named file handles opened by OPENFILE

use super::error::{InterpResult, RuntimeError};
use crate::ast::FileMode;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

enum Handle {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

/// Filename to open handle; the filename string is the handle
#[derive(Default)]
pub struct FileTable {
    open: HashMap<String, Handle>,
    /// Relative filenames resolve against this directory when set
    base_dir: Option<PathBuf>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        FileTable {
            open: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    /// Open `name`, replacing any handle already open under that name
    pub fn open(&mut self, name: &str, mode: FileMode) -> InterpResult<()> {
        let path = self.resolve(name);
        let file = match mode {
            FileMode::Read => File::open(&path),
            FileMode::Write => File::create(&path),
            FileMode::Append => OpenOptions::new().create(true).append(true).open(&path),
        }
        .map_err(|e| RuntimeError::io_error(format!("cannot open file: {name}: {e}")))?;

        let handle = match mode {
            FileMode::Read => Handle::Reader(BufReader::new(file)),
            FileMode::Write | FileMode::Append => Handle::Writer(BufWriter::new(file)),
        };
        tracing::debug!(file = name, %mode, "open file");
        self.open.insert(name.to_string(), handle);
        Ok(())
    }

    /// Flush and release the handle
    pub fn close(&mut self, name: &str) -> InterpResult<()> {
        let handle = self
            .open
            .remove(name)
            .ok_or_else(|| RuntimeError::io_error("file not open"))?;
        if let Handle::Writer(mut writer) = handle {
            writer
                .flush()
                .map_err(|e| RuntimeError::io_error(format!("write error: {e}")))?;
        }
        tracing::debug!(file = name, "close file");
        Ok(())
    }

    /// Next line without its terminator, `None` once the file is exhausted
    pub fn read_line(&mut self, name: &str) -> InterpResult<Option<String>> {
        let handle = self
            .open
            .get_mut(name)
            .ok_or_else(|| RuntimeError::io_error("file not open"))?;
        let Handle::Reader(reader) = handle else {
            return Err(RuntimeError::io_error("file not open for reading"));
        };

        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| RuntimeError::io_error(format!("read error: {e}")))?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Write `text` followed by a newline
    pub fn write_line(&mut self, name: &str, text: &str) -> InterpResult<()> {
        let handle = self
            .open
            .get_mut(name)
            .ok_or_else(|| RuntimeError::io_error("file not open"))?;
        let Handle::Writer(writer) = handle else {
            return Err(RuntimeError::io_error("file not open for writing"));
        };
        writeln!(writer, "{text}").map_err(|e| RuntimeError::io_error(format!("write error: {e}")))
    }

    /// True when no further line can be read; files not open read as exhausted
    pub fn is_eof(&mut self, name: &str) -> bool {
        match self.open.get_mut(name) {
            Some(Handle::Reader(reader)) => reader.fill_buf().map_or(true, |buf| buf.is_empty()),
            Some(_) | None => true,
        }
    }

    /// Flush and drop every handle
    pub fn close_all(&mut self) {
        for (_, handle) in self.open.drain() {
            if let Handle::Writer(mut writer) = handle {
                let _ = writer.flush();
            }
        }
    }
}

impl Drop for FileTable {
    fn drop(&mut self) {
        self.close_all();
    }
}
