//! Append-only CSV output streams.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, TelemetryError};

/// An append-only CSV stream.
///
/// The header is written on construction and every row is flushed as soon
/// as it is appended, so a crashed host still leaves complete rows behind.
/// Write errors are logged and counted, never returned: losing telemetry
/// must not disturb the match.
#[derive(Debug)]
pub struct CsvLog<W: Write> {
    name: &'static str,
    writer: Option<W>,
    rows_written: u64,
    write_failures: u64,
}

impl CsvLog<BufWriter<File>> {
    /// Create (or truncate) the file at `path` and write the header.
    ///
    /// An absent path or a file that cannot be created yields a disabled
    /// log.
    pub fn create(name: &'static str, path: Option<&Path>, header: &str) -> Self {
        match open(name, path) {
            Ok(file) => {
                tracing::debug!(stream = name, path = ?path, "Opened telemetry stream");
                Self::new(name, BufWriter::new(file), header)
            }
            Err(TelemetryError::NoOutputPath(_)) => {
                tracing::debug!(stream = name, "No path configured, stream disabled");
                Self::disabled(name)
            }
            Err(e) => {
                tracing::warn!(stream = name, error = %e, "Failed to open telemetry stream");
                Self::disabled(name)
            }
        }
    }
}

impl<W: Write> CsvLog<W> {
    /// Wrap an open writer and write the header line.
    pub fn new(name: &'static str, writer: W, header: &str) -> Self {
        let mut log = Self {
            name,
            writer: Some(writer),
            rows_written: 0,
            write_failures: 0,
        };
        log.write_line(header);
        log
    }

    /// A log that discards everything.
    #[must_use]
    pub fn disabled(name: &'static str) -> Self {
        Self {
            name,
            writer: None,
            rows_written: 0,
            write_failures: 0,
        }
    }

    /// Append one row. `line` must not contain the trailing newline.
    pub fn append(&mut self, line: &str) {
        if self.write_line(line) {
            self.rows_written += 1;
        }
    }

    /// Whether rows are actually being written somewhere.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Number of data rows successfully written (header excluded).
    #[must_use]
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Number of writes that failed.
    #[must_use]
    pub fn write_failures(&self) -> u64 {
        self.write_failures
    }

    /// Give back the underlying writer, if any.
    pub fn into_inner(self) -> Option<W> {
        self.writer
    }

    fn write_line(&mut self, line: &str) -> bool {
        let Some(writer) = self.writer.as_mut() else {
            return false;
        };
        let result = writeln!(writer, "{line}").and_then(|()| writer.flush());
        match result {
            Ok(()) => true,
            Err(e) => {
                self.write_failures += 1;
                tracing::warn!(stream = self.name, error = %e, "Dropped telemetry row");
                false
            }
        }
    }
}

fn open(name: &'static str, path: Option<&Path>) -> Result<File> {
    let path = path.ok_or(TelemetryError::NoOutputPath(name))?;
    File::create(path).map_err(|e| TelemetryError::io(path, e))
}
