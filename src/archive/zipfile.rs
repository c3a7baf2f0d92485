//! ZIP implementation of [`ArchiveWriter`].

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io::{self, Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::archive::ArchiveWriter;
use crate::config::CompressionLevel;
use crate::error::{ArchiveError, Result};

/// Deflate level used for [`CompressionLevel::Maximum`].
const MAX_DEFLATE_LEVEL: i64 = 9;

/// In-memory ZIP writer.
pub struct ZipArchiveWriter {
    inner: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ZipArchiveWriter {
    /// Create a writer whose entries are stamped with `modified`.
    ///
    /// Timestamps outside the ZIP range (before 1980) fall back to the
    /// format's default date.
    pub fn new(compression: CompressionLevel, modified: NaiveDateTime) -> Self {
        let mut options = match compression {
            CompressionLevel::None => {
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
            }
            CompressionLevel::Standard => {
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
            }
            CompressionLevel::Maximum => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(MAX_DEFLATE_LEVEL)),
        };

        if let Some(stamp) = zip_datetime(modified) {
            options = options.last_modified_time(stamp);
        }

        Self {
            inner: ZipWriter::new(Cursor::new(Vec::new())),
            options,
        }
    }
}

fn zip_datetime(ts: NaiveDateTime) -> Option<zip::DateTime> {
    let year = u16::try_from(ts.year()).ok()?;
    zip::DateTime::from_date_and_time(
        year,
        ts.month() as u8,
        ts.day() as u8,
        ts.hour() as u8,
        ts.minute() as u8,
        ts.second() as u8,
    )
    .ok()
}

impl ArchiveWriter for ZipArchiveWriter {
    fn create_entry(&mut self, name: &str) -> Result<&mut dyn Write> {
        self.inner
            .start_file(name, self.options)
            .map_err(|e| ArchiveError::archive_write(Some(name), io::Error::other(e)))?;
        Ok(&mut self.inner)
    }

    fn finish(self) -> Result<Vec<u8>> {
        let cursor = self
            .inner
            .finish()
            .map_err(|e| ArchiveError::archive_write(None, io::Error::other(e)))?;
        Ok(cursor.into_inner())
    }
}
