//! Writing finished archives to disk.
//!
//! Archives are written atomically by default: the bytes go to a sibling
//! temp file which is renamed over the destination once flushed.
//!
//! # Examples
//!
//! ```no_run
//! use docbundle::io::ArchiveFile;
//! use std::path::Path;
//!
//! # async fn example(archive: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let size = ArchiveFile::new().save(&archive, Path::new("bundle.zip")).await?;
//! println!("wrote {size} bytes");
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::path::Path;
use tokio::task;

use crate::error::{ArchiveError, Result};

/// Writer for archive files.
#[derive(Debug, Clone)]
pub struct ArchiveFile {
    atomic: bool,
}

impl ArchiveFile {
    /// Create a writer with atomic writes enabled.
    pub fn new() -> Self {
        Self { atomic: true }
    }

    /// Create a writer that writes the destination in place.
    pub fn non_atomic() -> Self {
        Self { atomic: false }
    }

    /// Save `archive` to `path` and return the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, written or renamed.
    pub async fn save(&self, archive: &[u8], path: &Path) -> Result<u64> {
        let path_buf = path.to_path_buf();
        let bytes = archive.to_vec();
        let atomic = self.atomic;

        task::spawn_blocking(move || {
            if let Some(parent) = path_buf.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }

            let write_path = if atomic {
                path_buf.with_extension("tmp")
            } else {
                path_buf.clone()
            };

            let file = std::fs::File::create(&write_path)?;
            let mut writer = std::io::BufWriter::new(file);
            writer.write_all(&bytes)?;
            writer.flush()?;

            if atomic {
                std::fs::rename(&write_path, &path_buf)?;
            }

            Ok::<_, ArchiveError>(bytes.len() as u64)
        })
        .await
        .map_err(|e| ArchiveError::Io {
            source: std::io::Error::other(format!("Write task failed: {e}")),
        })?
    }
}

impl Default for ArchiveFile {
    fn default() -> Self {
        Self::new()
    }
}
