//! Archive assembly for one request.

use chrono::NaiveDateTime;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::archive::{ArchiveWriter, FilePlan, ZipArchiveWriter};
use crate::config::CompressionLevel;
use crate::error::{ArchiveError, Result};
use crate::io::{DocumentLookup, InputSource};
use crate::model::{ArchiveEntry, OutputFileSpec, Request};
use crate::naming::FilenameResolver;
use crate::pdf::PdfEngine;

/// Builds one archive entry per output file.
///
/// Files are processed strictly in request order. The first failure aborts
/// the whole request and the partially written archive is dropped.
pub struct Assembler<'a, E: ?Sized, S: ?Sized> {
    engine: Arc<E>,
    source: &'a S,
    timestamp: NaiveDateTime,
}

impl<'a, E, S> Assembler<'a, E, S>
where
    E: PdfEngine + ?Sized + 'static,
    S: InputSource + ?Sized,
{
    /// Create an assembler that names files after `timestamp`.
    ///
    /// The engine is shared with the blocking tasks that run its calls.
    pub fn new(engine: Arc<E>, source: &'a S, timestamp: NaiveDateTime) -> Self {
        Self {
            engine,
            source,
            timestamp,
        }
    }

    /// The timestamp used for filename prefixes.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Assemble `request` into `writer` and return the finished archive.
    ///
    /// # Errors
    ///
    /// Fails before writing anything if the request does not validate, and
    /// on the first file whose content cannot be produced or written.
    #[instrument(
        skip_all,
        fields(files = request.files.len(), documents = request.documents.len())
    )]
    pub async fn assemble<W>(&self, request: &Request, mut writer: W) -> Result<Vec<u8>>
    where
        W: ArchiveWriter,
    {
        request.validate()?;

        let mut lookup = DocumentLookup::new(&request.documents, self.source);
        let mut names = FilenameResolver::for_customer(self.timestamp, &request.customer);

        for spec in &request.files {
            let entry = self.assemble_file(spec, &mut lookup, &mut names).await?;

            writer
                .create_entry(&entry.filename)?
                .write_all(&entry.content)
                .map_err(|e| ArchiveError::archive_write(Some(&entry.filename), e))?;

            debug!(
                file_id = %spec.id,
                filename = %entry.filename,
                bytes = entry.content.len(),
                "added archive entry"
            );
        }

        let archive = writer.finish()?;
        info!(
            entries = names.len(),
            fetched = lookup.fetched_count(),
            bytes = archive.len(),
            "archive assembled"
        );
        Ok(archive)
    }

    /// Assemble `request` into a ZIP stamped with this assembler's timestamp.
    pub async fn assemble_zip(
        &self,
        request: &Request,
        compression: CompressionLevel,
    ) -> Result<Vec<u8>> {
        let writer = ZipArchiveWriter::new(compression, self.timestamp);
        self.assemble(request, writer).await
    }

    /// Produce the named entry for one output file.
    pub async fn assemble_file<'r>(
        &self,
        spec: &'r OutputFileSpec,
        lookup: &mut DocumentLookup<'r, S>,
        names: &mut FilenameResolver,
    ) -> Result<ArchiveEntry>
    where
        'a: 'r,
    {
        let plan = FilePlan::new(spec, lookup)?;
        let filename = names.resolve(&spec.suffix, &plan.extension);
        let content = plan.render(lookup, &self.engine).await?;

        Ok(ArchiveEntry { filename, content })
    }
}
