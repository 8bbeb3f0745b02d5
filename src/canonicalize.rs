//! Raw stream → canonical stream.
//!
//! [`Canonicalizer`] maps every raw record through the field mapper of the
//! stream's declared format and yields one result per input record, in
//! order. It never drops or patches a record; [`ErrorPolicy`] decides what
//! the caller does with a failure.

use anyhow::Result;
use std::io::Write;
use tracing::{info, warn};

use crate::error::RecordError;
use crate::output::CanonicalWriter;
use crate::record::{CanonicalRecord, RawRecord};
use crate::sources::{FieldMapper, SourceFormat};

/// What to do with a record that fails to map or read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorPolicy {
    /// Stop at the first bad record.
    #[default]
    Abort,
    /// Log a warning and carry on without the record.
    Skip,
}

impl ErrorPolicy {
    /// Returns `Ok(None)` for a record skipped under [`ErrorPolicy::Skip`].
    ///
    /// I/O failures are returned under either policy.
    pub fn handle(
        self,
        result: Result<CanonicalRecord, RecordError>,
    ) -> Result<Option<CanonicalRecord>, RecordError> {
        match result {
            Ok(record) => Ok(Some(record)),
            Err(e) if self == ErrorPolicy::Skip && !e.is_fatal() => {
                warn!(index = e.index(), error = %e, "Skipping malformed record");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Iterator adapter producing canonical records from raw ones.
pub struct Canonicalizer<I> {
    records: I,
    mapper: &'static dyn FieldMapper,
    index: u64,
}

impl<I> Canonicalizer<I>
where
    I: Iterator<Item = Result<RawRecord, csv::Error>>,
{
    /// The mapper is resolved once here, not per record.
    pub fn new(records: I, format: SourceFormat) -> Self {
        Self {
            records,
            mapper: format.mapper(),
            index: 0,
        }
    }
}

impl<I> Iterator for Canonicalizer<I>
where
    I: Iterator<Item = Result<RawRecord, csv::Error>>,
{
    type Item = Result<CanonicalRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.records.next()?;
        self.index += 1;
        let index = self.index;

        Some(match raw {
            Ok(raw) => self
                .mapper
                .map(&raw)
                .map_err(|source| RecordError::Map { index, source }),
            Err(source) => Err(RecordError::Read { index, source }),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

/// Counts from one canonicalization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalizeSummary {
    pub written: u64,
    pub skipped: u64,
}

/// Streams canonical records into `writer`, applying `policy` to failures.
///
/// # Errors
///
/// Returns the first record error under [`ErrorPolicy::Abort`], any fatal
/// read error, or a write failure.
#[tracing::instrument(skip(records, writer))]
pub fn canonicalize_to_writer<I, W>(
    records: I,
    policy: ErrorPolicy,
    writer: &mut CanonicalWriter<W>,
) -> Result<CanonicalizeSummary>
where
    I: Iterator<Item = Result<CanonicalRecord, RecordError>>,
    W: Write,
{
    let mut summary = CanonicalizeSummary::default();

    for result in records {
        match policy.handle(result)? {
            Some(record) => {
                writer.write(&record)?;
                summary.written += 1;
            }
            None => summary.skipped += 1,
        }
    }

    info!(
        written = summary.written,
        skipped = summary.skipped,
        "Canonicalization complete"
    );
    Ok(summary)
}
