//! CSV reader for raw operator exports.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::rc::Rc;
use tracing::debug;

use crate::record::RawRecord;

/// Opens `path` for reading, decompressing on the fly when it ends in `.gz`.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    let gzip = path.extension().and_then(|e| e.to_str()) == Some("gz");
    debug!(path = %path.display(), gzip, "Opened input");

    Ok(if gzip {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}

/// Streams [`RawRecord`]s out of a headered CSV source.
pub struct RawReader<R> {
    reader: csv::Reader<R>,
    headers: Rc<StringRecord>,
}

impl<R: Read> RawReader<R> {
    /// Reads the header row. Surrounding whitespace in header names is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the header row cannot be read.
    pub fn from_reader(source: R) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::Headers)
            .from_reader(source);
        let headers = Rc::new(reader.headers()?.clone());
        Ok(Self { reader, headers })
    }

    /// Yields one record per data row, in file order.
    pub fn into_records(self) -> impl Iterator<Item = Result<RawRecord, csv::Error>> {
        let headers = self.headers;
        self.reader
            .into_records()
            .map(move |row| row.map(|values| RawRecord::new(Rc::clone(&headers), values)))
    }
}

impl RawReader<Box<dyn Read>> {
    pub fn open(path: &Path) -> Result<Self> {
        let input = open_input(path)?;
        RawReader::from_reader(input)
            .with_context(|| format!("failed to read header row of '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_trimmed() {
        let data = "Duration (ms) , Start date,Member Type\n427387,3/31/2016 22:57,Registered\n";
        let reader = RawReader::from_reader(data.as_bytes()).unwrap();

        let rows: Vec<_> = reader.into_records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Duration (ms)"), Some("427387"));
        assert_eq!(rows[0].get("Start date"), Some("3/31/2016 22:57"));
    }

    #[test]
    fn test_short_row_is_a_read_error() {
        let data = "tripduration,starttime,usertype\n839,1/1/2016 00:09:55\n";
        let reader = RawReader::from_reader(data.as_bytes()).unwrap();
        let rows: Vec<_> = reader.into_records().collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_err());
    }

    #[test]
    fn test_quoted_fields_keep_commas() {
        let data = "tripduration,start station name,usertype\n839,\"Broadway, W 60 St\",Customer\n";
        let reader = RawReader::from_reader(data.as_bytes()).unwrap();
        let row = reader.into_records().next().unwrap().unwrap();
        assert_eq!(row.get("start station name"), Some("Broadway, W 60 St"));
    }
}
