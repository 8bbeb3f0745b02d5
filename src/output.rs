//! Canonical record persistence and report formatting.
//!
//! Canonical files are CSV with the header
//! `duration,month,hour,day_of_week,user_type`, optionally gzip-compressed.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

use crate::error::{MapError, RecordError};
use crate::parser::open_input;
use crate::record::{CanonicalRecord, DayOfWeek, UserType};
use crate::report::{CityReport, Comparison};

pub const CANONICAL_HEADER: [&str; 5] = ["duration", "month", "hour", "day_of_week", "user_type"];

/// Writes canonical records as CSV rows, header first.
pub struct CanonicalWriter<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> CanonicalWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: WriterBuilder::new().has_headers(false).from_writer(inner),
            header_written: false,
        }
    }

    fn ensure_header(&mut self) -> Result<()> {
        if !self.header_written {
            self.writer.write_record(CANONICAL_HEADER)?;
            self.header_written = true;
        }
        Ok(())
    }

    pub fn write(&mut self, record: &CanonicalRecord) -> Result<()> {
        debug_assert!(record.is_well_formed(), "{record:?}");
        self.ensure_header()?;
        self.writer.serialize(record)?;
        Ok(())
    }

    /// Flushes everything and hands back the underlying writer. An empty
    /// stream still gets its header row.
    pub fn finish(mut self) -> Result<W> {
        self.ensure_header()?;
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush canonical output: {}", e.error()))
    }
}

/// Destination file of a canonical stream.
pub enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    /// Flushes the file, writing the gzip trailer when compressed.
    pub fn close(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut w) => w.flush(),
            Sink::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

/// Creates (or truncates) a canonical file at `path`.
pub fn create_canonical(path: &Path, gzip: bool) -> Result<CanonicalWriter<Sink>> {
    let file =
        File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?;
    debug!(path = %path.display(), gzip, "Creating canonical output");

    let file = BufWriter::new(file);
    let sink = if gzip {
        Sink::Gzip(GzEncoder::new(file, Compression::default()))
    } else {
        Sink::Plain(file)
    };
    Ok(CanonicalWriter::from_writer(sink))
}

/// One canonical CSV row whose values have not been checked yet.
#[derive(Debug, Deserialize)]
struct CanonicalRow {
    duration: String,
    month: String,
    hour: String,
    day_of_week: String,
    user_type: String,
}

fn check(row: CanonicalRow) -> Result<CanonicalRecord, MapError> {
    Ok(CanonicalRecord {
        duration: parse_field("duration", &row.duration, parse_duration)?,
        month: parse_field("month", &row.month, parse_month)?,
        hour: parse_field("hour", &row.hour, parse_hour)?,
        day_of_week: parse_field("day_of_week", &row.day_of_week, DayOfWeek::from_label)?,
        user_type: parse_field("user_type", &row.user_type, UserType::from_label)?,
    })
}

fn parse_field<T>(
    field: &'static str,
    value: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, MapError> {
    parse(value).ok_or_else(|| MapError::MalformedValue {
        field,
        value: value.to_string(),
    })
}

fn parse_duration(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}

fn parse_month(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

fn parse_hour(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|h| *h < 24)
}

/// Streams canonical records back out of CSV text. Indices are 1-based.
///
/// Out-of-range numbers and unknown labels are [`RecordError::Map`]; rows the
/// CSV reader cannot split into five fields are [`RecordError::Read`].
pub fn canonical_records<R: Read>(
    source: R,
) -> impl Iterator<Item = Result<CanonicalRecord, RecordError>> {
    ReaderBuilder::new()
        .has_headers(true)
        .from_reader(source)
        .into_deserialize::<CanonicalRow>()
        .zip(1u64..)
        .map(|(row, index)| match row {
            Ok(row) => check(row).map_err(|source| RecordError::Map { index, source }),
            Err(source) => Err(RecordError::Read { index, source }),
        })
}

/// Opens a canonical file (plain or `.gz`) for streaming.
pub fn read_canonical(
    path: &Path,
) -> Result<impl Iterator<Item = Result<CanonicalRecord, RecordError>>> {
    Ok(canonical_records(open_input(path)?))
}

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &CityReport) {
    debug!("{:#?}", report);
}

/// Prints any report value as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Two-decimal rendering that keeps "undefined" distinct from zero.
struct Stat(Option<f64>);

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.2}"),
            None => f.write_str("undefined"),
        }
    }
}

impl fmt::Display for CityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = &self.trip_counts;
        writeln!(f, "== {} ==", self.label)?;
        writeln!(
            f,
            "trips: {} (subscribers {}, customers {}), skipped {}",
            counts.counts.total, counts.counts.subscribers, counts.counts.customers, self.skipped
        )?;
        writeln!(
            f,
            "subscriber share: {}%  customer share: {}%  subscriber:customer ratio: {}",
            Stat(counts.subscriber_proportion.map(|p| p * 100.0)),
            Stat(counts.customer_proportion.map(|p| p * 100.0)),
            Stat(counts.subscriber_customer_ratio),
        )?;
        writeln!(
            f,
            "mean trip: {} min, over {} min: {}%",
            Stat(self.trip_length.mean_minutes),
            self.trip_length.threshold_minutes,
            Stat(self.trip_length.percent_over_threshold),
        )?;

        let durations = &self.user_type_durations;
        match durations.min_duration {
            Some(min) => writeln!(f, "mean trip by user type (trips over {min} min):")?,
            None => writeln!(f, "mean trip by user type:")?,
        }
        for (label, group) in [
            ("Subscriber", durations.subscriber),
            ("Customer", durations.customer),
        ] {
            writeln!(
                f,
                "  {label:<10} {} min ({} trips)",
                Stat(group.mean_minutes),
                group.trips
            )?;
        }

        match self.weekday.user_type {
            Some(user_type) => writeln!(f, "weekday ({user_type}):")?,
            None => writeln!(f, "weekday (all user types):")?,
        }
        let weekday = &self.weekday;
        let rows = weekday.counts.iter().zip(&weekday.mean_minutes);
        for (day, (count, mean)) in weekday.days.iter().zip(rows) {
            let mean = Stat(*mean);
            writeln!(f, "  {day:<10} {count:>8} trips, mean {mean} min")?;
        }

        for breakdown in &self.weekday_by_user_type {
            if let Some(user_type) = breakdown.user_type {
                let counts: Vec<_> = breakdown.counts.iter().map(u64::to_string).collect();
                writeln!(f, "  {user_type:<10} by day: {}", counts.join(" "))?;
            }
        }

        let peak = |p: Option<u32>| p.map_or_else(|| "undefined".to_string(), |v| v.to_string());
        writeln!(
            f,
            "busiest hour: {}, busiest month: {}",
            peak(self.hourly.peak_hour()),
            peak(self.monthly.peak_month())
        )?;

        let histogram = &self.duration_histogram;
        write!(f, "durations ({}-minute bins):", histogram.bin_width)?;
        for (lower, count) in histogram.lower_edges().iter().zip(&histogram.bins) {
            write!(f, " {lower}+:{count}")?;
        }
        writeln!(f, " {}+:{}", histogram.max, histogram.overflow)?;

        if let Some(correlation) = &self.weekday_correlation {
            writeln!(
                f,
                "weekday correlation (Subscriber vs Customer): {}",
                Stat(correlation.coefficient)
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.cities {
            writeln!(f, "{report}")?;
        }
        let or_none = |city: &Option<String>| city.clone().unwrap_or_else(|| "undefined".into());
        writeln!(
            f,
            "highest subscriber share: {}",
            or_none(&self.highest_subscriber_share)
        )?;
        writeln!(f, "longest mean trip: {}", or_none(&self.longest_mean_trip))
    }
}
