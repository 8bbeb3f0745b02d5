//! CLI entry point for the bike-share statistics tool.
//!
//! Provides subcommands for converting operator exports into canonical
//! records, reporting statistics over a canonical file, and comparing every
//! city listed in a manifest.

use anyhow::Result;
use bikeshare_stats::{
    aggregators::DayOrder,
    canonicalize::{Canonicalizer, ErrorPolicy, canonicalize_to_writer},
    config::CityManifest,
    output::{create_canonical, print_json, print_pretty},
    parser::RawReader,
    record::UserType,
    report::{ReportOptions, compare, summarize_canonical},
    sources::SourceFormat,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_stats")]
#[command(about = "Normalize bike-share trip exports and compare ridership", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a raw operator export into canonical CSV
    Canonicalize {
        /// Raw CSV export (may be .gz)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Source layout of the export
        #[arg(short, long, value_enum)]
        format: SourceFormat,

        /// Canonical CSV to write
        #[arg(short, long)]
        output: PathBuf,

        /// Gzip compress the canonical output
        #[arg(long, default_value_t = false)]
        gzip: bool,

        #[arg(long, value_enum, default_value_t = ErrorPolicy::Abort)]
        on_error: ErrorPolicy,
    },
    /// Report statistics over a canonical CSV file
    Report {
        /// Canonical CSV (may be .gz)
        #[arg(value_name = "CANONICAL")]
        input: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },
    /// Report every city of a manifest side by side, straight from raw exports
    Compare {
        /// JSON manifest mapping city names to { format, path }
        #[arg(short, long, default_value = "cities.json")]
        manifest: PathBuf,

        #[command(flatten)]
        report: ReportArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WeekStart {
    Monday,
    Sunday,
}

#[derive(Args)]
struct ReportArgs {
    /// Minutes above which a trip counts as long
    #[arg(short, long, default_value_t = 30.0, value_parser = finite_minutes)]
    threshold: f64,

    /// Restrict weekday, hourly, monthly and histogram breakdowns to one user type
    #[arg(short, long, value_enum)]
    user_type: Option<UserType>,

    /// Per-user-type means over trips longer than this many minutes only
    #[arg(long, value_parser = finite_minutes)]
    long_trips: Option<f64>,

    /// First day of the weekday vectors
    #[arg(long, value_enum, default_value_t = WeekStart::Sunday)]
    day_order: WeekStart,

    /// Correlate Subscriber and Customer weekday counts
    #[arg(long, default_value_t = false)]
    correlate: bool,

    /// Histogram bin width in minutes
    #[arg(long, default_value_t = 5.0, value_parser = finite_minutes)]
    bin_width: f64,

    /// Histogram upper bound in minutes
    #[arg(long, default_value_t = 75.0, value_parser = finite_minutes)]
    histogram_max: f64,

    /// Print JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    #[arg(long, value_enum, default_value_t = ErrorPolicy::Abort)]
    on_error: ErrorPolicy,
}

/// Parses a minute count, refusing NaN and infinities.
fn finite_minutes(s: &str) -> Result<f64, String> {
    let minutes: f64 = s.parse().map_err(|e| format!("not a number: {e}"))?;
    if minutes.is_finite() {
        Ok(minutes)
    } else {
        Err(format!("'{s}' is not a finite number of minutes"))
    }
}

impl ReportArgs {
    fn options(&self) -> ReportOptions {
        ReportOptions {
            threshold: self.threshold,
            user_type: self.user_type,
            long_trip_minutes: self.long_trips,
            day_order: match self.day_order {
                WeekStart::Monday => DayOrder::monday_first(),
                WeekStart::Sunday => DayOrder::sunday_first(),
            },
            correlate: self.correlate,
            bin_width: self.bin_width,
            histogram_max: self.histogram_max,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bikeshare_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Canonicalize {
            input,
            format,
            output,
            gzip,
            on_error,
        } => {
            canonicalize_file(&input, format, &output, gzip, on_error)?;
        }
        Commands::Report { input, report } => {
            let city = summarize_canonical(&input, report.on_error, &report.options())?;
            print_pretty(&city);
            if report.json {
                print_json(&city)?;
            } else {
                print!("{city}");
            }
        }
        Commands::Compare { manifest, report } => {
            let manifest = CityManifest::load(&manifest)?;
            info!(cities = manifest.len(), "Manifest loaded");

            let comparison = compare(&manifest, report.on_error, &report.options())?;
            if report.json {
                print_json(&comparison)?;
            } else {
                print!("{comparison}");
            }
        }
    }

    Ok(())
}

/// Streams a raw export through its field mapper into a canonical file.
#[tracing::instrument(
    skip(input, output),
    fields(input = %input.display(), output = %output.display())
)]
fn canonicalize_file(
    input: &Path,
    format: SourceFormat,
    output: &Path,
    gzip: bool,
    policy: ErrorPolicy,
) -> Result<()> {
    let reader = RawReader::open(input)?;
    let records = Canonicalizer::new(reader.into_records(), format);

    let mut writer = create_canonical(output, gzip)?;
    let summary = canonicalize_to_writer(records, policy, &mut writer)?;
    writer.finish()?.close()?;

    info!(
        written = summary.written,
        skipped = summary.skipped,
        "Canonical file written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_options_reject_non_finite_values() {
        assert_eq!(finite_minutes("12.5"), Ok(12.5));
        for bad in ["NaN", "inf", "-infinity", "ten"] {
            assert!(finite_minutes(bad).is_err(), "{bad}");
        }

        let args = ["bss", "report", "trips.csv", "--threshold", "NaN"];
        assert!(Cli::try_parse_from(args).is_err());
        let args = ["bss", "report", "trips.csv", "--bin-width", "2.5"];
        assert!(Cli::try_parse_from(args).is_ok());
    }
}
