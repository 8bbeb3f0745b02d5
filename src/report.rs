//! Named statistics per city.
//!
//! A report runs every aggregator over one canonical stream in a single
//! fused pass. Each aggregator keeps its own state; the records are only
//! read. Results are assembled once the pass has finished.

use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::aggregators::histogram::{DEFAULT_BIN_WIDTH, DEFAULT_MAX_MINUTES};
use crate::aggregators::trip_length::DEFAULT_THRESHOLD_MINUTES;
use crate::aggregators::types::{
    HistogramCounts, HourlyCounts, MonthlyCounts, TripCounts, TripLengthSummary, UserTypeDurations,
};
use crate::aggregators::utility::pearson;
use crate::aggregators::weekday::WeekdayBreakdown;
use crate::aggregators::{
    Aggregator, DayOrder, DurationHistogram, HourlyAggregator, MonthlyAggregator,
    TripCountAggregator, TripLengthAggregator, UserTypeDurationAggregator, WeekdayAggregator,
};
use crate::canonicalize::{Canonicalizer, ErrorPolicy};
use crate::config::CityManifest;
use crate::error::{RecordError, StatsError};
use crate::output::read_canonical;
use crate::parser::RawReader;
use crate::record::{CanonicalRecord, DayOfWeek, UserType};
use crate::sources::SourceFormat;

/// Knobs for a report run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Minutes above which a trip counts as long.
    pub threshold: f64,
    /// Restricts the weekday, hourly, monthly, and histogram breakdowns.
    pub user_type: Option<UserType>,
    /// Per-user-type means consider only trips longer than this, when set.
    pub long_trip_minutes: Option<f64>,
    pub day_order: DayOrder,
    /// Correlate Subscriber and Customer weekday counts.
    pub correlate: bool,
    pub bin_width: f64,
    pub histogram_max: f64,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD_MINUTES,
            user_type: None,
            long_trip_minutes: None,
            day_order: DayOrder::default(),
            correlate: false,
            bin_width: DEFAULT_BIN_WIDTH,
            histogram_max: DEFAULT_MAX_MINUTES,
        }
    }
}

/// Trip counts with the derived shares.
#[derive(Debug, Clone, Serialize)]
pub struct TripCountReport {
    #[serde(flatten)]
    pub counts: TripCounts,
    pub subscriber_proportion: Option<f64>,
    pub customer_proportion: Option<f64>,
    pub subscriber_customer_ratio: Option<f64>,
}

impl From<TripCounts> for TripCountReport {
    fn from(counts: TripCounts) -> Self {
        Self {
            counts,
            subscriber_proportion: counts.proportion(UserType::Subscriber),
            customer_proportion: counts.proportion(UserType::Customer),
            subscriber_customer_ratio: counts.subscriber_customer_ratio(),
        }
    }
}

/// Weekday vectors laid out in the requested day order.
#[derive(Debug, Clone, Serialize)]
pub struct WeekdayReport {
    pub user_type: Option<UserType>,
    pub days: Vec<DayOfWeek>,
    pub counts: Vec<u64>,
    pub mean_minutes: Vec<Option<f64>>,
}

impl WeekdayReport {
    pub fn new(breakdown: &WeekdayBreakdown, order: &DayOrder) -> Self {
        Self {
            user_type: breakdown.filter,
            days: order.days().to_vec(),
            counts: breakdown.counts(order),
            mean_minutes: breakdown.mean_durations(order),
        }
    }
}

/// Subscriber vs Customer weekday counts and their Pearson correlation.
#[derive(Debug, Clone, Serialize)]
pub struct WeekdayCorrelation {
    pub days: Vec<DayOfWeek>,
    pub subscriber_counts: Vec<u64>,
    pub customer_counts: Vec<u64>,
    /// `None` when either group has the same count every day.
    pub coefficient: Option<f64>,
}

/// Every statistic for one city or canonical file.
#[derive(Debug, Clone, Serialize)]
pub struct CityReport {
    pub label: String,
    pub skipped: u64,
    pub trip_counts: TripCountReport,
    pub trip_length: TripLengthSummary,
    pub user_type_durations: UserTypeDurations,
    pub weekday: WeekdayReport,
    /// Subscriber then Customer, regardless of the user-type filter.
    pub weekday_by_user_type: Vec<WeekdayReport>,
    pub hourly: HourlyCounts,
    pub monthly: MonthlyCounts,
    pub duration_histogram: HistogramCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday_correlation: Option<WeekdayCorrelation>,
}

/// The aggregators of one report, each owning its own state.
struct ReportPass {
    trip_counts: TripCountAggregator,
    trip_length: TripLengthAggregator,
    user_type_durations: UserTypeDurationAggregator,
    weekday: WeekdayAggregator,
    per_user_type: [WeekdayAggregator; 2],
    correlate: bool,
    hourly: HourlyAggregator,
    monthly: MonthlyAggregator,
    histogram: DurationHistogram,
}

fn check_minutes(name: &'static str, minutes: f64) -> Result<(), StatsError> {
    if minutes.is_finite() {
        Ok(())
    } else {
        Err(StatsError::InvalidMinutes { name, minutes })
    }
}

impl ReportPass {
    fn new(options: &ReportOptions) -> Result<Self, StatsError> {
        check_minutes("threshold", options.threshold)?;
        if let Some(minutes) = options.long_trip_minutes {
            check_minutes("long-trip minimum", minutes)?;
        }
        let filter = options.user_type;
        Ok(Self {
            trip_counts: TripCountAggregator::new(),
            trip_length: TripLengthAggregator::new(options.threshold),
            user_type_durations: match options.long_trip_minutes {
                Some(minutes) => UserTypeDurationAggregator::longer_than(minutes),
                None => UserTypeDurationAggregator::new(),
            },
            weekday: WeekdayAggregator::new(filter),
            per_user_type: UserType::ALL.map(|user_type| WeekdayAggregator::new(Some(user_type))),
            correlate: options.correlate,
            hourly: HourlyAggregator::new(filter),
            monthly: MonthlyAggregator::new(filter),
            histogram: DurationHistogram::new(options.bin_width, options.histogram_max, filter)?,
        })
    }

    fn update(&mut self, record: &CanonicalRecord) {
        self.trip_counts.update(record);
        self.trip_length.update(record);
        self.user_type_durations.update(record);
        self.weekday.update(record);
        for group in &mut self.per_user_type {
            group.update(record);
        }
        self.hourly.update(record);
        self.monthly.update(record);
        self.histogram.update(record);
    }

    fn finish(&self, label: &str, skipped: u64, order: &DayOrder) -> CityReport {
        let [subscribers, customers] = self.per_user_type.each_ref().map(|group| group.finish());
        CityReport {
            label: label.to_string(),
            skipped,
            trip_counts: self.trip_counts.finish().into(),
            trip_length: self.trip_length.finish(),
            user_type_durations: self.user_type_durations.finish(),
            weekday: WeekdayReport::new(&self.weekday.finish(), order),
            weekday_by_user_type: vec![
                WeekdayReport::new(&subscribers, order),
                WeekdayReport::new(&customers, order),
            ],
            hourly: self.hourly.finish(),
            monthly: self.monthly.finish(),
            duration_histogram: self.histogram.finish(),
            weekday_correlation: self
                .correlate
                .then(|| weekday_correlation(&subscribers, &customers, order)),
        }
    }
}

fn weekday_correlation(
    subscribers: &WeekdayBreakdown,
    customers: &WeekdayBreakdown,
    order: &DayOrder,
) -> WeekdayCorrelation {
    let subscriber_counts = subscribers.counts(order);
    let customer_counts = customers.counts(order);
    let as_f64 = |counts: &[u64]| counts.iter().map(|&c| c as f64).collect::<Vec<_>>();

    let coefficient = match pearson(&as_f64(&subscriber_counts), &as_f64(&customer_counts)) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!(error = %e, "Weekday correlation undefined");
            None
        }
    };

    WeekdayCorrelation {
        days: order.days().to_vec(),
        subscriber_counts,
        customer_counts,
        coefficient,
    }
}

/// Computes every statistic over `records` in one pass.
///
/// # Errors
///
/// Fails on invalid histogram options or on a record error the policy does
/// not skip.
#[tracing::instrument(skip(records, options))]
pub fn summarize<I>(
    label: &str,
    records: I,
    policy: ErrorPolicy,
    options: &ReportOptions,
) -> Result<CityReport>
where
    I: Iterator<Item = Result<CanonicalRecord, RecordError>>,
{
    let mut pass = ReportPass::new(options)?;
    let mut skipped = 0;

    for result in records {
        match policy.handle(result)? {
            Some(record) => pass.update(&record),
            None => skipped += 1,
        }
    }

    let report = pass.finish(label, skipped, &options.day_order);
    info!(
        trips = report.trip_counts.counts.total,
        skipped, "Report complete"
    );
    Ok(report)
}

/// Report over a canonical CSV file.
pub fn summarize_canonical(
    path: &Path,
    policy: ErrorPolicy,
    options: &ReportOptions,
) -> Result<CityReport> {
    let records = read_canonical(path)?;
    summarize(&path.display().to_string(), records, policy, options)
}

/// Report straight from a raw operator export, canonicalizing on the fly.
pub fn summarize_raw(
    label: &str,
    path: &Path,
    format: SourceFormat,
    policy: ErrorPolicy,
    options: &ReportOptions,
) -> Result<CityReport> {
    let reader = RawReader::open(path)?;
    let records = Canonicalizer::new(reader.into_records(), format);
    summarize(label, records, policy, options)
        .with_context(|| format!("failed to summarize {label} ({})", path.display()))
}

/// One statistic over a canonical CSV file.
///
/// # Errors
///
/// Fails when the file cannot be read or on a record error the policy does
/// not skip.
pub fn query_canonical<A: Aggregator>(
    path: &Path,
    mut aggregator: A,
    policy: ErrorPolicy,
) -> Result<A::Output> {
    for result in read_canonical(path)? {
        if let Some(record) = policy.handle(result)? {
            aggregator.update(&record);
        }
    }
    Ok(aggregator.finish())
}

/// Side-by-side reports for every city of a manifest.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub cities: Vec<CityReport>,
    /// City whose trips are most often taken by subscribers.
    pub highest_subscriber_share: Option<String>,
    /// City with the longest mean trip.
    pub longest_mean_trip: Option<String>,
}

#[tracing::instrument(skip_all, fields(cities = manifest.len()))]
pub fn compare(
    manifest: &CityManifest,
    policy: ErrorPolicy,
    options: &ReportOptions,
) -> Result<Comparison> {
    ensure!(!manifest.is_empty(), "manifest lists no cities");

    let cities = manifest
        .iter()
        .map(|(city, source)| summarize_raw(city, &source.path, source.format, policy, options))
        .collect::<Result<Vec<_>>>()?;

    let highest_subscriber_share = leader(&cities, |r| r.trip_counts.subscriber_proportion);
    let longest_mean_trip = leader(&cities, |r| r.trip_length.mean_minutes);

    Ok(Comparison {
        cities,
        highest_subscriber_share,
        longest_mean_trip,
    })
}

/// Label of the report with the largest defined `value`. On a tie the
/// earlier report wins, so manifest comparisons favour the first city name.
fn leader(cities: &[CityReport], value: impl Fn(&CityReport) -> Option<f64>) -> Option<String> {
    let mut best: Option<(&CityReport, f64)> = None;
    for (report, v) in cities.iter().filter_map(|r| value(r).map(|v| (r, v))) {
        if best.is_none_or(|(_, top)| v > top) {
            best = Some((report, v));
        }
    }
    best.map(|(report, _)| report.label.clone())
}
