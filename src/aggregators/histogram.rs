use super::types::HistogramCounts;
use super::{Aggregator, admits};
use crate::error::StatsError;
use crate::record::{CanonicalRecord, UserType};

pub const DEFAULT_BIN_WIDTH: f64 = 5.0;
pub const DEFAULT_MAX_MINUTES: f64 = 75.0;

// Keeps state bounded by a small fixed key set.
const MAX_BINS: usize = 10_000;

/// Counts trip durations in fixed-width bins; longer trips go to `overflow`.
#[derive(Debug, Clone)]
pub struct DurationHistogram {
    filter: Option<UserType>,
    bin_width: f64,
    max: f64,
    bins: Vec<u64>,
    overflow: u64,
}

impl DurationHistogram {
    /// # Errors
    ///
    /// [`StatsError::InvalidBins`] unless `bin_width` and `max` are finite and
    /// positive and yield at most 10 000 bins.
    pub fn new(bin_width: f64, max: f64, filter: Option<UserType>) -> Result<Self, StatsError> {
        let invalid = || StatsError::InvalidBins {
            width: bin_width,
            max,
        };
        if !(bin_width.is_finite() && max.is_finite() && bin_width > 0.0 && max > 0.0) {
            return Err(invalid());
        }
        let n_bins = (max / bin_width).ceil();
        if !(1.0..=MAX_BINS as f64).contains(&n_bins) {
            return Err(invalid());
        }

        Ok(Self {
            filter,
            bin_width,
            max,
            bins: vec![0; n_bins as usize],
            overflow: 0,
        })
    }
}

impl Aggregator for DurationHistogram {
    type Output = HistogramCounts;

    fn update(&mut self, record: &CanonicalRecord) {
        if !admits(self.filter, record) || record.duration < 0.0 {
            return;
        }
        if record.duration >= self.max {
            self.overflow += 1;
            return;
        }
        let i = ((record.duration / self.bin_width) as usize).min(self.bins.len() - 1);
        self.bins[i] += 1;
    }

    fn finish(&self) -> HistogramCounts {
        HistogramCounts {
            bin_width: self.bin_width,
            max: self.max,
            bins: self.bins.clone(),
            overflow: self.overflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregators::aggregate;
    use crate::aggregators::test_support::trip;
    use crate::record::DayOfWeek;

    #[test]
    fn test_binning_and_overflow() {
        let records: Vec<_> = [0.0, 4.99, 5.0, 74.9, 75.0, 200.0]
            .iter()
            .map(|&d| trip(d, DayOfWeek::Monday, UserType::Customer))
            .collect();
        let histogram =
            DurationHistogram::new(DEFAULT_BIN_WIDTH, DEFAULT_MAX_MINUTES, None).unwrap();
        let counts = aggregate(&records, histogram);

        assert_eq!(counts.bins.len(), 15);
        assert_eq!(counts.bins[0], 2);
        assert_eq!(counts.bins[1], 1);
        assert_eq!(counts.bins[14], 1);
        assert_eq!(counts.overflow, 2);
        assert_eq!(counts.lower_edges()[3], 15.0);
    }

    #[test]
    fn test_uneven_upper_bound_gets_partial_last_bin() {
        let histogram = DurationHistogram::new(10.0, 25.0, None).unwrap();
        let records = vec![trip(24.0, DayOfWeek::Monday, UserType::Subscriber)];
        let counts = aggregate(&records, histogram);

        assert_eq!(counts.bins, vec![0, 0, 1]);
    }

    #[test]
    fn test_invalid_bins() {
        assert!(DurationHistogram::new(0.0, 75.0, None).is_err());
        assert!(DurationHistogram::new(5.0, -1.0, None).is_err());
        assert!(DurationHistogram::new(f64::NAN, 75.0, None).is_err());
        assert!(DurationHistogram::new(1e-9, 75.0, None).is_err());
    }
}
