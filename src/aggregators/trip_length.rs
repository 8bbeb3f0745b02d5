use super::types::TripLengthSummary;
use super::utility::round2;
use super::{Accumulator, Aggregator};
use crate::record::CanonicalRecord;

/// Minutes above which a trip counts as long, unless configured otherwise.
pub const DEFAULT_THRESHOLD_MINUTES: f64 = 30.0;

/// Mean trip length and percentage of trips longer than a threshold.
#[derive(Debug, Clone)]
pub struct TripLengthAggregator {
    threshold: f64,
    all: Accumulator,
    over: u64,
}

impl TripLengthAggregator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            all: Accumulator::default(),
            over: 0,
        }
    }
}

impl Default for TripLengthAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_MINUTES)
    }
}

impl Aggregator for TripLengthAggregator {
    type Output = TripLengthSummary;

    fn update(&mut self, record: &CanonicalRecord) {
        self.all.add(record.duration);
        if record.duration > self.threshold {
            self.over += 1;
        }
    }

    fn finish(&self) -> TripLengthSummary {
        let trips = self.all.count;
        TripLengthSummary {
            threshold_minutes: self.threshold,
            trips,
            mean_minutes: self.all.mean().map(round2),
            percent_over_threshold: (trips > 0)
                .then(|| round2(self.over as f64 / trips as f64 * 100.0)),
        }
    }
}
