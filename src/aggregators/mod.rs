//! Single-pass streaming statistics over canonical records.
//!
//! Every aggregator owns only its running state (sums and counts over a
//! fixed key set) and never buffers records. Several aggregators can be fed
//! the same record stream side by side; none of them share state.

pub mod calendar;
pub mod histogram;
pub mod trip_count;
pub mod trip_length;
pub mod types;
pub mod user_type_duration;
pub mod utility;
pub mod weekday;

pub use calendar::{HourlyAggregator, MonthlyAggregator};
pub use histogram::DurationHistogram;
pub use trip_count::TripCountAggregator;
pub use trip_length::TripLengthAggregator;
pub use user_type_duration::UserTypeDurationAggregator;
pub use weekday::{DayOrder, WeekdayAggregator};

use crate::record::{CanonicalRecord, UserType};

/// A streaming reducer producing one statistic.
pub trait Aggregator {
    type Output;

    fn update(&mut self, record: &CanonicalRecord);

    fn finish(&self) -> Self::Output;
}

/// Runs `aggregator` over `records` in a single pass.
pub fn aggregate<'a, A, I>(records: I, mut aggregator: A) -> A::Output
where
    A: Aggregator,
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    for record in records {
        aggregator.update(record);
    }
    aggregator.finish()
}

/// Running sum and count for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    pub sum: f64,
    pub count: u64,
}

impl Accumulator {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// `None` for an empty group.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// `true` when `record` belongs to the group selected by `filter` (`None` = all).
pub(crate) fn admits(filter: Option<UserType>, record: &CanonicalRecord) -> bool {
    filter.is_none_or(|user_type| record.user_type == user_type)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_mean_undefined_when_empty() {
        let mut acc = Accumulator::default();
        assert_eq!(acc.mean(), None);

        acc.add(10.0);
        acc.add(20.0);
        assert_eq!(acc.mean(), Some(15.0));
    }
}
