use super::Aggregator;
use super::types::TripCounts;
use crate::record::{CanonicalRecord, UserType};

/// Tallies trips per user type.
#[derive(Debug, Clone, Default)]
pub struct TripCountAggregator {
    counts: [u64; 2],
}

impl TripCountAggregator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Aggregator for TripCountAggregator {
    type Output = TripCounts;

    fn update(&mut self, record: &CanonicalRecord) {
        self.counts[record.user_type.index()] += 1;
    }

    fn finish(&self) -> TripCounts {
        let subscribers = self.counts[UserType::Subscriber.index()];
        let customers = self.counts[UserType::Customer.index()];
        TripCounts {
            subscribers,
            customers,
            total: subscribers + customers,
        }
    }
}
