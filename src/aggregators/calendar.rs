//! Trip counts by start hour and by start month.

use super::types::{HourlyCounts, MonthlyCounts};
use super::{Aggregator, admits};
use crate::record::{CanonicalRecord, UserType};

#[derive(Debug, Clone)]
pub struct HourlyAggregator {
    filter: Option<UserType>,
    counts: [u64; 24],
}

impl HourlyAggregator {
    pub fn new(filter: Option<UserType>) -> Self {
        Self {
            filter,
            counts: [0; 24],
        }
    }
}

impl Aggregator for HourlyAggregator {
    type Output = HourlyCounts;

    fn update(&mut self, record: &CanonicalRecord) {
        if !admits(self.filter, record) {
            return;
        }
        if let Some(slot) = self.counts.get_mut(record.hour as usize) {
            *slot += 1;
        }
    }

    fn finish(&self) -> HourlyCounts {
        HourlyCounts {
            counts: self.counts,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonthlyAggregator {
    filter: Option<UserType>,
    counts: [u64; 12],
}

impl MonthlyAggregator {
    pub fn new(filter: Option<UserType>) -> Self {
        Self {
            filter,
            counts: [0; 12],
        }
    }
}

impl Aggregator for MonthlyAggregator {
    type Output = MonthlyCounts;

    fn update(&mut self, record: &CanonicalRecord) {
        if !admits(self.filter, record) {
            return;
        }
        let slot = (record.month as usize)
            .checked_sub(1)
            .and_then(|i| self.counts.get_mut(i));
        if let Some(slot) = slot {
            *slot += 1;
        }
    }

    fn finish(&self) -> MonthlyCounts {
        MonthlyCounts {
            counts: self.counts,
        }
    }
}
