//! Result types produced by the aggregators.

use serde::Serialize;

use super::Accumulator;
use crate::record::UserType;

/// Trips per user type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TripCounts {
    pub subscribers: u64,
    pub customers: u64,
    pub total: u64,
}

impl TripCounts {
    pub fn get(&self, user_type: UserType) -> u64 {
        match user_type {
            UserType::Subscriber => self.subscribers,
            UserType::Customer => self.customers,
        }
    }

    /// Subscribers per customer; `None` when there are no customers.
    pub fn subscriber_customer_ratio(&self) -> Option<f64> {
        (self.customers > 0).then(|| self.subscribers as f64 / self.customers as f64)
    }

    /// Share of all trips taken by `user_type`; `None` when there are no trips.
    pub fn proportion(&self, user_type: UserType) -> Option<f64> {
        (self.total > 0).then(|| self.get(user_type) as f64 / self.total as f64)
    }
}

/// Mean trip length and share of long trips, both rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripLengthSummary {
    pub threshold_minutes: f64,
    pub trips: u64,
    pub mean_minutes: Option<f64>,
    pub percent_over_threshold: Option<f64>,
}

/// Trip count and mean duration of one user type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GroupMean {
    pub trips: u64,
    pub mean_minutes: Option<f64>,
}

impl From<Accumulator> for GroupMean {
    fn from(acc: Accumulator) -> Self {
        Self {
            trips: acc.count,
            mean_minutes: acc.mean(),
        }
    }
}

/// Mean trip length per user type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UserTypeDurations {
    /// Only trips strictly longer than this were counted, when set.
    pub min_duration: Option<f64>,
    pub subscriber: GroupMean,
    pub customer: GroupMean,
}

impl UserTypeDurations {
    pub fn get(&self, user_type: UserType) -> GroupMean {
        match user_type {
            UserType::Subscriber => self.subscriber,
            UserType::Customer => self.customer,
        }
    }

    pub fn mean(&self, user_type: UserType) -> Option<f64> {
        self.get(user_type).mean_minutes
    }
}

/// Trips started in each hour of the day, index 0 = midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyCounts {
    pub counts: [u64; 24],
}

impl HourlyCounts {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Busiest hour, earliest on ties; `None` with no trips.
    pub fn peak_hour(&self) -> Option<u32> {
        peak(&self.counts).map(|i| i as u32)
    }
}

/// Trips started in each month, index 0 = January.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCounts {
    pub counts: [u64; 12],
}

impl MonthlyCounts {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Busiest month as 1–12, earliest on ties; `None` with no trips.
    pub fn peak_month(&self) -> Option<u32> {
        peak(&self.counts).map(|i| i as u32 + 1)
    }
}

fn peak(counts: &[u64]) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (i, &count) in counts.iter().enumerate() {
        if count > 0 && best.is_none_or(|(_, top)| count > top) {
            best = Some((i, count));
        }
    }
    best.map(|(i, _)| i)
}

/// Trip-duration distribution in fixed-width bins over `[0, max)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramCounts {
    pub bin_width: f64,
    pub max: f64,
    pub bins: Vec<u64>,
    /// Trips of `max` minutes or longer.
    pub overflow: u64,
}

impl HistogramCounts {
    /// Lower edge of every bin, in minutes.
    pub fn lower_edges(&self) -> Vec<f64> {
        (0..self.bins.len())
            .map(|i| i as f64 * self.bin_width)
            .collect()
    }
}
