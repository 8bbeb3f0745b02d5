//! Per-weekday duration and count breakdown.
//!
//! State is a fixed `[Accumulator; 7]` indexed by [`DayOfWeek`], so every
//! weekday is present in the result even when no trip fell on it. The order
//! of the output vectors is chosen by the caller through [`DayOrder`], which
//! keeps vectors from independent runs aligned position by position.

use serde::Serialize;

use super::{Accumulator, Aggregator, admits};
use crate::error::StatsError;
use crate::record::{CanonicalRecord, DayOfWeek, UserType};

/// A permutation of the seven weekdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayOrder([DayOfWeek; 7]);

impl DayOrder {
    /// # Errors
    ///
    /// [`StatsError::InvalidDayOrder`] unless each weekday appears exactly once.
    pub fn new(days: [DayOfWeek; 7]) -> Result<Self, StatsError> {
        let mut seen = [false; 7];
        for day in days {
            if std::mem::replace(&mut seen[day.index()], true) {
                return Err(StatsError::InvalidDayOrder);
            }
        }
        Ok(Self(days))
    }

    pub fn monday_first() -> Self {
        Self(DayOfWeek::ALL)
    }

    pub fn sunday_first() -> Self {
        let mut days = DayOfWeek::ALL;
        days.rotate_right(1);
        Self(days)
    }

    pub fn days(&self) -> &[DayOfWeek; 7] {
        &self.0
    }
}

impl Default for DayOrder {
    fn default() -> Self {
        Self::sunday_first()
    }
}

/// Accumulates duration sums and trip counts per weekday.
#[derive(Debug, Clone, Default)]
pub struct WeekdayAggregator {
    filter: Option<UserType>,
    days: [Accumulator; 7],
}

impl WeekdayAggregator {
    /// `filter = None` counts every user type.
    pub fn new(filter: Option<UserType>) -> Self {
        Self {
            filter,
            days: [Accumulator::default(); 7],
        }
    }
}

impl Aggregator for WeekdayAggregator {
    type Output = WeekdayBreakdown;

    fn update(&mut self, record: &CanonicalRecord) {
        if admits(self.filter, record) {
            self.days[record.day_of_week.index()].add(record.duration);
        }
    }

    fn finish(&self) -> WeekdayBreakdown {
        WeekdayBreakdown {
            filter: self.filter,
            days: self.days,
        }
    }
}

/// Result of a [`WeekdayAggregator`] pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekdayBreakdown {
    pub filter: Option<UserType>,
    days: [Accumulator; 7],
}

impl WeekdayBreakdown {
    pub fn get(&self, day: DayOfWeek) -> Accumulator {
        self.days[day.index()]
    }

    /// Trip count per weekday, in `order`.
    pub fn counts(&self, order: &DayOrder) -> Vec<u64> {
        order.days().iter().map(|d| self.get(*d).count).collect()
    }

    /// Mean duration per weekday, in `order`; `None` for days without trips.
    pub fn mean_durations(&self, order: &DayOrder) -> Vec<Option<f64>> {
        order.days().iter().map(|d| self.get(*d).mean()).collect()
    }
}
