use super::types::UserTypeDurations;
use super::{Accumulator, Aggregator};
use crate::record::{CanonicalRecord, UserType};

/// Mean trip length per user type, optionally over long trips only.
#[derive(Debug, Clone, Default)]
pub struct UserTypeDurationAggregator {
    min_duration: Option<f64>,
    groups: [Accumulator; 2],
}

impl UserTypeDurationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts only trips strictly longer than `minutes`.
    pub fn longer_than(minutes: f64) -> Self {
        Self {
            min_duration: Some(minutes),
            ..Self::default()
        }
    }
}

impl Aggregator for UserTypeDurationAggregator {
    type Output = UserTypeDurations;

    fn update(&mut self, record: &CanonicalRecord) {
        if self.min_duration.is_some_and(|min| record.duration <= min) {
            return;
        }
        self.groups[record.user_type.index()].add(record.duration);
    }

    fn finish(&self) -> UserTypeDurations {
        UserTypeDurations {
            min_duration: self.min_duration,
            subscriber: self.groups[UserType::Subscriber.index()].into(),
            customer: self.groups[UserType::Customer.index()].into(),
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
    fn test_means_per_user_type() {
        let records = vec![
            trip(10.0, DayOfWeek::Monday, UserType::Subscriber),
            trip(14.0, DayOfWeek::Monday, UserType::Subscriber),
            trip(40.0, DayOfWeek::Sunday, UserType::Customer),
        ];
        let durations = aggregate(&records, UserTypeDurationAggregator::new());

        assert_eq!(durations.mean(UserType::Subscriber), Some(12.0));
        assert_eq!(durations.mean(UserType::Customer), Some(40.0));
        assert_eq!(durations.subscriber.trips, 2);
    }

    #[test]
    fn test_missing_group_is_undefined() {
        let records = vec![trip(10.0, DayOfWeek::Monday, UserType::Subscriber)];
        let durations = aggregate(&records, UserTypeDurationAggregator::new());

        assert_eq!(durations.mean(UserType::Customer), None);
        assert_eq!(durations.customer.trips, 0);
    }

    #[test]
    fn test_long_trip_filter() {
        let records = vec![
            trip(10.0, DayOfWeek::Monday, UserType::Subscriber),
            trip(50.0, DayOfWeek::Monday, UserType::Subscriber),
            trip(30.0, DayOfWeek::Monday, UserType::Customer),
        ];
        let durations = aggregate(&records, UserTypeDurationAggregator::longer_than(30.0));

        assert_eq!(durations.mean(UserType::Subscriber), Some(50.0));
        assert_eq!(durations.mean(UserType::Customer), None);
        assert_eq!(durations.min_duration, Some(30.0));
    }
}
