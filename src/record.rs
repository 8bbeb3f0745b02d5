//! Raw and canonical trip records, and the fixed label sets they use.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Normalized rider class. Every source vocabulary maps onto these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum UserType {
    /// Long-term or annual member.
    Subscriber,
    /// Short-term or casual pass holder.
    Customer,
}

impl UserType {
    pub const ALL: [UserType; 2] = [UserType::Subscriber, UserType::Customer];

    pub fn index(self) -> usize {
        match self {
            UserType::Subscriber => 0,
            UserType::Customer => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Subscriber => "Subscriber",
            UserType::Customer => "Customer",
        }
    }

    /// Inverse of [`UserType::as_str`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == label)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Calendar weekday, serialized with its full English name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All seven days, Monday first. Position matches [`DayOfWeek::index`].
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    /// Inverse of [`DayOfWeek::as_str`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|day| day.as_str() == label)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        DayOfWeek::ALL[day.num_days_from_monday() as usize]
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Month, hour, and weekday of a trip start. Seconds are not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripTime {
    pub month: u32,
    pub hour: u32,
    pub day_of_week: DayOfWeek,
}

impl TripTime {
    pub fn from_datetime(start: &NaiveDateTime) -> Self {
        Self {
            month: start.month(),
            hour: start.hour(),
            day_of_week: start.weekday().into(),
        }
    }
}

/// One trip in the unified schema. Field order is the serialized column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Trip length in minutes.
    pub duration: f64,
    pub month: u32,
    pub hour: u32,
    pub day_of_week: DayOfWeek,
    pub user_type: UserType,
}

impl CanonicalRecord {
    pub fn new(duration: f64, time: TripTime, user_type: UserType) -> Self {
        Self {
            duration,
            month: time.month,
            hour: time.hour,
            day_of_week: time.day_of_week,
            user_type,
        }
    }

    /// Checks the value ranges serde cannot express (used when re-reading files).
    pub fn is_well_formed(&self) -> bool {
        self.duration.is_finite()
            && self.duration >= 0.0
            && (1..=12).contains(&self.month)
            && self.hour < 24
    }
}

/// One line of a source export: field names in header order, with values.
///
/// The header row is shared by every record read from the same stream.
#[derive(Debug, Clone)]
pub struct RawRecord {
    headers: Rc<StringRecord>,
    values: StringRecord,
}

impl RawRecord {
    pub fn new(headers: Rc<StringRecord>, values: StringRecord) -> Self {
        Self { headers, values }
    }

    /// Builds a record from `(field, value)` pairs, keeping their order.
    #[cfg(test)]
    pub(crate) fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let headers: StringRecord = pairs.iter().map(|(k, _)| *k).collect();
        let values: StringRecord = pairs.iter().map(|(_, v)| *v).collect();
        Self::new(Rc::new(headers), values)
    }

    /// Value of `field`, or `None` if the source has no such column on this row.
    pub fn get(&self, field: &str) -> Option<&str> {
        let position = self.headers.iter().position(|h| h == field)?;
        self.values.get(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_trip_time_from_datetime() {
        let start = NaiveDate::from_ymd_opt(2016, 1, 1)
            .unwrap()
            .and_hms_opt(0, 9, 55)
            .unwrap();
        let time = TripTime::from_datetime(&start);

        assert_eq!(time.month, 1);
        assert_eq!(time.hour, 0);
        assert_eq!(time.day_of_week, DayOfWeek::Friday);
    }

    #[test]
    fn test_day_index_matches_all_order() {
        for (i, day) in DayOfWeek::ALL.iter().enumerate() {
            assert_eq!(day.index(), i);
        }
        assert_eq!(DayOfWeek::from(Weekday::Sun), DayOfWeek::Sunday);
    }

    #[test]
    fn test_raw_record_lookup() {
        let raw = RawRecord::from_pairs(&[("tripduration", "839"), ("usertype", "Customer")]);

        assert_eq!(raw.get("usertype"), Some("Customer"));
        assert_eq!(raw.get("tripduration"), Some("839"));
        assert_eq!(raw.get("gender"), None);
    }

    #[test]
    fn test_well_formed_ranges() {
        let time = TripTime {
            month: 12,
            hour: 23,
            day_of_week: DayOfWeek::Sunday,
        };
        assert!(CanonicalRecord::new(0.0, time, UserType::Customer).is_well_formed());

        let mut bad = CanonicalRecord::new(1.0, time, UserType::Customer);
        bad.month = 13;
        assert!(!bad.is_well_formed());
        bad.month = 1;
        bad.duration = -0.5;
        assert!(!bad.is_well_formed());
    }
}
