//! Per-operator source layouts and the field mappers built on them.
//!
//! Each [`SourceSchema`] names the columns, units, timestamp format, and
//! user-type vocabulary of one operator's export. [`SourceFormat`] is the
//! routing table from a format identifier to its schema; a new operator is
//! one more schema constant and one more variant.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MapError;
use crate::record::{CanonicalRecord, RawRecord, TripTime, UserType};

/// Unit of a source's trip-duration column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Seconds,
    Milliseconds,
}

impl DurationUnit {
    fn per_minute(self) -> f64 {
        match self {
            DurationUnit::Seconds => 60.0,
            DurationUnit::Milliseconds => 60_000.0,
        }
    }
}

/// Translates one raw record of a known layout into canonical values.
pub trait FieldMapper {
    /// Trip length in minutes, unrounded.
    fn map_duration(&self, raw: &RawRecord) -> Result<f64, MapError>;

    fn map_time(&self, raw: &RawRecord) -> Result<TripTime, MapError>;

    fn map_user_type(&self, raw: &RawRecord) -> Result<UserType, MapError>;

    fn map(&self, raw: &RawRecord) -> Result<CanonicalRecord, MapError> {
        Ok(CanonicalRecord::new(
            self.map_duration(raw)?,
            self.map_time(raw)?,
            self.map_user_type(raw)?,
        ))
    }
}

/// Fixed column layout of one operator's trip export.
#[derive(Debug)]
pub struct SourceSchema {
    pub duration_field: &'static str,
    pub duration_unit: DurationUnit,
    pub start_field: &'static str,
    pub timestamp_format: &'static str,
    pub user_type_field: &'static str,
    /// Source label → canonical label. Exactly one entry per canonical label.
    pub user_types: [(&'static str, UserType); 2],
}

/// NYC Citi Bike: labels are already canonical.
pub static NYC_CITI_BIKE: SourceSchema = SourceSchema {
    duration_field: "tripduration",
    duration_unit: DurationUnit::Seconds,
    start_field: "starttime",
    timestamp_format: "%m/%d/%Y %H:%M:%S",
    user_type_field: "usertype",
    user_types: [
        ("Subscriber", UserType::Subscriber),
        ("Customer", UserType::Customer),
    ],
};

/// Chicago Divvy: start times carry no seconds.
pub static CHICAGO_DIVVY: SourceSchema = SourceSchema {
    duration_field: "tripduration",
    duration_unit: DurationUnit::Seconds,
    start_field: "starttime",
    timestamp_format: "%m/%d/%Y %H:%M",
    user_type_field: "usertype",
    user_types: [
        ("Subscriber", UserType::Subscriber),
        ("Customer", UserType::Customer),
    ],
};

/// Washington Capital Bikeshare: milliseconds, and member/casual vocabulary.
pub static WASHINGTON_CAPITAL_BIKESHARE: SourceSchema = SourceSchema {
    duration_field: "Duration (ms)",
    duration_unit: DurationUnit::Milliseconds,
    start_field: "Start date",
    timestamp_format: "%m/%d/%Y %H:%M",
    user_type_field: "Member Type",
    user_types: [
        ("Registered", UserType::Subscriber),
        ("Casual", UserType::Customer),
    ],
};

fn required<'a>(raw: &'a RawRecord, field: &'static str) -> Result<&'a str, MapError> {
    match raw.get(field).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(MapError::MissingField { field }),
    }
}

impl FieldMapper for SourceSchema {
    fn map_duration(&self, raw: &RawRecord) -> Result<f64, MapError> {
        let field = self.duration_field;
        let value = required(raw, field)?;
        let malformed = || MapError::MalformedValue {
            field,
            value: value.to_string(),
        };

        let amount: f64 = value.parse().map_err(|_| malformed())?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(malformed());
        }
        Ok(amount / self.duration_unit.per_minute())
    }

    fn map_time(&self, raw: &RawRecord) -> Result<TripTime, MapError> {
        let field = self.start_field;
        let value = required(raw, field)?;
        let start = NaiveDateTime::parse_from_str(value, self.timestamp_format).map_err(|_| {
            MapError::MalformedTimestamp {
                field,
                value: value.to_string(),
                format: self.timestamp_format,
            }
        })?;
        Ok(TripTime::from_datetime(&start))
    }

    fn map_user_type(&self, raw: &RawRecord) -> Result<UserType, MapError> {
        let field = self.user_type_field;
        let value = required(raw, field)?;
        self.user_types
            .iter()
            .find(|(label, _)| *label == value)
            .map(|(_, user_type)| *user_type)
            .ok_or_else(|| MapError::MalformedValue {
                field,
                value: value.to_string(),
            })
    }
}

/// Identifier of a supported source layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Nyc,
    Chicago,
    Washington,
}

impl SourceFormat {
    pub fn schema(self) -> &'static SourceSchema {
        match self {
            SourceFormat::Nyc => &NYC_CITI_BIKE,
            SourceFormat::Chicago => &CHICAGO_DIVVY,
            SourceFormat::Washington => &WASHINGTON_CAPITAL_BIKESHARE,
        }
    }

    pub fn mapper(self) -> &'static dyn FieldMapper {
        self.schema()
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Nyc => "nyc",
            SourceFormat::Chicago => "chicago",
            SourceFormat::Washington => "washington",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DayOfWeek;
    use clap::ValueEnum;

    const TOLERANCE: f64 = 0.001;

    fn nyc_row() -> RawRecord {
        RawRecord::from_pairs(&[
            ("tripduration", "839"),
            ("starttime", "1/1/2016 00:09:55"),
            ("stoptime", "1/1/2016 00:23:54"),
            ("start station id", "532"),
            ("usertype", "Customer"),
            ("birth year", ""),
            ("gender", "0"),
        ])
    }

    fn chicago_row() -> RawRecord {
        RawRecord::from_pairs(&[
            ("trip_id", "9080545"),
            ("starttime", "3/31/2016 23:30"),
            ("stoptime", "3/31/2016 23:46"),
            ("bikeid", "2295"),
            ("tripduration", "926"),
            ("usertype", "Subscriber"),
        ])
    }

    fn washington_row() -> RawRecord {
        RawRecord::from_pairs(&[
            ("Duration (ms)", "427387"),
            ("Start date", "3/31/2016 22:57"),
            ("End date", "3/31/2016 23:04"),
            ("Start station number", "31602"),
            ("Member Type", "Registered"),
        ])
    }

    #[test]
    fn test_duration_conversion_per_format() {
        let cases = [
            (SourceFormat::Nyc, nyc_row(), 13.9833),
            (SourceFormat::Chicago, chicago_row(), 15.4333),
            (SourceFormat::Washington, washington_row(), 7.1231),
        ];
        for (format, raw, expected) in cases {
            let minutes = format.mapper().map_duration(&raw).unwrap();
            assert!(
                (minutes - expected).abs() < TOLERANCE,
                "{format}: {minutes} != {expected}"
            );
        }
    }

    #[test]
    fn test_time_decomposition_per_format() {
        let decompose = |format: SourceFormat, raw: RawRecord| {
            let time = format.mapper().map_time(&raw).unwrap();
            (time.month, time.hour, time.day_of_week)
        };

        let nyc = decompose(SourceFormat::Nyc, nyc_row());
        assert_eq!(nyc, (1, 0, DayOfWeek::Friday));

        let chicago = decompose(SourceFormat::Chicago, chicago_row());
        assert_eq!(chicago, (3, 23, DayOfWeek::Thursday));

        let washington = decompose(SourceFormat::Washington, washington_row());
        assert_eq!(washington, (3, 22, DayOfWeek::Thursday));
    }

    #[test]
    fn test_user_type_tables_are_bijective() {
        for format in SourceFormat::value_variants() {
            let schema = format.schema();
            let mut seen = Vec::new();
            for (label, expected) in schema.user_types {
                let raw = RawRecord::from_pairs(&[(schema.user_type_field, label)]);
                let mapped = schema.map_user_type(&raw).unwrap();
                assert_eq!(mapped, expected);
                seen.push(mapped);
            }
            assert!(seen.contains(&UserType::Subscriber), "{format}");
            assert!(seen.contains(&UserType::Customer), "{format}");
        }
    }

    #[test]
    fn test_washington_vocabulary_is_remapped() {
        let casual = RawRecord::from_pairs(&[("Member Type", "Casual")]);
        let mapper = SourceFormat::Washington.mapper();
        assert_eq!(mapper.map_user_type(&casual).unwrap(), UserType::Customer);

        let canonical_word = RawRecord::from_pairs(&[("Member Type", "Subscriber")]);
        assert!(matches!(
            mapper.map_user_type(&canonical_word),
            Err(MapError::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_missing_field() {
        let raw = RawRecord::from_pairs(&[("starttime", "1/1/2016 00:09:55")]);
        let err = SourceFormat::Nyc.mapper().map(&raw).unwrap_err();
        assert_eq!(err.to_string(), "missing required field 'tripduration'");

        let blank = RawRecord::from_pairs(&[("usertype", "  ")]);
        assert_eq!(
            SourceFormat::Nyc.mapper().map_user_type(&blank),
            Err(MapError::MissingField { field: "usertype" })
        );
    }

    #[test]
    fn test_malformed_duration_is_not_zero() {
        for value in ["abc", "-5", "NaN"] {
            let raw = RawRecord::from_pairs(&[("tripduration", value)]);
            assert!(matches!(
                SourceFormat::Nyc.mapper().map_duration(&raw),
                Err(MapError::MalformedValue {
                    field: "tripduration",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_timestamp_must_match_source_format() {
        // seconds present where the source format has none
        let raw = RawRecord::from_pairs(&[("starttime", "3/31/2016 23:30:12")]);
        assert!(matches!(
            SourceFormat::Chicago.mapper().map_time(&raw),
            Err(MapError::MalformedTimestamp { .. })
        ));

        let raw = RawRecord::from_pairs(&[("starttime", "2016-01-01T00:09:55")]);
        assert!(matches!(
            SourceFormat::Nyc.mapper().map_time(&raw),
            Err(MapError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_full_mapping_nyc() {
        let record = SourceFormat::Nyc.mapper().map(&nyc_row()).unwrap();
        assert_eq!(record.user_type, UserType::Customer);
        assert_eq!(record.day_of_week, DayOfWeek::Friday);
        assert!((record.duration - 13.9833).abs() < TOLERANCE);
    }
}
