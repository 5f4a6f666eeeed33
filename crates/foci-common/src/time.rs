//! CF-convention time axes.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{FociError, FociResult};

/// Unit of a `<unit> since <reference>` time encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn seconds(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86400.0,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(TimeUnit::Seconds),
            "min" | "mins" | "minute" | "minutes" => Some(TimeUnit::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(TimeUnit::Hours),
            "d" | "day" | "days" => Some(TimeUnit::Days),
            _ => None,
        }
    }
}

/// Raw time coordinate values plus the attributes needed to decode them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    pub values: Vec<f64>,
    pub units: Option<String>,
    pub calendar: Option<String>,
}

impl TimeAxis {
    pub fn new(values: Vec<f64>, units: Option<String>, calendar: Option<String>) -> Self {
        Self {
            values,
            units,
            calendar,
        }
    }

    /// A plain `0..len` axis for files without a time coordinate.
    pub fn index(len: usize) -> Self {
        Self::new((0..len).map(|i| i as f64).collect(), None, None)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First value, used to order files when concatenating.
    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Decode time step `i` to a UTC timestamp.
    ///
    /// Returns `None` when there are no units, the units do not parse, or the
    /// calendar is not representable with the proleptic Gregorian calendar.
    pub fn datetime(&self, i: usize) -> Option<DateTime<Utc>> {
        let value = *self.values.get(i)?;
        if !self.is_gregorian() {
            return None;
        }
        let (unit, reference) = parse_cf_units(self.units.as_deref()?).ok()?;
        let millis = (value * unit.seconds() * 1000.0).round();
        if !millis.is_finite() {
            return None;
        }
        let offset = Duration::try_milliseconds(millis as i64)?;
        Utc.from_utc_datetime(&reference).checked_add_signed(offset)
    }

    /// Calendar date of step `i` (`YYYY-MM-DD`), if decodable.
    pub fn date_label(&self, i: usize) -> Option<String> {
        self.datetime(i).map(|dt| dt.format("%Y-%m-%d").to_string())
    }

    /// Concatenate several axes. Units of the first axis are kept.
    pub fn concat(parts: Vec<TimeAxis>) -> TimeAxis {
        let mut iter = parts.into_iter();
        let Some(mut first) = iter.next() else {
            return TimeAxis::index(0);
        };
        for part in iter {
            first.values.extend(part.values);
        }
        first
    }

    fn is_gregorian(&self) -> bool {
        match self.calendar.as_deref().map(str::to_ascii_lowercase) {
            None => true,
            Some(c) => matches!(c.as_str(), "standard" | "gregorian" | "proleptic_gregorian"),
        }
    }
}

/// Parse a CF `units` string such as `seconds since 1900-01-01 00:00:00`.
pub fn parse_cf_units(units: &str) -> FociResult<(TimeUnit, NaiveDateTime)> {
    let invalid = || FociError::InvalidTimeUnits(units.to_string());

    let (unit_part, ref_part) = units.split_once(" since ").ok_or_else(invalid)?;
    let unit = TimeUnit::parse(unit_part.trim()).ok_or_else(invalid)?;

    let reference = ref_part
        .trim()
        .trim_end_matches(" UTC")
        .trim_end_matches('Z')
        .trim();
    // Drop fractional seconds, which NEMO sometimes writes as "00:00:0.0"
    let reference = match reference.rsplit_once('.') {
        Some((head, tail)) if tail.chars().all(|c| c.is_ascii_digit()) && head.contains(':') => head,
        _ => reference,
    };

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(reference, fmt) {
            return Ok((unit, ndt));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(reference, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok((unit, ndt));
        }
    }
    Err(invalid())
}
