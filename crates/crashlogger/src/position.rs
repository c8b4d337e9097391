//! Last known position and timestamp.
//!
//! The positioning source reports location, date and time independently, each
//! with its own validity flag. [`PositionTracker`] keeps the most recent valid
//! value of each field. Fields are never reset to "unknown", so the current
//! [`Fix`] may pair a fresh time with a stale position.

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Offset applied to source time by default: +05:30.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl Coordinates {
    /// Create coordinates from latitude and longitude.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Position plus date and local time, as last validated.
///
/// `None` means the field has never been validated since power-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fix {
    /// Last valid position.
    pub position: Option<Coordinates>,
    /// Last valid calendar date, as reported by the source.
    pub date: Option<NaiveDate>,
    /// Last valid time of day, already shifted to local time.
    pub time: Option<NaiveTime>,
}

/// A single field reported by the positioning source.
///
/// Times are in the source's reference timezone (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixField {
    /// Latitude and longitude, updated as a unit.
    Location(Coordinates),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day in UTC.
    Time(NaiveTime),
}

/// A field update tagged with the source's validity flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixUpdate {
    /// The reported field.
    #[serde(flatten)]
    pub field: FixField,
    /// Whether the source considers the field valid.
    pub valid: bool,
}

impl FixUpdate {
    /// A valid update.
    #[must_use]
    pub fn valid(field: FixField) -> Self {
        Self { field, valid: true }
    }

    /// An update the source flagged as invalid.
    #[must_use]
    pub fn invalid(field: FixField) -> Self {
        Self {
            field,
            valid: false,
        }
    }
}

/// Shift a UTC time of day by a fixed offset.
///
/// Minutes carry into hours and hours wrap past midnight. The day carry is
/// discarded: the date is not rolled over, so shortly after UTC midnight the
/// local time can pair with the previous UTC date (and vice versa for
/// negative offsets).
#[must_use]
pub fn to_local_time(utc: NaiveTime, offset: TimeDelta) -> NaiveTime {
    let (local, _days) = utc.overflowing_add_signed(offset);
    local
}

/// Holds the most recently validated fix.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    fix: Fix,
    utc_offset: TimeDelta,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_MINUTES)
    }
}

impl PositionTracker {
    /// Create a tracker that converts source time by `utc_offset_minutes`.
    #[must_use]
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self {
            fix: Fix::default(),
            utc_offset: TimeDelta::minutes(i64::from(utc_offset_minutes)),
        }
    }

    /// Overwrite the matching stored field when `valid` is set.
    ///
    /// Returns whether anything was stored. Invalid updates are a no-op.
    pub fn update_if_valid(&mut self, field: FixField, valid: bool) -> bool {
        if !valid {
            trace!(?field, "ignoring invalid fix field");
            return false;
        }
        match field {
            FixField::Location(coords) => self.fix.position = Some(coords),
            FixField::Date(date) => self.fix.date = Some(date),
            FixField::Time(utc) => self.fix.time = Some(to_local_time(utc, self.utc_offset)),
        }
        true
    }

    /// Apply a tagged update from the positioning source.
    pub fn apply(&mut self, update: FixUpdate) -> bool {
        self.update_if_valid(update.field, update.valid)
    }

    /// The latest stored fix. Fields may be of different ages.
    #[must_use]
    pub fn current(&self) -> Fix {
        self.fix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_new_tracker_has_no_fix() {
        let tracker = PositionTracker::default();
        assert_eq!(tracker.current(), Fix::default());
    }

    #[test]
    fn test_invalid_location_keeps_previous() {
        let mut tracker = PositionTracker::default();
        let first = Coordinates::new(12.971_599, 77.594_566);

        assert!(tracker.update_if_valid(FixField::Location(first), true));
        assert!(!tracker.update_if_valid(FixField::Location(Coordinates::new(0.0, 0.0)), false));

        assert_eq!(tracker.current().position, Some(first));
    }

    #[test]
    fn test_invalid_update_before_any_fix_is_noop() {
        let mut tracker = PositionTracker::default();
        tracker.apply(FixUpdate::invalid(FixField::Time(hms(10, 0, 0))));
        assert!(tracker.current().time.is_none());
    }

    #[test]
    fn test_fields_update_independently() {
        let mut tracker = PositionTracker::new(0);
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        tracker.apply(FixUpdate::valid(FixField::Location(Coordinates::new(1.0, 2.0))));
        tracker.apply(FixUpdate::valid(FixField::Date(date)));
        tracker.apply(FixUpdate::invalid(FixField::Location(Coordinates::new(3.0, 4.0))));
        tracker.apply(FixUpdate::valid(FixField::Time(hms(8, 15, 0))));

        let fix = tracker.current();
        assert_eq!(fix.position, Some(Coordinates::new(1.0, 2.0)));
        assert_eq!(fix.date, Some(date));
        assert_eq!(fix.time, Some(hms(8, 15, 0)));
    }

    #[test]
    fn test_time_offset_applied() {
        let mut tracker = PositionTracker::default();
        tracker.apply(FixUpdate::valid(FixField::Time(hms(6, 10, 42))));
        assert_eq!(tracker.current().time, Some(hms(11, 40, 42)));
    }

    #[test]
    fn test_minute_carry_into_hour() {
        let offset = TimeDelta::minutes(330);
        assert_eq!(to_local_time(hms(6, 45, 5), offset), hms(12, 15, 5));
    }

    #[test]
    fn test_hour_wraps_without_date_rollover() {
        let mut tracker = PositionTracker::default();
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        tracker.apply(FixUpdate::valid(FixField::Date(date)));
        tracker.apply(FixUpdate::valid(FixField::Time(hms(20, 45, 0))));

        let fix = tracker.current();
        assert_eq!(fix.time, Some(hms(2, 15, 0)));
        // The date stays as reported.
        assert_eq!(fix.date, Some(date));
    }

    #[test]
    fn test_negative_offset_wraps_backwards() {
        let offset = TimeDelta::minutes(-300);
        assert_eq!(to_local_time(hms(2, 0, 0), offset), hms(21, 0, 0));
    }

    #[test]
    fn test_fix_update_json_shape() {
        let json = r#"{"location": {"lat": 12.5, "lon": 77.25}, "valid": true}"#;
        let update: FixUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(
            update,
            FixUpdate::valid(FixField::Location(Coordinates::new(12.5, 77.25)))
        );

        let json = r#"{"time": "23:59:30", "valid": false}"#;
        let update: FixUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update, FixUpdate::invalid(FixField::Time(hms(23, 59, 30))));
    }
}
