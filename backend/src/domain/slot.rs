//! Slot ledger primitives.
//!
//! A slot is one `(date, "HH:MM - HH:MM")` unit of booked time. Time ranges
//! are stored as canonical strings so the storage-level uniqueness constraint
//! on `(booking, date, time)` compares like with like.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BookingId, SlotId};

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validation failures for slot input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotValidationError {
    /// Time range was not of the form `HH:MM - HH:MM`.
    #[error("time range must look like \"HH:MM - HH:MM\": {value}")]
    MalformedRange {
        /// Rejected input.
        value: String,
    },
    /// Range end does not come after its start.
    #[error("time range must end after it starts: {value}")]
    EmptyRange {
        /// Rejected input.
        value: String,
    },
    /// Date key was not an ISO `YYYY-MM-DD` date.
    #[error("slot date must be YYYY-MM-DD: {value}")]
    MalformedDate {
        /// Rejected input.
        value: String,
    },
    /// `slotsByDate` was not an object of string arrays.
    #[error("slotsByDate must map dates to arrays of time ranges")]
    NotAMapping,
    /// No slots were supplied.
    #[error("at least one slot is required")]
    Empty,
}

/// Half-open `[start, end)` range within a single day.
///
/// # Examples
/// ```
/// use backend::domain::TimeRange;
///
/// let range: TimeRange = "09:00-10:30".parse().expect("valid range");
/// assert_eq!(range.to_string(), "09:00 - 10:30");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    /// Build a range, rejecting empty or inverted bounds.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, SlotValidationError> {
        if end <= start {
            return Err(SlotValidationError::EmptyRange {
                value: format!("{} - {}", start.format(TIME_FORMAT), end.format(TIME_FORMAT)),
            });
        }
        Ok(Self { start, end })
    }

    /// Range start.
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Range end.
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether the two ranges share any instant.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(TIME_FORMAT),
            self.end.format(TIME_FORMAT)
        )
    }
}

impl FromStr for TimeRange {
    type Err = SlotValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SlotValidationError::MalformedRange {
            value: s.to_owned(),
        };
        let (start, end) = s.split_once('-').ok_or_else(malformed)?;
        let start = NaiveTime::parse_from_str(start.trim(), TIME_FORMAT).map_err(|_| malformed())?;
        let end = NaiveTime::parse_from_str(end.trim(), TIME_FORMAT).map_err(|_| malformed())?;
        Self::new(start, end).map_err(|_| SlotValidationError::EmptyRange {
            value: s.to_owned(),
        })
    }
}

impl Serialize for TimeRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A requested `(date, time range)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotRequest {
    /// Calendar date of the slot.
    pub date: NaiveDate,
    /// Time range on that date.
    pub time: TimeRange,
}

/// Persisted slot row belonging to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSlot {
    pub id: SlotId,
    pub booking_id: BookingId,
    pub date: NaiveDate,
    pub time: String,
}

impl BookingSlot {
    /// Whether this row holds exactly the given date and time range.
    pub fn matches(&self, date: NaiveDate, time: &str) -> bool {
        self.date == date && self.time == time
    }
}

/// Requested slots split into rows to insert and repeated pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedSlots {
    /// First occurrence of every pair, in request order.
    pub staged: Vec<SlotRequest>,
    /// Pairs that repeated an earlier entry.
    pub duplicates: Vec<SlotRequest>,
}

/// Parse a `slotsByDate` JSON object into slot requests.
///
/// Keys must be ISO dates and values arrays of `HH:MM - HH:MM` strings.
/// Request order is preserved.
///
/// # Examples
/// ```
/// use backend::domain::parse_slots_by_date;
/// use serde_json::json;
///
/// let slots = parse_slots_by_date(&json!({ "2025-09-20": ["10:00 - 11:00"] }))
///     .expect("valid slots");
/// assert_eq!(slots.len(), 1);
/// ```
pub fn parse_slots_by_date(value: &Value) -> Result<Vec<SlotRequest>, SlotValidationError> {
    let map = value.as_object().ok_or(SlotValidationError::NotAMapping)?;
    let mut requests = Vec::new();
    for (raw_date, times) in map {
        let date = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT).map_err(|_| {
            SlotValidationError::MalformedDate {
                value: raw_date.clone(),
            }
        })?;
        let times = times.as_array().ok_or(SlotValidationError::NotAMapping)?;
        for time in times {
            let raw_time = time.as_str().ok_or(SlotValidationError::NotAMapping)?;
            requests.push(SlotRequest {
                date,
                time: raw_time.parse()?,
            });
        }
    }
    if requests.is_empty() {
        return Err(SlotValidationError::Empty);
    }
    Ok(requests)
}

/// Split requests into unique pairs to stage and repeated pairs to report.
pub fn stage_slots(requests: &[SlotRequest]) -> StagedSlots {
    let mut seen = HashSet::new();
    let mut staged = StagedSlots::default();
    for request in requests {
        if seen.insert(*request) {
            staged.staged.push(*request);
        } else {
            staged.duplicates.push(*request);
        }
    }
    staged
}

/// Requested slots that overlap any already-booked slot on the same date.
///
/// Booked rows whose time string cannot be parsed only conflict on an exact
/// string match.
pub fn find_conflicts(requested: &[SlotRequest], booked: &[BookingSlot]) -> Vec<SlotRequest> {
    requested
        .iter()
        .filter(|request| overlaps_booked(request.date, &request.time.to_string(), booked))
        .copied()
        .collect()
}

/// Whether `time` on `date` overlaps any of the booked rows.
///
/// Either side failing to parse as a range falls back to an exact match.
pub fn overlaps_booked(date: NaiveDate, time: &str, booked: &[BookingSlot]) -> bool {
    let requested = time.parse::<TimeRange>().ok();
    booked
        .iter()
        .filter(|slot| slot.date == date)
        .any(|slot| match (requested, slot.time.parse::<TimeRange>()) {
            (Some(requested), Ok(range)) => range.overlaps(&requested),
            _ => slot.time == time,
        })
}
