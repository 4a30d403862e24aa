//! Collapses adjacent booked time ranges for display and pricing.
//!
//! Merging is purely textual on zero-padded `HH:MM` bounds: a range whose
//! start equals the running end extends the run. Ranges that cannot be split
//! into two bounds are passed through after the merged runs, unchanged.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::BookingSlot;

/// Merged ranges of one booking date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SlotGroup {
    /// Calendar date shared by every range in the group.
    pub booking_date: NaiveDate,
    /// Contiguous `"HH:MM - HH:MM"` ranges ordered by start.
    pub booking_times: Vec<String>,
}

fn split_bounds(range: &str) -> Option<(&str, &str)> {
    let (start, end) = range.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());
    if start.is_empty() || end.is_empty() {
        return None;
    }
    Some((start, end))
}

/// Merge the ranges of a single date into the minimal contiguous set.
///
/// # Examples
/// ```
/// use backend::domain::merge_time_ranges;
///
/// let merged = merge_time_ranges(&["10:00 - 11:00", "09:00 - 10:00", "12:00 - 13:00"]);
/// assert_eq!(merged, vec!["09:00 - 11:00", "12:00 - 13:00"]);
/// ```
pub fn merge_time_ranges<S: AsRef<str>>(ranges: &[S]) -> Vec<String> {
    let mut bounded = Vec::with_capacity(ranges.len());
    let mut unparsed = Vec::new();
    for range in ranges {
        let range = range.as_ref();
        match split_bounds(range) {
            Some(bounds) => bounded.push(bounds),
            None => unparsed.push(range.to_owned()),
        }
    }
    bounded.sort_unstable();

    let mut merged: Vec<String> = Vec::new();
    let mut run: Option<(&str, &str)> = None;
    for (start, end) in bounded {
        run = match run {
            Some((run_start, run_end)) if run_end == start => Some((run_start, end)),
            Some((run_start, run_end)) => {
                merged.push(format!("{run_start} - {run_end}"));
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((run_start, run_end)) = run {
        merged.push(format!("{run_start} - {run_end}"));
    }
    merged.extend(unparsed);
    merged
}

/// Group slot rows by date (ascending) and merge each date independently.
pub fn group_and_merge(slots: &[BookingSlot]) -> Vec<SlotGroup> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&str>> = BTreeMap::new();
    for slot in slots {
        by_date.entry(slot.date).or_default().push(slot.time.as_str());
    }
    by_date
        .into_iter()
        .map(|(booking_date, times)| SlotGroup {
            booking_date,
            booking_times: merge_time_ranges(times.as_slice()),
        })
        .collect()
}
