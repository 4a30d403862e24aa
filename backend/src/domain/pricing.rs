//! Availability-based booking price.
//!
//! Prices are recomputed on every read from the talent's availability
//! entries; nothing here is persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Money, SlotGroup};

/// An offerable block of a talent's calendar with its price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityEntry {
    pub date: NaiveDate,
    /// Comma-separated block descriptor, e.g. `"09:00-10:00,10:00-11:00"`.
    pub slot: String,
    pub price: Money,
    /// Carried for display; pricing does not apply it.
    pub discount: Option<Money>,
}

impl AvailabilityEntry {
    /// Number of non-empty comma-separated blocks in the descriptor.
    pub fn block_count(&self) -> u32 {
        let count = self
            .slot
            .split(',')
            .filter(|block| !block.trim().is_empty())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

/// Total price of the booked groups against the talent's availability.
///
/// Each group contributes `price × block_count` of the first availability
/// entry on the same date, or nothing when the date has no entry.
///
/// # Examples
/// ```
/// use backend::domain::{AvailabilityEntry, Money, SlotGroup, total_price};
///
/// let date = "2025-09-20".parse().expect("date");
/// let availability = vec![AvailabilityEntry {
///     date,
///     slot: "09:00-10:00,10:00-11:00".to_owned(),
///     price: "50".parse().expect("price"),
///     discount: None,
/// }];
/// let groups = vec![SlotGroup {
///     booking_date: date,
///     booking_times: vec!["09:00 - 11:00".to_owned()],
/// }];
/// assert_eq!(total_price(&groups, &availability).to_string(), "100.00");
/// ```
pub fn total_price(groups: &[SlotGroup], availability: &[AvailabilityEntry]) -> Money {
    groups
        .iter()
        .filter_map(|group| {
            availability
                .iter()
                .find(|entry| entry.date == group.booking_date)
        })
        .fold(Money::ZERO, |total, entry| {
            total.plus(entry.price.times(entry.block_count()))
        })
}
