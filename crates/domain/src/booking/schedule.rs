//! Booking dates and time slots.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating dates and time slots.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// The chosen date is before today.
    #[error("Date {date} is in the past")]
    PastDate { date: NaiveDate },

    /// The chosen date falls on the shop's closed weekday.
    #[error("The shop is closed on {weekday}")]
    ClosedWeekday { weekday: Weekday },

    /// The time string could not be parsed.
    #[error("Invalid time: {raw}")]
    InvalidTime { raw: String },
}

/// A calendar date validated for booking.
///
/// Must not be before today and must not fall on the policy-defined closed
/// weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingDate(NaiveDate);

impl BookingDate {
    /// Validates a date against today's date and the closed weekday.
    pub fn try_new(
        date: NaiveDate,
        today: NaiveDate,
        closed_weekday: Weekday,
    ) -> Result<Self, ScheduleError> {
        if date < today {
            return Err(ScheduleError::PastDate { date });
        }
        if date.weekday() == closed_weekday {
            return Err(ScheduleError::ClosedWeekday {
                weekday: closed_weekday,
            });
        }
        Ok(Self(date))
    }

    /// Returns the underlying date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl std::fmt::Display for BookingDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bookable start time.
///
/// Only valid in the context of the exact (date, services) pair it was
/// fetched for; changing either invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    /// Parses a slot from `"HH:MM"`; the backend sometimes sends seconds,
    /// so `"HH:MM:SS"` is accepted too.
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map(Self)
            .map_err(|_| ScheduleError::InvalidTime {
                raw: raw.to_string(),
            })
    }

    /// Creates a slot from an already-validated time.
    pub fn from_time(time: NaiveTime) -> Self {
        Self(time)
    }

    /// Returns the start time.
    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// The list of bookable start times for one (date, services) pair.
///
/// The resolver on the server is authoritative; locally the list is only
/// parsed, ordered, and filtered for already-passed times when the date is
/// today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotList {
    date: NaiveDate,
    slots: Vec<TimeSlot>,
}

impl SlotList {
    /// Builds a slot list from raw time strings.
    ///
    /// Slots are sorted ascending. When `date` is today, slots whose start
    /// time is before `now` plus the tolerance are dropped.
    pub fn from_times(
        date: NaiveDate,
        times: &[String],
        now: NaiveDateTime,
        tolerance_minutes: u32,
    ) -> Result<Self, ScheduleError> {
        let mut slots = times
            .iter()
            .map(|raw| TimeSlot::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        slots.sort();
        slots.dedup();

        if date == now.date() {
            // compare full instants so a tolerance reaching past midnight
            // drops the remaining slots instead of wrapping around
            let cutoff = now + chrono::Duration::minutes(i64::from(tolerance_minutes));
            slots.retain(|slot| date.and_time(slot.time()) >= cutoff);
        }

        Ok(Self { date, slots })
    }

    /// Returns the date the slots were computed for.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns true if the given slot is present in the list.
    pub fn contains(&self, slot: TimeSlot) -> bool {
        self.slots.contains(&slot)
    }

    /// Returns true if no slots are available.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over the slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TimeSlot> + '_ {
        self.slots.iter().copied()
    }

    /// Returns the number of available slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
