//! Derived staff views: time slots and day segments.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::{Reservation, Table};

/// Table assignment at one distinct reservation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    at: NaiveDateTime,
    tables: Vec<Table>,
}

impl TimeSlot {
    pub(crate) fn new(at: NaiveDateTime, tables: Vec<Table>) -> Self {
        Self { at, tables }
    }

    pub fn at(&self) -> NaiveDateTime {
        self.at
    }

    /// Every table of the restaurant, reserved or not.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Reservations seated in this slot, table by table.
    pub fn reservations(&self) -> Vec<&Reservation> {
        self.tables.iter().flat_map(Table::reservations).collect()
    }

    pub fn total_capacity(&self) -> u64 {
        self.tables.iter().map(|t| u64::from(t.capacity())).sum()
    }

    pub fn remaining_capacity(&self) -> u64 {
        self.tables
            .iter()
            .map(|t| u64::from(t.remaining_capacity()))
            .sum()
    }
}

/// The reservations relevant to a single calendar day.
///
/// Always a value, even for a day without bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    date: NaiveDate,
    #[serde(skip)]
    seating_duration: Duration,
    reservations: Vec<Reservation>,
}

impl Segment {
    pub(crate) fn new(
        date: NaiveDate,
        seating_duration: Duration,
        reservations: Vec<Reservation>,
    ) -> Self {
        Self {
            date,
            seating_duration,
            reservations,
        }
    }

    /// `[date 00:00, date+1 00:00)`.
    pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(NaiveTime::MIN);
        let end = date
            .succ_opt()
            .map(|d| d.and_time(NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX);
        (start, end)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Store query range `[min, max)` that covers the day, including seatings
    /// that started the day before and are still running.
    pub fn window(&self) -> (NaiveDateTime, NaiveDateTime) {
        let (start, end) = Self::day_bounds(self.date);
        let min = start
            .checked_sub_signed(self.seating_duration)
            .unwrap_or(NaiveDateTime::MIN);
        (min, end)
    }

    /// Relevant reservations, ordered by time.
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn into_reservations(self) -> Vec<Reservation> {
        self.reservations
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn guests(&self) -> u64 {
        self.reservations
            .iter()
            .map(|r| u64::from(r.quantity()))
            .sum()
    }
}
