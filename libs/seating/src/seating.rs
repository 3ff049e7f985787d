//! Seating intervals.

use chrono::{Duration, NaiveDateTime};

use crate::Reservation;

/// The half-open interval `[at, at + duration)` occupied by a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seating {
    at: NaiveDateTime,
    duration: Duration,
}

impl Seating {
    pub fn new(duration: Duration, at: NaiveDateTime) -> Self {
        Self { at, duration }
    }

    /// The seating a reservation occupies for the given duration.
    pub fn of(duration: Duration, reservation: &Reservation) -> Self {
        Self::new(duration, reservation.at())
    }

    pub fn start(&self) -> NaiveDateTime {
        self.at
    }

    /// Exclusive end. Saturates at the calendar bounds.
    pub fn end(&self) -> NaiveDateTime {
        self.at
            .checked_add_signed(self.duration)
            .unwrap_or(NaiveDateTime::MAX)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// True iff the two intervals intersect.
    pub fn overlaps(&self, other: &Seating) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }

    /// True iff the reservation's seating, using this seating's duration,
    /// intersects this one.
    pub fn overlaps_reservation(&self, reservation: &Reservation) -> bool {
        self.overlaps(&Seating::of(self.duration, reservation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_back_to_back_seatings_do_not_overlap() {
        let d = Duration::hours(2);
        let first = Seating::new(d, at(18, 0));
        let second = Seating::new(d, at(20, 0));
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn test_one_minute_inside_overlaps() {
        let d = Duration::hours(2);
        let first = Seating::new(d, at(18, 0));
        let second = Seating::new(d, at(19, 59));
        assert!(first.overlaps(&second));
        assert!(second.overlaps(&first));
    }

    #[test]
    fn test_same_start_overlaps() {
        let d = Duration::minutes(90);
        assert!(Seating::new(d, at(18, 30)).overlaps(&Seating::new(d, at(18, 30))));
    }

    #[test]
    fn test_end_saturates() {
        let s = Seating::new(Duration::hours(1), NaiveDateTime::MAX);
        assert_eq!(s.end(), NaiveDateTime::MAX);
    }
}
