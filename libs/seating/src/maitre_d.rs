//! The allocator and scheduler for one restaurant.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::{MaitreDError, Reservation, Seating, Segment, Table, TimeSlot};

/// Outcome of an admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    /// The candidate arrives before the restaurant opens.
    BeforeOpening,
    /// The candidate arrives after the last seating.
    AfterLastSeating,
    /// No table left in the pool fits the party.
    NoCapacity,
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }

    /// True for rejections caused by the requested time alone.
    pub fn is_outside_opening_hours(&self) -> bool {
        matches!(self, Decision::BeforeOpening | Decision::AfterLastSeating)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Accept => "accepted",
            Decision::BeforeOpening => "requested time is before opening",
            Decision::AfterLastSeating => "requested time is after the last seating",
            Decision::NoCapacity => "no table available for the party",
        };
        f.write_str(s)
    }
}

/// A restaurant's seating configuration.
///
/// Built once from configuration and read-only afterwards. Table order is the
/// allocation priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaitreD {
    opens_at: NaiveTime,
    last_seating: NaiveTime,
    seating_duration: Duration,
    tables: Vec<Table>,
}

impl MaitreD {
    pub fn new(
        opens_at: NaiveTime,
        last_seating: NaiveTime,
        seating_duration: Duration,
        tables: impl IntoIterator<Item = Table>,
    ) -> Result<Self, MaitreDError> {
        let tables: Vec<Table> = tables.into_iter().collect();

        if tables.is_empty() {
            return Err(MaitreDError::NoTables);
        }
        for (index, table) in tables.iter().enumerate() {
            if table.capacity() == 0 {
                return Err(MaitreDError::EmptyTable { index });
            }
            if !table.is_empty() {
                return Err(MaitreDError::OccupiedTable { index });
            }
        }
        if seating_duration <= Duration::zero() {
            return Err(MaitreDError::NonPositiveDuration);
        }
        if last_seating < opens_at {
            return Err(MaitreDError::LastSeatingBeforeOpening {
                opens_at,
                last_seating,
            });
        }

        Ok(Self {
            opens_at,
            last_seating,
            seating_duration,
            tables,
        })
    }

    pub fn opens_at(&self) -> NaiveTime {
        self.opens_at
    }

    pub fn last_seating(&self) -> NaiveTime {
        self.last_seating
    }

    pub fn seating_duration(&self) -> Duration {
        self.seating_duration
    }

    /// Tables in priority order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn total_capacity(&self) -> u64 {
        self.tables.iter().map(|t| u64::from(t.capacity())).sum()
    }

    pub fn seating(&self, reservation: &Reservation) -> Seating {
        Seating::of(self.seating_duration, reservation)
    }

    /// Store query range `[min, max)` covering every reservation whose
    /// seating can overlap a seating starting at `at`.
    pub fn seating_window(&self, at: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let min = at
            .checked_sub_signed(self.seating_duration)
            .unwrap_or(NaiveDateTime::MIN);
        let max = at
            .checked_add_signed(self.seating_duration)
            .unwrap_or(NaiveDateTime::MAX);
        (min, max)
    }

    /// Store query range `[min, max)` covering every reservation relevant to
    /// [`MaitreD::segment`] for `date`.
    pub fn day_window(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        Segment::new(date, self.seating_duration, Vec::new()).window()
    }

    /// Checks only the time of day against opening hours.
    pub fn check_time(&self, at: NaiveDateTime) -> Decision {
        let time = at.time();
        if time < self.opens_at {
            Decision::BeforeOpening
        } else if self.last_seating < time {
            Decision::AfterLastSeating
        } else {
            Decision::Accept
        }
    }

    /// Decides whether `candidate` can be admitted next to `existing`.
    ///
    /// `existing` may contain reservations outside the candidate's seating;
    /// they are filtered out. The order of `existing` is significant.
    pub fn decide(&self, existing: &[Reservation], candidate: &Reservation) -> Decision {
        let time = self.check_time(candidate.at());
        if !time.is_accept() {
            return time;
        }

        let seating = self.seating(candidate);
        let relevant = existing.iter().filter(|r| seating.overlaps_reservation(r));
        let available = self.allocate(relevant);

        if available.iter().any(|t| t.fits(candidate.quantity())) {
            Decision::Accept
        } else {
            Decision::NoCapacity
        }
    }

    pub fn will_accept(&self, existing: &[Reservation], candidate: &Reservation) -> bool {
        self.decide(existing, candidate).is_accept()
    }

    /// Greedy first-fit of `reservations` onto the tables.
    ///
    /// Each reservation takes the first table in the pool that fits it; the
    /// reserved table goes to the back of the pool. A reserved standard table
    /// never fits again; a communal one keeps its remaining seats. Parties
    /// that fit nowhere are left out.
    pub fn allocate<'a>(&self, reservations: impl IntoIterator<Item = &'a Reservation>) -> Vec<Table> {
        let mut pool = self.tables.clone();
        for reservation in reservations {
            if let Some(index) = pool.iter().position(|t| t.fits(reservation.quantity())) {
                let table = pool.remove(index);
                pool.push(table.reserve(reservation));
            }
        }
        pool
    }

    /// One [`TimeSlot`] per distinct reservation time, ascending.
    ///
    /// Each slot holds the allocation of the reservations overlapping the
    /// seating that starts at the slot's time.
    pub fn schedule(&self, reservations: &[Reservation]) -> Vec<TimeSlot> {
        let times: BTreeSet<NaiveDateTime> = reservations.iter().map(Reservation::at).collect();

        times
            .into_iter()
            .map(|at| {
                let seating = Seating::new(self.seating_duration, at);
                let relevant = reservations.iter().filter(|r| seating.overlaps_reservation(r));
                TimeSlot::new(at, self.allocate(relevant))
            })
            .collect()
    }

    /// The reservations relevant to the day `date`.
    ///
    /// A reservation is relevant when its seating overlaps any part of the
    /// day, including one that started the evening before.
    pub fn segment(&self, date: NaiveDate, reservations: &[Reservation]) -> Segment {
        let day = Segment::day_bounds(date);
        let day_seating = Seating::new(day.1 - day.0, day.0);

        let mut relevant: Vec<Reservation> = reservations
            .iter()
            .filter(|r| self.seating(r).overlaps(&day_seating))
            .cloned()
            .collect();
        relevant.sort_by_key(Reservation::at);

        Segment::new(date, self.seating_duration, relevant)
    }
}
