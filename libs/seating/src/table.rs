//! Tables and their capacity accounting.

use serde::Serialize;

use crate::Reservation;

/// A seating unit.
///
/// Tables are values: [`Table::reserve`] returns a new table and leaves the
/// original untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Table {
    /// Held by at most one party, whatever its size.
    Standard(StandardTable),
    /// Shared by any parties whose sizes sum to at most the seat count.
    Communal(CommunalTable),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardTable {
    seats: u32,
    occupant: Option<Reservation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommunalTable {
    seats: u32,
    reservations: Vec<Reservation>,
}

impl StandardTable {
    pub fn seats(&self) -> u32 {
        self.seats
    }

    pub fn occupant(&self) -> Option<&Reservation> {
        self.occupant.as_ref()
    }
}

impl CommunalTable {
    pub fn seats(&self) -> u32 {
        self.seats
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    fn seated(&self) -> u64 {
        self.reservations
            .iter()
            .map(|r| u64::from(r.quantity()))
            .sum()
    }
}

impl Table {
    /// An empty standard table.
    pub fn standard(seats: u32) -> Self {
        Table::Standard(StandardTable {
            seats,
            occupant: None,
        })
    }

    /// An empty communal table.
    pub fn communal(seats: u32) -> Self {
        Table::Communal(CommunalTable {
            seats,
            reservations: Vec::new(),
        })
    }

    /// Total number of seats.
    pub fn capacity(&self) -> u32 {
        match self {
            Table::Standard(t) => t.seats,
            Table::Communal(t) => t.seats,
        }
    }

    /// Seats still available. Never exceeds [`Table::capacity`].
    pub fn remaining_capacity(&self) -> u32 {
        match self {
            Table::Standard(t) if t.occupant.is_some() => 0,
            Table::Standard(t) => t.seats,
            Table::Communal(t) => {
                let seated = u32::try_from(t.seated()).unwrap_or(u32::MAX);
                t.seats.saturating_sub(seated)
            }
        }
    }

    pub fn fits(&self, quantity: u32) -> bool {
        quantity <= self.remaining_capacity()
    }

    /// Returns a table holding `reservation` as well.
    ///
    /// For a standard table any previous occupant is replaced; callers only
    /// reserve tables that [`Table::fits`] the party.
    #[must_use]
    pub fn reserve(&self, reservation: &Reservation) -> Table {
        match self {
            Table::Standard(t) => Table::Standard(StandardTable {
                seats: t.seats,
                occupant: Some(reservation.clone()),
            }),
            Table::Communal(t) => {
                let mut reservations = t.reservations.clone();
                reservations.push(reservation.clone());
                Table::Communal(CommunalTable {
                    seats: t.seats,
                    reservations,
                })
            }
        }
    }

    /// Reservations currently seated at this table.
    pub fn reservations(&self) -> &[Reservation] {
        match self {
            Table::Standard(t) => t.occupant.as_slice(),
            Table::Communal(t) => &t.reservations,
        }
    }

    pub fn is_communal(&self) -> bool {
        matches!(self, Table::Communal(_))
    }

    pub fn is_empty(&self) -> bool {
        self.reservations().is_empty()
    }
}
