//! Reservation value type.

use chrono::NaiveDateTime;
use maitred_id::ReservationId;
use serde::{Deserialize, Serialize};

use crate::ReservationError;

/// A party of `quantity` guests booked for `at`.
///
/// `at` is a wall-clock time in the restaurant's own calendar; it is stored
/// and compared exactly as given. Reservations are immutable: the `with_*`
/// methods return a new value that keeps the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawReservation")]
pub struct Reservation {
    id: ReservationId,
    at: NaiveDateTime,
    email: String,
    name: String,
    quantity: u32,
}

impl Reservation {
    /// Creates a reservation.
    ///
    /// Fails iff `quantity < 1`.
    pub fn new(
        id: ReservationId,
        at: NaiveDateTime,
        email: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
    ) -> Result<Self, ReservationError> {
        Ok(Self {
            id,
            at,
            email: email.into(),
            name: name.into(),
            quantity: checked_quantity(quantity)?,
        })
    }

    pub fn id(&self) -> ReservationId {
        self.id
    }

    pub fn at(&self) -> NaiveDateTime {
        self.at
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns a copy moved to a new time.
    #[must_use]
    pub fn with_at(&self, at: NaiveDateTime) -> Self {
        Self { at, ..self.clone() }
    }

    /// Returns a copy with a new party size.
    pub fn with_quantity(&self, quantity: i64) -> Result<Self, ReservationError> {
        Ok(Self {
            quantity: checked_quantity(quantity)?,
            ..self.clone()
        })
    }

    #[must_use]
    pub fn with_email(&self, email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

fn checked_quantity(quantity: i64) -> Result<u32, ReservationError> {
    if quantity < 1 {
        return Err(ReservationError::InvalidQuantity(quantity));
    }
    u32::try_from(quantity).map_err(|_| ReservationError::InvalidQuantity(quantity))
}

/// Wire shape; deserialization goes through [`Reservation::new`].
#[derive(Deserialize)]
struct RawReservation {
    id: ReservationId,
    at: NaiveDateTime,
    email: String,
    #[serde(default)]
    name: String,
    quantity: i64,
}

impl TryFrom<RawReservation> for Reservation {
    type Error = ReservationError;

    fn try_from(raw: RawReservation) -> Result<Self, Self::Error> {
        Reservation::new(raw.id, raw.at, raw.email, raw.name, raw.quantity)
    }
}
