//! Error types for the seating core.

use chrono::NaiveTime;
use thiserror::Error;

/// Errors raised when constructing a [`crate::Reservation`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationError {
    /// Party size below one.
    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),
}

/// Errors raised when constructing a [`crate::MaitreD`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaitreDError {
    #[error("a restaurant needs at least one table")]
    NoTables,

    #[error("table {index} has no seats")]
    EmptyTable { index: usize },

    #[error("table {index} is already holding reservations")]
    OccupiedTable { index: usize },

    #[error("seating duration must be positive")]
    NonPositiveDuration,

    #[error("last seating {last_seating} is before opening time {opens_at}")]
    LastSeatingBeforeOpening {
        opens_at: NaiveTime,
        last_seating: NaiveTime,
    },
}
