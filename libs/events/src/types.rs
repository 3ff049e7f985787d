//! Event type definitions and payloads.

use chrono::NaiveDateTime;
use maitred_id::ReservationId;
use maitred_seating::Reservation;
use serde::{Deserialize, Serialize};

/// All event type names as constants.
pub mod event_types {
    pub const RESERVATION_CREATED: &str = "reservation.created";
    pub const RESERVATION_UPDATED: &str = "reservation.updated";
    pub const RESERVATION_DELETED: &str = "reservation.deleted";

    pub const ALL: &[&str] = &[RESERVATION_CREATED, RESERVATION_UPDATED, RESERVATION_DELETED];
}

/// Current schema version for every reservation event.
pub const RESERVATION_EVENT_VERSION: i32 = 1;

/// Reservation fields as carried in events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSnapshot {
    pub reservation_id: ReservationId,
    pub at: NaiveDateTime,
    pub email: String,
    pub name: String,
    pub quantity: u32,
}

impl From<&Reservation> for ReservationSnapshot {
    fn from(r: &Reservation) -> Self {
        Self {
            reservation_id: r.id(),
            at: r.at(),
            email: r.email().to_string(),
            name: r.name().to_string(),
            quantity: r.quantity(),
        }
    }
}

/// A committed reservation change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReservationEvent {
    Created {
        reservation: ReservationSnapshot,
    },
    Updated {
        previous: ReservationSnapshot,
        reservation: ReservationSnapshot,
    },
    Deleted {
        reservation: ReservationSnapshot,
    },
}

impl ReservationEvent {
    pub fn created(reservation: &Reservation) -> Self {
        Self::Created {
            reservation: reservation.into(),
        }
    }

    pub fn updated(previous: &Reservation, reservation: &Reservation) -> Self {
        Self::Updated {
            previous: previous.into(),
            reservation: reservation.into(),
        }
    }

    pub fn deleted(reservation: &Reservation) -> Self {
        Self::Deleted {
            reservation: reservation.into(),
        }
    }

    /// The dotted event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created { .. } => event_types::RESERVATION_CREATED,
            Self::Updated { .. } => event_types::RESERVATION_UPDATED,
            Self::Deleted { .. } => event_types::RESERVATION_DELETED,
        }
    }

    pub fn reservation_id(&self) -> ReservationId {
        match self {
            Self::Created { reservation }
            | Self::Updated { reservation, .. }
            | Self::Deleted { reservation } => reservation.reservation_id,
        }
    }
}
