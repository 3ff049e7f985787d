//! # maitred-events
//!
//! Reservation lifecycle events.
//!
//! Events are published after a reservation change has been committed. They
//! are notifications, not the source of truth: a lost event never changes
//! what the store holds.
//!
//! ## Event Envelope
//!
//! Every event is wrapped in an [`EventEnvelope`] carrying:
//! - the publisher's sequence number (`seq`)
//! - the commit time
//! - the restaurant the reservation belongs to
//!
//! ## Event Types
//!
//! - `reservation.created`
//! - `reservation.updated`
//! - `reservation.deleted`

mod envelope;
mod error;
mod types;

pub use envelope::*;
pub use error::EventError;
pub use types::*;
