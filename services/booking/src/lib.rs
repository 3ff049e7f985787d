//! # maitred-booking
//!
//! Reservation admission on top of the seating core.
//!
//! - [`AdmissionController`]: admits, reschedules and cancels reservations
//!   without overselling, retrying conflicting transactions with backoff.
//! - [`store`]: the repository boundary, with an in-process store and
//!   ([`db`]) a Postgres store using serializable transactions.
//! - [`notify`]: post-commit notifications.
//! - [`config`]: environment configuration and the restaurants file.

pub mod admission;
pub mod config;
pub mod db;
pub mod notify;
pub mod registry;
pub mod request;
pub mod store;

pub use admission::{
    Admission, AdmissionController, AdmissionError, AdmissionPolicy, BackoffPolicy, DaySchedule,
    Rejection,
};
pub use config::{Config, ConfigError};
pub use notify::{BroadcastNotifier, NotifyError, ReservationNotifier, TracingNotifier};
pub use registry::{Restaurant, RestaurantRegistry};
pub use request::{ReservationChange, ReservationRequest, ValidationError};
pub use store::{
    AdmissionStore, AdmissionTransaction, InMemoryReservationStore, ReservationRepository,
    StoreError,
};
