//! # maitred-seating
//!
//! The allocation core of the booking system. Everything here is a pure
//! function of its inputs: no I/O, no clocks, no interior mutability, so
//! every type is safe to share across request handlers.
//!
//! ## Concepts
//!
//! - [`Reservation`]: a party of `quantity` guests arriving at `at`.
//! - [`Seating`]: the half-open interval `[at, at + duration)` a reservation
//!   occupies.
//! - [`Table`]: a standard table (one party at a time) or a communal table
//!   (parties share the seats).
//! - [`MaitreD`]: a restaurant's opening hours, seating duration and ordered
//!   table list. Answers "does this candidate fit?" and derives the staff
//!   schedule.
//!
//! ## Allocation
//!
//! Allocation is a greedy first-fit: each reservation takes the first table
//! in the pool that fits it. It is deterministic for a fixed table order and
//! a fixed reservation order, and it is not optimal. Both orders are part of
//! the observable behaviour.

mod error;
mod layout;
mod maitre_d;
mod reservation;
mod schedule;
mod seating;
mod table;

pub use error::{MaitreDError, ReservationError};
pub use layout::{RestaurantLayout, TableKind, TableSpec};
pub use maitre_d::{Decision, MaitreD};
pub use reservation::Reservation;
pub use schedule::{Segment, TimeSlot};
pub use seating::Seating;
pub use table::{CommunalTable, StandardTable, Table};
