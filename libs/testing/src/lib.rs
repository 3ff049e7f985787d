//! Shared fixtures for maitred tests.
//!
//! Builders for reservations, a few canned restaurants, and proptest
//! strategies for the seating model.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use maitred_id::ReservationId;
use maitred_seating::{MaitreD, Reservation, Table};
use proptest::prelude::*;

/// The date most fixtures book on.
pub fn service_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 14).expect("valid date")
}

/// `hh:mm` on [`service_date`].
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    on(service_date(), hour, minute)
}

/// `hh:mm` on `date`.
pub fn on(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_time(time(hour, minute))
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

/// Builder with sensible defaults: a party of two at 19:00.
#[derive(Debug, Clone)]
pub struct ReservationBuilder {
    id: ReservationId,
    at: NaiveDateTime,
    email: String,
    name: String,
    quantity: i64,
}

impl Default for ReservationBuilder {
    fn default() -> Self {
        Self {
            id: ReservationId::new(),
            at: at(19, 0),
            email: "guest@example.com".to_string(),
            name: "Guest".to_string(),
            quantity: 2,
        }
    }
}

impl ReservationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: ReservationId) -> Self {
        self.id = id;
        self
    }

    pub fn at(mut self, at: NaiveDateTime) -> Self {
        self.at = at;
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// Panics on an invalid quantity; use [`Reservation::new`] to test
    /// validation.
    pub fn build(self) -> Reservation {
        Reservation::new(self.id, self.at, self.email, self.name, self.quantity)
            .expect("fixture reservation must be valid")
    }
}

/// A party of `quantity` at `hh:mm` on [`service_date`].
pub fn party(hour: u32, minute: u32, quantity: i64) -> Reservation {
    ReservationBuilder::new()
        .at(at(hour, minute))
        .quantity(quantity)
        .build()
}

/// Opens 18:00, last seating 21:00, 2.5 hour seatings.
pub fn evening_service(tables: Vec<Table>) -> MaitreD {
    MaitreD::new(time(18, 0), time(21, 0), Duration::minutes(150), tables)
        .expect("fixture restaurant must be valid")
}

/// One communal table of ten.
pub fn communal_ten() -> MaitreD {
    evening_service(vec![Table::communal(10)])
}

/// A two-top and an eleven-top.
pub fn two_and_eleven() -> MaitreD {
    evening_service(vec![Table::standard(2), Table::standard(11)])
}

/// Four two-tops, two four-tops and a communal bar of six.
pub fn mixed_floor() -> MaitreD {
    evening_service(vec![
        Table::standard(2),
        Table::standard(2),
        Table::standard(2),
        Table::standard(2),
        Table::standard(4),
        Table::standard(4),
        Table::communal(6),
    ])
}

// =============================================================================
// Proptest strategies
// =============================================================================

pub fn arb_table() -> impl Strategy<Value = Table> {
    prop_oneof![
        (1u32..=12).prop_map(Table::standard),
        (1u32..=20).prop_map(Table::communal),
    ]
}

pub fn arb_tables() -> impl Strategy<Value = Vec<Table>> {
    prop::collection::vec(arb_table(), 1..6)
}

pub fn arb_quantity() -> impl Strategy<Value = i64> {
    1i64..=12
}

/// Any time on [`service_date`] at a quarter-hour between 16:00 and 23:45.
pub fn arb_time_on_service_date() -> impl Strategy<Value = NaiveDateTime> {
    (16u32..24, prop::sample::select(vec![0u32, 15, 30, 45]))
        .prop_map(|(hour, minute)| at(hour, minute))
}

pub fn arb_reservation() -> impl Strategy<Value = Reservation> {
    (arb_time_on_service_date(), arb_quantity()).prop_map(|(at, quantity)| {
        ReservationBuilder::new().at(at).quantity(quantity).build()
    })
}

pub fn arb_reservations() -> impl Strategy<Value = Vec<Reservation>> {
    prop::collection::vec(arb_reservation(), 0..12)
}

/// Evening service over arbitrary tables, with seatings of 30 to 240 minutes.
pub fn arb_maitre_d() -> impl Strategy<Value = MaitreD> {
    (arb_tables(), 30i64..=240).prop_map(|(tables, minutes)| {
        MaitreD::new(time(18, 0), time(21, 0), Duration::minutes(minutes), tables)
            .expect("generated restaurant must be valid")
    })
}
