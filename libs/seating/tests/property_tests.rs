//! Property-based tests for the seating invariants.

use chrono::{Duration, NaiveDateTime};
use maitred_id::ReservationId;
use maitred_seating::{Decision, MaitreD, Reservation, Seating, Table};
use maitred_testing::{
    arb_maitre_d, arb_reservation, arb_reservations, arb_table, arb_tables, at, time,
};
use proptest::prelude::*;

/// Arbitrary tables followed by one communal table big enough for every
/// party, so that no reservation is ever left unseated.
fn roomy_maitre_d(tables: Vec<Table>, reservations: &[Reservation], minutes: i64) -> MaitreD {
    let total: u32 = reservations.iter().map(Reservation::quantity).sum();
    let mut tables = tables;
    tables.push(Table::communal(total.max(1)));
    MaitreD::new(time(18, 0), time(21, 0), Duration::minutes(minutes), tables).unwrap()
}

fn sorted_ids<'a>(reservations: impl IntoIterator<Item = &'a Reservation>) -> Vec<ReservationId> {
    let mut ids: Vec<_> = reservations.into_iter().map(Reservation::id).collect();
    ids.sort();
    ids
}

proptest! {
    /// INVARIANT: 0 <= remaining_capacity <= capacity, however many parties
    /// are squeezed onto a table.
    #[test]
    fn remaining_capacity_is_bounded(
        table in arb_table(),
        parties in prop::collection::vec(arb_reservation(), 0..8),
    ) {
        let mut table = table;
        prop_assert!(table.remaining_capacity() <= table.capacity());
        for party in &parties {
            table = table.reserve(party);
            prop_assert!(table.remaining_capacity() <= table.capacity());
        }
    }

    /// INVARIANT: construction fails iff quantity < 1.
    #[test]
    fn reservation_fails_iff_quantity_below_one(quantity in -1_000i64..1_000) {
        let result = Reservation::new(ReservationId::new(), at(19, 0), "a@example.com", "", quantity);
        prop_assert_eq!(result.is_err(), quantity < 1);
    }

    /// INVARIANT: overlap is symmetric and half-open.
    #[test]
    fn overlap_is_symmetric_and_half_open(
        a_offset in 0i64..600,
        b_offset in 0i64..600,
        a_minutes in 1i64..300,
        b_minutes in 1i64..300,
    ) {
        let base = at(12, 0);
        let a = Seating::new(Duration::minutes(a_minutes), base + Duration::minutes(a_offset));
        let b = Seating::new(Duration::minutes(b_minutes), base + Duration::minutes(b_offset));

        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        if a.end() <= b.start() || b.end() <= a.start() {
            prop_assert!(!a.overlaps(&b));
        } else {
            prop_assert!(a.overlaps(&b));
        }
    }

    /// INVARIANT: the decision is a pure function of its inputs.
    #[test]
    fn decision_is_idempotent(
        maitre_d in arb_maitre_d(),
        existing in arb_reservations(),
        candidate in arb_reservation(),
    ) {
        let first = maitre_d.decide(&existing, &candidate);
        let second = maitre_d.decide(&existing, &candidate);
        prop_assert_eq!(first, second);
    }

    /// INVARIANT: a candidate before opening is rejected regardless of
    /// capacity.
    #[test]
    fn before_opening_is_always_rejected(
        tables in arb_tables(),
        minute in 0u32..(18 * 60),
    ) {
        let maitre_d = MaitreD::new(time(18, 0), time(21, 0), Duration::minutes(90), tables).unwrap();
        let when: NaiveDateTime = at(0, 0) + Duration::minutes(i64::from(minute));
        let candidate = Reservation::new(ReservationId::new(), when, "a@example.com", "", 1).unwrap();
        prop_assert_eq!(maitre_d.decide(&[], &candidate), Decision::BeforeOpening);
    }

    /// INVARIANT: an accepted candidate is seated when allocated after the
    /// reservations it was checked against.
    #[test]
    fn accepted_candidate_gets_a_table(
        maitre_d in arb_maitre_d(),
        existing in arb_reservations(),
        candidate in arb_reservation(),
    ) {
        if !maitre_d.will_accept(&existing, &candidate) {
            return Ok(());
        }

        let seating = maitre_d.seating(&candidate);
        let relevant = existing.iter().filter(|r| seating.overlaps_reservation(r));
        let pool = maitre_d.allocate(relevant.chain(std::iter::once(&candidate)));

        let seated = pool
            .iter()
            .flat_map(Table::reservations)
            .any(|r| r.id() == candidate.id());
        prop_assert!(seated);
    }

    /// INVARIANT: one slot per distinct time, strictly ascending, every
    /// table present, and exactly the overlapping reservations seated.
    #[test]
    fn schedule_accounts_for_every_relevant_reservation(
        tables in arb_tables(),
        reservations in arb_reservations(),
        minutes in 30i64..=240,
    ) {
        let maitre_d = roomy_maitre_d(tables, &reservations, minutes);
        let slots = maitre_d.schedule(&reservations);

        let mut distinct: Vec<_> = reservations.iter().map(Reservation::at).collect();
        distinct.sort();
        distinct.dedup();
        let times: Vec<_> = slots.iter().map(|s| s.at()).collect();
        prop_assert_eq!(times, distinct);

        for slot in &slots {
            prop_assert_eq!(slot.total_capacity(), maitre_d.total_capacity());
            prop_assert_eq!(slot.tables().len(), maitre_d.tables().len());

            let seating = Seating::new(maitre_d.seating_duration(), slot.at());
            let expected = sorted_ids(reservations.iter().filter(|r| seating.overlaps_reservation(r)));
            let actual = sorted_ids(slot.reservations());
            prop_assert_eq!(actual, expected);
        }
    }
}
