//! Concurrent admissions: no overselling, conflict retries, timeouts,
//! late commit acknowledgements and cancellation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures_util::future::join_all;
use maitred_booking::{
    Admission, AdmissionController, AdmissionError, AdmissionPolicy, AdmissionStore,
    AdmissionTransaction, BackoffPolicy, InMemoryReservationStore, Rejection, ReservationChange,
    ReservationRepository, ReservationRequest, RestaurantRegistry, StoreError,
};
use maitred_id::{ReservationId, RestaurantId};
use maitred_seating::{MaitreD, Reservation, Table};
use maitred_testing::{communal_ten, evening_service, party};

fn registry(restaurant: RestaurantId, maitre_d: MaitreD) -> RestaurantRegistry {
    RestaurantRegistry::new().with_restaurant(restaurant, "Hipgnosta", maitre_d)
}

fn fast_policy() -> AdmissionPolicy {
    AdmissionPolicy {
        max_attempts: 3,
        backoff: BackoffPolicy {
            base: Duration::from_millis(1),
            max: Duration::from_millis(5),
            jitter: 0.0,
        },
        timeout: Duration::from_millis(200),
    }
}

async fn admit_concurrently<S>(
    controller: Arc<AdmissionController<S>>,
    restaurant: RestaurantId,
    candidates: Vec<Reservation>,
) -> Vec<Admission>
where
    S: AdmissionStore + 'static,
{
    let handles = candidates.into_iter().map(|candidate| {
        let controller = controller.clone();
        tokio::spawn(async move { controller.try_create(restaurant, &candidate).await })
    });
    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("admission failed"))
        .collect()
}

fn count_accepted(admissions: &[Admission]) -> usize {
    admissions.iter().filter(|a| a.is_accepted()).count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_seat_goes_to_exactly_one_party() {
    let restaurant = RestaurantId::new();
    let store = InMemoryReservationStore::new();
    store.create(restaurant, &party(18, 30, 9)).await.unwrap();
    let controller = Arc::new(AdmissionController::new(
        store.clone(),
        registry(restaurant, communal_ten()),
    ));

    let admissions = admit_concurrently(
        controller,
        restaurant,
        vec![party(18, 30, 1), party(18, 30, 1)],
    )
    .await;

    assert_eq!(count_accepted(&admissions), 1);
    assert!(admissions.contains(&Admission::rejected(Rejection::Capacity)));
    assert_eq!(store.len(restaurant).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pair_that_only_fits_one_at_a_time() {
    // q + c1 > C and q + c2 > C, but each fits alone.
    for (existing, first, second) in [(4, 6, 6), (0, 7, 4), (9, 1, 1), (3, 5, 7)] {
        let restaurant = RestaurantId::new();
        let store = InMemoryReservationStore::new();
        if existing > 0 {
            store
                .create(restaurant, &party(19, 0, existing))
                .await
                .unwrap();
        }
        let controller = Arc::new(AdmissionController::new(
            store.clone(),
            registry(restaurant, communal_ten()),
        ));

        let admissions = admit_concurrently(
            controller,
            restaurant,
            vec![party(19, 0, first), party(19, 30, second)],
        )
        .await;

        assert_eq!(
            count_accepted(&admissions),
            1,
            "existing {existing}, candidates {first} and {second}: {admissions:?}"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_parties_never_oversell() {
    let restaurant = RestaurantId::new();
    let store = InMemoryReservationStore::new();
    let maitre_d = evening_service(vec![
        Table::standard(2),
        Table::standard(2),
        Table::standard(4),
        Table::communal(6),
    ]);
    let controller = Arc::new(AdmissionController::new(
        store.clone(),
        registry(restaurant, maitre_d.clone()),
    ));

    let candidates: Vec<_> = (0..40).map(|i| party(19, 0, 1 + (i % 3))).collect();
    let admissions = admit_concurrently(controller, restaurant, candidates).await;

    let accepted = count_accepted(&admissions);
    assert!(accepted > 0);
    assert_eq!(store.len(restaurant).await, accepted);

    let stored = store
        .read_reservations(restaurant, NaiveDateTime::MIN, NaiveDateTime::MAX)
        .await
        .unwrap();
    let guests: u64 = stored.iter().map(|r| u64::from(r.quantity())).sum();
    assert!(guests <= maitre_d.total_capacity(), "{guests} guests seated");
    // Standard tables hold one party each, the communal table at most six.
    assert!(accepted <= 2 + 1 + 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_restaurants_do_not_contend() {
    let here = RestaurantId::new();
    let there = RestaurantId::new();
    let store = InMemoryReservationStore::new();
    let registry = RestaurantRegistry::new()
        .with_restaurant(here, "Hipgnosta", communal_ten())
        .with_restaurant(there, "Nono", communal_ten());
    let controller = Arc::new(AdmissionController::new(store.clone(), registry));

    let a = tokio::spawn({
        let controller = controller.clone();
        async move { controller.try_create(here, &party(19, 0, 10)).await }
    });
    let b = tokio::spawn({
        let controller = controller.clone();
        async move { controller.try_create(there, &party(19, 0, 10)).await }
    });

    assert!(a.await.unwrap().unwrap().is_accepted());
    assert!(b.await.unwrap().unwrap().is_accepted());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reschedules_keep_both_changes() {
    let restaurant = RestaurantId::new();
    let store = InMemoryReservationStore::new();
    let original = party(19, 0, 2);
    store.create(restaurant, &original).await.unwrap();
    let controller = Arc::new(AdmissionController::new(
        store.clone(),
        registry(restaurant, communal_ten()),
    ));

    let grow = ReservationChange {
        quantity: Some(4),
        ..Default::default()
    };
    let rename = ReservationChange {
        name: Some("Grace".to_string()),
        ..Default::default()
    };
    let handles = [grow, rename].into_iter().map(|change| {
        let controller = controller.clone();
        let id = original.id();
        tokio::spawn(async move { controller.reschedule(restaurant, id, &change).await })
    });
    for admission in join_all(handles).await {
        assert!(admission.unwrap().unwrap().is_accepted());
    }

    let stored = store
        .read_by_id(restaurant, original.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.quantity(), 4);
    assert_eq!(stored.name(), "Grace");
    assert_eq!(stored.at(), original.at());
}

// =============================================================================
// Flaky store
// =============================================================================

/// Wraps the in-memory store. Fails the first `conflicts` commits, and
/// acknowledges successful commits only after `ack_delay`.
#[derive(Clone)]
struct FlakyStore {
    inner: InMemoryReservationStore,
    conflicts: Arc<AtomicU32>,
    ack_delay: Duration,
    begun: Arc<AtomicU32>,
}

impl FlakyStore {
    fn conflicting(conflicts: u32) -> Self {
        Self {
            inner: InMemoryReservationStore::new(),
            conflicts: Arc::new(AtomicU32::new(conflicts)),
            ack_delay: Duration::ZERO,
            begun: Arc::new(AtomicU32::new(0)),
        }
    }

    fn slow_ack(ack_delay: Duration) -> Self {
        Self {
            ack_delay,
            ..Self::conflicting(0)
        }
    }
}

#[async_trait]
impl ReservationRepository for FlakyStore {
    async fn read_reservations(
        &self,
        restaurant_id: RestaurantId,
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> Result<Vec<Reservation>, StoreError> {
        self.inner.read_reservations(restaurant_id, min, max).await
    }

    async fn read_by_id(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError> {
        self.inner.read_by_id(restaurant_id, id).await
    }

    async fn create(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        self.inner.create(restaurant_id, reservation).await
    }

    async fn update(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        self.inner.update(restaurant_id, reservation).await
    }

    async fn delete(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError> {
        self.inner.delete(restaurant_id, id).await
    }
}

#[async_trait]
impl AdmissionStore for FlakyStore {
    async fn begin(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Box<dyn AdmissionTransaction>, StoreError> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FlakyTransaction {
            inner: self.inner.begin(restaurant_id).await?,
            conflicts: self.conflicts.clone(),
            ack_delay: self.ack_delay,
        }))
    }
}

struct FlakyTransaction {
    inner: Box<dyn AdmissionTransaction>,
    conflicts: Arc<AtomicU32>,
    ack_delay: Duration,
}

#[async_trait]
impl AdmissionTransaction for FlakyTransaction {
    async fn read_reservations(
        &mut self,
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> Result<Vec<Reservation>, StoreError> {
        self.inner.read_reservations(min, max).await
    }

    async fn read_by_id(&mut self, id: ReservationId) -> Result<Option<Reservation>, StoreError> {
        self.inner.read_by_id(id).await
    }

    async fn create(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        self.inner.create(reservation).await
    }

    async fn update(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        self.inner.update(reservation).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let remaining = self.conflicts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Conflict);
        }
        self.inner.commit().await?;
        tokio::time::sleep(self.ack_delay).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_conflicts_are_retried() {
    let restaurant = RestaurantId::new();
    let store = FlakyStore::conflicting(2);
    let controller = AdmissionController::new(store.clone(), registry(restaurant, communal_ten()))
        .with_policy(fast_policy());
    let r = party(19, 0, 2);

    let admission = controller.try_create(restaurant, &r).await.unwrap();

    assert_eq!(admission, Admission::accepted(r.id()));
    assert_eq!(store.begun.load(Ordering::SeqCst), 3);
    assert!(store.inner.read_by_id(restaurant, r.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_persistent_conflict_surfaces_as_contended() {
    let restaurant = RestaurantId::new();
    let store = FlakyStore::conflicting(u32::MAX);
    let controller = AdmissionController::new(store.clone(), registry(restaurant, communal_ten()))
        .with_policy(fast_policy());
    let r = party(19, 0, 2);

    let err = controller.try_create(restaurant, &r).await.unwrap_err();

    assert!(matches!(err, AdmissionError::Contended { attempts: 3 }));
    assert!(err.is_retryable());
    assert_eq!(store.begun.load(Ordering::SeqCst), 3);
    assert_eq!(store.inner.len(restaurant).await, 0);
}

// =============================================================================
// Timeouts and cancellation
// =============================================================================

#[tokio::test]
async fn test_late_commit_acknowledgement_is_not_a_timeout() {
    let restaurant = RestaurantId::new();
    let store = FlakyStore::slow_ack(Duration::from_millis(200));
    let policy = AdmissionPolicy {
        timeout: Duration::from_millis(50),
        ..fast_policy()
    };
    let controller = AdmissionController::new(store.clone(), registry(restaurant, communal_ten()))
        .with_policy(policy);
    let request = ReservationRequest::new("2024-06-14 19:00", "ada@example.com", "Ada", 2);

    let admission = controller
        .request_admission(restaurant, &request)
        .await
        .unwrap();

    let Admission::Accepted { reservation_id } = admission else {
        panic!("expected acceptance, got {admission:?}");
    };
    assert_eq!(store.inner.len(restaurant).await, 1);

    let grow = ReservationChange {
        quantity: Some(4),
        ..Default::default()
    };
    let admission = controller
        .reschedule(restaurant, reservation_id, &grow)
        .await
        .unwrap();
    assert!(admission.is_accepted());
    let stored = store
        .inner
        .read_by_id(restaurant, reservation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.quantity(), 4);
    assert_eq!(store.inner.len(restaurant).await, 1);
}

#[tokio::test]
async fn test_attempt_times_out_while_restaurant_is_locked() {
    let restaurant = RestaurantId::new();
    let store = InMemoryReservationStore::new();
    let policy = AdmissionPolicy {
        timeout: Duration::from_millis(50),
        ..fast_policy()
    };
    let controller = AdmissionController::new(store.clone(), registry(restaurant, communal_ten()))
        .with_policy(policy);

    let held = store.begin(restaurant).await.unwrap();
    let err = controller
        .try_create(restaurant, &party(19, 0, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, AdmissionError::Timeout(_)));
    assert!(err.is_retryable());

    drop(held);
    assert_eq!(store.len(restaurant).await, 0);
    let admission = controller
        .try_create(restaurant, &party(19, 0, 2))
        .await
        .unwrap();
    assert!(admission.is_accepted());
}

#[tokio::test]
async fn test_cancelled_admission_commits_nothing() {
    let restaurant = RestaurantId::new();
    let store = InMemoryReservationStore::new();
    let controller = AdmissionController::new(store.clone(), registry(restaurant, communal_ten()));
    let r = party(19, 0, 2);

    let held = store.begin(restaurant).await.unwrap();
    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), controller.try_create(restaurant, &r))
            .await;
    assert!(abandoned.is_err());
    held.commit().await.unwrap();

    assert!(store.read_by_id(restaurant, r.id()).await.unwrap().is_none());
    let admission = controller.try_create(restaurant, &r).await.unwrap();
    assert!(admission.is_accepted());
}
