//! Repository boundary for reservations.
//!
//! Two layers:
//! - [`ReservationRepository`]: plain reads and writes, one statement each.
//! - [`AdmissionStore`]: opens an [`AdmissionTransaction`] scoped to one
//!   restaurant. Everything read and written through the transaction is
//!   serializable with respect to every other admission transaction of the
//!   same restaurant. A store that cannot guarantee this reports
//!   [`StoreError::Conflict`] on the losing side instead.
//!
//! Dropping a transaction without calling [`AdmissionTransaction::commit`]
//! discards its writes.

mod memory;

pub use memory::InMemoryReservationStore;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use maitred_id::{ReservationId, RestaurantId};
use maitred_seating::Reservation;
use thiserror::Error;

/// Reservation store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The transaction lost a race against a concurrent one and was rolled
    /// back. Retrying from the start is safe.
    #[error("transaction conflict")]
    Conflict,

    /// The store could not be reached (pool exhausted, connection lost).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Failed to execute a query.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("reservation not found: {0}")]
    NotFound(ReservationId),

    #[error("reservation already exists: {0}")]
    Duplicate(ReservationId),

    /// A stored row that no longer passes domain validation.
    #[error("corrupt reservation {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

impl StoreError {
    /// Whether the same operation may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict | StoreError::Unavailable(_))
    }
}

/// Non-transactional reservation access.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Reservations of `restaurant_id` with `min <= at < max`, ordered by
    /// `at` and then by id.
    async fn read_reservations(
        &self,
        restaurant_id: RestaurantId,
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> Result<Vec<Reservation>, StoreError>;

    async fn read_by_id(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the id is taken.
    async fn create(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] if there is nothing to replace.
    async fn update(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), StoreError>;

    /// Removes a reservation, returning it if it existed.
    async fn delete(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError>;
}

/// A store that can run read-decide-write admission cycles atomically.
#[async_trait]
pub trait AdmissionStore: ReservationRepository {
    async fn begin(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Box<dyn AdmissionTransaction>, StoreError>;
}

/// One admission cycle against a single restaurant.
///
/// Reads observe the transaction's own staged writes.
#[async_trait]
pub trait AdmissionTransaction: Send {
    /// Same contract as [`ReservationRepository::read_reservations`].
    async fn read_reservations(
        &mut self,
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> Result<Vec<Reservation>, StoreError>;

    async fn read_by_id(&mut self, id: ReservationId) -> Result<Option<Reservation>, StoreError>;

    async fn create(&mut self, reservation: &Reservation) -> Result<(), StoreError>;

    async fn update(&mut self, reservation: &Reservation) -> Result<(), StoreError>;

    /// Makes the writes visible. May fail with [`StoreError::Conflict`], in
    /// which case nothing was written.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Ordering used by every `read_reservations` implementation.
pub(crate) fn sort_reservations(reservations: &mut [Reservation]) {
    reservations.sort_by_key(|r| (r.at(), r.id()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::Conflict.is_retryable());
        assert!(StoreError::Unavailable("pool timed out".into()).is_retryable());
        assert!(!StoreError::NotFound(ReservationId::new()).is_retryable());
        assert!(!StoreError::Duplicate(ReservationId::new()).is_retryable());
    }
}
