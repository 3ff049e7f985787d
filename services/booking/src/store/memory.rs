//! In-process reservation store.
//!
//! Each restaurant's book sits behind its own `tokio::sync::Mutex`. An
//! admission transaction holds that lock from `begin` until it is committed
//! or dropped, so admissions for one restaurant run one at a time while
//! different restaurants proceed in parallel. Plain repository calls take the
//! same lock for a single operation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use maitred_id::{ReservationId, RestaurantId};
use maitred_seating::Reservation;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{
    sort_reservations, AdmissionStore, AdmissionTransaction, ReservationRepository, StoreError,
};

type Book = HashMap<ReservationId, Reservation>;

/// Reservation store that lives in memory.
///
/// Cloning is cheap; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationStore {
    books: Arc<Mutex<HashMap<RestaurantId, Arc<Mutex<Book>>>>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn book(&self, restaurant_id: RestaurantId) -> Arc<Mutex<Book>> {
        let mut books = self.books.lock().await;
        books.entry(restaurant_id).or_default().clone()
    }

    /// Number of reservations held for `restaurant_id`.
    pub async fn len(&self, restaurant_id: RestaurantId) -> usize {
        self.book(restaurant_id).await.lock().await.len()
    }
}

fn in_window(reservation: &Reservation, min: NaiveDateTime, max: NaiveDateTime) -> bool {
    min <= reservation.at() && reservation.at() < max
}

#[async_trait]
impl ReservationRepository for InMemoryReservationStore {
    async fn read_reservations(
        &self,
        restaurant_id: RestaurantId,
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> Result<Vec<Reservation>, StoreError> {
        let book = self.book(restaurant_id).await;
        let book = book.lock().await;
        let mut found: Vec<Reservation> = book
            .values()
            .filter(|r| in_window(r, min, max))
            .cloned()
            .collect();
        sort_reservations(&mut found);
        Ok(found)
    }

    async fn read_by_id(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError> {
        let book = self.book(restaurant_id).await;
        let book = book.lock().await;
        Ok(book.get(&id).cloned())
    }

    async fn create(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        let book = self.book(restaurant_id).await;
        let mut book = book.lock().await;
        if book.contains_key(&reservation.id()) {
            return Err(StoreError::Duplicate(reservation.id()));
        }
        book.insert(reservation.id(), reservation.clone());
        Ok(())
    }

    async fn update(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        let book = self.book(restaurant_id).await;
        let mut book = book.lock().await;
        match book.get_mut(&reservation.id()) {
            Some(slot) => {
                *slot = reservation.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(reservation.id())),
        }
    }

    async fn delete(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError> {
        let book = self.book(restaurant_id).await;
        let mut book = book.lock().await;
        Ok(book.remove(&id))
    }
}

#[async_trait]
impl AdmissionStore for InMemoryReservationStore {
    async fn begin(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Box<dyn AdmissionTransaction>, StoreError> {
        let guard = self.book(restaurant_id).await.lock_owned().await;
        debug!(%restaurant_id, "admission transaction started");
        Ok(Box::new(InMemoryTransaction {
            restaurant_id,
            book: guard,
            staged: HashMap::new(),
        }))
    }
}

/// Holds the restaurant's lock; staged writes overlay the book until commit.
struct InMemoryTransaction {
    restaurant_id: RestaurantId,
    book: OwnedMutexGuard<Book>,
    staged: Book,
}

impl InMemoryTransaction {
    fn get(&self, id: &ReservationId) -> Option<&Reservation> {
        self.staged.get(id).or_else(|| self.book.get(id))
    }
}

#[async_trait]
impl AdmissionTransaction for InMemoryTransaction {
    async fn read_reservations(
        &mut self,
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> Result<Vec<Reservation>, StoreError> {
        let committed = self
            .book
            .values()
            .filter(|r| !self.staged.contains_key(&r.id()));
        let mut found: Vec<Reservation> = committed
            .chain(self.staged.values())
            .filter(|r| in_window(r, min, max))
            .cloned()
            .collect();
        sort_reservations(&mut found);
        Ok(found)
    }

    async fn read_by_id(&mut self, id: ReservationId) -> Result<Option<Reservation>, StoreError> {
        Ok(self.get(&id).cloned())
    }

    async fn create(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        if self.get(&reservation.id()).is_some() {
            return Err(StoreError::Duplicate(reservation.id()));
        }
        self.staged.insert(reservation.id(), reservation.clone());
        Ok(())
    }

    async fn update(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        if self.get(&reservation.id()).is_none() {
            return Err(StoreError::NotFound(reservation.id()));
        }
        self.staged.insert(reservation.id(), reservation.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryTransaction {
            restaurant_id,
            mut book,
            staged,
        } = *self;
        let writes = staged.len();
        book.extend(staged);
        debug!(%restaurant_id, writes, "admission transaction committed");
        Ok(())
    }
}
