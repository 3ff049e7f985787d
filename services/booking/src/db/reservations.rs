//! Postgres reservation store.
//!
//! Admission transactions run at `SERIALIZABLE`. Two admissions that read
//! overlapping windows of the same restaurant and both insert form a
//! read/write dependency cycle; Postgres aborts one of them with SQLSTATE
//! `40001`, which surfaces as [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::NaiveDateTime;
use maitred_id::{ReservationId, RestaurantId};
use maitred_seating::Reservation;
use sqlx::{
    postgres::{PgPool, PgRow},
    PgExecutor, Postgres, Row, Transaction,
};
use tracing::{debug, instrument};

use crate::store::{AdmissionStore, AdmissionTransaction, ReservationRepository, StoreError};

/// SQLSTATE for a serialization failure.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for a detected deadlock.
const DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// A row from the reservations table.
#[derive(Debug, Clone)]
struct ReservationRow {
    id: String,
    at: NaiveDateTime,
    email: String,
    name: String,
    quantity: i64,
}

impl<'r> sqlx::FromRow<'r, PgRow> for ReservationRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            at: row.try_get("at")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let id = ReservationId::parse(&row.id).map_err(|e| StoreError::Corrupt {
            id: row.id.clone(),
            reason: e.to_string(),
        })?;
        Reservation::new(id, row.at, row.email, row.name, row.quantity).map_err(|e| {
            StoreError::Corrupt {
                id: row.id,
                reason: e.to_string(),
            }
        })
    }
}

fn into_reservations(rows: Vec<ReservationRow>) -> Result<Vec<Reservation>, StoreError> {
    rows.into_iter().map(Reservation::try_from).collect()
}

fn store_error(e: sqlx::Error) -> StoreError {
    let code = match &e {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    };
    match code.as_deref() {
        Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => return StoreError::Conflict,
        _ => {}
    }
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        e => StoreError::Query(e),
    }
}

fn insert_error(id: ReservationId, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Duplicate(id);
        }
    }
    store_error(e)
}

async fn select_window<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: RestaurantId,
    min: NaiveDateTime,
    max: NaiveDateTime,
) -> Result<Vec<Reservation>, StoreError> {
    let rows = sqlx::query_as::<_, ReservationRow>(
        r#"
        SELECT id, at, email, name, quantity
        FROM reservations
        WHERE restaurant_id = $1 AND at >= $2 AND at < $3
        ORDER BY at, id COLLATE "C"
        "#,
    )
    .bind(restaurant_id.to_string())
    .bind(min)
    .bind(max)
    .fetch_all(executor)
    .await
    .map_err(store_error)?;

    into_reservations(rows)
}

async fn select_one<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: RestaurantId,
    id: ReservationId,
) -> Result<Option<Reservation>, StoreError> {
    let row = sqlx::query_as::<_, ReservationRow>(
        r#"
        SELECT id, at, email, name, quantity
        FROM reservations
        WHERE restaurant_id = $1 AND id = $2
        "#,
    )
    .bind(restaurant_id.to_string())
    .bind(id.to_string())
    .fetch_optional(executor)
    .await
    .map_err(store_error)?;

    row.map(Reservation::try_from).transpose()
}

async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: RestaurantId,
    reservation: &Reservation,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO reservations (id, restaurant_id, at, email, name, quantity)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(reservation.id().to_string())
    .bind(restaurant_id.to_string())
    .bind(reservation.at())
    .bind(reservation.email())
    .bind(reservation.name())
    .bind(i64::from(reservation.quantity()))
    .execute(executor)
    .await
    .map_err(|e| insert_error(reservation.id(), e))?;

    Ok(())
}

async fn replace<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: RestaurantId,
    reservation: &Reservation,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE reservations
        SET at = $3, email = $4, name = $5, quantity = $6, updated_at = now()
        WHERE restaurant_id = $1 AND id = $2
        "#,
    )
    .bind(restaurant_id.to_string())
    .bind(reservation.id().to_string())
    .bind(reservation.at())
    .bind(reservation.email())
    .bind(reservation.name())
    .bind(i64::from(reservation.quantity()))
    .execute(executor)
    .await
    .map_err(store_error)?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(reservation.id()));
    }
    Ok(())
}

/// Reservation store backed by the `reservations` table.
#[derive(Debug, Clone)]
pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    /// Create a new reservation store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepository for PgReservationStore {
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    async fn read_reservations(
        &self,
        restaurant_id: RestaurantId,
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> Result<Vec<Reservation>, StoreError> {
        select_window(&self.pool, restaurant_id, min, max).await
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id, reservation_id = %id))]
    async fn read_by_id(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError> {
        select_one(&self.pool, restaurant_id, id).await
    }

    #[instrument(skip(self, reservation), fields(restaurant_id = %restaurant_id, reservation_id = %reservation.id()))]
    async fn create(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        insert(&self.pool, restaurant_id, reservation).await
    }

    #[instrument(skip(self, reservation), fields(restaurant_id = %restaurant_id, reservation_id = %reservation.id()))]
    async fn update(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), StoreError> {
        replace(&self.pool, restaurant_id, reservation).await
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id, reservation_id = %id))]
    async fn delete(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            r#"
            DELETE FROM reservations
            WHERE restaurant_id = $1 AND id = $2
            RETURNING id, at, email, name, quantity
            "#,
        )
        .bind(restaurant_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(Reservation::try_from).transpose()
    }
}

#[async_trait]
impl AdmissionStore for PgReservationStore {
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    async fn begin(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Box<dyn AdmissionTransaction>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        debug!("serializable transaction started");

        Ok(Box::new(PgAdmissionTransaction { restaurant_id, tx }))
    }
}

/// Rolls back on drop unless committed.
struct PgAdmissionTransaction {
    restaurant_id: RestaurantId,
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AdmissionTransaction for PgAdmissionTransaction {
    async fn read_reservations(
        &mut self,
        min: NaiveDateTime,
        max: NaiveDateTime,
    ) -> Result<Vec<Reservation>, StoreError> {
        select_window(&mut *self.tx, self.restaurant_id, min, max).await
    }

    async fn read_by_id(&mut self, id: ReservationId) -> Result<Option<Reservation>, StoreError> {
        select_one(&mut *self.tx, self.restaurant_id, id).await
    }

    async fn create(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        insert(&mut *self.tx, self.restaurant_id, reservation).await
    }

    async fn update(&mut self, reservation: &Reservation) -> Result<(), StoreError> {
        replace(&mut *self.tx, self.restaurant_id, reservation).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_error)
    }
}
