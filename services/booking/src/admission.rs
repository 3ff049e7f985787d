//! Admission controller.
//!
//! Every admission is a read-decide-write cycle run inside one
//! [`AdmissionTransaction`]:
//!
//! 1. read the reservations whose seatings can overlap the candidate's
//! 2. ask the restaurant's [`MaitreD`] whether the candidate fits
//! 3. write the candidate and commit, or drop the transaction
//!
//! The store guarantees that two cycles for the same restaurant cannot both
//! commit decisions based on the same stale read; the loser gets
//! [`StoreError::Conflict`] and the whole cycle is retried with backoff.
//! Capacity is therefore never oversold, whatever the interleaving.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use maitred_id::{RequestId, ReservationId, RestaurantId};
use maitred_seating::{Decision, MaitreD, Reservation, Segment, TimeSlot};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::notify::{NotifyError, ReservationNotifier, TracingNotifier};
use crate::registry::RestaurantRegistry;
use crate::request::{ReservationChange, ReservationRequest};
use crate::store::{AdmissionStore, AdmissionTransaction, StoreError};

// =============================================================================
// Policy
// =============================================================================

/// Exponential backoff between conflicting attempts.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,

    /// Maximum delay.
    pub max: Duration,

    /// Jitter factor (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(10),
            max: Duration::from_secs(1),
            jitter: 0.25,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = self.base.as_millis() as f64 * 2.0_f64.powi(attempt.min(30) as i32);
        let delay = delay.min(self.max.as_millis() as f64);

        let jitter = if self.jitter > 0.0 {
            delay * self.jitter * rand::rng().random_range(-1.0_f64..=1.0)
        } else {
            0.0
        };

        Duration::from_millis((delay + jitter).max(0.0) as u64)
    }
}

/// Limits for a single admission.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    /// Attempts before giving up on a contended restaurant. At least one
    /// attempt is always made.
    pub max_attempts: u32,

    pub backoff: BackoffPolicy,

    /// Deadline for each attempt, from opening the transaction to commit.
    pub timeout: Duration,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: BackoffPolicy::default(),
            timeout: Duration::from_millis(5000),
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Why a well-formed request was turned down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Rejection {
    /// No table fits the party at that time.
    Capacity,
    /// The request itself cannot be honoured (malformed, or outside
    /// opening hours).
    Invalid(String),
}

impl Rejection {
    /// The rejection a decision implies, if any.
    pub fn from_decision(decision: Decision) -> Option<Self> {
        match decision {
            Decision::Accept => None,
            Decision::NoCapacity => Some(Rejection::Capacity),
            Decision::BeforeOpening | Decision::AfterLastSeating => {
                Some(Rejection::Invalid(decision.to_string()))
            }
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Capacity => f.write_str("no table available for the party"),
            Rejection::Invalid(reason) => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Admission {
    Accepted { reservation_id: ReservationId },
    Rejected { rejection: Rejection },
}

impl Admission {
    pub fn accepted(reservation_id: ReservationId) -> Self {
        Admission::Accepted { reservation_id }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Admission::Rejected { rejection }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted { .. })
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Admission::Accepted { .. } => None,
            Admission::Rejected { rejection } => Some(rejection),
        }
    }
}

/// Admission failures. A capacity rejection is not one of them.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("unknown restaurant: {0}")]
    UnknownRestaurant(RestaurantId),

    #[error("reservation not found: {0}")]
    NotFound(ReservationId),

    #[error("restaurant is busy; gave up after {attempts} attempts")]
    Contended { attempts: u32 },

    #[error("admission attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl AdmissionError {
    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            AdmissionError::Contended { .. } | AdmissionError::Timeout(_) => true,
            AdmissionError::Store(e) => e.is_retryable(),
            AdmissionError::UnknownRestaurant(_) | AdmissionError::NotFound(_) => false,
        }
    }
}

impl From<StoreError> for AdmissionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => AdmissionError::NotFound(id),
            e => AdmissionError::Store(e),
        }
    }
}

/// The staff view of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySchedule {
    pub segment: Segment,
    pub slots: Vec<TimeSlot>,
}

// =============================================================================
// Controller
// =============================================================================

/// What one attempt decided before committing.
enum Attempt<T> {
    /// Nothing to write; the transaction is dropped.
    Done(T),
    /// Writes are staged in the transaction; committing makes `T` true.
    Commit(Box<dyn AdmissionTransaction>, T),
}

/// Admits, reschedules and cancels reservations for a set of restaurants.
pub struct AdmissionController<S> {
    store: S,
    restaurants: RestaurantRegistry,
    notifier: Arc<dyn ReservationNotifier>,
    policy: AdmissionPolicy,
}

impl<S: AdmissionStore> AdmissionController<S> {
    /// Creates a controller that logs changes through [`TracingNotifier`]
    /// and uses the default [`AdmissionPolicy`].
    pub fn new(store: S, restaurants: RestaurantRegistry) -> Self {
        Self {
            store,
            restaurants,
            notifier: Arc::new(TracingNotifier),
            policy: AdmissionPolicy::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ReservationNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn restaurants(&self) -> &RestaurantRegistry {
        &self.restaurants
    }

    fn maitre_d(&self, restaurant_id: RestaurantId) -> Result<&MaitreD, AdmissionError> {
        self.restaurants
            .maitre_d(restaurant_id)
            .ok_or(AdmissionError::UnknownRestaurant(restaurant_id))
    }

    /// Validates a raw request and admits it under a fresh id.
    ///
    /// Malformed requests come back as `Rejected(Invalid(..))` without
    /// touching the store.
    pub async fn request_admission(
        &self,
        restaurant_id: RestaurantId,
        request: &ReservationRequest,
    ) -> Result<Admission, AdmissionError> {
        let request_id = RequestId::new();
        let span = info_span!("request_admission", %restaurant_id, %request_id);

        async move {
            match request.validate(ReservationId::new()) {
                Ok(reservation) => self.try_create(restaurant_id, &reservation).await,
                Err(e) => {
                    info!(error = %e, "request rejected");
                    Ok(Admission::rejected(Rejection::Invalid(e.to_string())))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Admits `reservation` if a table fits it.
    #[instrument(skip(self, reservation), fields(restaurant_id = %restaurant_id, reservation_id = %reservation.id()))]
    pub async fn try_create(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<Admission, AdmissionError> {
        let maitre_d = self.maitre_d(restaurant_id)?;
        if let Some(rejection) = Rejection::from_decision(maitre_d.check_time(reservation.at())) {
            info!(%rejection, "reservation rejected");
            return Ok(Admission::rejected(rejection));
        }

        let admission = self
            .with_retries(|| self.create_once(restaurant_id, maitre_d, reservation))
            .await?;

        match admission.rejection() {
            None => {
                info!(quantity = reservation.quantity(), "reservation accepted");
                self.notify(self.notifier.on_created(restaurant_id, reservation))
                    .await;
            }
            Some(rejection) => info!(%rejection, "reservation rejected"),
        }
        Ok(admission)
    }

    /// Replaces an existing reservation if the new version still fits.
    ///
    /// The reservation being replaced does not compete with its new version.
    /// Every field of the stored version is overwritten; use
    /// [`reschedule`](Self::reschedule) to change only some of them.
    #[instrument(skip(self, reservation), fields(restaurant_id = %restaurant_id, reservation_id = %reservation.id()))]
    pub async fn try_update(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<Admission, AdmissionError> {
        let maitre_d = self.maitre_d(restaurant_id)?;
        if let Some(rejection) = Rejection::from_decision(maitre_d.check_time(reservation.at())) {
            info!(%rejection, "update rejected");
            return Ok(Admission::rejected(rejection));
        }

        self.update_with(restaurant_id, maitre_d, reservation.id(), |_| {
            Ok(reservation.clone())
        })
        .await
    }

    /// Applies `change` to the stored version of `id` and keeps the result
    /// if it still fits.
    #[instrument(skip(self, change), fields(restaurant_id = %restaurant_id, reservation_id = %id))]
    pub async fn reschedule(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
        change: &ReservationChange,
    ) -> Result<Admission, AdmissionError> {
        let maitre_d = self.maitre_d(restaurant_id)?;
        if let Some(at) = change.at {
            if let Some(rejection) = Rejection::from_decision(maitre_d.check_time(at)) {
                info!(%rejection, "update rejected");
                return Ok(Admission::rejected(rejection));
            }
        }

        self.update_with(restaurant_id, maitre_d, id, |current| {
            change
                .apply(current)
                .map_err(|e| Rejection::Invalid(e.to_string()))
        })
        .await
    }

    async fn update_with<F>(
        &self,
        restaurant_id: RestaurantId,
        maitre_d: &MaitreD,
        id: ReservationId,
        build: F,
    ) -> Result<Admission, AdmissionError>
    where
        F: Fn(&Reservation) -> Result<Reservation, Rejection>,
    {
        let build = &build;
        let outcome = self
            .with_retries(move || self.update_once(restaurant_id, maitre_d, id, build))
            .await?;

        match outcome {
            Ok((previous, updated)) => {
                info!(quantity = updated.quantity(), "reservation updated");
                self.notify(self.notifier.on_updated(restaurant_id, &previous, &updated))
                    .await;
                Ok(Admission::accepted(id))
            }
            Err(rejection) => {
                info!(%rejection, "update rejected");
                Ok(Admission::rejected(rejection))
            }
        }
    }

    /// Deletes a reservation and returns it.
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id, reservation_id = %id))]
    pub async fn cancel(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Reservation, AdmissionError> {
        self.maitre_d(restaurant_id)?;
        let deleted = self
            .store
            .delete(restaurant_id, id)
            .await?
            .ok_or(AdmissionError::NotFound(id))?;

        info!("reservation cancelled");
        self.notify(self.notifier.on_deleted(restaurant_id, &deleted))
            .await;
        Ok(deleted)
    }

    #[instrument(skip(self), fields(restaurant_id = %restaurant_id, reservation_id = %id))]
    pub async fn get(
        &self,
        restaurant_id: RestaurantId,
        id: ReservationId,
    ) -> Result<Option<Reservation>, AdmissionError> {
        self.maitre_d(restaurant_id)?;
        Ok(self.store.read_by_id(restaurant_id, id).await?)
    }

    /// The reservations relevant to `date` and their table assignments.
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    pub async fn schedule(
        &self,
        restaurant_id: RestaurantId,
        date: NaiveDate,
    ) -> Result<DaySchedule, AdmissionError> {
        let maitre_d = self.maitre_d(restaurant_id)?;
        let (min, max) = maitre_d.day_window(date);
        let reservations = self.store.read_reservations(restaurant_id, min, max).await?;

        let segment = maitre_d.segment(date, &reservations);
        let slots = maitre_d.schedule(segment.reservations());
        debug!(reservations = segment.len(), slots = slots.len(), "schedule built");

        Ok(DaySchedule { segment, slots })
    }

    async fn create_once(
        &self,
        restaurant_id: RestaurantId,
        maitre_d: &MaitreD,
        reservation: &Reservation,
    ) -> Result<Attempt<Admission>, StoreError> {
        let mut tx = self.store.begin(restaurant_id).await?;

        let (min, max) = maitre_d.seating_window(reservation.at());
        let existing = tx.read_reservations(min, max).await?;
        if let Some(rejection) = Rejection::from_decision(maitre_d.decide(&existing, reservation)) {
            return Ok(Attempt::Done(Admission::rejected(rejection)));
        }

        tx.create(reservation).await?;
        Ok(Attempt::Commit(tx, Admission::accepted(reservation.id())))
    }

    /// On success yields the replaced and the new version.
    async fn update_once<F>(
        &self,
        restaurant_id: RestaurantId,
        maitre_d: &MaitreD,
        id: ReservationId,
        build: &F,
    ) -> Result<Attempt<Result<(Reservation, Reservation), Rejection>>, StoreError>
    where
        F: Fn(&Reservation) -> Result<Reservation, Rejection>,
    {
        let mut tx = self.store.begin(restaurant_id).await?;

        let previous = tx.read_by_id(id).await?.ok_or(StoreError::NotFound(id))?;
        let updated = match build(&previous) {
            Ok(updated) => updated,
            Err(rejection) => return Ok(Attempt::Done(Err(rejection))),
        };

        let (min, max) = maitre_d.seating_window(updated.at());
        let others: Vec<Reservation> = tx
            .read_reservations(min, max)
            .await?
            .into_iter()
            .filter(|r| r.id() != id)
            .collect();
        if let Some(rejection) = Rejection::from_decision(maitre_d.decide(&others, &updated)) {
            return Ok(Attempt::Done(Err(rejection)));
        }

        tx.update(&updated).await?;
        Ok(Attempt::Commit(tx, Ok((previous, updated))))
    }

    /// Runs `attempt` until it stops conflicting.
    ///
    /// The policy timeout bounds each attempt up to its staged writes. The
    /// commit is awaited outside it, so a `Timeout` never follows a durable
    /// write.
    async fn with_retries<T, F, Fut>(&self, mut attempt: F) -> Result<T, AdmissionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Attempt<T>, StoreError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 1;

        loop {
            let staged = match tokio::time::timeout(self.policy.timeout, attempt()).await {
                Ok(staged) => staged,
                Err(_) => {
                    warn!(attempt = attempts, timeout = ?self.policy.timeout, "admission attempt timed out");
                    return Err(AdmissionError::Timeout(self.policy.timeout));
                }
            };

            let result = match staged {
                Ok(Attempt::Done(value)) => Ok(value),
                Ok(Attempt::Commit(tx, value)) => tx.commit().await.map(|()| value),
                Err(e) => Err(e),
            };

            match result {
                Err(StoreError::Conflict) if attempts < max_attempts => {
                    let delay = self.policy.backoff.delay(attempts - 1);
                    debug!(attempt = attempts, delay = ?delay, "admission conflict; retrying");
                    tokio::time::sleep(delay).await;
                    attempts += 1;
                }
                Err(StoreError::Conflict) => {
                    warn!(attempts, "admission still conflicting; giving up");
                    return Err(AdmissionError::Contended { attempts });
                }
                result => return result.map_err(AdmissionError::from),
            }
        }
    }

    async fn notify(&self, delivery: impl Future<Output = Result<(), NotifyError>>) {
        if let Err(e) = delivery.await {
            warn!(error = %e, "reservation notification failed");
        }
    }
}
