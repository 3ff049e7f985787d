//! Post-commit reservation notifications.
//!
//! Notifiers run after a change is committed. Their failures are logged by
//! the caller and never change the outcome of an admission.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use maitred_events::{EventEnvelope, EventError, ReservationEvent};
use maitred_id::{EventSeq, RestaurantId};
use maitred_seating::Reservation;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build event: {0}")]
    Event(#[from] EventError),
}

#[async_trait]
pub trait ReservationNotifier: Send + Sync {
    async fn on_created(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), NotifyError>;

    async fn on_updated(
        &self,
        restaurant_id: RestaurantId,
        previous: &Reservation,
        reservation: &Reservation,
    ) -> Result<(), NotifyError>;

    async fn on_deleted(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), NotifyError>;
}

/// Writes one structured log line per change.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl ReservationNotifier for TracingNotifier {
    async fn on_created(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), NotifyError> {
        info!(
            %restaurant_id,
            reservation_id = %reservation.id(),
            at = %reservation.at(),
            quantity = reservation.quantity(),
            "reservation created"
        );
        Ok(())
    }

    async fn on_updated(
        &self,
        restaurant_id: RestaurantId,
        previous: &Reservation,
        reservation: &Reservation,
    ) -> Result<(), NotifyError> {
        info!(
            %restaurant_id,
            reservation_id = %reservation.id(),
            previous_at = %previous.at(),
            at = %reservation.at(),
            previous_quantity = previous.quantity(),
            quantity = reservation.quantity(),
            "reservation updated"
        );
        Ok(())
    }

    async fn on_deleted(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), NotifyError> {
        info!(
            %restaurant_id,
            reservation_id = %reservation.id(),
            at = %reservation.at(),
            "reservation deleted"
        );
        Ok(())
    }
}

/// Publishes [`EventEnvelope`]s on a broadcast channel.
///
/// Sequence numbers start at 1 and are assigned in publish order. Events
/// sent while nobody is subscribed are dropped.
#[derive(Debug)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<EventEnvelope>,
    last_seq: AtomicU64,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            last_seq: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    fn publish(
        &self,
        restaurant_id: RestaurantId,
        event: ReservationEvent,
    ) -> Result<(), NotifyError> {
        let seq = EventSeq::new(self.last_seq.fetch_add(1, Ordering::SeqCst) + 1);
        let envelope = EventEnvelope::builder()
            .seq(seq)
            .restaurant_id(restaurant_id)
            .payload(event)
            .build()?;

        if self.sender.send(envelope).is_err() {
            debug!(%seq, "no subscribers; event dropped");
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationNotifier for BroadcastNotifier {
    async fn on_created(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), NotifyError> {
        self.publish(restaurant_id, ReservationEvent::created(reservation))
    }

    async fn on_updated(
        &self,
        restaurant_id: RestaurantId,
        previous: &Reservation,
        reservation: &Reservation,
    ) -> Result<(), NotifyError> {
        self.publish(
            restaurant_id,
            ReservationEvent::updated(previous, reservation),
        )
    }

    async fn on_deleted(
        &self,
        restaurant_id: RestaurantId,
        reservation: &Reservation,
    ) -> Result<(), NotifyError> {
        self.publish(restaurant_id, ReservationEvent::deleted(reservation))
    }
}
