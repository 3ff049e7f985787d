//! Event envelope - the common wrapper for all events.

use chrono::{DateTime, Utc};
use maitred_id::{EventSeq, RestaurantId};
use serde::{Deserialize, Serialize};

use crate::{event_types, EventError, ReservationEvent, RESERVATION_EVENT_VERSION};

/// Common metadata around a [`ReservationEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Publisher-assigned, monotonic per publisher.
    pub seq: EventSeq,

    /// When the change was committed.
    pub occurred_at: DateTime<Utc>,

    pub restaurant_id: RestaurantId,

    /// The event type (e.g., "reservation.created").
    pub event_type: String,

    /// Schema version for this event type.
    pub event_version: i32,

    pub payload: ReservationEvent,
}

impl EventEnvelope {
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::new()
    }

    pub fn to_json(&self) -> Result<String, EventError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes an envelope, rejecting unknown types and versions.
    pub fn from_json(json: &str) -> Result<Self, EventError> {
        let envelope: EventEnvelope = serde_json::from_str(json)?;
        if !event_types::ALL.contains(&envelope.event_type.as_str()) {
            return Err(EventError::UnknownEventType(envelope.event_type));
        }
        if envelope.event_version != RESERVATION_EVENT_VERSION {
            return Err(EventError::UnsupportedVersion {
                event_type: envelope.event_type,
                version: envelope.event_version,
            });
        }
        Ok(envelope)
    }
}

/// Builder for constructing event envelopes.
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    seq: Option<EventSeq>,
    occurred_at: Option<DateTime<Utc>>,
    restaurant_id: Option<RestaurantId>,
    payload: Option<ReservationEvent>,
}

impl EventEnvelopeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seq(mut self, seq: EventSeq) -> Self {
        self.seq = Some(seq);
        self
    }

    pub fn occurred_at(mut self, ts: DateTime<Utc>) -> Self {
        self.occurred_at = Some(ts);
        self
    }

    pub fn restaurant_id(mut self, restaurant_id: RestaurantId) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn payload(mut self, payload: ReservationEvent) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Builds the envelope. `occurred_at` defaults to now; the type name and
    /// version follow from the payload.
    pub fn build(self) -> Result<EventEnvelope, EventError> {
        let payload = self.payload.ok_or(EventError::MissingField("payload"))?;
        Ok(EventEnvelope {
            seq: self.seq.ok_or(EventError::MissingField("seq"))?,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            restaurant_id: self
                .restaurant_id
                .ok_or(EventError::MissingField("restaurant_id"))?,
            event_type: payload.event_type().to_string(),
            event_version: RESERVATION_EVENT_VERSION,
            payload,
        })
    }
}
