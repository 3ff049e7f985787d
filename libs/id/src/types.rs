//! Typed ID definitions.

use crate::define_id;

define_id!(
    /// Identifies a single reservation. Stable across reschedules.
    ReservationId,
    "rsv"
);

define_id!(
    /// Identifies a restaurant (one seating configuration).
    RestaurantId,
    "rst"
);

define_id!(
    /// Correlates log lines and notifications with one admission request.
    RequestId,
    "req"
);

/// Position of a notification in the publisher's stream.
///
/// Plain monotonic counter, not ULID-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventSeq(u64);

impl EventSeq {
    /// Creates a sequence number from a raw value.
    #[must_use]
    pub const fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for EventSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for EventSeq {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EventSeq {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Self(u64::deserialize(deserializer)?))
    }
}
