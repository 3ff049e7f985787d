//! Raw reservation requests and their validation.

use chrono::NaiveDateTime;
use maitred_id::ReservationId;
use maitred_seating::{Reservation, ReservationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Why a raw request cannot become a [`Reservation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("email is required")]
    MissingEmail,

    #[error(transparent)]
    Reservation(#[from] ReservationError),
}

/// An unvalidated booking request, as a caller would submit it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    /// Local date and time, e.g. `2024-06-14 18:30`.
    pub at: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub quantity: i64,
}

impl ReservationRequest {
    pub fn new(
        at: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Self {
            at: at.into(),
            email: email.into(),
            name: name.into(),
            quantity,
        }
    }

    /// Builds a reservation with identity `id`, or says what is wrong.
    pub fn validate(&self, id: ReservationId) -> Result<Reservation, ValidationError> {
        let at = parse_timestamp(&self.at)?;
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        Ok(Reservation::new(
            id,
            at,
            email,
            self.name.trim(),
            self.quantity,
        )?)
    }
}

/// Fields to change on a stored reservation; `None` keeps the stored value.
///
/// Applied to the version read inside the admission transaction, so
/// concurrent changes to different fields do not overwrite each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationChange {
    pub at: Option<NaiveDateTime>,
    pub quantity: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl ReservationChange {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, current: &Reservation) -> Result<Reservation, ValidationError> {
        let mut changed = current.clone();
        if let Some(at) = self.at {
            changed = changed.with_at(at);
        }
        if let Some(quantity) = self.quantity {
            changed = changed.with_quantity(quantity)?;
        }
        if let Some(email) = &self.email {
            let email = email.trim();
            if email.is_empty() {
                return Err(ValidationError::MissingEmail);
            }
            changed = changed.with_email(email);
        }
        if let Some(name) = &self.name {
            changed = changed.with_name(name.trim());
        }
        Ok(changed)
    }
}

/// Parses a local timestamp in one of the accepted layouts.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ValidationError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use maitred_testing::{at, party};
    use rstest::rstest;

    #[test]
    fn test_change_keeps_unset_fields() {
        let current = party(19, 0, 2);
        let change = ReservationChange {
            name: Some(" Grace ".to_string()),
            ..Default::default()
        };

        let changed = change.apply(&current).unwrap();

        assert_eq!(changed.id(), current.id());
        assert_eq!(changed.at(), current.at());
        assert_eq!(changed.quantity(), 2);
        assert_eq!(changed.email(), current.email());
        assert_eq!(changed.name(), "Grace");
    }

    #[test]
    fn test_change_validates_new_values() {
        let current = party(19, 0, 2);
        let zero = ReservationChange {
            quantity: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            zero.apply(&current),
            Err(ValidationError::Reservation(_))
        ));

        let blank = ReservationChange {
            email: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.apply(&current), Err(ValidationError::MissingEmail));
        assert!(ReservationChange::default().is_empty());
        assert!(!blank.is_empty());
    }

    #[rstest]
    #[case("2024-06-14 18:30")]
    #[case("2024-06-14T18:30")]
    #[case("2024-06-14T18:30:00")]
    #[case(" 2024-06-14 18:30:00 ")]
    fn test_accepted_timestamps(#[case] raw: &str) {
        assert_eq!(parse_timestamp(raw).unwrap(), at(18, 30));
    }

    #[rstest]
    #[case("")]
    #[case("tomorrow")]
    #[case("2024-06-14")]
    #[case("2024-02-30 18:30")]
    fn test_rejected_timestamps(#[case] raw: &str) {
        assert!(matches!(
            parse_timestamp(raw),
            Err(ValidationError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_validate_builds_reservation() {
        let id = ReservationId::new();
        let request = ReservationRequest::new("2024-06-14 19:00", " ada@example.com ", "Ada", 3);
        let reservation = request.validate(id).unwrap();

        assert_eq!(reservation.id(), id);
        assert_eq!(reservation.at(), at(19, 0));
        assert_eq!(reservation.email(), "ada@example.com");
        assert_eq!(reservation.quantity(), 3);
    }

    #[test]
    fn test_validate_requires_email() {
        let request = ReservationRequest::new("2024-06-14 19:00", "  ", "Ada", 3);
        assert_eq!(
            request.validate(ReservationId::new()),
            Err(ValidationError::MissingEmail)
        );
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    fn test_validate_rejects_non_positive_quantity(#[case] quantity: i64) {
        let request = ReservationRequest::new("2024-06-14 19:00", "a@example.com", "", quantity);
        assert!(matches!(
            request.validate(ReservationId::new()),
            Err(ValidationError::Reservation(_))
        ));
    }

    #[test]
    fn test_request_from_json_defaults_name() {
        let request: ReservationRequest = serde_json::from_str(
            r#"{"at": "2024-06-14 19:00", "email": "a@example.com", "quantity": 2}"#,
        )
        .unwrap();
        assert_eq!(request.name, "");
    }
}
