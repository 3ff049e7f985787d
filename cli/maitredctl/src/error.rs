//! Error handling and display for the CLI.

use colored::Colorize;
use maitred_booking::db::DbError;
use maitred_booking::{AdmissionError, ConfigError, Rejection};
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No restaurant selected. Pass --restaurant or run `md context set <restaurant>`.")]
    NoRestaurant,

    #[error("Unknown restaurant: {0}")]
    UnknownRestaurant(String),

    #[error("Reservation not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(Rejection),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(hint) = hint_for(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::NoRestaurant | CliError::UnknownRestaurant(_) => {
                Some("Run `md restaurants` to list configured restaurants.")
            }
            CliError::NotFound(_) => Some("Run `md schedule --date <day>` to look it up."),
            CliError::Rejected(Rejection::Capacity) => {
                Some("Try another time or a smaller party.")
            }
            CliError::Rejected(Rejection::Invalid(_)) => None,
        };
    }

    if let Some(admission_err) = err.downcast_ref::<AdmissionError>() {
        if admission_err.is_retryable() {
            return Some("The restaurant is busy right now; try again.");
        }
        return None;
    }

    if let Some(DbError::Connect(_)) = err.downcast_ref::<DbError>() {
        return Some("Check that DATABASE_URL points at a reachable database.");
    }

    if let Some(ConfigError::NoRestaurants) = err.downcast_ref::<ConfigError>() {
        return Some("Set MAITRED_RESTAURANTS to the path of your restaurants.toml.");
    }

    None
}
