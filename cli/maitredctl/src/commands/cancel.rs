//! Cancelling a reservation.

use anyhow::Result;
use clap::Args;
use maitred_booking::AdmissionError;
use maitred_id::ReservationId;

use crate::error::CliError;
use crate::output::{print_output, print_success, OutputFormat};

use super::{CommandContext, ReservationRow};

/// Cancel a reservation and free its table.
#[derive(Debug, Args)]
pub struct CancelCommand {
    /// Reservation ID.
    id: ReservationId,
}

impl CancelCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let session = ctx.session().await?;
        let cancelled = match session
            .controller
            .cancel(session.restaurant_id, self.id)
            .await
        {
            Ok(reservation) => reservation,
            Err(AdmissionError::NotFound(id)) => {
                return Err(CliError::NotFound(id.to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };

        let rows = [ReservationRow::from(&cancelled)];
        match ctx.format {
            OutputFormat::Json => print_output(&rows, ctx.format),
            OutputFormat::Table => {
                print_success(&format!("Cancelled reservation {}", self.id));
                print_output(&rows, ctx.format);
            }
        }
        Ok(())
    }
}
