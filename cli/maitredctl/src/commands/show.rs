//! Showing one reservation.

use anyhow::Result;
use clap::Args;
use maitred_id::ReservationId;

use crate::error::CliError;
use crate::output::print_output;

use super::{CommandContext, ReservationRow};

/// Show a single reservation.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Reservation ID.
    id: ReservationId,
}

impl ShowCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let session = ctx.session().await?;
        let reservation = session
            .controller
            .get(session.restaurant_id, self.id)
            .await?
            .ok_or_else(|| CliError::NotFound(self.id.to_string()))?;

        print_output(&[ReservationRow::from(&reservation)], ctx.format);
        Ok(())
    }
}
