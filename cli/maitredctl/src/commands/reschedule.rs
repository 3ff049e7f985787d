//! Moving or resizing a reservation.

use anyhow::Result;
use clap::Args;
use maitred_booking::request::parse_timestamp;
use maitred_booking::{AdmissionError, ReservationChange};
use maitred_id::ReservationId;

use crate::error::CliError;

use super::{report_admission, CommandContext};

/// Change a reservation; only the given fields change.
#[derive(Debug, Args)]
pub struct RescheduleCommand {
    /// Reservation ID.
    id: ReservationId,

    /// New local date and time.
    #[arg(long)]
    at: Option<String>,

    /// New party size.
    #[arg(long, short = 'q')]
    quantity: Option<i64>,

    /// New contact email.
    #[arg(long)]
    email: Option<String>,

    /// New name.
    #[arg(long)]
    name: Option<String>,
}

impl RescheduleCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let change = self.change()?;
        if change.is_empty() {
            anyhow::bail!("Nothing to change. Pass --at, --quantity, --email or --name.");
        }

        let session = ctx.session().await?;
        let admission = match session
            .controller
            .reschedule(session.restaurant_id, self.id, &change)
            .await
        {
            Ok(admission) => admission,
            Err(AdmissionError::NotFound(id)) => {
                return Err(CliError::NotFound(id.to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };

        report_admission(ctx.format, admission, "Rescheduled")
    }

    fn change(&self) -> Result<ReservationChange> {
        let at = self.at.as_deref().map(parse_timestamp).transpose()?;
        Ok(ReservationChange {
            at,
            quantity: self.quantity,
            email: self.email.clone(),
            name: self.name.clone(),
        })
    }
}
