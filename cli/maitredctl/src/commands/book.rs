//! Booking a table.

use anyhow::Result;
use clap::Args;
use maitred_booking::ReservationRequest;

use super::{report_admission, CommandContext};

/// Request a table for a party.
#[derive(Debug, Args)]
pub struct BookCommand {
    /// Local date and time, e.g. "2024-06-14 19:30".
    #[arg(long)]
    at: String,

    /// Contact email.
    #[arg(long)]
    email: String,

    /// Name the reservation is under.
    #[arg(long, default_value = "")]
    name: String,

    /// Party size.
    #[arg(long, short = 'q', default_value_t = 2)]
    quantity: i64,
}

impl BookCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let session = ctx.session().await?;
        let request = ReservationRequest::new(self.at, self.email, self.name, self.quantity);

        let admission = session
            .controller
            .request_admission(session.restaurant_id, &request)
            .await?;

        report_admission(ctx.format, admission, "Booked")
    }
}
