//! Restaurant listing.

use anyhow::Result;
use maitred_booking::Restaurant;
use serde::Serialize;
use tabled::Tabled;

use crate::output::print_output;

use super::CommandContext;

#[derive(Debug, Serialize, Tabled)]
struct RestaurantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "HOURS")]
    hours: String,
    #[tabled(rename = "TABLES")]
    tables: usize,
    #[tabled(rename = "SEATS")]
    seats: u64,
}

impl From<&Restaurant> for RestaurantRow {
    fn from(r: &Restaurant) -> Self {
        let maitre_d = &r.maitre_d;
        Self {
            id: r.id.to_string(),
            name: r.name.clone(),
            hours: format!(
                "{}-{}",
                maitre_d.opens_at().format("%H:%M"),
                maitre_d.last_seating().format("%H:%M")
            ),
            tables: maitre_d.tables().len(),
            seats: maitre_d.total_capacity(),
        }
    }
}

pub async fn run(ctx: CommandContext) -> Result<()> {
    let registry = ctx.registry()?;
    let rows: Vec<RestaurantRow> = registry
        .restaurants()
        .into_iter()
        .map(RestaurantRow::from)
        .collect();

    print_output(&rows, ctx.format);
    Ok(())
}
