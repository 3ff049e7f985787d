//! The staff view of a day.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Args;
use maitred_booking::DaySchedule;
use maitred_seating::{Table, TimeSlot};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_info, print_output, print_single, OutputFormat};

use super::CommandContext;

/// Print table assignments for every reservation time of a day.
#[derive(Debug, Args)]
pub struct ScheduleCommand {
    /// Day to show (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Tabled)]
struct SlotRow {
    #[tabled(rename = "TIME")]
    time: String,
    #[tabled(rename = "TABLE")]
    table: String,
    #[tabled(rename = "KIND")]
    kind: &'static str,
    #[tabled(rename = "SEATS")]
    seats: u32,
    #[tabled(rename = "FREE")]
    free: u32,
    #[tabled(rename = "PARTIES")]
    parties: String,
}

fn slot_rows(slot: &TimeSlot) -> Vec<SlotRow> {
    let time = slot.at().format("%H:%M").to_string();
    slot.tables()
        .iter()
        .enumerate()
        .map(|(i, table)| SlotRow {
            time: time.clone(),
            table: format!("#{}", i + 1),
            kind: match table {
                Table::Standard(_) => "standard",
                Table::Communal(_) => "communal",
            },
            seats: table.capacity(),
            free: table.remaining_capacity(),
            parties: describe_parties(table),
        })
        .collect()
}

fn describe_parties(table: &Table) -> String {
    let parties: Vec<String> = table
        .reservations()
        .iter()
        .map(|r| {
            let who = if r.name().is_empty() { r.email() } else { r.name() };
            format!("{who} ({})", r.quantity())
        })
        .collect();
    if parties.is_empty() {
        "-".to_string()
    } else {
        parties.join(", ")
    }
}

impl ScheduleCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        let session = ctx.session().await?;
        let schedule = session
            .controller
            .schedule(session.restaurant_id, date)
            .await?;

        match ctx.format {
            OutputFormat::Json => print_single(&schedule),
            OutputFormat::Table => print_table(&schedule),
        }
        Ok(())
    }
}

fn print_table(schedule: &DaySchedule) {
    print_info(&format!(
        "{}: {} reservations, {} guests",
        schedule.segment.date(),
        schedule.segment.len(),
        schedule.segment.guests()
    ));
    let rows: Vec<SlotRow> = schedule.slots.iter().flat_map(slot_rows).collect();
    print_output(&rows, OutputFormat::Table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use maitred_testing::{mixed_floor, party, ReservationBuilder};

    #[test]
    fn one_row_per_table_per_slot() {
        let maitre_d = mixed_floor();
        let named = ReservationBuilder::new()
            .at(maitred_testing::at(19, 0))
            .name("Ada")
            .quantity(2)
            .build();
        let slots = maitre_d.schedule(&[named, party(20, 0, 3)]);

        let rows: Vec<SlotRow> = slots.iter().flat_map(slot_rows).collect();

        assert_eq!(rows.len(), slots.len() * maitre_d.tables().len());
        assert_eq!(rows[0].time, "19:00");
        assert_eq!(rows[0].table, "#1");
        assert!(rows.iter().any(|row| row.parties == "Ada (2)"));
    }

    #[test]
    fn empty_table_shows_dash() {
        assert_eq!(describe_parties(&Table::communal(6)), "-");
    }
}
