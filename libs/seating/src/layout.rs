//! Serializable restaurant layout, as written in configuration files.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{MaitreD, MaitreDError, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Standard,
    Communal,
}

/// One table line of a layout: `{ kind = "communal", seats = 10 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub kind: TableKind,
    pub seats: u32,
}

impl TableSpec {
    pub fn to_table(self) -> Table {
        match self.kind {
            TableKind::Standard => Table::standard(self.seats),
            TableKind::Communal => Table::communal(self.seats),
        }
    }
}

/// Opening hours, seating duration and the ordered table list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantLayout {
    pub opens_at: NaiveTime,
    pub last_seating: NaiveTime,
    pub seating_duration_minutes: u32,
    /// Allocation priority order.
    pub tables: Vec<TableSpec>,
}

impl TryFrom<RestaurantLayout> for MaitreD {
    type Error = MaitreDError;

    fn try_from(layout: RestaurantLayout) -> Result<Self, Self::Error> {
        MaitreD::new(
            layout.opens_at,
            layout.last_seating,
            chrono::Duration::minutes(i64::from(layout.seating_duration_minutes)),
            layout.tables.into_iter().map(TableSpec::to_table),
        )
    }
}
