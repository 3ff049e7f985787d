//! CLI commands.

mod book;
mod cancel;
mod context;
mod migrate;
mod reschedule;
mod restaurants;
mod schedule;
mod show;

use anyhow::Result;
use clap::{Parser, Subcommand};
use maitred_booking::db::{Database, PgReservationStore};
use maitred_booking::{Admission, AdmissionController, RestaurantRegistry};
use maitred_id::RestaurantId;
use maitred_seating::Reservation;
use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use crate::config::CliConfig;
use crate::error::CliError;
use crate::output::{print_single, print_success, OutputFormat};

/// md - book and inspect restaurant reservations.
#[derive(Debug, Parser)]
#[command(name = "md")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Restaurant ID or name.
    #[arg(long, global = true, env = "MAITRED_RESTAURANT")]
    restaurant: Option<String>,

    /// Log at MAITRED_LOG_LEVEL instead of warnings only.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List configured restaurants.
    Restaurants,

    /// Request a table.
    Book(book::BookCommand),

    /// Move or resize an existing reservation.
    Reschedule(reschedule::RescheduleCommand),

    /// Cancel a reservation.
    Cancel(cancel::CancelCommand),

    /// Show a single reservation.
    Show(show::ShowCommand),

    /// Print the table plan for a day.
    Schedule(schedule::ScheduleCommand),

    /// Apply database migrations.
    Migrate,

    /// Show, set or clear the saved restaurant.
    Context(context::ContextCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self, settings: maitred_booking::Config) -> Result<()> {
        let config = CliConfig::load()?;

        let ctx = CommandContext {
            settings,
            config,
            format: self.format,
            restaurant: self.restaurant,
        };

        match self.command {
            Commands::Restaurants => restaurants::run(ctx).await,
            Commands::Book(cmd) => cmd.run(ctx).await,
            Commands::Reschedule(cmd) => cmd.run(ctx).await,
            Commands::Cancel(cmd) => cmd.run(ctx).await,
            Commands::Show(cmd) => cmd.run(ctx).await,
            Commands::Schedule(cmd) => cmd.run(ctx).await,
            Commands::Migrate => migrate::run(ctx).await,
            Commands::Context(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("md {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub settings: maitred_booking::Config,
    pub config: CliConfig,
    pub format: OutputFormat,
    pub restaurant: Option<String>,
}

/// An admission controller bound to the restaurant a command acts on.
pub struct Session {
    pub controller: AdmissionController<PgReservationStore>,
    pub restaurant_id: RestaurantId,
}

impl CommandContext {
    pub fn registry(&self) -> Result<RestaurantRegistry> {
        Ok(self.settings.load_restaurants()?)
    }

    pub async fn database(&self) -> Result<Database> {
        debug!("connecting to reservation database");
        Ok(Database::connect(&self.settings.database).await?)
    }

    /// Connect to the database and pick the restaurant to act on.
    pub async fn session(&self) -> Result<Session> {
        let registry = self.registry()?;
        let restaurant_id =
            resolve_restaurant(&registry, self.restaurant.as_deref(), self.config.restaurant)?;
        let db = self.database().await?;
        let controller = AdmissionController::new(db.reservation_store(), registry)
            .with_policy(self.settings.admission.clone());
        Ok(Session {
            controller,
            restaurant_id,
        })
    }
}

/// Picks a restaurant: the flag wins over the saved context, and a registry
/// with a single restaurant needs neither.
pub fn resolve_restaurant(
    registry: &RestaurantRegistry,
    flag: Option<&str>,
    saved: Option<RestaurantId>,
) -> Result<RestaurantId, CliError> {
    if let Some(raw) = flag {
        return find_restaurant(registry, raw);
    }

    if let Some(id) = saved {
        return registry
            .get(id)
            .map(|r| r.id)
            .ok_or_else(|| CliError::UnknownRestaurant(id.to_string()));
    }

    match registry.restaurants().as_slice() {
        [only] => Ok(only.id),
        _ => Err(CliError::NoRestaurant),
    }
}

fn find_restaurant(registry: &RestaurantRegistry, raw: &str) -> Result<RestaurantId, CliError> {
    if let Ok(id) = RestaurantId::parse(raw) {
        if registry.get(id).is_some() {
            return Ok(id);
        }
    }

    registry
        .restaurants()
        .into_iter()
        .find(|r| r.name.eq_ignore_ascii_case(raw))
        .map(|r| r.id)
        .ok_or_else(|| CliError::UnknownRestaurant(raw.to_string()))
}

/// Prints an admission; a rejection becomes an error so the exit code
/// reflects it.
pub fn report_admission(format: OutputFormat, admission: Admission, verb: &str) -> Result<()> {
    if format == OutputFormat::Json {
        print_single(&admission);
    }

    match admission {
        Admission::Accepted { reservation_id } => {
            if format == OutputFormat::Table {
                print_success(&format!("{verb} reservation {reservation_id}"));
            }
            Ok(())
        }
        Admission::Rejected { rejection } => Err(CliError::Rejected(rejection).into()),
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct ReservationRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "AT")]
    pub at: String,
    #[tabled(rename = "GUESTS")]
    pub quantity: u32,
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "EMAIL")]
    pub email: String,
}

impl From<&Reservation> for ReservationRow {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id().to_string(),
            at: r.at().format("%Y-%m-%d %H:%M").to_string(),
            quantity: r.quantity(),
            name: if r.name().is_empty() {
                "-".to_string()
            } else {
                r.name().to_string()
            },
            email: r.email().to_string(),
        }
    }
}
