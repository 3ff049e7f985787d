//! Context commands (saved default restaurant).

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::output::{print_single, print_success, OutputFormat};

use super::{resolve_restaurant, CommandContext};

/// Manage the saved restaurant.
#[derive(Debug, Args)]
pub struct ContextCommand {
    #[command(subcommand)]
    command: ContextSubcommand,
}

#[derive(Debug, Subcommand)]
enum ContextSubcommand {
    /// Show the saved context.
    Show,

    /// Save the restaurant to act on.
    Set {
        /// Restaurant ID or name.
        restaurant: String,
    },

    /// Clear the saved context.
    Clear,
}

#[derive(Debug, Serialize)]
struct ContextView {
    restaurant_id: Option<String>,
    restaurant_name: Option<String>,
}

impl ContextCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ContextSubcommand::Show => show(ctx),
            ContextSubcommand::Set { restaurant } => set(ctx, &restaurant),
            ContextSubcommand::Clear => clear(ctx),
        }
    }
}

fn show(ctx: CommandContext) -> Result<()> {
    let name = match (ctx.config.restaurant, ctx.registry()) {
        (Some(id), Ok(registry)) => registry.get(id).map(|r| r.name.clone()),
        _ => None,
    };
    let view = ContextView {
        restaurant_id: ctx.config.restaurant.map(|id| id.to_string()),
        restaurant_name: name,
    };

    match ctx.format {
        OutputFormat::Json => print_single(&view),
        OutputFormat::Table => {
            println!("restaurant: {}", view.restaurant_id.as_deref().unwrap_or("-"));
            println!("name: {}", view.restaurant_name.as_deref().unwrap_or("-"));
        }
    }

    Ok(())
}

fn set(mut ctx: CommandContext, restaurant: &str) -> Result<()> {
    let registry = ctx.registry()?;
    let id = resolve_restaurant(&registry, Some(restaurant), None)?;
    ctx.config.restaurant = Some(id);
    ctx.config.save()?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({ "restaurant_id": id })),
        OutputFormat::Table => print_success(&format!("Saved restaurant {id}")),
    }

    Ok(())
}

fn clear(mut ctx: CommandContext) -> Result<()> {
    ctx.config.restaurant = None;
    ctx.config.save()?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({ "ok": true })),
        OutputFormat::Table => print_success("Cleared saved context"),
    }

    Ok(())
}
