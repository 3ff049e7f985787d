//! Database migrations.

use anyhow::Result;

use crate::output::{print_single, print_success, OutputFormat};

use super::CommandContext;

pub async fn run(ctx: CommandContext) -> Result<()> {
    let db = ctx.database().await?;
    db.run_migrations().await?;
    db.health_check().await?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({ "ok": true })),
        OutputFormat::Table => print_success("Database is up to date"),
    }
    Ok(())
}
