use anyhow::{Context as _, Result};
use gridkit::AdminHandle;

use crate::Context;
use crate::commands::print_json;
use crate::ui;

/// Print every server id the registry knows, in registry order
pub fn run(ctx: &Context, admin: &dyn AdminHandle) -> Result<()> {
    let ids = admin
        .list_all_server_ids()
        .context("Failed to list servers")?;

    if ctx.json {
        return print_json(&ids);
    }

    if ids.is_empty() {
        ui::info("Registry has no servers");
        return Ok(());
    }

    for id in &ids {
        println!("{id}");
    }
    if !ctx.quiet {
        ui::dim(&ui::servers(ids.len()));
    }
    Ok(())
}
