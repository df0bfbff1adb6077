use anyhow::Result;
use colored::Colorize;
use declarative::{ReconcileRequest, preview};
use gridkit::AdminHandle;

use crate::Context;
use crate::commands::print_json;
use crate::progress;
use crate::ui;

/// Show observed enablement and lifecycle of the requested servers
pub fn run(ctx: &Context, admin: &dyn AdminHandle, request: &ReconcileRequest) -> Result<()> {
    let pb = (!ctx.quiet && !ctx.json).then(|| progress::spinner("Querying registry..."));
    let preview = preview(admin, request);
    if let Some(pb) = &pb {
        progress::finish_clear(pb);
    }
    let preview = preview?;
    let rows = preview.rows();

    if ctx.json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        ui::info("No servers found");
        return Ok(());
    }

    ui::header("Server Status");
    let width = ui::id_width(rows.iter().map(|r| r.server.as_str()));
    let mut running = 0;
    for (id, info) in preview.observation.iter() {
        let marker = if info.lifecycle == gridkit::ServerState::Active {
            running += 1;
            "●".green()
        } else {
            "○".dimmed()
        };
        ui::server_row(
            &marker.to_string(),
            id.as_str(),
            width,
            &format!("{}  {}", ui::enabled(info.enabled), ui::state(info.lifecycle)),
        );
    }

    println!();
    ui::dim(&format!("{running} of {} active", ui::servers(rows.len())));
    Ok(())
}
