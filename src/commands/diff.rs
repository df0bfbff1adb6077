use anyhow::Result;
use colored::Colorize;
use declarative::{Preview, ReconcileRequest, preview};
use gridkit::AdminHandle;
use serde::Serialize;

use crate::Context;
use crate::commands::print_json;
use crate::progress;
use crate::ui;

#[derive(Serialize)]
struct DiffReport<'a> {
    targets: &'a [gridkit::ServerId],
    changed: bool,
    plan: &'a declarative::Plan,
}

/// Preview what `apply` would change
pub fn run(ctx: &Context, admin: &dyn AdminHandle, request: &ReconcileRequest) -> Result<()> {
    let pb = (!ctx.quiet && !ctx.json).then(|| progress::spinner("Computing plan..."));
    let preview = preview(admin, request);
    if let Some(pb) = &pb {
        progress::finish_clear(pb);
    }
    let preview = preview?;

    if ctx.json {
        return print_json(&DiffReport {
            targets: &preview.targets,
            changed: !preview.plan.is_empty(),
            plan: &preview.plan,
        });
    }

    print_preview(&preview);
    Ok(())
}

fn print_preview(preview: &Preview) {
    if preview.plan.is_empty() {
        ui::success(&format!(
            "No changes: {} in desired state",
            ui::servers(preview.targets.len())
        ));
        return;
    }

    ui::header("Planned Changes");
    let rows = preview.rows();
    let width = ui::id_width(rows.iter().map(|r| r.server.as_str()));
    for row in rows.iter().filter(|r| !r.actions.is_empty()) {
        ui::server_row(
            &"~".yellow().to_string(),
            row.server.as_str(),
            width,
            &format!(
                "{}  {}",
                row.actions.join(", ").yellow(),
                format!("({}, {})", if row.enabled { "enabled" } else { "disabled" }, row.state)
                    .dimmed()
            ),
        );
    }

    println!();
    ui::info(&format!(
        "{} to change, {} already in desired state",
        ui::servers(rows.iter().filter(|r| !r.actions.is_empty()).count()),
        rows.iter().filter(|r| r.actions.is_empty()).count()
    ));
    ui::dim("Run 'gridctl apply' with the same arguments to make these changes");
}
