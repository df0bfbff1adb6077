use anyhow::Result;
use colored::Colorize;
use declarative::{ReconcileRequest, ReconciliationResult, reconcile};
use gridkit::AdminHandle;

use crate::Context;
use crate::commands::{Report, print_json};
use crate::progress::TerminalProgress;
use crate::ui;

pub fn run(ctx: &Context, admin: &dyn AdminHandle, request: &ReconcileRequest) -> Result<()> {
    let mut progress = TerminalProgress::new(ctx.quiet || ctx.json);

    match reconcile(admin, request, &mut progress) {
        Ok(result) => {
            if ctx.json {
                print_json(&Report::success(&result))?;
            } else {
                print_result(&result, ctx.quiet);
            }
            Ok(())
        }
        Err(err) => {
            if !ctx.json
                && let Some(partial) = err.partial_result()
            {
                print_changes(partial);
            }
            Err(err.into())
        }
    }
}

/// Human summary of a finished run
pub fn print_result(result: &ReconciliationResult, quiet: bool) {
    if result.targets.is_empty() {
        if !quiet {
            ui::info("No servers to act on");
        }
        return;
    }

    if !result.changed {
        if !quiet {
            ui::success(&format!(
                "All {} already in desired state",
                ui::servers(result.targets.len())
            ));
        }
        return;
    }

    if !quiet {
        ui::header("Changes");
        print_changes(result);
        println!();
    }
    ui::success(&format!(
        "Changed {} of {}",
        ui::servers(result.changed_servers().len()),
        result.targets.len()
    ));
}

fn print_changes(result: &ReconciliationResult) {
    let lists = [
        ("enabled", result.enabled.as_deref()),
        ("disabled", result.disabled.as_deref()),
        ("state changed", result.state_changed.as_deref()),
    ];
    for (verb, ids) in lists {
        for id in ids.unwrap_or_default() {
            println!("  {} {} {}", "✓".green(), id, verb.dimmed());
        }
    }
}
