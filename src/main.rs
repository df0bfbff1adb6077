mod cli;
mod commands;
mod config;
mod progress;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, ConnectionArgs};
use config::Settings;
use gridkit::backend::http::{self, HttpAdmin};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        json: cli.json,
    };

    let Err(err) = dispatch(&ctx, &cli) else {
        return Ok(());
    };
    if ctx.json {
        commands::print_json(&failure_report(&err))?;
    } else {
        ui::error(&format!("{err:#}"));
        if let Some(hint) = hint(&err) {
            ui::hint(&hint);
        }
    }
    std::process::exit(1)
}

fn dispatch(ctx: &Context, cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "gridctl", &mut io::stdout());
            Ok(())
        }
        Command::List => {
            let settings = load_settings(cli)?;
            let admin = open_session(&settings, &cli.connection)?;
            commands::list::run(ctx, &admin)
        }
        Command::Status(targets) => {
            let settings = load_settings(cli)?;
            let request = commands::request(&settings, targets, Default::default());
            let admin = open_session(&settings, &cli.connection)?;
            commands::status::run(ctx, &admin, &request)
        }
        Command::Diff(args) => {
            let settings = load_settings(cli)?;
            settings.locator(&cli.connection)?;
            let desired = commands::desired_state(&args.desired)?;
            let request = commands::request(&settings, &args.targets, desired);
            let admin = open_session(&settings, &cli.connection)?;
            commands::diff::run(ctx, &admin, &request)
        }
        Command::Apply(args) => {
            let settings = load_settings(cli)?;
            settings.locator(&cli.connection)?;
            let desired = commands::desired_state(&args.desired)?;
            let request = commands::request(&settings, &args.targets, desired);
            let admin = open_session(&settings, &cli.connection)?;
            commands::apply::run(ctx, &admin, &request)
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::load(cli.config.as_deref(), &cli.overrides)
}

fn open_session(settings: &Settings, connection: &ConnectionArgs) -> Result<HttpAdmin> {
    let session = settings.session(connection)?;
    log::info!("Connecting to registry at {}", session.locator);
    http::connect(&session).with_context(|| format!("Failed to connect to {}", session.locator))
}

/// JSON failure report, carrying the partial result of a failed run
fn failure_report(err: &anyhow::Error) -> commands::Report<'_> {
    match err.downcast_ref::<declarative::Error>() {
        Some(engine) => commands::Report::failure(engine.to_string(), engine.partial_result()),
        None => commands::Report::failure(format!("{err:#}"), None),
    }
}

/// What kind of registry failure caused `err`, and what to do about it
fn hint(err: &anyhow::Error) -> Option<String> {
    let category = err.chain().find_map(|cause| {
        cause
            .downcast_ref::<declarative::Error>()
            .and_then(declarative::Error::category)
            .or_else(|| cause.downcast_ref::<gridkit::Error>().map(gridkit::Error::category))
    })?;
    Some(format!("{category}: {}", category.advice()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{ActionFailure, ActionKind, FailureReason, ReconciliationResult};

    #[test]
    fn test_failure_report_keeps_partial_result() {
        let partial = ReconciliationResult {
            targets: vec!["a".into(), "b".into()],
            changed: true,
            enabled: Some(vec!["a".into()]),
            ..Default::default()
        };
        let err = anyhow::Error::from(declarative::Error::Action {
            failure: ActionFailure {
                server: "b".into(),
                kind: ActionKind::Enable,
                reason: FailureReason::TargetVanished,
            },
            partial: Box::new(partial),
        });

        let json = serde_json::to_value(failure_report(&err)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "targets": ["a", "b"],
                "changed": true,
                "enabled": ["a"],
                "failed": true,
                "msg": "Server b does not exist"
            })
        );
    }

    #[test]
    fn test_failure_report_includes_cause() {
        let err = anyhow::Error::from(gridkit::Error::transport("connection refused", None))
            .context("Failed to connect to http://registry:4061");
        let json = serde_json::to_value(failure_report(&err)).unwrap();
        let msg = json["msg"].as_str().unwrap();
        assert!(msg.starts_with("Failed to connect to http://registry:4061: "));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_hint_for_registry_causes() {
        let err = anyhow::Error::from(gridkit::Error::transport("connection refused", None))
            .context("Failed to connect to http://registry:4061");
        assert_eq!(
            hint(&err).as_deref(),
            Some("Registry unavailable: Check the locator and that the registry is running")
        );

        let err = anyhow::Error::from(declarative::Error::UnknownTargets {
            ids: vec!["ghost".into()],
        });
        assert!(hint(&err).unwrap().contains("--skip"));
    }

    #[test]
    fn test_no_hint_for_local_errors() {
        let err = anyhow::Error::from(declarative::Error::configuration(
            "One of 'state' or 'enabled' must be set.",
        ));
        assert!(hint(&err).is_none());
        assert!(hint(&anyhow::anyhow!("Invalid override 'x'")).is_none());
    }
}
