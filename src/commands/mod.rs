//! Command implementations
//!
//! Every command takes the admin handle as a parameter; `main` opens the
//! session once configuration has been validated.

pub mod apply;
pub mod diff;
pub mod list;
pub mod status;

use anyhow::Result;
use declarative::{DesiredState, LifecycleTarget, ReconcileRequest, ReconciliationResult};
use serde::Serialize;

use crate::cli::{DesiredArgs, StateArg, TargetArgs};
use crate::config::Settings;

/// Desired state from `--enabled`/`--state`, rejected when neither is given
pub fn desired_state(args: &DesiredArgs) -> Result<DesiredState> {
    let desired = DesiredState::new(
        args.enabled.map(|t| t.as_bool()),
        args.state.map(|s| match s {
            StateArg::Started => LifecycleTarget::Started,
            StateArg::Stopped => LifecycleTarget::Stopped,
        }),
    );
    desired.validate()?;
    Ok(desired)
}

/// Engine request for the given targets, with config defaults filled in
pub fn request(settings: &Settings, targets: &TargetArgs, desired: DesiredState) -> ReconcileRequest {
    let mut request = ReconcileRequest::new(desired)
        .skip_unknown(settings.skip_unknown(targets.skip_unknown()));
    if let Some(servers) = targets.requested() {
        request = request.targets(servers.iter().map(String::as_str));
    }
    if let Some(jobs) = settings.jobs(targets.jobs) {
        request = request.jobs(jobs);
    }
    request
}

/// Machine-readable outcome of a run
///
/// On failure `failed` and `msg` are set and the result holds whatever was
/// changed before the failure.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    #[serde(flatten)]
    pub result: Option<&'a ReconciliationResult>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl<'a> Report<'a> {
    pub fn success(result: &'a ReconciliationResult) -> Self {
        Self {
            result: Some(result),
            failed: false,
            msg: None,
        }
    }

    pub fn failure(msg: impl Into<String>, partial: Option<&'a ReconciliationResult>) -> Self {
        Self {
            result: partial,
            failed: true,
            msg: Some(msg.into()),
        }
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
