use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gridctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative enablement and lifecycle control for registry-managed servers", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $GRIDCTL_CONFIG, then <config dir>/gridctl/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override a config value (e.g. --set registry.timeout_secs=10)
    #[arg(long = "set", global = true, value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Print machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// How to reach and authenticate with the registry
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Registry base URL (http:// or https://)
    #[arg(long, global = true, env = "GRIDCTL_LOCATOR")]
    pub locator: Option<String>,

    /// Registry user for password authentication
    #[arg(long, global = true, env = "GRIDCTL_USERNAME")]
    pub username: Option<String>,

    /// Password for password authentication
    #[arg(long, global = true, env = "GRIDCTL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Use SSL/TLS client certificate authentication
    #[arg(long, global = true)]
    pub secure: bool,

    /// PEM client certificate (with --secure)
    #[arg(long, global = true, value_name = "PATH")]
    pub cert: Option<String>,

    /// PEM private key (with --secure)
    #[arg(long, global = true, value_name = "PATH")]
    pub key: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bring servers to the desired enablement and/or lifecycle state
    Apply(ApplyArgs),

    /// Show what apply would change, without changing anything
    Diff(DiffArgs),

    /// Show enablement and lifecycle state of servers
    Status(TargetArgs),

    /// List every server the registry knows
    List,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared Arguments
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Servers to act on (default: every server in the registry)
    #[arg(value_name = "SERVER")]
    pub servers: Vec<String>,

    /// Ignore requested servers the registry does not know
    #[arg(long, overrides_with = "no_skip")]
    pub skip: bool,

    /// Fail on unknown servers even if the config says to skip them
    #[arg(long, overrides_with = "skip")]
    pub no_skip: bool,

    /// Cap on concurrent registry calls (default: every call at once)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl TargetArgs {
    /// Requested servers, or `None` for all of them
    pub fn requested(&self) -> Option<&[String]> {
        if self.servers.is_empty() {
            None
        } else {
            Some(&self.servers)
        }
    }

    /// `--skip` / `--no-skip`, or `None` to defer to the config
    pub fn skip_unknown(&self) -> Option<bool> {
        match (self.skip, self.no_skip) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DesiredArgs {
    /// Desired enablement
    #[arg(long, value_enum, value_name = "yes|no")]
    pub enabled: Option<Toggle>,

    /// Desired lifecycle state
    #[arg(long, value_enum)]
    pub state: Option<StateArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    #[value(alias = "true", alias = "on")]
    Yes,
    #[value(alias = "false", alias = "off")]
    No,
}

impl Toggle {
    pub fn as_bool(self) -> bool {
        self == Self::Yes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Started,
    Stopped,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub targets: TargetArgs,

    #[command(flatten)]
    pub desired: DesiredArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DiffArgs {
    #[command(flatten)]
    pub targets: TargetArgs,

    #[command(flatten)]
    pub desired: DesiredArgs,
}
