//! Configuration file, `--set` overrides and connection settings.
//!
//! Precedence for every setting: command-line flag, then `--set KEY=VALUE`,
//! then the config file, then the built-in default.

use anyhow::{Context, Result, bail};
use gridkit::backend::http::{Credentials, DEFAULT_TIMEOUT, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::ConnectionArgs;

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "GRIDCTL_CONFIG";

// ============================================================================
// File Schema
// ============================================================================

/// Contents of `gridctl.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Registry connection
    #[serde(default)]
    pub registry: RegistrySection,

    /// Defaults for reconciliation runs
    #[serde(default)]
    pub defaults: DefaultsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    pub locator: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub secure: Option<bool>,
    pub cert: Option<String>,
    pub key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    pub jobs: Option<usize>,
    pub skip_unknown: Option<bool>,
}

impl FileConfig {
    /// Load the config file
    ///
    /// An explicit path (flag or `$GRIDCTL_CONFIG`) must exist. The default
    /// location is optional: a missing file yields an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Self::read(path).map(|config| (config, Some(path.to_path_buf())));
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            let path = PathBuf::from(path);
            return Self::read(&path).map(|config| (config, Some(path)));
        }

        match default_path() {
            Some(path) if path.exists() => Self::read(&path).map(|config| (config, Some(path))),
            _ => Ok((Self::default(), None)),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))
    }

    /// Apply one `KEY=VALUE` override
    ///
    /// Keys are `section.field` as in the file, e.g. `registry.locator`.
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("Invalid override '{assignment}': expected KEY=VALUE");
        };
        let (key, value) = (key.trim(), value.trim());
        let registry = &mut self.registry;
        let defaults = &mut self.defaults;

        match key {
            "registry.locator" => registry.locator = Some(value.to_string()),
            "registry.username" => registry.username = Some(value.to_string()),
            "registry.password" => registry.password = Some(value.to_string()),
            "registry.secure" => registry.secure = Some(parse_bool(key, value)?),
            "registry.cert" => registry.cert = Some(value.to_string()),
            "registry.key" => registry.key = Some(value.to_string()),
            "registry.timeout_secs" => {
                registry.timeout_secs = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid number for {key}: '{value}'"))?,
                );
            }
            "defaults.jobs" => {
                defaults.jobs = Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid number for {key}: '{value}'"))?,
                );
            }
            "defaults.skip_unknown" => defaults.skip_unknown = Some(parse_bool(key, value)?),
            _ => bail!("Unknown config key '{key}'"),
        }
        Ok(())
    }

    /// Apply every override in order; later ones win
    pub fn apply_overrides<S: AsRef<str>>(&mut self, assignments: &[S]) -> Result<()> {
        for assignment in assignments {
            self.apply_override(assignment.as_ref())?;
        }
        Ok(())
    }
}

/// Default config location: `<config_dir>/gridctl/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gridctl").join("config.toml"))
}

/// Parse a yes/no style boolean
pub fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "on" | "1" => Ok(true),
        "no" | "n" | "false" | "off" | "0" => Ok(false),
        _ => bail!("Invalid boolean for {key}: '{value}' (expected yes or no)"),
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

// ============================================================================
// Resolved Settings
// ============================================================================

/// Fully resolved settings for one invocation
#[derive(Debug, Clone)]
pub struct Settings {
    pub file: FileConfig,
}

impl Settings {
    /// Load the file and layer `--set` overrides on top
    pub fn load(explicit: Option<&Path>, overrides: &[String]) -> Result<Self> {
        let (mut file, source) = FileConfig::load(explicit)?;
        if let Some(path) = &source {
            log::debug!("Loaded config from {}", path.display());
        }
        file.apply_overrides(overrides)?;
        Ok(Self { file })
    }

    /// Registry locator: flag, then override or file
    pub fn locator(&self, cli: &ConnectionArgs) -> Result<String> {
        match cli.locator.clone().or_else(|| self.file.registry.locator.clone()) {
            Some(locator) => Ok(locator),
            None => bail!("One of 'locator' or 'config' must be set."),
        }
    }

    /// Build the registry session config, validating credentials
    ///
    /// Runs before any remote call.
    pub fn session(&self, cli: &ConnectionArgs) -> Result<SessionConfig> {
        let registry = &self.file.registry;
        let locator = self.locator(cli)?;

        let secure = cli.secure || registry.secure.unwrap_or(false);
        let credentials = if secure {
            let cert = cli.cert.clone().or_else(|| registry.cert.clone());
            let key = cli.key.clone().or_else(|| registry.key.clone());
            match (cert, key) {
                (Some(cert), Some(key)) => Credentials::secure(expand_path(&cert), expand_path(&key)),
                _ => bail!(
                    "Both 'cert' and 'key' must be set when using SSL/TLS based client authentication."
                ),
            }
        } else {
            let username = cli.username.clone().or_else(|| registry.username.clone());
            let password = cli.password.clone().or_else(|| registry.password.clone());
            match (username, password) {
                (Some(username), Some(password)) => Credentials::password(username, password),
                _ => bail!(
                    "Username and password must be set when using password based client authentication. \
                     Otherwise set 'secure=yes' to use SSL/TLS based client authentication."
                ),
            }
        };

        let timeout = registry
            .timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Ok(SessionConfig::new(locator, credentials).timeout(timeout))
    }

    /// Fan-out width: flag, then config, then sized by the engine
    pub fn jobs(&self, cli: Option<usize>) -> Option<usize> {
        cli.or(self.file.defaults.jobs)
    }

    /// Whether to skip unknown servers: flag, then config, then false
    pub fn skip_unknown(&self, cli: Option<bool>) -> bool {
        cli.or(self.file.defaults.skip_unknown).unwrap_or(false)
    }
}
