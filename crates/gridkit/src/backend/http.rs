//! HTTP admin session backend.
//!
//! [`connect`] builds an agent from a [`SessionConfig`], opens an admin
//! session on the registry and returns an [`HttpAdmin`] bound to it.
//!
//! # Wire format
//!
//! | Call | Request |
//! |------|---------|
//! | create session | `POST {locator}/session` `{"username", "password"}` |
//! | create secure session | `POST {locator}/session/secure` (client certificate) |
//! | list servers | `GET /admin/servers` |
//! | is enabled | `GET /admin/servers/{id}/enabled` |
//! | state | `GET /admin/servers/{id}/state` |
//! | enable / disable | `PUT /admin/servers/{id}/enabled` with a JSON bool |
//! | start / stop | `POST /admin/servers/{id}/start` / `stop` |
//!
//! Failed calls answer with a JSON fault `{"kind", "id", "node", "reason"}`
//! which is decoded into [`Error`].

use crate::backend::AdminHandle;
use crate::error::{Error, Result};
use crate::types::{ServerId, ServerState};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use ureq::Agent;
use ureq::Body;
use ureq::http::Response;
use ureq::tls::{Certificate, ClientCert, PrivateKey, TlsConfig};

/// Default timeout for a single registry round-trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How to authenticate the admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Username/password authentication.
    Password {
        /// Registry user.
        username: String,
        /// Password for `username`.
        password: String,
    },
    /// Client-certificate (mutual TLS) authentication.
    Secure {
        /// PEM client certificate.
        cert: PathBuf,
        /// PEM private key for `cert`.
        key: PathBuf,
    },
}

impl Credentials {
    /// Password credentials.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Client-certificate credentials.
    pub fn secure(cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self::Secure {
            cert: cert.into(),
            key: key.into(),
        }
    }
}

/// Everything needed to open an admin session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the registry.
    pub locator: String,
    /// Session credentials.
    pub credentials: Credentials,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SessionConfig {
    /// Create a session config with the default timeout.
    pub fn new(locator: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            locator: locator.into(),
            credentials,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Admin handle backed by an HTTP session on the registry.
pub struct HttpAdmin {
    agent: Agent,
    base: String,
    authorization: String,
}

impl std::fmt::Debug for HttpAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAdmin").field("base", &self.base).finish()
    }
}

/// Open an admin session on the registry.
///
/// # Errors
///
/// - `Error::InvalidLocator` if the locator is not an http(s) URL
/// - `Error::Tls` if the client certificate or key cannot be loaded
/// - `Error::PermissionDenied` if the registry refuses the credentials
/// - `Error::Transport` if the registry cannot be reached
pub fn connect(config: &SessionConfig) -> Result<HttpAdmin> {
    let base = normalize_locator(&config.locator)?;
    let agent = build_agent(config)?;

    let response = match &config.credentials {
        Credentials::Password { username, password } => {
            log::debug!("Creating admin session on {base} as {username}");
            agent
                .post(format!("{base}/session"))
                .send_json(&SessionRequest { username, password })?
        }
        Credentials::Secure { .. } => {
            log::debug!("Creating admin session on {base} from secure connection");
            agent.post(format!("{base}/session/secure")).send_empty()?
        }
    };

    let session: SessionReply = match read_json(response) {
        Err(Error::PermissionDenied { .. }) => {
            return Err(Error::PermissionDenied {
                message: "Permission denied. Please verify username and password.".to_string(),
            });
        }
        other => other?,
    };

    log::info!("Admin session established on {base}");

    Ok(HttpAdmin {
        agent,
        base,
        authorization: format!("Bearer {}", session.token),
    })
}

impl HttpAdmin {
    /// Base URL this session talks to.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    fn servers_url(&self) -> String {
        format!("{}/admin/servers", self.base)
    }

    fn server_url(&self, id: &ServerId, leaf: &str) -> String {
        format!(
            "{}/admin/servers/{}/{}",
            self.base,
            encode_segment(id.as_str()),
            leaf
        )
    }
}

impl AdminHandle for HttpAdmin {
    fn list_all_server_ids(&self) -> Result<Vec<ServerId>> {
        let response = self
            .agent
            .get(self.servers_url())
            .header("Authorization", self.authorization.as_str())
            .call()?;
        read_json(response)
    }

    fn is_server_enabled(&self, id: &ServerId) -> Result<bool> {
        let response = self
            .agent
            .get(self.server_url(id, "enabled"))
            .header("Authorization", self.authorization.as_str())
            .call()?;
        read_json(response)
    }

    fn get_server_state(&self, id: &ServerId) -> Result<ServerState> {
        let response = self
            .agent
            .get(self.server_url(id, "state"))
            .header("Authorization", self.authorization.as_str())
            .call()?;
        read_json(response)
    }

    fn enable_server(&self, id: &ServerId, enabled: bool) -> Result<()> {
        let response = self
            .agent
            .put(self.server_url(id, "enabled"))
            .header("Authorization", self.authorization.as_str())
            .send_json(enabled)?;
        check(response).map(drop)
    }

    fn start_server(&self, id: &ServerId) -> Result<()> {
        let response = self
            .agent
            .post(self.server_url(id, "start"))
            .header("Authorization", self.authorization.as_str())
            .send_empty()?;
        check(response).map(drop)
    }

    fn stop_server(&self, id: &ServerId) -> Result<()> {
        let response = self
            .agent
            .post(self.server_url(id, "stop"))
            .header("Authorization", self.authorization.as_str())
            .send_empty()?;
        check(response).map(drop)
    }
}

fn build_agent(config: &SessionConfig) -> Result<Agent> {
    let mut builder = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(config.timeout));

    if let Credentials::Secure { cert, key } = &config.credentials {
        builder = builder.tls_config(client_tls(cert, key)?);
    }

    Ok(Agent::new_with_config(builder.build()))
}

fn client_tls(cert: &Path, key: &Path) -> Result<TlsConfig> {
    let cert_pem =
        fs::read(cert).map_err(|e| Error::Tls(format!("{}: {e}", cert.display())))?;
    let key_pem = fs::read(key).map_err(|e| Error::Tls(format!("{}: {e}", key.display())))?;

    let certificate = Certificate::from_pem(&cert_pem)
        .map_err(|e| Error::Tls(format!("{}: {e}", cert.display())))?;
    let private_key = PrivateKey::from_pem(&key_pem)
        .map_err(|e| Error::Tls(format!("{}: {e}", key.display())))?;

    Ok(TlsConfig::builder()
        .client_cert(Some(ClientCert::new_with_certs(&[certificate], private_key)))
        .build())
}

/// Validate a locator and strip trailing slashes.
fn normalize_locator(locator: &str) -> Result<String> {
    let trimmed = locator.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));

    match rest {
        Some(host) if !host.is_empty() => Ok(trimmed.to_string()),
        _ => Err(Error::InvalidLocator(format!(
            "Failed to parse locator '{locator}': expected an http:// or https:// URL"
        ))),
    }
}

/// Percent-encode a server id for use as a single path segment.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(char::from(byte));
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn check(mut response: Response<Body>) -> Result<Response<Body>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.body_mut().read_to_string().unwrap_or_default();
    Err(decode_fault(status.as_u16(), &body))
}

fn read_json<T: DeserializeOwned>(response: Response<Body>) -> Result<T> {
    let mut response = check(response)?;
    response
        .body_mut()
        .read_json::<T>()
        .map_err(|e| Error::InvalidResponse(e.to_string()))
}

fn decode_fault(status: u16, body: &str) -> Error {
    match serde_json::from_str::<RemoteFault>(body) {
        Ok(fault) => fault.into_error(status),
        Err(_) if status == 401 || status == 403 => Error::PermissionDenied {
            message: format!("HTTP {status}"),
        },
        Err(_) => Error::transport(
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {}", body.trim())
            },
            Some(status),
        ),
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct SessionRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionReply {
    token: String,
}

#[derive(Debug, Deserialize)]
struct RemoteFault {
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    node: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl RemoteFault {
    fn into_error(self, status: u16) -> Error {
        let kind = self.kind.strip_suffix("Exception").unwrap_or(&self.kind);
        let id = self.id.unwrap_or_default();
        let reason = self.reason.unwrap_or_default();

        match kind {
            "ServerNotExist" => Error::ServerNotExist { id },
            "NodeUnreachable" => Error::NodeUnreachable {
                node: self.node.unwrap_or_default(),
                reason,
            },
            "ServerStart" => Error::ServerStart { id, reason },
            "ServerStop" => Error::ServerStop { id, reason },
            "Deployment" => Error::Deployment { reason },
            "PermissionDenied" => Error::PermissionDenied { message: reason },
            other => Error::transport(format!("HTTP {status}: {other} {reason}"), Some(status)),
        }
    }
}
