//! Thin client for the parts of the Vault HTTP API this tool needs.
//!
//! The client knows nothing about specific auth methods: [`VaultClient::login`]
//! only consumes the path and body an [`AuthBackend`] produces.

mod secret;
mod token;

pub use secret::{SealStatus, Secret, SecretAuth};
pub use token::{FsTokenReader, TokenFile, TokenReader};

use std::time::Duration;

use reqwest::{Client, Method, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::auth::{AuthBackend, AuthDetails, AuthError};
use crate::config::{RetryConfig, VaultConfig};
use crate::retry::with_retry;
use secret::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("invalid Vault configuration: {0}")]
    Config(String),

    #[error("request to {path} failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Vault returned {status} for {path}: {}", errors.join("; "))]
    Status {
        path: String,
        status: u16,
        errors: Vec<String>,
    },

    #[error("could not decode Vault response for {path}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("the vault is either sealed or not initialized (sealed: {sealed}, initialized: {initialized})")]
    Unavailable { sealed: bool, initialized: bool },

    #[error("server did not return a secret for {path}")]
    NoSecret { path: String },

    #[error("server returned no results for {path}")]
    NoResults { path: String },

    #[error("could not parse list from server response for {path}")]
    UnparsableList { path: String },

    #[error("login returned an empty token")]
    EmptyToken,

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl VaultError {
    /// Connection-level failures worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            VaultError::Transport { source, .. } => {
                source.is_connect() || source.is_timeout() || source.is_request()
            }
            _ => false,
        }
    }
}

/// True if `value` can be used as exactly one segment of a logical path.
pub fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\', '\0', '?', '#'])
}

/// Session against one Vault server.
pub struct VaultClient {
    http: Client,
    address: Url,
    token: Option<SecretString>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.address.as_str())
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

fn parse_address(address: &str) -> Result<Url, VaultError> {
    let url = Url::parse(address.trim())
        .map_err(|e| VaultError::Config(format!("invalid address {address:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(VaultError::Config(format!(
            "unsupported scheme {scheme:?} in address {address:?}"
        ))),
    }
}

impl VaultClient {
    /// Create a client for `address` without a token.
    pub fn new(address: &str, timeout: Duration, connect_timeout: Duration) -> Result<Self, VaultError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| VaultError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            address: parse_address(address)?,
            token: None,
        })
    }

    pub fn from_config(config: &VaultConfig) -> Result<Self, VaultError> {
        Self::new(&config.address, config.timeout, config.connect_timeout)
    }

    /// Override address and/or token. Empty arguments leave the current value alone.
    pub fn configure(&mut self, address: &str, token: &str) -> Result<(), VaultError> {
        if !address.trim().is_empty() {
            self.address = parse_address(address)?;
        }
        if !token.trim().is_empty() {
            self.set_token(SecretString::from(token.trim().to_string()));
        }
        Ok(())
    }

    pub fn address(&self) -> &str {
        self.address.as_str().trim_end_matches('/')
    }

    pub fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: SecretString) {
        self.token = Some(token);
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.address(), path.trim_start_matches('/'))
    }

    /// Send one request and return the body, or `None` for an empty response.
    ///
    /// With `missing_is_empty`, a 404 is also reported as `None`, matching how
    /// Vault signals "nothing stored here" on reads and lists.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Map<String, Value>>,
        with_token: bool,
        missing_is_empty: bool,
    ) -> Result<Option<String>, VaultError> {
        debug!(%method, path, "vault request");

        let mut req = self
            .http
            .request(method, self.url(path))
            .header("X-Vault-Request", "true");

        if with_token {
            if let Some(token) = &self.token {
                req = req.header("X-Vault-Token", token.expose_secret());
            }
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let transport = |source: reqwest::Error| VaultError::Transport {
            path: path.to_string(),
            source,
        };

        let response = req.send().await.map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;

        if status == StatusCode::NOT_FOUND && missing_is_empty {
            return Ok(None);
        }

        if !status.is_success() {
            let errors = serde_json::from_str::<ErrorResponse>(&text)
                .map(|r| r.errors)
                .unwrap_or_default();
            return Err(VaultError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                errors,
            });
        }

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }

    fn decode_secret(path: &str, body: Option<String>) -> Result<Option<Secret>, VaultError> {
        body.map(|text| {
            serde_json::from_str(&text).map_err(|source| VaultError::Decode {
                path: path.to_string(),
                source,
            })
        })
        .transpose()
    }

    async fn seal_status(&self) -> Result<SealStatus, VaultError> {
        let path = "sys/seal-status";
        let body = self
            .send(Method::GET, path, None, false, false)
            .await?
            .ok_or_else(|| VaultError::NoSecret {
                path: path.to_string(),
            })?;

        let status: SealStatus =
            serde_json::from_str(&body).map_err(|source| VaultError::Decode {
                path: path.to_string(),
                source,
            })?;
        debug!(sealed = status.sealed, initialized = status.initialized, "seal status");
        Ok(status)
    }

    /// Check the seal status. True only when the store is unsealed and initialized.
    pub async fn available(&self) -> Result<bool, VaultError> {
        let status = self.seal_status().await?;
        Ok(!status.sealed && status.initialized)
    }

    /// Like [`available`](Self::available), retrying transport failures and
    /// turning an unusable store into [`VaultError::Unavailable`].
    pub async fn ensure_available(&self, retry: &RetryConfig) -> Result<(), VaultError> {
        let status = with_retry(retry, "vault health check", VaultError::is_transient, || {
            self.seal_status()
        })
        .await?;

        if status.sealed || !status.initialized {
            return Err(VaultError::Unavailable {
                sealed: status.sealed,
                initialized: status.initialized,
            });
        }
        Ok(())
    }

    /// Whether the current token is accepted by the server.
    ///
    /// Only a missing token or a 401/403 answer means "no"; any other failure
    /// is returned so it is not mistaken for being logged out.
    pub async fn authenticated(&self) -> Result<bool, VaultError> {
        if self.token.is_none() {
            return Ok(false);
        }
        match self
            .send(Method::GET, "auth/token/lookup-self", None, true, false)
            .await
        {
            Ok(_) => Ok(true),
            Err(VaultError::Status {
                status: 401 | 403, ..
            }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Logical read. `Ok(None)` when nothing is stored at `path`.
    pub async fn read(&self, path: &str) -> Result<Option<Secret>, VaultError> {
        let body = self.send(Method::GET, path, None, true, true).await?;
        Self::decode_secret(path, body)
    }

    /// Logical write. Many endpoints answer with no body, hence the `Option`.
    pub async fn write(
        &self,
        path: &str,
        data: &Map<String, Value>,
    ) -> Result<Option<Secret>, VaultError> {
        let body = self.send(Method::PUT, path, Some(data), true, false).await?;
        Self::decode_secret(path, body)
    }

    /// Logical list, returning the raw `keys` entries.
    pub async fn list(&self, path: &str) -> Result<Vec<Value>, VaultError> {
        let method = Method::from_bytes(b"LIST").map_err(|e| VaultError::Config(e.to_string()))?;
        let body = self.send(method, path, None, true, true).await?;

        let data = Self::decode_secret(path, body)?
            .and_then(|secret| secret.data)
            .ok_or_else(|| VaultError::NoSecret {
                path: path.to_string(),
            })?;

        match data.get("keys") {
            None | Some(Value::Null) => Err(VaultError::NoResults {
                path: path.to_string(),
            }),
            Some(Value::Array(keys)) => Ok(keys.clone()),
            Some(_) => Err(VaultError::UnparsableList {
                path: path.to_string(),
            }),
        }
    }

    /// Exchange collected credentials for a token and keep it for later calls.
    ///
    /// The current token is only replaced on success.
    pub async fn login(
        &mut self,
        backend: &dyn AuthBackend,
        details: &AuthDetails,
    ) -> Result<(), VaultError> {
        if let Some(missing) = details.first_missing() {
            return Err(AuthError::MissingDetail(missing.to_string()).into());
        }
        let path = backend.path(details)?;
        let data = backend.data(details)?;

        // Login endpoints are unauthenticated; a stale token would only get in the way.
        let body = self.send(Method::PUT, &path, Some(&data), false, false).await?;
        let token = Self::decode_secret(&path, body)?
            .and_then(|secret| secret.auth)
            .map(|auth| auth.client_token)
            .filter(|token| !token.is_empty())
            .ok_or(VaultError::EmptyToken)?;

        self.token = Some(SecretString::from(token));
        info!(method = backend.method(), address = self.address(), "logged in to Vault");
        Ok(())
    }
}
