//! Client side of the certificate issuing service.
//!
//! The issuing service obtains certificates from Let's Encrypt and stores them
//! in Vault under the certificate prefix. This module only asks for them; the
//! returned Vault paths are read back through [`crate::certs`].

pub mod proto;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tonic::transport::{Channel, Endpoint};

use crate::config::{IssuerConfig, RetryConfig};
use crate::retry::with_retry;
use proto::certificate_request::Endpoint as ProtoEndpoint;
use proto::{CertificateRequest, CertificateResponse, CertificateServiceClient};

/// Which ACME directory the issuing service should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuanceEndpoint {
    #[default]
    Staging,
    Production,
}

impl IssuanceEndpoint {
    pub fn to_proto(self) -> ProtoEndpoint {
        match self {
            IssuanceEndpoint::Staging => ProtoEndpoint::LeStaging,
            IssuanceEndpoint::Production => ProtoEndpoint::LeProduction,
        }
    }
}

impl std::fmt::Display for IssuanceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IssuanceEndpoint::Staging => "staging",
            IssuanceEndpoint::Production => "production",
        })
    }
}

/// Failure of a single call, before it is tied to a server and domain list.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("invalid server address {address:?}: {reason}")]
    Address { address: String, reason: String },

    #[error("could not connect: {0}")]
    Connect(#[source] tonic::transport::Error),

    #[error("call failed: {}", .0.message())]
    Status(#[source] tonic::Status),
}

impl CallError {
    /// Connection failures and the status codes a retry can fix.
    pub fn is_transient(&self) -> bool {
        match self {
            CallError::Address { .. } => false,
            CallError::Connect(_) => true,
            CallError::Status(status) => matches!(
                status.code(),
                tonic::Code::Unavailable | tonic::Code::DeadlineExceeded
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("no domains given")]
    NoDomains,

    #[error("error requesting certificates for {} from {server}", domains.join(", "))]
    Transport {
        server: String,
        domains: Vec<String>,
        #[source]
        source: CallError,
    },

    #[error("server {server} rejected the request for {}", domains.join(", "))]
    Rejected { server: String, domains: Vec<String> },
}

impl IssueError {
    pub fn is_transient(&self) -> bool {
        matches!(self, IssueError::Transport { source, .. } if source.is_transient())
    }
}

/// Seam between the request flow and the gRPC transport.
#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    /// Address used in logs and errors.
    fn server(&self) -> &str;

    async fn get_certificate(
        &self,
        request: CertificateRequest,
    ) -> Result<CertificateResponse, CallError>;
}

/// Plaintext gRPC connection to an issuing service.
#[derive(Debug, Clone)]
pub struct GrpcIssuer {
    server: String,
    timeout: Duration,
    connect_timeout: Duration,
}

impl GrpcIssuer {
    /// `server` is `host:port`; an explicit `http://` scheme is accepted too.
    pub fn new(server: &str, timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            server: server.trim().to_string(),
            timeout,
            connect_timeout,
        }
    }

    pub fn from_config(server: &str, config: &IssuerConfig) -> Self {
        Self::new(server, config.timeout, config.connect_timeout)
    }

    fn endpoint(&self) -> Result<Endpoint, CallError> {
        let invalid = |reason: &str| CallError::Address {
            address: self.server.clone(),
            reason: reason.to_string(),
        };

        if self.server.is_empty() {
            return Err(invalid("address is empty"));
        }
        if self.server.starts_with("https://") {
            return Err(invalid("only plaintext connections are supported"));
        }

        let uri = if self.server.starts_with("http://") {
            self.server.clone()
        } else {
            format!("http://{}", self.server)
        };

        Endpoint::from_shared(uri)
            .map(|endpoint| {
                endpoint
                    .connect_timeout(self.connect_timeout)
                    .timeout(self.timeout)
            })
            .map_err(|e| invalid(&e.to_string()))
    }

    async fn connect(&self) -> Result<Channel, CallError> {
        self.endpoint()?.connect().await.map_err(CallError::Connect)
    }
}

#[async_trait]
impl CertificateIssuer for GrpcIssuer {
    fn server(&self) -> &str {
        &self.server
    }

    async fn get_certificate(
        &self,
        request: CertificateRequest,
    ) -> Result<CertificateResponse, CallError> {
        let channel = self.connect().await?;
        let mut client = CertificateServiceClient::new(channel);
        let response = client
            .get_certificate(request)
            .await
            .map_err(CallError::Status)?;
        Ok(response.into_inner())
    }
}

/// Asks an issuing service for certificates, retrying transport failures.
#[derive(Debug)]
pub struct CertificateRequester<I> {
    issuer: I,
    endpoint: IssuanceEndpoint,
    retry: RetryConfig,
}

impl<I: CertificateIssuer> CertificateRequester<I> {
    pub fn new(issuer: I, endpoint: IssuanceEndpoint, retry: RetryConfig) -> Self {
        Self {
            issuer,
            endpoint,
            retry,
        }
    }

    pub fn endpoint(&self) -> IssuanceEndpoint {
        self.endpoint
    }

    /// Request certificates for `domains` and return the Vault paths the
    /// service stored them at.
    ///
    /// A response with `success == false` is returned as
    /// [`IssueError::Rejected`] and never retried.
    pub async fn request_certificates(&self, domains: &[String]) -> Result<Vec<String>, IssueError> {
        if domains.is_empty() {
            return Err(IssueError::NoDomains);
        }

        let server = self.issuer.server().to_string();
        let request = CertificateRequest {
            domains: domains.to_vec(),
            endpoint: self.endpoint.to_proto() as i32,
        };

        tracing::info!(
            server = %server,
            endpoint = %self.endpoint,
            domains = ?domains,
            "requesting certificates"
        );

        let response = with_retry(
            &self.retry,
            "certificate request",
            CallError::is_transient,
            || self.issuer.get_certificate(request.clone()),
        )
        .await
        .map_err(|source| IssueError::Transport {
            server: server.clone(),
            domains: domains.to_vec(),
            source,
        })?;

        if !response.success {
            return Err(IssueError::Rejected {
                server,
                domains: domains.to_vec(),
            });
        }

        tracing::info!(paths = ?response.vault_paths, "certificates issued");
        Ok(response.vault_paths)
    }
}
