//! Certificate bundles stored in Vault, one secret per domain.
//!
//! The issuing service writes each bundle to `<prefix>/<domain>`:
//!
//! ```text
//! secret/ssl/example.com
//!   cert_stable_url     ACME URL of the certificate
//!   cert_url            ACME URL of this issuance
//!   certificate         base64(PEM leaf certificate)
//!   issuer_certificate  base64(PEM issuer certificate)
//!   private_key         base64(PEM private key)
//! ```

mod bundle;
mod expiry;

pub use bundle::{CertificateBundle, PemField, REQUIRED_KEYS};
pub use expiry::{display_timezone, format_expiration, not_after};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::vault::{is_path_segment, VaultClient, VaultError};

#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("invalid domain {0:?}")]
    InvalidDomain(String),

    #[error("no certificates stored for {domain}")]
    NotFound { domain: String },

    #[error("the server returned a malformed response for {domain}: missing {missing:?}")]
    Malformed { domain: String, missing: String },

    #[error("error unmarshalling {field} from response for {domain}")]
    NotAString { domain: String, field: PemField },

    #[error("error decoding {field} for {domain}")]
    Base64 {
        domain: String,
        field: PemField,
        #[source]
        source: base64::DecodeError,
    },

    #[error("error parsing domain as a string: {0}")]
    NonStringKey(Value),

    #[error("no PEM block found in certificate for {domain}")]
    Pem {
        domain: String,
        #[source]
        source: pem::PemError,
    },

    #[error("invalid X.509 certificate for {domain}: {reason}")]
    X509 { domain: String, reason: String },

    #[error("error writing {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Expiration lookup result for one listed domain.
#[derive(Debug)]
pub struct DomainExpiry {
    pub domain: String,
    pub expires: Result<DateTime<Utc>, CertError>,
}

/// Certificate operations on top of an authenticated [`VaultClient`].
#[derive(Debug)]
pub struct CertificateStore<'a> {
    client: &'a VaultClient,
    prefix: String,
    file_mode: u32,
}

impl<'a> CertificateStore<'a> {
    pub fn new(client: &'a VaultClient, prefix: &str) -> Self {
        Self {
            client,
            prefix: prefix.trim_matches('/').to_string(),
            file_mode: 0o600,
        }
    }

    /// Permission bits for written PEM files.
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn domain_path(&self, domain: &str) -> Result<String, CertError> {
        if !is_path_segment(domain) {
            return Err(CertError::InvalidDomain(domain.to_string()));
        }
        Ok(format!("{}/{domain}", self.prefix))
    }

    /// Read and decode the bundle stored for `domain`.
    pub async fn fetch(&self, domain: &str) -> Result<CertificateBundle, CertError> {
        let path = self.domain_path(domain)?;
        let secret = self.client.read(&path).await?;
        let bundle = CertificateBundle::from_secret(domain, secret)?;
        tracing::info!(domain, path = %path, "fetched certificate bundle");
        Ok(bundle)
    }

    /// Write the three PEM files of `bundle` into `dir`.
    pub fn write_bundle(
        &self,
        bundle: &CertificateBundle,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, CertError> {
        let written = bundle.write_to(dir, self.file_mode)?;
        tracing::info!(domain = %bundle.domain, dir = %dir.display(), "wrote certificate files");
        Ok(written)
    }

    /// Domains with a stored bundle. Every key must be a string.
    pub async fn list_domains(&self) -> Result<Vec<String>, CertError> {
        self.client
            .list(&self.prefix)
            .await?
            .into_iter()
            .map(|key| match key {
                Value::String(domain) => Ok(domain),
                other => Err(CertError::NonStringKey(other)),
            })
            .collect()
    }

    /// `NotAfter` of the leaf certificate stored for `domain`, in UTC.
    ///
    /// Only the `certificate` key has to be present and decodable.
    pub async fn expiration_of(&self, domain: &str) -> Result<DateTime<Utc>, CertError> {
        let path = self.domain_path(domain)?;
        let secret = self.client.read(&path).await?;
        let certificate = CertificateBundle::certificate_from_secret(domain, secret)?;
        not_after(domain, &certificate)
    }

    /// List domains together with their expiration.
    ///
    /// Failing to list is an error; a single unreadable certificate is only
    /// reported in its own entry.
    pub async fn list_with_expiration(&self) -> Result<Vec<DomainExpiry>, CertError> {
        let domains = self.list_domains().await?;
        let mut entries = Vec::with_capacity(domains.len());

        for domain in domains {
            let expires = self.expiration_of(&domain).await;
            if let Err(err) = &expires {
                tracing::warn!(domain = %domain, error = %err, "could not determine expiration");
            }
            entries.push(DomainExpiry { domain, expires });
        }

        Ok(entries)
    }
}
