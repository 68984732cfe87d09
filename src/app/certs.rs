use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::certs::{display_timezone, format_expiration, CertificateStore};
use crate::config::Config;
use crate::issuer::{CertificateRequester, GrpcIssuer, IssuanceEndpoint};
use crate::vault::VaultClient;

fn store<'a>(client: &'a VaultClient, config: &Config) -> CertificateStore<'a> {
    CertificateStore::new(client, &config.certs.prefix).with_file_mode(config.certs.file_mode)
}

/// Fetch the bundle for `domain` and write its PEM files into `dir`.
pub async fn fetch_certificate(
    client: &VaultClient,
    config: &Config,
    domain: &str,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let store = store(client, config);
    let bundle = store
        .fetch(domain)
        .await
        .with_context(|| format!("Failed to fetch certificate for {domain}"))?;
    let written = store.write_bundle(&bundle, dir)?;
    Ok(written)
}

pub async fn list_certificates(client: &VaultClient, config: &Config) -> Result<Vec<String>> {
    store(client, config)
        .list_domains()
        .await
        .context("Failed to list certificates")
}

/// One line of `cert list --expiration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationOutput {
    pub domain: String,
    /// Formatted date in the display timezone.
    pub expires: Option<String>,
    pub error: Option<String>,
}

impl fmt::Display for ExpirationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.expires, &self.error) {
            (Some(expires), _) => write!(f, "{} (expires {expires})", self.domain),
            (None, Some(error)) => write!(f, "{} (error: {error})", self.domain),
            (None, None) => write!(f, "{}", self.domain),
        }
    }
}

pub async fn list_certificates_with_expiration(
    client: &VaultClient,
    config: &Config,
) -> Result<Vec<ExpirationOutput>> {
    let entries = store(client, config)
        .list_with_expiration()
        .await
        .context("Failed to list certificates")?;
    let tz = display_timezone(&config.certs.display_timezone);

    Ok(entries
        .into_iter()
        .map(|entry| match entry.expires {
            Ok(expires) => ExpirationOutput {
                domain: entry.domain,
                expires: Some(format_expiration(expires, tz)),
                error: None,
            },
            Err(err) => ExpirationOutput {
                domain: entry.domain,
                expires: None,
                error: Some(err.to_string()),
            },
        })
        .collect())
}

/// Ask the issuing service at `server` for certificates covering `domains`.
///
/// `production` forces the production endpoint; otherwise the configured one is used.
pub async fn request_certificates(
    config: &Config,
    server: &str,
    domains: &[String],
    production: bool,
) -> Result<Vec<String>> {
    let endpoint = if production {
        IssuanceEndpoint::Production
    } else {
        config.issuer.endpoint
    };

    let requester = CertificateRequester::new(
        GrpcIssuer::from_config(server, &config.issuer),
        endpoint,
        config.retry.clone(),
    );

    let paths = requester.request_certificates(domains).await?;
    Ok(paths)
}
