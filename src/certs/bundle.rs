use std::fmt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

use super::CertError;
use crate::fsutil::write_file_atomic;
use crate::vault::Secret;

/// Keys every stored certificate secret must carry.
pub const REQUIRED_KEYS: [&str; 5] = [
    "cert_stable_url",
    "cert_url",
    "certificate",
    "issuer_certificate",
    "private_key",
];

/// One of the three base64-encoded PEM artifacts in a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemField {
    Certificate,
    IssuerCertificate,
    PrivateKey,
}

impl PemField {
    /// In the order they are written to disk.
    pub const ALL: [PemField; 3] = [
        PemField::Certificate,
        PemField::IssuerCertificate,
        PemField::PrivateKey,
    ];

    /// Key in the stored secret.
    pub fn key(self) -> &'static str {
        match self {
            PemField::Certificate => "certificate",
            PemField::IssuerCertificate => "issuer_certificate",
            PemField::PrivateKey => "private_key",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            PemField::Certificate => "certificate.pem",
            PemField::IssuerCertificate => "ca_certificate.pem",
            PemField::PrivateKey => "key.pem",
        }
    }
}

impl fmt::Display for PemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PemField::Certificate => "certificate",
            PemField::IssuerCertificate => "CA certificate",
            PemField::PrivateKey => "private key",
        })
    }
}

/// Certificate, issuer certificate and private key stored for one domain.
#[derive(Clone)]
pub struct CertificateBundle {
    pub domain: String,
    pub cert_stable_url: Value,
    pub cert_url: Value,
    certificate: Vec<u8>,
    issuer_certificate: Vec<u8>,
    private_key: Vec<u8>,
}

impl fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("domain", &self.domain)
            .field("cert_url", &self.cert_url)
            .field("certificate_len", &self.certificate.len())
            .field("issuer_certificate_len", &self.issuer_certificate.len())
            .finish_non_exhaustive()
    }
}

fn decode_field(
    domain: &str,
    data: &Map<String, Value>,
    field: PemField,
) -> Result<Vec<u8>, CertError> {
    let encoded = data
        .get(field.key())
        .and_then(Value::as_str)
        .ok_or_else(|| CertError::NotAString {
            domain: domain.to_string(),
            field,
        })?;

    // Line breaks inside the payload are skipped, as wrapped base64 is common.
    let compact: String = encoded
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .collect();

    STANDARD
        .decode(compact)
        .map_err(|source| CertError::Base64 {
            domain: domain.to_string(),
            field,
            source,
        })
}

impl CertificateBundle {
    /// Validate and decode the secret stored for `domain`.
    ///
    /// All five keys are checked before anything is decoded, so a missing key
    /// is always reported as a malformed response.
    pub fn from_secret(domain: &str, secret: Option<Secret>) -> Result<Self, CertError> {
        let data = secret
            .and_then(|s| s.data)
            .ok_or_else(|| CertError::NotFound {
                domain: domain.to_string(),
            })?;

        if let Some(missing) = REQUIRED_KEYS.iter().find(|key| !data.contains_key(**key)) {
            return Err(CertError::Malformed {
                domain: domain.to_string(),
                missing: missing.to_string(),
            });
        }

        Ok(Self {
            domain: domain.to_string(),
            cert_stable_url: data["cert_stable_url"].clone(),
            cert_url: data["cert_url"].clone(),
            certificate: decode_field(domain, &data, PemField::Certificate)?,
            issuer_certificate: decode_field(domain, &data, PemField::IssuerCertificate)?,
            private_key: decode_field(domain, &data, PemField::PrivateKey)?,
        })
    }

    /// Decode only the leaf certificate of the secret stored for `domain`.
    ///
    /// The other keys are not looked at, so a damaged key or issuer
    /// certificate does not hide the leaf's expiration.
    pub fn certificate_from_secret(
        domain: &str,
        secret: Option<Secret>,
    ) -> Result<Vec<u8>, CertError> {
        let data = secret
            .and_then(|s| s.data)
            .ok_or_else(|| CertError::NotFound {
                domain: domain.to_string(),
            })?;

        let field = PemField::Certificate;
        if !data.contains_key(field.key()) {
            return Err(CertError::Malformed {
                domain: domain.to_string(),
                missing: field.key().to_string(),
            });
        }
        decode_field(domain, &data, field)
    }

    /// Decoded PEM bytes of one artifact.
    pub fn pem(&self, field: PemField) -> &[u8] {
        match field {
            PemField::Certificate => &self.certificate,
            PemField::IssuerCertificate => &self.issuer_certificate,
            PemField::PrivateKey => &self.private_key,
        }
    }

    /// Write `certificate.pem`, `ca_certificate.pem` and `key.pem` into `dir`.
    ///
    /// Every file gets `mode`. The first failure stops the remaining writes;
    /// files already written are left in place.
    pub fn write_to(&self, dir: &Path, mode: u32) -> Result<Vec<PathBuf>, CertError> {
        let mut written = Vec::with_capacity(PemField::ALL.len());

        for field in PemField::ALL {
            let path = dir.join(field.file_name());
            write_file_atomic(&path, self.pem(field), mode).map_err(|source| CertError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path.display(), "wrote {field}");
            written.push(path);
        }

        Ok(written)
    }
}
