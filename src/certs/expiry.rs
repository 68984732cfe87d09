//! Expiration extraction and display.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::CertError;

/// `NotAfter` of the first certificate in `pem_bytes`.
pub fn not_after(domain: &str, pem_bytes: &[u8]) -> Result<DateTime<Utc>, CertError> {
    let block = pem::parse(pem_bytes).map_err(|source| CertError::Pem {
        domain: domain.to_string(),
        source,
    })?;

    let (_, cert) = x509_parser::parse_x509_certificate(block.contents()).map_err(|e| {
        CertError::X509 {
            domain: domain.to_string(),
            reason: e.to_string(),
        }
    })?;

    let timestamp = cert.validity().not_after.timestamp();
    DateTime::from_timestamp(timestamp, 0).ok_or_else(|| CertError::X509 {
        domain: domain.to_string(),
        reason: format!("notAfter {timestamp} is out of range"),
    })
}

/// Resolve a display timezone, falling back to UTC when the name is unknown.
///
/// Display problems never fail the lookup that produced the timestamp.
pub fn display_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!(timezone = name, "unknown display timezone, using UTC");
        chrono_tz::UTC
    })
}

/// Render an expiration date as e.g. `January 01, 2025` in `tz`.
pub fn format_expiration(expires: DateTime<Utc>, tz: Tz) -> String {
    expires.with_timezone(&tz).format("%B %d, %Y").to_string()
}
