use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Generic response of a logical read, write or list.
#[derive(Clone, Default, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub request_id: String,

    #[serde(default)]
    pub lease_id: String,

    #[serde(default)]
    pub lease_duration: u64,

    #[serde(default)]
    pub renewable: bool,

    #[serde(default)]
    pub data: Option<Map<String, Value>>,

    #[serde(default)]
    pub warnings: Option<Vec<String>>,

    /// Present on responses of login endpoints.
    #[serde(default)]
    pub auth: Option<SecretAuth>,
}

// Secret data routinely holds private keys, so only the keys are printed.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Option<Vec<&String>> = self.data.as_ref().map(|d| d.keys().collect());
        f.debug_struct("Secret")
            .field("request_id", &self.request_id)
            .field("lease_duration", &self.lease_duration)
            .field("data_keys", &keys)
            .field("warnings", &self.warnings)
            .field("auth", &self.auth)
            .finish()
    }
}

/// Auth block returned by a successful login.
#[derive(Clone, Default, Deserialize)]
pub struct SecretAuth {
    #[serde(default)]
    pub client_token: String,

    #[serde(default)]
    pub accessor: String,

    #[serde(default)]
    pub policies: Vec<String>,

    #[serde(default)]
    pub lease_duration: u64,

    #[serde(default)]
    pub renewable: bool,
}

impl fmt::Debug for SecretAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretAuth")
            .field("accessor", &self.accessor)
            .field("policies", &self.policies)
            .field("lease_duration", &self.lease_duration)
            .field("renewable", &self.renewable)
            .finish_non_exhaustive()
    }
}

/// Response of `sys/seal-status`.
#[derive(Debug, Clone, Deserialize)]
pub struct SealStatus {
    pub sealed: bool,
    pub initialized: bool,
    #[serde(default)]
    pub version: Option<String>,
}

/// Error body of a failed API call.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let body = r#"{
            "request_id": "0b1c",
            "lease_id": "",
            "renewable": false,
            "lease_duration": 0,
            "data": null,
            "wrap_info": null,
            "warnings": null,
            "auth": {
                "client_token": "s.abc123",
                "accessor": "acc",
                "policies": ["default", "ssl-read"],
                "token_policies": ["default", "ssl-read"],
                "metadata": {"username": "alice"},
                "lease_duration": 2764800,
                "renewable": true
            }
        }"#;

        let secret: Secret = serde_json::from_str(body).unwrap();
        assert!(secret.data.is_none());
        let auth = secret.auth.unwrap();
        assert_eq!(auth.client_token, "s.abc123");
        assert_eq!(auth.policies, vec!["default", "ssl-read"]);
        assert!(!format!("{auth:?}").contains("s.abc123"));
    }

    #[test]
    fn test_debug_omits_values() {
        let secret: Secret =
            serde_json::from_str(r#"{"data": {"private_key": "LS0tLS1CRUdJTg=="}}"#).unwrap();
        let rendered = format!("{secret:?}");
        assert!(rendered.contains("private_key"));
        assert!(!rendered.contains("LS0tLS1CRUdJTg=="));
    }

    #[test]
    fn test_parse_seal_status() {
        let status: SealStatus = serde_json::from_str(
            r#"{"type":"shamir","initialized":true,"sealed":false,"t":3,"n":5,"progress":0,"version":"1.15.2"}"#,
        )
        .unwrap();
        assert!(status.initialized);
        assert!(!status.sealed);
        assert_eq!(status.version.as_deref(), Some("1.15.2"));
    }
}
