use serde_json::{Map, Value};

use super::{clean_mount, AuthBackend, AuthDetails, AuthError, Detail};

/// Username and password login.
///
/// Vault's `userpass` and `ldap` methods share the same login shape, so one
/// backend serves both and only the method key and mount differ.
#[derive(Debug, Clone)]
pub struct UserpassBackend {
    method: &'static str,
    mount: String,
}

impl UserpassBackend {
    pub fn userpass() -> Self {
        Self {
            method: "userpass",
            mount: "userpass".to_string(),
        }
    }

    pub fn ldap() -> Self {
        Self {
            method: "ldap",
            mount: "ldap".to_string(),
        }
    }

    pub fn with_mount(mut self, mount: &str) -> Self {
        self.mount = clean_mount(mount);
        self
    }
}

impl AuthBackend for UserpassBackend {
    fn method(&self) -> &str {
        self.method
    }

    fn auth_details(&self) -> AuthDetails {
        AuthDetails::new(vec![
            Detail::new("username", "Username"),
            Detail::hidden("password", "Password"),
        ])
    }

    fn path(&self, details: &AuthDetails) -> Result<String, AuthError> {
        let username = details.require_segment("username")?;
        Ok(format!("auth/{}/login/{username}", self.mount))
    }

    fn data(&self, details: &AuthDetails) -> Result<Map<String, Value>, AuthError> {
        let mut data = Map::new();
        data.insert(
            "password".to_string(),
            Value::String(details.require("password")?.to_string()),
        );
        Ok(data)
    }
}
