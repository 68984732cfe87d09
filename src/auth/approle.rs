use serde_json::{Map, Value};

use super::{clean_mount, AuthBackend, AuthDetails, AuthError, Detail};

/// AppRole login, mostly used by automation that still wants the CLI flow.
#[derive(Debug, Clone)]
pub struct AppRoleBackend {
    mount: String,
}

impl AppRoleBackend {
    pub fn new() -> Self {
        Self {
            mount: "approle".to_string(),
        }
    }

    pub fn with_mount(mut self, mount: &str) -> Self {
        self.mount = clean_mount(mount);
        self
    }
}

impl Default for AppRoleBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthBackend for AppRoleBackend {
    fn method(&self) -> &str {
        "approle"
    }

    fn auth_details(&self) -> AuthDetails {
        AuthDetails::new(vec![
            Detail::new("role_id", "Role ID"),
            Detail::hidden("secret_id", "Secret ID"),
        ])
    }

    fn path(&self, _details: &AuthDetails) -> Result<String, AuthError> {
        Ok(format!("auth/{}/login", self.mount))
    }

    fn data(&self, details: &AuthDetails) -> Result<Map<String, Value>, AuthError> {
        let mut data = Map::new();
        for field in ["role_id", "secret_id"] {
            data.insert(
                field.to_string(),
                Value::String(details.require(field)?.to_string()),
            );
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approle_request() {
        let backend = AppRoleBackend::new().with_mount("ci-approle");
        let mut details = backend.auth_details();
        details.fill("role_id", "role-123");
        details.fill("secret_id", "s3cr3t");

        assert_eq!(backend.path(&details).unwrap(), "auth/ci-approle/login");
        assert_eq!(
            Value::Object(backend.data(&details).unwrap()),
            serde_json::json!({"role_id": "role-123", "secret_id": "s3cr3t"})
        );
    }
}
