use serde_json::{Map, Value};

use super::{clean_mount, AuthBackend, AuthDetails, AuthError, Detail};

/// GitHub personal access token login.
#[derive(Debug, Clone)]
pub struct GithubBackend {
    mount: String,
}

impl GithubBackend {
    pub fn new() -> Self {
        Self {
            mount: "github".to_string(),
        }
    }

    pub fn with_mount(mut self, mount: &str) -> Self {
        self.mount = clean_mount(mount);
        self
    }
}

impl Default for GithubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthBackend for GithubBackend {
    fn method(&self) -> &str {
        "github"
    }

    fn auth_details(&self) -> AuthDetails {
        AuthDetails::new(vec![Detail::hidden("token", "GitHub personal access token")])
    }

    fn path(&self, _details: &AuthDetails) -> Result<String, AuthError> {
        Ok(format!("auth/{}/login", self.mount))
    }

    fn data(&self, details: &AuthDetails) -> Result<Map<String, Value>, AuthError> {
        let mut data = Map::new();
        data.insert(
            "token".to_string(),
            Value::String(details.require("token")?.to_string()),
        );
        Ok(data)
    }
}
