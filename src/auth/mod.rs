//! Pluggable Vault authentication methods.
//!
//! Each method declares the fields an operator has to supply and turns the
//! collected values into a single logical write against its login endpoint:
//!
//! ```text
//! userpass  ->  PUT auth/userpass/login/<username>  {"password": ...}
//! github    ->  PUT auth/github/login               {"token": ...}
//! ```
//!
//! The session client only sees the resulting path and body, so adding a
//! method is one new [`AuthBackend`] implementation plus one registry entry.

mod approle;
mod github;
mod registry;
mod userpass;

pub use approle::AppRoleBackend;
pub use github::GithubBackend;
pub use registry::{lookup, method_names, AuthMethod, METHODS};
pub use userpass::UserpassBackend;

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

use crate::vault::is_path_segment;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authentication detail {0:?} was not filled in")]
    MissingDetail(String),

    #[error("authentication detail {name:?} is invalid: {reason}")]
    InvalidDetail { name: String, reason: String },
}

/// One input field an auth method needs from the operator.
#[derive(Clone)]
pub struct Detail {
    pub name: String,
    pub prompt: String,
    /// Masked on input and never echoed.
    pub hidden: bool,
    value: Option<SecretString>,
}

impl Detail {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            hidden: false,
            value: None,
        }
    }

    pub fn hidden(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            hidden: true,
            ..Self::new(name, prompt)
        }
    }

    pub(crate) fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(SecretString::from(value.into()));
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_ref().map(|v| v.expose_secret())
    }

    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Debug for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detail")
            .field("name", &self.name)
            .field("prompt", &self.prompt)
            .field("hidden", &self.hidden)
            .field("filled", &self.is_filled())
            .finish()
    }
}

/// The ordered set of details declared by one auth method.
#[derive(Debug, Clone, Default)]
pub struct AuthDetails {
    details: Vec<Detail>,
}

impl AuthDetails {
    pub fn new(details: Vec<Detail>) -> Self {
        Self { details }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Detail> {
        self.details.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Detail> {
        self.details.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.details.iter().all(Detail::is_filled)
    }

    /// Name of the first declared detail that has no value yet.
    pub fn first_missing(&self) -> Option<&str> {
        self.details
            .iter()
            .find(|d| !d.is_filled())
            .map(|d| d.name.as_str())
    }

    /// Set the value of the named detail. Returns false if no such detail was declared.
    pub(crate) fn fill(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.details.iter_mut().find(|d| d.name == name) {
            Some(detail) => {
                detail.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Value of a declared and filled detail.
    pub fn require(&self, name: &str) -> Result<&str, AuthError> {
        self.details
            .iter()
            .find(|d| d.name == name)
            .and_then(Detail::value)
            .ok_or_else(|| AuthError::MissingDetail(name.to_string()))
    }

    /// Like [`require`](Self::require), but the value must also be usable as one
    /// segment of a Vault path.
    pub fn require_segment(&self, name: &str) -> Result<&str, AuthError> {
        let value = self.require(name)?;
        if is_path_segment(value) {
            Ok(value)
        } else {
            Err(AuthError::InvalidDetail {
                name: name.to_string(),
                reason: "must be a single path segment".to_string(),
            })
        }
    }
}

/// An authentication method understood by Vault.
pub trait AuthBackend: Send + Sync {
    /// Registry key of this method, e.g. `userpass`.
    fn method(&self) -> &str;

    /// Empty details in the order they should be asked for.
    fn auth_details(&self) -> AuthDetails;

    /// Logical path of the login endpoint.
    fn path(&self, details: &AuthDetails) -> Result<String, AuthError>;

    /// Body of the login write.
    fn data(&self, details: &AuthDetails) -> Result<Map<String, Value>, AuthError>;
}

/// Normalize a mount point: no leading or trailing slashes.
pub(crate) fn clean_mount(mount: &str) -> String {
    mount.trim_matches('/').to_string()
}
