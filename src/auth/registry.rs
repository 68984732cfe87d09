//! Name → constructor table for the built-in auth methods.

use super::{AppRoleBackend, AuthBackend, GithubBackend, UserpassBackend};

/// A selectable auth method.
pub struct AuthMethod {
    /// Stable key, used on the command line and in Vault mount defaults.
    pub key: &'static str,
    /// Label shown in the interactive method picker.
    pub name: &'static str,
    constructor: fn(Option<&str>) -> Box<dyn AuthBackend>,
}

impl AuthMethod {
    /// Build the backend on its default mount.
    pub fn build(&self) -> Box<dyn AuthBackend> {
        (self.constructor)(None)
    }

    /// Build the backend on a custom mount point.
    pub fn build_with_mount(&self, mount: &str) -> Box<dyn AuthBackend> {
        (self.constructor)(Some(mount))
    }
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMethod")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish()
    }
}

fn userpass(mount: Option<&str>) -> Box<dyn AuthBackend> {
    let backend = UserpassBackend::userpass();
    Box::new(match mount {
        Some(mount) => backend.with_mount(mount),
        None => backend,
    })
}

fn ldap(mount: Option<&str>) -> Box<dyn AuthBackend> {
    let backend = UserpassBackend::ldap();
    Box::new(match mount {
        Some(mount) => backend.with_mount(mount),
        None => backend,
    })
}

fn github(mount: Option<&str>) -> Box<dyn AuthBackend> {
    let backend = GithubBackend::new();
    Box::new(match mount {
        Some(mount) => backend.with_mount(mount),
        None => backend,
    })
}

fn approle(mount: Option<&str>) -> Box<dyn AuthBackend> {
    let backend = AppRoleBackend::new();
    Box::new(match mount {
        Some(mount) => backend.with_mount(mount),
        None => backend,
    })
}

/// Built-in methods, in the order they are offered to the operator.
pub const METHODS: &[AuthMethod] = &[
    AuthMethod {
        key: "userpass",
        name: "Username & Password",
        constructor: userpass,
    },
    AuthMethod {
        key: "ldap",
        name: "LDAP",
        constructor: ldap,
    },
    AuthMethod {
        key: "github",
        name: "GitHub",
        constructor: github,
    },
    AuthMethod {
        key: "approle",
        name: "AppRole",
        constructor: approle,
    },
];

/// Display names of all methods, in picker order.
pub fn method_names() -> Vec<&'static str> {
    METHODS.iter().map(|m| m.name).collect()
}

/// Find a method by key or display name (case-insensitive).
pub fn lookup(name: &str) -> Option<&'static AuthMethod> {
    let name = name.trim();
    METHODS
        .iter()
        .find(|m| m.key.eq_ignore_ascii_case(name) || m.name.eq_ignore_ascii_case(name))
}
