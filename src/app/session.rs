use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::auth::{lookup, method_names, AuthMethod, METHODS};
use crate::config::Config;
use crate::prompt::{collect, Prompter};
use crate::vault::{TokenFile, TokenReader, VaultClient};

/// Build a client from config with the best available token.
///
/// A non-empty `env_token` (`VAULT_TOKEN`) wins over the token file.
pub fn open_client(
    config: &Config,
    env_token: Option<&str>,
    token_file: &TokenFile,
    reader: &dyn TokenReader,
) -> Result<VaultClient> {
    let mut client =
        VaultClient::from_config(&config.vault).context("Invalid Vault configuration")?;

    match env_token.map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => {
            tracing::debug!("using token from VAULT_TOKEN");
            client.configure("", token)?;
        }
        None => {
            if let Some(token) = token_file.load(reader)? {
                tracing::debug!(path = %token_file.path().display(), "using token file");
                client.set_token(token);
            }
        }
    }

    Ok(client)
}

/// [`open_client`], failing unless the store is usable and accepts the token.
///
/// A sealed or unreachable store is reported as such, never as a missing login.
pub async fn authenticated_client(
    config: &Config,
    env_token: Option<&str>,
    token_file: &TokenFile,
    reader: &dyn TokenReader,
) -> Result<VaultClient> {
    let client = open_client(config, env_token, token_file, reader)?;
    client
        .ensure_available(&config.retry)
        .await
        .with_context(|| format!("Vault at {} is not available", client.address()))?;

    let authenticated = client
        .authenticated()
        .await
        .with_context(|| format!("Failed to check token with {}", client.address()))?;
    if !authenticated {
        bail!(
            "Not logged in to {}; run `vaultcert login` first",
            client.address()
        );
    }
    Ok(client)
}

#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    /// Overrides the configured Vault address.
    pub server: Option<String>,
    /// Method key or display name; asked interactively when absent.
    pub method: Option<String>,
    /// Custom mount point of the auth method.
    pub mount: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub address: String,
    pub method: &'static str,
    pub token_path: PathBuf,
}

fn choose_method(
    name: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<&'static AuthMethod> {
    if let Some(name) = name {
        return lookup(name).with_context(|| {
            let keys: Vec<_> = METHODS.iter().map(|m| m.key).collect();
            format!("Unknown auth method {name:?} (available: {})", keys.join(", "))
        });
    }

    let names = method_names();
    let index = prompter
        .select("Authentication method", &names)
        .context("Failed to read authentication method")?;
    METHODS
        .get(index)
        .with_context(|| format!("Invalid method selection {index}"))
}

/// Log in interactively and save the resulting token.
///
/// Nothing is written to the token file unless the login succeeds.
pub async fn login(
    config: &Config,
    options: &LoginOptions,
    token_file: &TokenFile,
    prompter: &mut dyn Prompter,
) -> Result<LoginOutput> {
    let mut client =
        VaultClient::from_config(&config.vault).context("Invalid Vault configuration")?;
    if let Some(server) = options.server.as_deref() {
        client
            .configure(server, "")
            .with_context(|| format!("Invalid server address {server:?}"))?;
    }

    client
        .ensure_available(&config.retry)
        .await
        .with_context(|| format!("Vault at {} is not available", client.address()))?;

    let method = choose_method(options.method.as_deref(), prompter)?;
    let backend = match options.mount.as_deref() {
        Some(mount) => method.build_with_mount(mount),
        None => method.build(),
    };

    let details = collect(backend.as_ref(), prompter)?;
    client
        .login(backend.as_ref(), &details)
        .await
        .with_context(|| format!("{} login to {} failed", method.name, client.address()))?;

    let token = client.token().context("login returned an empty token")?;
    token_file.save(token)?;

    Ok(LoginOutput {
        address: client.address().to_string(),
        method: method.name,
        token_path: token_file.path().to_path_buf(),
    })
}
