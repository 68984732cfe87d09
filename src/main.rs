use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vaultcert::app::{self, LoginOptions};
use vaultcert::config::{default_config_path, Config};
use vaultcert::prompt::TerminalPrompter;
use vaultcert::vault::{FsTokenReader, TokenFile};

#[derive(Parser)]
#[command(name = "vaultcert")]
#[command(version, about = "Log in to Vault and manage TLS certificates")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in to Vault and save the token
    Login {
        /// Vault address, overriding config and VAULT_ADDR
        #[arg(short, long)]
        server: Option<String>,

        /// Auth method (userpass, ldap, github, approle); asked when omitted
        #[arg(long)]
        method: Option<String>,

        /// Custom mount point of the auth method
        #[arg(long)]
        mount: Option<String>,
    },

    /// Work with certificates stored in Vault
    #[command(subcommand)]
    Cert(CertCommand),
}

#[derive(Subcommand)]
enum CertCommand {
    /// List domains with stored certificates
    List {
        /// Also show when each certificate expires
        #[arg(short, long)]
        expiration: bool,
    },

    /// Write certificate.pem, ca_certificate.pem and key.pem for a domain
    Fetch {
        domain: String,
        /// Output directory
        dir: PathBuf,
    },

    /// Ask a certificate service to issue or renew certificates
    #[command(alias = "renew")]
    Request {
        /// Service address (host:port)
        server: String,

        #[arg(required = true)]
        domains: Vec<String>,

        /// Use the Let's Encrypt production endpoint
        #[arg(long)]
        production: bool,
    },
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolved only by commands that talk to Vault.
fn token_file(config: &Config) -> Result<TokenFile> {
    Ok(TokenFile::new(config.vault.token_path()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = Config::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;
    config.apply_env(env_var);

    let env_token = env_var("VAULT_TOKEN");

    match cli.command {
        Command::Login {
            server,
            method,
            mount,
        } => {
            let options = LoginOptions {
                server,
                method,
                mount,
            };
            let token_file = token_file(&config)?;
            let mut prompter = TerminalPrompter::new();
            let output = app::login(&config, &options, &token_file, &mut prompter).await?;
            println!(
                "Logged in to {} with {}; token saved to {}",
                output.address,
                output.method,
                output.token_path.display()
            );
        }

        Command::Cert(CertCommand::List { expiration }) => {
            let token_file = token_file(&config)?;
            let client =
                app::authenticated_client(&config, env_token.as_deref(), &token_file, &FsTokenReader)
                    .await?;
            if expiration {
                for entry in app::list_certificates_with_expiration(&client, &config).await? {
                    println!("{entry}");
                }
            } else {
                for domain in app::list_certificates(&client, &config).await? {
                    println!("{domain}");
                }
            }
        }

        Command::Cert(CertCommand::Fetch { domain, dir }) => {
            let token_file = token_file(&config)?;
            let client =
                app::authenticated_client(&config, env_token.as_deref(), &token_file, &FsTokenReader)
                    .await?;
            for path in app::fetch_certificate(&client, &config, &domain, &dir).await? {
                println!("Wrote {}", path.display());
            }
        }

        Command::Cert(CertCommand::Request {
            server,
            domains,
            production,
        }) => {
            let paths = app::request_certificates(&config, &server, &domains, production).await?;
            println!("Certificates stored at:");
            for path in paths {
                println!("  {path}");
            }
        }
    }

    Ok(())
}
