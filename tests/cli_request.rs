#![cfg(feature = "cli")]

use std::net::TcpListener;
use std::process::Command;

use anyhow::Result;
use tempfile::TempDir;

#[test]
fn cert_request_runs_without_a_home_directory() -> Result<()> {
    let server = {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.to_string()
    };

    let dir = TempDir::new()?;
    let config_path = dir.path().join("vaultcert.toml");
    std::fs::write(
        &config_path,
        "[issuer]\ntimeout = \"2s\"\nconnect_timeout = \"1s\"\n\n[retry]\nattempts = 1\nbackoff = \"1ms\"\n",
    )?;

    let output = Command::new(env!("CARGO_BIN_EXE_vaultcert"))
        .arg("--config")
        .arg(&config_path)
        .args(["cert", "request", &server, "a.example.com"])
        .env_remove("HOME")
        .env_remove("VAULT_ADDR")
        .env_remove("VAULT_TOKEN")
        .output()?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(
        stderr.contains("error requesting certificates for a.example.com"),
        "{stderr}"
    );
    assert!(!stderr.contains("home directory"), "{stderr}");
    Ok(())
}
