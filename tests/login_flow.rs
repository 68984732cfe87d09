mod support;

use std::io;
use std::path::Path;

use anyhow::Result;
use secrecy::ExposeSecret;
use serde_json::json;
use tempfile::TempDir;
use vaultcert::app::{self, LoginOptions};
use vaultcert::vault::{FsTokenReader, TokenFile};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{config_for, seal_status, ScriptedPrompter};

async fn mount_healthy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/sys/seal-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seal_status(false, true)))
        .mount(server)
        .await;
}

fn login_response(token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "auth": {
            "client_token": token,
            "accessor": "acc",
            "policies": ["default", "certs"],
            "lease_duration": 2764800,
            "renewable": true
        }
    }))
}

#[tokio::test]
async fn login_with_named_method_saves_token() -> Result<()> {
    let server = MockServer::start().await;
    mount_healthy(&server).await;
    Mock::given(method("PUT"))
        .and(path("/v1/auth/ldap/login/alice"))
        .and(body_json(json!({"password": "hunter2"})))
        .respond_with(login_response("s.ldap"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let token_file = TokenFile::new(dir.path().join(".vault-token"));
    let mut prompter = ScriptedPrompter::new(&["alice", "hunter2"]);
    let options = LoginOptions {
        method: Some("ldap".to_string()),
        ..LoginOptions::default()
    };

    let output = app::login(&config_for(&server), &options, &token_file, &mut prompter).await?;

    assert_eq!(output.method, "LDAP");
    assert_eq!(output.address, server.uri());
    assert_eq!(std::fs::read_to_string(token_file.path())?.trim(), "s.ldap");
    assert_eq!(
        prompter.asked.iter().map(|(_, hidden)| *hidden).collect::<Vec<_>>(),
        vec![false, true]
    );
    Ok(())
}

#[tokio::test]
async fn login_picks_method_interactively_on_custom_mount() -> Result<()> {
    let server = MockServer::start().await;
    mount_healthy(&server).await;
    Mock::given(method("PUT"))
        .and(path("/v1/auth/ci-approle/login"))
        .and(body_json(json!({"role_id": "role", "secret_id": "secret"})))
        .respond_with(login_response("s.approle"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let token_file = TokenFile::new(dir.path().join(".vault-token"));
    // AppRole is the fourth entry of the picker.
    let mut prompter = ScriptedPrompter::new(&["role", "secret"]).selecting(3);
    let options = LoginOptions {
        mount: Some("ci-approle".to_string()),
        ..LoginOptions::default()
    };

    let output = app::login(&config_for(&server), &options, &token_file, &mut prompter).await?;
    assert_eq!(output.method, "AppRole");
    assert_eq!(
        token_file.load(&FsTokenReader)?.map(|t| t.expose_secret().to_string()),
        Some("s.approle".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn failed_login_leaves_token_file_alone() -> Result<()> {
    let server = MockServer::start().await;
    mount_healthy(&server).await;
    Mock::given(method("PUT"))
        .and(path("/v1/auth/userpass/login/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"auth": null})))
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let token_path = dir.path().join(".vault-token");
    std::fs::write(&token_path, "s.previous\n")?;
    let token_file = TokenFile::new(&token_path);

    let mut prompter = ScriptedPrompter::new(&["alice", "hunter2"]);
    let options = LoginOptions {
        method: Some("userpass".to_string()),
        ..LoginOptions::default()
    };

    let err = app::login(&config_for(&server), &options, &token_file, &mut prompter)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("login returned an empty token"));
    assert_eq!(std::fs::read_to_string(&token_path)?, "s.previous\n");
    Ok(())
}

#[tokio::test]
async fn login_against_sealed_vault_asks_nothing() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/seal-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seal_status(true, true)))
        .mount(&server)
        .await;

    let dir = TempDir::new()?;
    let token_file = TokenFile::new(dir.path().join(".vault-token"));
    let mut prompter = ScriptedPrompter::new(&["alice", "hunter2"]);
    let options = LoginOptions {
        method: Some("userpass".to_string()),
        ..LoginOptions::default()
    };

    let err = app::login(&config_for(&server), &options, &token_file, &mut prompter)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("sealed"));
    assert!(prompter.asked.is_empty());
    assert!(!token_file.path().exists());
    Ok(())
}

#[tokio::test]
async fn unknown_method_is_reported() -> Result<()> {
    let server = MockServer::start().await;
    mount_healthy(&server).await;

    let dir = TempDir::new()?;
    let token_file = TokenFile::new(dir.path().join(".vault-token"));
    let mut prompter = ScriptedPrompter::new(&[]);
    let options = LoginOptions {
        method: Some("kerberos".to_string()),
        ..LoginOptions::default()
    };

    let err = app::login(&config_for(&server), &options, &token_file, &mut prompter)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("kerberos"));
    Ok(())
}

#[tokio::test]
async fn env_token_wins_over_token_file() -> Result<()> {
    let server = MockServer::start().await;
    mount_healthy(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .and(header("X-Vault-Token", "s.from-env"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})))
        .mount(&server)
        .await;

    let file_reader = |_: &Path| -> io::Result<Vec<u8>> { Ok(b"s.from-file\n".to_vec()) };
    let token_file = TokenFile::new("/nonexistent/.vault-token");
    let config = config_for(&server);

    let client =
        app::authenticated_client(&config, Some("s.from-env"), &token_file, &file_reader).await?;
    assert_eq!(client.token().map(|t| t.expose_secret()), Some("s.from-env"));

    // Blank environment values fall back to the file, which this server rejects.
    let err = app::authenticated_client(&config, Some("  "), &token_file, &file_reader)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Not logged in"));
    Ok(())
}

#[tokio::test]
async fn sealed_vault_is_not_reported_as_logged_out() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/seal-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seal_status(true, true)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"errors": ["Vault is sealed"]})))
        .mount(&server)
        .await;

    let token_file = TokenFile::new("/nonexistent/.vault-token");
    let err = app::authenticated_client(&config_for(&server), Some("s.token"), &token_file, &FsTokenReader)
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("sealed"), "{message}");
    assert!(!message.contains("Not logged in"), "{message}");
    Ok(())
}

#[tokio::test]
async fn unreachable_vault_is_not_reported_as_logged_out() -> Result<()> {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    drop(server);
    config.vault.address = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        format!("http://{}", listener.local_addr()?)
    };

    let token_file = TokenFile::new("/nonexistent/.vault-token");
    let err = app::authenticated_client(&config, Some("s.token"), &token_file, &FsTokenReader)
        .await
        .unwrap_err();

    let message = format!("{err:#}");
    assert!(message.contains("is not available"), "{message}");
    assert!(!message.contains("Not logged in"), "{message}");
    Ok(())
}
