#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use secrecy::SecretString;
use serde_json::{json, Value};
use vaultcert::config::{Config, RetryConfig};
use vaultcert::prompt::Prompter;
use vaultcert::vault::VaultClient;
use wiremock::MockServer;

pub const TOKEN: &str = "s.test-token";

pub const FIXTURE_CERT: &[u8] = include_bytes!("../fixtures/example.com.crt.pem");
pub const FIXTURE_KEY: &[u8] = include_bytes!("../fixtures/example.com.key.pem");

/// Config pointing at the mock server, with short timeouts and no retry delay.
pub fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.vault.address = server.uri();
    config.vault.timeout = Duration::from_secs(5);
    config.vault.connect_timeout = Duration::from_secs(2);
    config.retry = RetryConfig {
        attempts: 2,
        backoff: Duration::from_millis(1),
    };
    config
}

pub fn client_for(server: &MockServer) -> VaultClient {
    let mut client = VaultClient::from_config(&config_for(server).vault).unwrap();
    client.set_token(SecretString::from(TOKEN.to_string()));
    client
}

/// Vault read response wrapping `data`.
pub fn secret_body(data: Value) -> Value {
    json!({
        "request_id": "3b7f1a2c",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 2764800,
        "data": data,
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// Certificate secret as the issuing service stores it.
pub fn certificate_data() -> Value {
    json!({
        "cert_stable_url": "https://acme-staging-v02.api.letsencrypt.org/acme/cert/fa1b",
        "cert_url": "https://acme-staging-v02.api.letsencrypt.org/acme/cert/fa1b/1",
        "certificate": STANDARD.encode(FIXTURE_CERT),
        "issuer_certificate": STANDARD.encode(FIXTURE_CERT),
        "private_key": STANDARD.encode(FIXTURE_KEY),
    })
}

pub fn seal_status(sealed: bool, initialized: bool) -> Value {
    json!({
        "type": "shamir",
        "initialized": initialized,
        "sealed": sealed,
        "t": 1,
        "n": 1,
        "progress": 0,
        "version": "1.15.2"
    })
}

/// Prompter answering from a script and recording what it was asked.
pub struct ScriptedPrompter {
    answers: VecDeque<io::Result<String>>,
    selection: Option<usize>,
    pub asked: Vec<(String, bool)>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| Ok(a.to_string())).collect(),
            selection: None,
            asked: Vec::new(),
        }
    }

    pub fn selecting(mut self, index: usize) -> Self {
        self.selection = Some(index);
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, message: &str, hidden: bool) -> io::Result<String> {
        self.asked.push((message.to_string(), hidden));
        self.answers.pop_front().unwrap_or_else(|| {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no more answers"))
        })
    }

    fn select(&mut self, _message: &str, _options: &[&str]) -> io::Result<usize> {
        self.selection
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no selection"))
    }
}
