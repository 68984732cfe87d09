//! Command implementations shared by the CLI and the integration tests.
//!
//! Everything here takes its inputs explicitly (config, token file, prompter,
//! environment values) and returns data for the caller to print.

mod certs;
mod session;

pub use certs::{
    fetch_certificate, list_certificates, list_certificates_with_expiration,
    request_certificates, ExpirationOutput,
};
pub use session::{authenticated_client, login, open_client, LoginOptions, LoginOutput};
