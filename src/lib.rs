pub mod app;
pub mod auth;
pub mod certs;
pub mod config;
pub mod duration;
mod fsutil;
pub mod issuer;
pub mod prompt;
pub mod retry;
pub mod vault;
