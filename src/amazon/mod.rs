pub mod auth;
pub mod client;
pub mod config;

pub use client::SpApiClient;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpApiError {
    #[error("missing LWA credentials in env")]
    MissingCredentials,
    #[error("oauth request failed: {0}")]
    Auth(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("document io failed: {0}")]
    Io(String),
}
