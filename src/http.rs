use crate::settings;
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared client for the text service, SP-API and inventory downloads.
/// `HTTP_TIMEOUT_SECS` and `HTTP_CONNECT_TIMEOUT_SECS` override the defaults.
pub fn build_client() -> Client {
    Client::builder()
        .timeout(settings::secs("HTTP_TIMEOUT_SECS").unwrap_or(REQUEST_TIMEOUT))
        .connect_timeout(settings::secs("HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(CONNECT_TIMEOUT))
        .user_agent(concat!("sp-listing-feed/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}
