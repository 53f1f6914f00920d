use once_cell::sync::Lazy;
use std::env;

pub static APP_ID: Lazy<String> = Lazy::new(|| env::var("LWA_APP_ID_RELEASE").unwrap_or_default());

pub static CLIENT_SECRET: Lazy<String> =
    Lazy::new(|| env::var("LWA_CLIENT_SECRET_RELEASE").unwrap_or_default());

pub static REFRESH_TOKEN: Lazy<String> =
    Lazy::new(|| env::var("REFRESH_TOKEN_RELEASE").unwrap_or_default());

pub static LWA_TOKEN_URL: Lazy<String> = Lazy::new(|| {
    env::var("LWA_TOKEN_URL").unwrap_or_else(|_| "https://api.amazon.com/auth/o2/token".to_string())
});

pub static ROOT: Lazy<String> = Lazy::new(|| {
    env::var("SP_API_ENDPOINT")
        .unwrap_or_else(|_| "https://sellingpartnerapi-na.amazon.com".to_string())
        .trim_end_matches('/')
        .to_string()
});

/// US marketplace unless overridden.
pub static MARKETPLACE_ID: Lazy<String> =
    Lazy::new(|| env::var("SP_API_MARKETPLACE_ID").unwrap_or_else(|_| "ATVPDKIKX0DER".to_string()));

pub static SELLER_ID: Lazy<String> =
    Lazy::new(|| env::var("SELLER_ID").unwrap_or_else(|_| "SELLER_ID".to_string()));

pub const DEFINITIONS_VERSION: &str = "2020-09-01";
pub const FEEDS_VERSION: &str = "2021-06-30";
