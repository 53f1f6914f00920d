use crate::amazon::SpApiError;
use crate::amazon::config::{APP_ID, CLIENT_SECRET, LWA_TOKEN_URL, REFRESH_TOKEN};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct LwaCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl LwaCredentials {
    pub fn from_env() -> Result<Self, SpApiError> {
        Self::new(APP_ID.as_str(), CLIENT_SECRET.as_str(), REFRESH_TOKEN.as_str())
    }

    pub fn new(client_id: &str, client_secret: &str, refresh_token: &str) -> Result<Self, SpApiError> {
        if [client_id, client_secret, refresh_token]
            .iter()
            .any(|value| value.trim().is_empty())
        {
            return Err(SpApiError::MissingCredentials);
        }
        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            refresh_token: refresh_token.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    refresh_after: Instant,
}

/// Exchanges the refresh token for short-lived access tokens and reuses them
/// until shortly before they expire.
pub struct AccessTokenProvider {
    http: Client,
    token_url: String,
    credentials: LwaCredentials,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokenProvider {
    pub fn new(http: Client, credentials: LwaCredentials) -> Self {
        Self {
            http,
            token_url: LWA_TOKEN_URL.clone(),
            credentials,
            cached: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, SpApiError> {
        let mut guard = self.cached.lock().await;
        if let Some(token) = guard.as_ref()
            && Instant::now() < token.refresh_after
        {
            return Ok(token.value.clone());
        }

        let payload = self.request_token().await?;
        let lifetime = Duration::from_secs(payload.expires_in).saturating_sub(EXPIRY_MARGIN);
        debug!(
            target = "listing.sp_api",
            expires_in = payload.expires_in,
            "lwa_token_refreshed"
        );
        *guard = Some(CachedToken {
            value: payload.access_token.clone(),
            refresh_after: Instant::now() + lifetime,
        });
        Ok(payload.access_token)
    }

    async fn request_token(&self) -> Result<TokenResponse, SpApiError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let response = self
            .http
            .post(self.token_url.as_str())
            .form(&params)
            .send()
            .await
            .map_err(|err| SpApiError::Auth(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SpApiError::Auth(format!("HTTP {}", response.status())));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|err| SpApiError::Auth(err.to_string()))
    }
}
