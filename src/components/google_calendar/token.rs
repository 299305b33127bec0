use crate::error::Fault;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Default OAuth token endpoint
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Access tokens expiring within this margin are refreshed up front
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Bearer token for the Calendar API
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Authorized-user credential file as written by Google's client libraries
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoredCredential {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_uri: Option<String>,
    pub expiry: Option<String>,
}

impl StoredCredential {
    /// The stored access token, if present and not about to expire
    pub fn usable_access_token(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        match self.expiry.as_deref() {
            // Without an expiry the token is taken at face value
            None => Some(AccessToken::new(token)),
            Some(expiry) => {
                let expiry = parse_expiry(expiry)?;
                (expiry > now + Duration::seconds(EXPIRY_MARGIN_SECS))
                    .then(|| AccessToken::new(token))
            }
        }
    }
}

/// Accepts RFC 3339 and the zone-less ISO form some libraries write
fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: Option<String>,
}

/// Reads the local credential file and hands out access tokens.
///
/// A refreshed token is kept in memory for this run only; the file is never
/// written.
#[derive(Clone)]
pub struct TokenManager {
    path: PathBuf,
    client: Client,
}

impl TokenManager {
    pub fn new(path: impl Into<PathBuf>, client: Client) -> Self {
        Self {
            path: path.into(),
            client,
        }
    }

    /// Load the credential file
    pub async fn load(&self) -> Result<StoredCredential, Fault> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Get a valid access token, refreshing it when the stored one is stale
    pub async fn get_token(&self) -> Result<AccessToken, Fault> {
        let stored = self.load().await?;

        if let Some(token) = stored.usable_access_token(Utc::now()) {
            return Ok(token);
        }

        self.refresh_token(&stored).await
    }

    /// Exchange the refresh token for a new access token
    async fn refresh_token(&self, stored: &StoredCredential) -> Result<AccessToken, Fault> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            stored.refresh_token.as_deref(),
            stored.client_id.as_deref(),
            stored.client_secret.as_deref(),
        ) else {
            return Err(Fault::Token(
                "credentials expired and cannot be refreshed".to_string(),
            ));
        };

        let token_uri = stored.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URI);
        let params = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.client.post(token_uri).form(&params).send().await?;

        if !response.status().is_success() {
            return Err(Fault::Token(format!(
                "refresh rejected with HTTP {}",
                response.status()
            )));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|_| Fault::Token("token response is not valid json".to_string()))?;
        body.access_token
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| Fault::Token("token response missing 'access_token' field".to_string()))
    }
}
