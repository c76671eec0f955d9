//! OAuth 2.0 authorization-code flow and token persistence for the Google
//! Workspace APIs. The one-time `auth` subcommand exchanges a pasted
//! authorization code for a refresh token; after that every tool call goes
//! through [`Authenticator::access_token`] which silently refreshes the
//! short-lived access token when it is close to expiry.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::AppConfig;
use crate::tools::Surface;

pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// OAuth scopes requested per tool surface.
pub fn scopes(surface: Surface) -> &'static [&'static str] {
    match surface {
        Surface::Gmail => &[
            "https://www.googleapis.com/auth/gmail.labels",
            "https://www.googleapis.com/auth/gmail.send",
            "https://www.googleapis.com/auth/gmail.readonly",
            "https://www.googleapis.com/auth/gmail.compose",
            "https://www.googleapis.com/auth/gmail.insert",
            "https://www.googleapis.com/auth/gmail.modify",
            "https://www.googleapis.com/auth/gmail.settings.basic",
        ],
        Surface::Calendar => &[
            "https://www.googleapis.com/auth/calendar",
            "https://www.googleapis.com/auth/calendar.events",
        ],
        Surface::Drive => &["https://www.googleapis.com/auth/drive"],
        Surface::Tasks => &["https://www.googleapis.com/auth/tasks"],
    }
}

/// Path of the persisted token for a surface, e.g.
/// `.credentials/gmail_auth_token.json`.
pub fn token_path(config: &AppConfig, surface: Surface) -> PathBuf {
    PathBuf::from(&config.credentials_dir)
        .join(format!("{}_auth_token.json", surface.scope_word()))
}

/// Resolve the OAuth client id/secret, preferring the environment over the
/// `--credentials` client secret file.
pub fn client_secrets(config: &AppConfig, credentials_path: &str) -> Result<(String, String)> {
    if let (Some(id), Some(secret)) = (
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
    ) {
        return Ok((id, secret));
    }

    #[derive(Deserialize)]
    struct ClientSecretFile {
        installed: Option<ClientSecrets>,
        web: Option<ClientSecrets>,
    }

    #[derive(Deserialize)]
    struct ClientSecrets {
        client_id: String,
        client_secret: String,
    }

    let raw = fs::read_to_string(credentials_path)
        .with_context(|| format!("Failed to read client secret file: {}", credentials_path))?;
    let parsed: ClientSecretFile = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed client secret file: {}", credentials_path))?;
    let secrets = parsed
        .installed
        .or(parsed.web)
        .ok_or_else(|| anyhow!("Client secret file has no `installed` or `web` section"))?;

    Ok((secrets.client_id, secrets.client_secret))
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code_for_token(
    token_endpoint: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenResponse> {
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("grant_type", "authorization_code"),
    ];
    let res = reqwest::Client::new()
        .post(token_endpoint)
        .form(&params)
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("Token exchange failed: {} ({})", status, text);
    }
    let token: TokenResponse = serde_json::from_str(&text)?;
    Ok(token)
}

/// Exchange a refresh token for a fresh access token.
pub async fn refresh_access_token(
    token_endpoint: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    let res = reqwest::Client::new()
        .post(token_endpoint)
        .form(&params)
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("Token refresh failed: {} ({})", status, text);
    }
    let token: TokenResponse = serde_json::from_str(&text)?;
    Ok(token)
}

/// Token state persisted to disk between runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expiry: DateTime<Utc>,
}

impl StoredToken {
    /// Treat tokens within a minute of expiry as already expired so an
    /// in-flight request doesn't race the deadline.
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(60) >= self.expiry
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| {
            format!(
                "No stored token at {}. Run `toolbox auth` first.",
                path.display()
            )
        })?;
        let token = serde_json::from_str(&raw)
            .with_context(|| format!("Malformed token file: {}", path.display()))?;
        Ok(token)
    }

    pub fn store(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Hands out a valid access token, refreshing and re-persisting it when the
/// stored one has expired. Shared across concurrent tool calls.
pub struct Authenticator {
    client_id: String,
    client_secret: String,
    token_path: PathBuf,
    token_endpoint: String,
    cached: tokio::sync::Mutex<Option<StoredToken>>,
}

impl Authenticator {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_path: token_path.into(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            cached: tokio::sync::Mutex::new(None),
        }
    }

    pub fn with_token_endpoint(mut self, token_endpoint: impl Into<String>) -> Self {
        self.token_endpoint = token_endpoint.into();
        self
    }

    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if cached.is_none() {
            *cached = Some(StoredToken::load(&self.token_path)?);
        }
        let token = cached.as_mut().expect("token loaded above");

        if token.is_expired() {
            tracing::debug!("Access token expired, refreshing");
            let refreshed = refresh_access_token(
                &self.token_endpoint,
                &self.client_id,
                &self.client_secret,
                &token.refresh_token,
            )
            .await?;
            token.access_token = refreshed.access_token;
            token.expiry = Utc::now() + Duration::seconds(refreshed.expires_in);
            if let Some(refresh_token) = refreshed.refresh_token {
                token.refresh_token = refresh_token;
            }
            token.store(&self.token_path)?;
        }

        Ok(token.access_token.clone())
    }
}

/// Where a surface client gets its bearer token from. `Fixed` is used by
/// tests and by callers that manage tokens themselves.
#[derive(Clone)]
pub enum TokenSource {
    Fixed(String),
    OAuth(Arc<Authenticator>),
}

impl TokenSource {
    pub async fn access_token(&self) -> Result<String> {
        match self {
            TokenSource::Fixed(token) => Ok(token.clone()),
            TokenSource::OAuth(authenticator) => authenticator.access_token().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_token_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gmail_auth_token.json");

        let token = StoredToken {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expiry: Utc::now() + Duration::hours(1),
        };
        token.store(&path).unwrap();

        let loaded = StoredToken::load(&path).unwrap();
        assert_eq!(loaded.access_token, "at");
        assert_eq!(loaded.refresh_token, "rt");
        assert!(!loaded.is_expired());
    }

    #[test]
    fn missing_token_file_mentions_auth_subcommand() {
        let err = StoredToken::load(Path::new("/nonexistent/token.json")).unwrap_err();
        assert!(err.to_string().contains("toolbox auth"));
    }

    #[test]
    fn token_near_expiry_counts_as_expired() {
        let token = StoredToken {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expiry: Utc::now() + Duration::seconds(30),
        };
        assert!(token.is_expired());
    }

    #[tokio::test]
    async fn authenticator_refreshes_expired_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "fresh", "expires_in": 3600}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calendar_auth_token.json");
        StoredToken {
            access_token: "stale".to_string(),
            refresh_token: "rt".to_string(),
            expiry: Utc::now() - Duration::hours(1),
        }
        .store(&path)
        .unwrap();

        let authenticator = Authenticator::new("id", "secret", &path)
            .with_token_endpoint(format!("{}/token", server.url()));
        let token = authenticator.access_token().await.unwrap();
        assert_eq!(token, "fresh");

        // The rotated token must be persisted for the next process.
        let persisted = StoredToken::load(&path).unwrap();
        assert_eq!(persisted.access_token, "fresh");
        assert_eq!(persisted.refresh_token, "rt");
    }

    #[tokio::test]
    async fn fixed_token_source_never_hits_the_network() {
        let source = TokenSource::Fixed("static".to_string());
        assert_eq!(source.access_token().await.unwrap(), "static");
    }
}
