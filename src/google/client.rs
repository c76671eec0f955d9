//! Thin authenticated HTTP client for the Google REST APIs. Each surface
//! gets its own `GoogleClient` pointed at the right base URL; the base URL
//! is injectable so tests can run against a local mock server.

use std::fmt;

use reqwest::{StatusCode, Url};
use serde_json::Value;

use super::oauth::TokenSource;

/// Failure from a provider call. `Api` carries the HTTP status so the tool
/// layer can map it onto a canned user-facing message; everything else is
/// an `Other` (network failure, bad URL, token refresh failure).
#[derive(Debug)]
pub enum ProviderError {
    Api { status: u16, reason: String },
    Other(anyhow::Error),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Api { status, reason } => {
                write!(f, "API error {}: {}", status, reason)
            }
            ProviderError::Other(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Other(err.into())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Other(err.into())
    }
}

impl From<anyhow::Error> for ProviderError {
    fn from(err: anyhow::Error) -> Self {
        ProviderError::Other(err)
    }
}

/// Pull the human-readable reason out of a Google error body, which nests
/// it under `error.message`. Falls back to the raw body, then the status
/// line.
fn error_reason(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.pointer("/error/message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}

#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenSource,
}

impl GoogleClient {
    pub fn new(base_url: impl Into<String>, token: TokenSource) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    /// Build an absolute URL from an API path plus query pairs. Query values
    /// are percent-encoded by the URL builder.
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url.trim_end_matches('/'), path))
            .map_err(|e| ProviderError::Other(e.into()))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn execute(&self, req: reqwest::RequestBuilder) -> Result<Value, ProviderError> {
        let token = self.token.access_token().await?;
        let res = req.bearer_auth(token).send().await?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                reason: error_reason(status, &body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn get(&self, url: Url) -> Result<Value, ProviderError> {
        self.execute(self.http.get(url)).await
    }

    pub async fn post(&self, url: Url, body: &Value) -> Result<Value, ProviderError> {
        self.execute(self.http.post(url).json(body)).await
    }

    /// POST with no request body, used by action endpoints like
    /// `messages/{id}/trash` or `tasks/{id}/move`.
    pub async fn post_empty(&self, url: Url) -> Result<Value, ProviderError> {
        self.execute(self.http.post(url)).await
    }

    pub async fn patch(&self, url: Url, body: &Value) -> Result<Value, ProviderError> {
        self.execute(self.http.patch(url).json(body)).await
    }

    pub async fn put(&self, url: Url, body: &Value) -> Result<Value, ProviderError> {
        self.execute(self.http.put(url).json(body)).await
    }

    pub async fn delete(&self, url: Url) -> Result<Value, ProviderError> {
        self.execute(self.http.delete(url)).await
    }

    /// GET a raw body, used for Drive file downloads and exports.
    pub async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, ProviderError> {
        let token = self.token.access_token().await?;
        let res = self.http.get(url).bearer_auth(token).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                reason: error_reason(status, &body),
            });
        }
        Ok(res.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> GoogleClient {
        GoogleClient::new(base_url, TokenSource::Fixed("test-token".to_string()))
    }

    #[test]
    fn url_encodes_query_pairs() {
        let client = test_client("https://example.com/");
        let url = client
            .url("drive/v3/files", &[("q", "name contains \"a b\"".to_string())])
            .unwrap();
        assert_eq!(url.path(), "/drive/v3/files");
        assert!(url.query().unwrap().contains("name+contains"));
    }

    #[tokio::test]
    async fn get_parses_json_and_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tasks/v1/users/@me/lists")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.url("tasks/v1/users/@me/lists", &[]).unwrap();
        let value = client.get(url).await.unwrap();
        assert_eq!(value["items"], serde_json::json!([]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_success_body_becomes_null() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/calendar/v3/calendars/abc")
            .with_status(204)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.url("calendar/v3/calendars/abc", &[]).unwrap();
        let value = client.delete(url).await.unwrap();
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn api_error_extracts_nested_google_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gmail/v1/users/me/messages/missing")
            .with_status(404)
            .with_body(r#"{"error": {"code": 404, "message": "Requested entity was not found."}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.url("gmail/v1/users/me/messages/missing", &[]).unwrap();
        match client.get(url).await {
            Err(ProviderError::Api { status, reason }) => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Requested entity was not found.");
            }
            other => panic!("expected Api error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn api_error_falls_back_to_raw_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/whatever")
            .with_status(500)
            .with_body("backend exploded")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.url("whatever", &[]).unwrap();
        match client.get(url).await {
            Err(ProviderError::Api { status, reason }) => {
                assert_eq!(status, 500);
                assert_eq!(reason, "backend exploded");
            }
            other => panic!("expected Api error, got {:?}", other.map(|_| ())),
        }
    }
}
