//! Uniform result envelope shared by every tool. Every operation returns a
//! JSON object with a `status` of `success`, `not_found`, or `error`; error
//! and not_found results carry a `message`, success results carry whatever
//! payload keys the operation defines, optionally alongside a `warning`.

use std::future::Future;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::google::ProviderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    NotFound,
    Error,
}

/// The tool surface an operation belongs to. Used to parameterize the
/// canned provider error messages and to select a surface on the command
/// line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Surface {
    Gmail,
    Calendar,
    Drive,
    Tasks,
}

impl Surface {
    pub fn scope_word(&self) -> &'static str {
        match self {
            Surface::Gmail => "gmail",
            Surface::Calendar => "calendar",
            Surface::Drive => "drive",
            Surface::Tasks => "tasks",
        }
    }

    fn resource_phrase(&self) -> &'static str {
        match self {
            Surface::Gmail => "email or message",
            Surface::Calendar => "calendar or event",
            Surface::Drive => "file or folder",
            Surface::Tasks => "tasklist or task",
        }
    }

    fn api_label(&self) -> &'static str {
        match self {
            Surface::Gmail => "Gmail",
            Surface::Calendar => "Google Calendar",
            Surface::Drive => "Google Drive",
            Surface::Tasks => "Google Tasks",
        }
    }
}

/// Map an HTTP status from the provider onto the envelope status and a
/// user-facing message.
pub fn status_message(surface: Surface, status: u16, reason: &str) -> (Status, String) {
    let label = surface.api_label();
    match status {
        400 => (
            Status::Error,
            format!("Bad request to the {} API: {}", label, reason),
        ),
        401 => (
            Status::Error,
            "Unauthorized access. Check if the credentials are valid or expired.".to_string(),
        ),
        403 => (
            Status::Error,
            format!(
                "Access forbidden. You may not have permission to access this {} resource.",
                surface.scope_word()
            ),
        ),
        404 => (
            Status::NotFound,
            format!(
                "The requested {} was not found. Verify the id and try again.",
                surface.resource_phrase()
            ),
        ),
        409 => (
            Status::Error,
            format!("Conflict detected by the {} API: {}", label, reason),
        ),
        410 => (
            Status::Error,
            format!(
                "The requested {} is gone and no longer available.",
                surface.resource_phrase()
            ),
        ),
        412 => (
            Status::Error,
            format!("Precondition failed for the {} API request: {}", label, reason),
        ),
        429 => (
            Status::Error,
            "Quota exceeded. Too many requests. Try again later or use exponential backoff."
                .to_string(),
        ),
        500 | 503 => (
            Status::Error,
            format!(
                "The {} service is temporarily unavailable. Please retry after some time.",
                label
            ),
        ),
        _ => (
            Status::Error,
            format!("Unexpected error with the {} API: {}", label, reason),
        ),
    }
}

/// A tool result ready to serialize back to the orchestrator. Internally a
/// JSON object so operations can attach arbitrary payload keys without a
/// per-operation response struct.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct ToolResult(Map<String, Value>);

impl ToolResult {
    pub fn success() -> Self {
        let mut map = Map::new();
        map.insert("status".to_string(), Value::String("success".to_string()));
        Self(map)
    }

    pub fn success_msg(message: impl Into<String>) -> Self {
        Self::success().with("message", message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("status".to_string(), Value::String("not_found".to_string()));
        map.insert("message".to_string(), Value::String(message.into()));
        Self(map)
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("status".to_string(), Value::String("error".to_string()));
        map.insert("message".to_string(), Value::String(message.into()));
        Self(map)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.0.insert(key.into(), value);
        self
    }

    pub fn warning(self, message: impl Into<String>) -> Self {
        self.with("warning", message.into())
    }

    pub fn status(&self) -> Status {
        match self.0.get("status").and_then(|s| s.as_str()) {
            Some("success") => Status::Success,
            Some("not_found") => Status::NotFound,
            _ => Status::Error,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(|m| m.as_str())
    }
}

/// Run an operation body and fold any provider failure into the envelope.
/// Operation bodies return early with `Ok(ToolResult::error(..))` for
/// validation failures; provider errors surface here as `Err` and get the
/// canned per-status message.
pub async fn guard<F>(surface: Surface, fut: F) -> ToolResult
where
    F: Future<Output = Result<ToolResult, ProviderError>>,
{
    match fut.await {
        Ok(result) => result,
        Err(ProviderError::Api { status, reason }) => {
            tracing::warn!(status, %reason, "provider call failed");
            let (status, message) = status_message(surface, status, &reason);
            match status {
                Status::NotFound => ToolResult::not_found(message),
                _ => ToolResult::error(message),
            }
        }
        Err(ProviderError::Other(err)) => {
            tracing::error!(error = %err, "tool operation failed");
            ToolResult::error(format!("An unexpected error occurred: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_serializes_flat() {
        let result = ToolResult::success()
            .with("id", "m1")
            .with("count", 3)
            .warning("partial");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["id"], "m1");
        assert_eq!(json["count"], 3);
        assert_eq!(json["warning"], "partial");
    }

    #[test]
    fn not_found_maps_from_404() {
        let (status, message) = status_message(Surface::Gmail, 404, "ignored");
        assert_eq!(status, Status::NotFound);
        assert_eq!(
            message,
            "The requested email or message was not found. Verify the id and try again."
        );
    }

    #[test]
    fn resource_phrase_tracks_the_surface() {
        let (_, calendar) = status_message(Surface::Calendar, 404, "");
        assert!(calendar.contains("calendar or event"));
        let (_, drive) = status_message(Surface::Drive, 410, "");
        assert!(drive.contains("file or folder"));
        let (_, tasks) = status_message(Surface::Tasks, 404, "");
        assert!(tasks.contains("tasklist or task"));
    }

    #[test]
    fn auth_and_quota_messages_ignore_the_reason() {
        let (status, message) = status_message(Surface::Drive, 401, "whatever");
        assert_eq!(status, Status::Error);
        assert_eq!(
            message,
            "Unauthorized access. Check if the credentials are valid or expired."
        );
        let (_, message) = status_message(Surface::Tasks, 429, "whatever");
        assert_eq!(
            message,
            "Quota exceeded. Too many requests. Try again later or use exponential backoff."
        );
    }

    #[test]
    fn server_errors_name_the_api() {
        let (_, m500) = status_message(Surface::Calendar, 500, "");
        let (_, m503) = status_message(Surface::Calendar, 503, "");
        assert_eq!(m500, m503);
        assert!(m500.contains("Google Calendar service is temporarily unavailable"));
    }

    #[test]
    fn unknown_status_includes_the_reason() {
        let (_, message) = status_message(Surface::Gmail, 418, "teapot");
        assert_eq!(message, "Unexpected error with the Gmail API: teapot");
    }

    #[tokio::test]
    async fn guard_passes_through_ok_results() {
        let result = guard(Surface::Gmail, async {
            Ok(ToolResult::success_msg("done"))
        })
        .await;
        assert_eq!(result.status(), Status::Success);
        assert_eq!(result.message(), Some("done"));
    }

    #[tokio::test]
    async fn guard_maps_api_errors_onto_canned_messages() {
        let result = guard(Surface::Tasks, async {
            Err(ProviderError::Api {
                status: 403,
                reason: "ignored".to_string(),
            })
        })
        .await;
        assert_eq!(result.status(), Status::Error);
        assert_eq!(
            result.message(),
            Some("Access forbidden. You may not have permission to access this tasks resource.")
        );
    }

    #[tokio::test]
    async fn guard_wraps_non_api_failures() {
        let result = guard(Surface::Drive, async {
            Err(ProviderError::Other(anyhow::anyhow!("socket closed")))
        })
        .await;
        assert_eq!(result.status(), Status::Error);
        assert_eq!(
            result.message(),
            Some("An unexpected error occurred: socket closed")
        );
    }
}
