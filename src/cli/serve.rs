//! Stdio transport for a single tool surface. One JSON request object per
//! line on stdin, one JSON response object per line on stdout. Logging goes
//! to stderr so stdout stays protocol-clean.

use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::AppConfig;
use crate::google::oauth::{Authenticator, TokenSource, client_secrets, token_path};
use crate::tools::{Surface, ToolSurface, build_surface};

#[derive(Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Params,
}

#[derive(Default, Deserialize)]
struct Params {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: Value,
}

fn error_response(id: Value, message: String) -> Value {
    json!({ "id": id, "error": { "message": message } })
}

async fn handle_line(surface: &dyn ToolSurface, line: &str) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            return error_response(Value::Null, format!("Malformed request: {}", err));
        }
    };

    match request.method.as_str() {
        "tools/list" => {
            json!({ "id": request.id, "result": { "tools": surface.declarations() } })
        }
        "tools/call" => {
            let arguments = if request.params.arguments.is_null() {
                Value::Object(serde_json::Map::new())
            } else {
                request.params.arguments
            };
            let result = surface.call(&request.params.name, arguments).await;
            json!({ "id": request.id, "result": result })
        }
        method => error_response(request.id, format!("Unknown method: {}", method)),
    }
}

pub async fn run(surface: Surface, credentials: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::default();
    let (client_id, client_secret) = client_secrets(&config, credentials)?;
    let authenticator =
        Authenticator::new(client_id, client_secret, token_path(&config, surface));
    let tools = build_surface(surface, &config, TokenSource::OAuth(Arc::new(authenticator)));

    tracing::info!(surface = tools.name(), "serving tools over stdio");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(tools.as_ref(), &line).await;
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}
