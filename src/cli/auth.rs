use std::io::{self, Write};

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, Utc};

use crate::core::AppConfig;
use crate::google::oauth::{
    GOOGLE_AUTH_ENDPOINT, GOOGLE_TOKEN_ENDPOINT, StoredToken, client_secrets,
    exchange_code_for_token, scopes, token_path,
};
use crate::tools::Surface;

/// Walk the user through the OAuth consent flow for one surface and persist
/// the resulting token where `serve` will look for it.
pub async fn run(surface: Surface, credentials: &str) -> Result<()> {
    let config = AppConfig::default();
    let (client_id, client_secret) = client_secrets(&config, credentials)?;
    let scope = scopes(surface).join(" ");

    let auth_url = format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        GOOGLE_AUTH_ENDPOINT,
        urlencoding::encode(&client_id),
        urlencoding::encode(&config.oauth_redirect_uri),
        urlencoding::encode(&scope)
    );
    println!(
        "\nPlease open the following URL in your browser and authorize access:\n\n{}\n",
        auth_url
    );

    print!("Paste the authorization code shown by Google here: ");
    io::stdout().flush()?;
    let mut code = String::new();
    io::stdin()
        .read_line(&mut code)
        .context("Failed to read authorization code")?;
    let code = code.trim();

    let token = exchange_code_for_token(
        GOOGLE_TOKEN_ENDPOINT,
        &client_id,
        &client_secret,
        code,
        &config.oauth_redirect_uri,
    )
    .await?;

    // Without a refresh token the stored credentials die within the hour.
    let refresh_token = token.refresh_token.ok_or_else(|| {
        anyhow!("No refresh token in response. Revoke the app's access in your Google account and run auth again.")
    })?;

    let path = token_path(&config, surface);
    StoredToken {
        access_token: token.access_token,
        refresh_token,
        expiry: Utc::now() + Duration::seconds(token.expires_in),
    }
    .store(&path)?;

    println!("Token for {} saved to {}.", surface.scope_word(), path.display());
    Ok(())
}
