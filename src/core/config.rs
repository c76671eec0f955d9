use std::env;

/// Process-level configuration shared by every subcommand.
///
/// OAuth client credentials can come from the environment or from the
/// `--credentials` client secret file; the environment wins when both are
/// set so deployments can avoid shipping the secret file.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub credentials_dir: String,
    pub oauth_redirect_uri: String,
    pub gmail_api_base_url: String,
    pub calendar_api_base_url: String,
    pub drive_api_base_url: String,
    pub tasks_api_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let credentials_dir =
            env::var("TOOLBOX_CREDENTIALS_DIR").unwrap_or_else(|_| "./.credentials".to_string());
        let oauth_redirect_uri = env::var("TOOLBOX_OAUTH_REDIRECT_URI")
            .unwrap_or_else(|_| "urn:ietf:wg:oauth:2.0:oob".to_string());
        let gmail_api_base_url = env::var("TOOLBOX_GMAIL_API_URL")
            .unwrap_or_else(|_| "https://gmail.googleapis.com".to_string());
        let calendar_api_base_url = env::var("TOOLBOX_CALENDAR_API_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com".to_string());
        let drive_api_base_url = env::var("TOOLBOX_DRIVE_API_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com".to_string());
        let tasks_api_base_url = env::var("TOOLBOX_TASKS_API_URL")
            .unwrap_or_else(|_| "https://tasks.googleapis.com".to_string());

        Self {
            google_client_id: env::var("TOOLBOX_GOOGLE_CLIENT_ID").ok(),
            google_client_secret: env::var("TOOLBOX_GOOGLE_CLIENT_SECRET").ok(),
            credentials_dir,
            oauth_redirect_uri,
            gmail_api_base_url,
            calendar_api_base_url,
            drive_api_base_url,
            tasks_api_base_url,
        }
    }
}
