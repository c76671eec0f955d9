//! Gmail tool surface: profile, message, and draft operations backed by the
//! Gmail REST API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::envelope::{self, Surface, ToolResult};
use super::{ToolSpec, ToolSurface, mime, validate};
use crate::google::GoogleClient;

const MESSAGE_FORMATS: &[&str] = &["full", "metadata", "minimal", "raw"];

fn default_user_id() -> String {
    "me".to_string()
}

/// Shared user id guard. `me` is always accepted; anything else must look
/// like an email address.
fn check_user_id(user_id: &str) -> Option<ToolResult> {
    if user_id.trim().is_empty() {
        return Some(ToolResult::error("User Id cannot be empty."));
    }
    if user_id != "me" && !validate::is_valid_email(user_id) {
        return Some(ToolResult::error("Invalid User Id format."));
    }
    None
}

#[derive(Deserialize)]
pub struct GetProfileArgs {
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct ListMessagesArgs {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub query: Option<String>,
    pub max_results: Option<i64>,
    pub include_spam_and_trash: Option<bool>,
}

#[derive(Deserialize)]
pub struct GetMessageArgs {
    pub message_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct SendMessageArgs {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub to: String,
    pub body: String,
    pub subject: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub thread_id: Option<String>,
    pub in_reply_to: Option<String>,
}

#[derive(Deserialize)]
pub struct ModifyLabelsArgs {
    pub message_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub add_labels: Option<Vec<String>>,
    pub remove_labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct MessageIdArgs {
    pub message_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct ListDraftsArgs {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub query: Option<String>,
    pub max_results: Option<i64>,
    pub include_spam_and_trash: Option<bool>,
}

#[derive(Deserialize)]
pub struct DraftIdArgs {
    pub draft_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct GetDraftArgs {
    pub draft_id: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateDraftArgs {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub to: Option<String>,
    pub body: Option<String>,
    pub subject: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub thread_id: Option<String>,
    pub in_reply_to: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateDraftArgs {
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub draft_id: String,
    pub body: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub add_to: Vec<String>,
    #[serde(default)]
    pub remove_to: Vec<String>,
    #[serde(default)]
    pub add_cc: Vec<String>,
    #[serde(default)]
    pub remove_cc: Vec<String>,
    #[serde(default)]
    pub add_bcc: Vec<String>,
    #[serde(default)]
    pub remove_bcc: Vec<String>,
}

pub struct GmailTools {
    client: GoogleClient,
}

impl GmailTools {
    pub fn new(client: GoogleClient) -> Self {
        Self { client }
    }

    fn users_path(user_id: &str, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("gmail/v1/users/{}", user_id)
        } else {
            format!("gmail/v1/users/{}/{}", user_id, suffix)
        }
    }

    pub async fn get_profile(&self, args: GetProfileArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            let url = self
                .client
                .url(&Self::users_path(&args.user_id, "profile"), &[])?;
            let response = self.client.get(url).await?;
            if response.is_null() {
                return Ok(ToolResult::not_found(format!(
                    "Profile not found for user with id: `{}`.",
                    args.user_id
                )));
            }
            Ok(ToolResult::success().with("profile_information", response))
        })
        .await
    }

    pub async fn list_messages(&self, args: ListMessagesArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            let mut query = Vec::new();
            if let Some(q) = args.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
                query.push(("q", q.to_string()));
            }
            if let Some(max_results) = args.max_results {
                if let Some(err) = validate::check_range("max_results", max_results, 1, 100) {
                    return Ok(ToolResult::error(err));
                }
                query.push(("maxResults", max_results.to_string()));
            }
            if let Some(include) = args.include_spam_and_trash {
                query.push(("includeSpamTrash", include.to_string()));
            }
            let url = self
                .client
                .url(&Self::users_path(&args.user_id, "messages"), &query)?;
            let response = self.client.get(url).await?;
            let messages = response["messages"].as_array().cloned().unwrap_or_default();
            if messages.is_empty() {
                return Ok(ToolResult::not_found(format!(
                    "No messages found for user with id: '{}'",
                    args.user_id
                )));
            }
            Ok(ToolResult::success().with("email_messages", messages))
        })
        .await
    }

    pub async fn get_email_message(&self, args: GetMessageArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            if args.message_id.trim().is_empty() {
                return Ok(ToolResult::error("Message Id cannot be empty."));
            }
            let mut query = Vec::new();
            if let Some(format) = &args.format {
                if let Some(err) = validate::check_enum("format", format, MESSAGE_FORMATS) {
                    return Ok(ToolResult::error(err));
                }
                query.push(("format", format.clone()));
            }
            let path = Self::users_path(&args.user_id, &format!("messages/{}", args.message_id));
            let url = self.client.url(&path, &query)?;
            let message = self.client.get(url).await?;
            if message.is_null() {
                return Ok(ToolResult::not_found(format!(
                    "Message id: {} not found for user {}",
                    args.message_id, args.user_id
                )));
            }
            Ok(ToolResult::success().with("email_message", message))
        })
        .await
    }

    pub async fn send_message(&self, args: SendMessageArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            if args.to.trim().is_empty() {
                return Ok(ToolResult::error("Recipient email id cannot be empty."));
            }

            // `to` is all-or-nothing; one bad address fails the whole send.
            let to = mime::split_recipients(&args.to);
            for email in &to {
                if !validate::is_valid_email(email) {
                    return Ok(ToolResult::error(format!(
                        "Invalid recipient email address: {}.",
                        email
                    )));
                }
            }
            if to.is_empty() {
                return Ok(ToolResult::error("Recipient email id cannot be empty."));
            }

            let mut subject = match args.subject.as_deref() {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => "(No Subject)".to_string(),
            };
            if args.in_reply_to.is_some() && !subject.to_lowercase().starts_with("re:") {
                subject = format!("Re: {}", subject);
            }

            // Invalid cc/bcc addresses are dropped and reported, not fatal.
            let (cc, invalid_cc) = mime::partition_valid(
                args.cc.as_deref().map(mime::split_recipients).unwrap_or_default(),
            );
            let (bcc, invalid_bcc) = mime::partition_valid(
                args.bcc.as_deref().map(mime::split_recipients).unwrap_or_default(),
            );

            let message = mime::OutgoingMessage {
                from: (args.user_id != "me").then(|| args.user_id.clone()),
                to,
                cc,
                bcc,
                subject,
                in_reply_to: args.in_reply_to.clone(),
                body: args.body.clone(),
            };
            let mut payload = json!({ "raw": mime::encode_rfc2822(&message) });
            if let Some(thread_id) = &args.thread_id {
                payload["threadId"] = json!(thread_id);
            }

            let url = self
                .client
                .url(&Self::users_path(&args.user_id, "messages/send"), &[])?;
            let response = self.client.post(url, &payload).await?;

            let mut result = ToolResult::success_msg(format!(
                "Email delivered with id: {}",
                response["id"].as_str().unwrap_or_default()
            ));
            if !invalid_cc.is_empty() {
                result = result
                    .warning("Skipped some email addresses that were invalid.")
                    .with("invalid_emails_in_cc", &invalid_cc);
            }
            if !invalid_bcc.is_empty() {
                result = result
                    .warning("Skipped some email addresses that were invalid.")
                    .with("invalid_emails_in_bcc", &invalid_bcc);
            }
            Ok(result)
        })
        .await
    }

    pub async fn modify_message_label(&self, args: ModifyLabelsArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            if args.message_id.trim().is_empty() {
                return Ok(ToolResult::error("Message Id cannot be empty."));
            }
            let mut body = serde_json::Map::new();
            if let Some(add) = args.add_labels.as_ref().filter(|l| !l.is_empty()) {
                body.insert("addLabelIds".to_string(), json!(add));
            }
            if let Some(remove) = args.remove_labels.as_ref().filter(|l| !l.is_empty()) {
                body.insert("removeLabelIds".to_string(), json!(remove));
            }
            if body.is_empty() {
                return Ok(ToolResult::error("No labels provided to modify."));
            }
            let path =
                Self::users_path(&args.user_id, &format!("messages/{}/modify", args.message_id));
            let url = self.client.url(&path, &[])?;
            self.client.post(url, &Value::Object(body)).await?;
            Ok(ToolResult::success_msg(format!(
                "Labels modified for message id: {}.",
                args.message_id
            )))
        })
        .await
    }

    pub async fn trash_message(&self, args: MessageIdArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            if args.message_id.trim().is_empty() {
                return Ok(ToolResult::error("Message Id cannot be empty."));
            }
            let path =
                Self::users_path(&args.user_id, &format!("messages/{}/trash", args.message_id));
            let url = self.client.url(&path, &[])?;
            self.client.post_empty(url).await?;
            Ok(ToolResult::success_msg(format!(
                "Message with id: {} has been trashed.",
                args.message_id
            )))
        })
        .await
    }

    pub async fn untrash_message(&self, args: MessageIdArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            if args.message_id.trim().is_empty() {
                return Ok(ToolResult::error("Message Id cannot be empty."));
            }
            let path =
                Self::users_path(&args.user_id, &format!("messages/{}/untrash", args.message_id));
            let url = self.client.url(&path, &[])?;
            self.client.post_empty(url).await?;
            Ok(ToolResult::success_msg(format!(
                "Message with id: {} has been recovered.",
                args.message_id
            )))
        })
        .await
    }

    pub async fn list_drafts(&self, args: ListDraftsArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            let mut query = Vec::new();
            if let Some(q) = args.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
                query.push(("q", q.to_string()));
            }
            if let Some(max_results) = args.max_results {
                if let Some(err) = validate::check_range("max_results", max_results, 1, 100) {
                    return Ok(ToolResult::error(err));
                }
                query.push(("maxResults", max_results.to_string()));
            }
            if let Some(include) = args.include_spam_and_trash {
                query.push(("includeSpamTrash", include.to_string()));
            }
            let url = self
                .client
                .url(&Self::users_path(&args.user_id, "drafts"), &query)?;
            let response = self.client.get(url).await?;
            let drafts = response["drafts"].as_array().cloned().unwrap_or_default();
            if drafts.is_empty() {
                return Ok(ToolResult::not_found(
                    "No drafts found in user's gmail account.",
                ));
            }
            // Flatten the nested message metadata for the caller.
            let draft_list: Vec<Value> = drafts
                .iter()
                .map(|draft| {
                    json!({
                        "draft_id": draft["id"],
                        "message_id": draft["message"]["id"],
                        "thread_id": draft["message"]["threadId"],
                        "label_ids": draft["message"]["labelIds"].as_array().cloned().unwrap_or_default(),
                        "snippet": draft["message"]["snippet"],
                    })
                })
                .collect();
            Ok(ToolResult::success().with("drafts", draft_list))
        })
        .await
    }

    pub async fn get_draft(&self, args: GetDraftArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            if args.draft_id.trim().is_empty() {
                return Ok(ToolResult::error("Draft Id cannot be empty."));
            }
            let mut query = Vec::new();
            if let Some(format) = &args.format {
                if let Some(err) = validate::check_enum("format", format, MESSAGE_FORMATS) {
                    return Ok(ToolResult::error(err));
                }
                query.push(("format", format.clone()));
            }
            let path = Self::users_path(&args.user_id, &format!("drafts/{}", args.draft_id));
            let url = self.client.url(&path, &query)?;
            let draft = self.client.get(url).await?;
            if draft.is_null() {
                return Ok(ToolResult::not_found(format!(
                    "Draft id: {} not found for user {}",
                    args.draft_id, args.user_id
                )));
            }
            let Some(message) = draft.get("message") else {
                return Ok(ToolResult::error(format!(
                    "Draft {} does not contain a message object.",
                    args.draft_id
                )));
            };
            Ok(ToolResult::success().with("draft", message))
        })
        .await
    }

    pub async fn send_draft(&self, args: DraftIdArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            if args.draft_id.trim().is_empty() {
                return Ok(ToolResult::error("Draft Id cannot be empty."));
            }
            let url = self
                .client
                .url(&Self::users_path(&args.user_id, "drafts/send"), &[])?;
            let response = self.client.post(url, &json!({ "id": args.draft_id })).await?;
            if response.is_null() {
                return Ok(ToolResult::error(
                    "No response received for send operation from Gmail API",
                ));
            }
            Ok(ToolResult::success_msg(format!(
                "Email delivered with id: {}.",
                response["id"].as_str().unwrap_or_default()
            )))
        })
        .await
    }

    pub async fn create_draft(&self, args: CreateDraftArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }

            // Drafts tolerate missing or invalid recipients; they are fixed
            // up before sending.
            let (to, invalid_to) = mime::partition_valid(
                args.to.as_deref().map(mime::split_recipients).unwrap_or_default(),
            );
            let (cc, invalid_cc) = mime::partition_valid(
                args.cc.as_deref().map(mime::split_recipients).unwrap_or_default(),
            );
            let (bcc, invalid_bcc) = mime::partition_valid(
                args.bcc.as_deref().map(mime::split_recipients).unwrap_or_default(),
            );

            let mut subject = match args.subject.as_deref() {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => "(No Subject)".to_string(),
            };
            if args.in_reply_to.is_some() && !subject.to_lowercase().starts_with("re:") {
                subject = format!("Re: {}", subject);
            }

            let message = mime::OutgoingMessage {
                from: (args.user_id != "me").then(|| args.user_id.clone()),
                to,
                cc,
                bcc,
                subject,
                in_reply_to: args.in_reply_to.clone(),
                body: args.body.clone().unwrap_or_default(),
            };
            let mut message_payload = json!({ "raw": mime::encode_rfc2822(&message) });
            if let Some(thread_id) = &args.thread_id {
                message_payload["threadId"] = json!(thread_id);
            }

            let url = self
                .client
                .url(&Self::users_path(&args.user_id, "drafts"), &[])?;
            let response = self
                .client
                .post(url, &json!({ "message": message_payload }))
                .await?;

            let mut result = ToolResult::success_msg(format!(
                "Draft created with id: {}",
                response["id"].as_str().unwrap_or_default()
            ));
            let mut warnings = Vec::new();
            if !invalid_to.is_empty() {
                warnings.push("Skipped invalid email addresses in to.");
                result = result.with("invalid_emails_in_to", &invalid_to);
            }
            if !invalid_cc.is_empty() {
                warnings.push("Skipped invalid email addresses in cc.");
                result = result.with("invalid_emails_in_cc", &invalid_cc);
            }
            if !invalid_bcc.is_empty() {
                warnings.push("Skipped invalid email addresses in bcc.");
                result = result.with("invalid_emails_in_bcc", &invalid_bcc);
            }
            if !warnings.is_empty() {
                result = result.warning(warnings.join(" "));
            }
            Ok(result)
        })
        .await
    }

    pub async fn update_draft(&self, args: UpdateDraftArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            if args.draft_id.trim().is_empty() {
                return Ok(ToolResult::error("Draft Id cannot be empty."));
            }

            // Fetch the current draft so unspecified fields survive the
            // rewrite.
            let path = Self::users_path(&args.user_id, &format!("drafts/{}", args.draft_id));
            let url = self.client.url(&path, &[])?;
            let existing = self.client.get(url).await?;
            let payload = &existing["message"]["payload"];

            let existing_body = payload["body"]["data"]
                .as_str()
                .and_then(mime::decode_body)
                .or_else(|| {
                    payload["parts"].as_array().and_then(|parts| {
                        parts
                            .iter()
                            .find(|part| part["mimeType"] == "text/plain")
                            .and_then(|part| part["body"]["data"].as_str())
                            .and_then(mime::decode_body)
                    })
                })
                .unwrap_or_default();

            let header = |name: &str| -> Vec<String> {
                payload["headers"]
                    .as_array()
                    .and_then(|headers| {
                        headers
                            .iter()
                            .find(|h| h["name"] == name)
                            .and_then(|h| h["value"].as_str())
                    })
                    .map(mime::split_recipients)
                    .unwrap_or_default()
            };
            let existing_subject = payload["headers"]
                .as_array()
                .and_then(|headers| {
                    headers
                        .iter()
                        .find(|h| h["name"] == "Subject")
                        .and_then(|h| h["value"].as_str())
                })
                .unwrap_or("(No Subject)")
                .to_string();

            let subject = match args.subject.as_deref().map(str::trim) {
                Some("") | None => existing_subject,
                Some(s) => s.to_string(),
            };

            let mut invalid_to = Vec::new();
            let to =
                mime::apply_recipient_edits(header("To"), &args.add_to, &args.remove_to, &mut invalid_to);
            let mut invalid_cc = Vec::new();
            let cc =
                mime::apply_recipient_edits(header("Cc"), &args.add_cc, &args.remove_cc, &mut invalid_cc);
            let mut invalid_bcc = Vec::new();
            let bcc = mime::apply_recipient_edits(
                header("Bcc"),
                &args.add_bcc,
                &args.remove_bcc,
                &mut invalid_bcc,
            );

            let message = mime::OutgoingMessage {
                from: None,
                to,
                cc,
                bcc,
                subject,
                in_reply_to: None,
                body: args.body.clone().unwrap_or(existing_body),
            };
            let url = self.client.url(&path, &[])?;
            let response = self
                .client
                .put(
                    url,
                    &json!({ "message": { "raw": mime::encode_rfc2822(&message) } }),
                )
                .await?;

            let mut result = ToolResult::success_msg(format!(
                "Draft updated successfully with id: {}.",
                response["id"].as_str().unwrap_or_default()
            ));
            let mut warnings = Vec::new();
            if !invalid_to.is_empty() {
                warnings.push("Skipped invalid email addresses in to.");
                result = result.with("invalid_emails_in_to", &invalid_to);
            }
            if !invalid_cc.is_empty() {
                warnings.push("Skipped invalid email addresses in cc.");
                result = result.with("invalid_emails_in_cc", &invalid_cc);
            }
            if !invalid_bcc.is_empty() {
                warnings.push("Skipped invalid email addresses in bcc.");
                result = result.with("invalid_emails_in_bcc", &invalid_bcc);
            }
            if !warnings.is_empty() {
                result = result.warning(warnings.join(" "));
            }
            Ok(result)
        })
        .await
    }

    pub async fn delete_draft(&self, args: DraftIdArgs) -> ToolResult {
        envelope::guard(Surface::Gmail, async {
            if let Some(err) = check_user_id(&args.user_id) {
                return Ok(err);
            }
            if args.draft_id.trim().is_empty() {
                return Ok(ToolResult::error("Draft Id cannot be empty."));
            }
            let path = Self::users_path(&args.user_id, &format!("drafts/{}", args.draft_id));
            let url = self.client.url(&path, &[])?;
            self.client.delete(url).await?;
            Ok(ToolResult::success_msg(format!(
                "Draft with id: {} has been deleted permanently.",
                args.draft_id
            )))
        })
        .await
    }
}

pub fn declarations() -> Vec<ToolSpec> {
    use super::{boolean, enumerated, string, string_array};

    let user_id = || string("User's email id. Use 'me' for the authenticated user.");
    let format = || enumerated("Format to return the message in.", MESSAGE_FORMATS);
    let max_results = || super::integer("Maximum number of results to return (1-100).");

    vec![
        ToolSpec::new("get_profile", "Retrieve the Gmail profile of a user.")
            .required("user_id", user_id()),
        ToolSpec::new("list_messages", "List email messages from the user's mailbox.")
            .required("user_id", user_id())
            .optional("query", string("Gmail search query to filter messages."))
            .optional("max_results", max_results())
            .optional(
                "include_spam_and_trash",
                boolean("Whether to include messages from spam and trash."),
            ),
        ToolSpec::new("get_email_message", "Retrieve a specific email message.")
            .required("message_id", string("Unique id of the message to retrieve."))
            .required("user_id", user_id())
            .optional("format", format()),
        ToolSpec::new("send_message", "Compose and send an email message.")
            .required("user_id", user_id())
            .required("to", string("Comma-separated recipient email address(es)."))
            .required("body", string("Content of the email message."))
            .optional("subject", string("Subject line of the email."))
            .optional("cc", string("Comma-separated CC recipient email address(es)."))
            .optional("bcc", string("Comma-separated BCC recipient email address(es)."))
            .optional("thread_id", string("Thread id the email belongs to."))
            .optional("in_reply_to", string("Message id this email replies to.")),
        ToolSpec::new("modify_message_label", "Add or remove labels on a message.")
            .required("message_id", string("Unique id of the message to modify."))
            .required("user_id", user_id())
            .optional("add_labels", string_array("Label ids to add to the message."))
            .optional("remove_labels", string_array("Label ids to remove from the message.")),
        ToolSpec::new("trash_message", "Move a message to the trash folder.")
            .required("message_id", string("Unique id of the message to trash."))
            .required("user_id", user_id()),
        ToolSpec::new("untrash_message", "Restore a message from the trash folder.")
            .required("message_id", string("Unique id of the message to recover."))
            .required("user_id", user_id()),
        ToolSpec::new("list_drafts", "List draft messages in the user's mailbox.")
            .required("user_id", user_id())
            .optional("query", string("Gmail search query to filter drafts."))
            .optional("max_results", max_results())
            .optional(
                "include_spam_and_trash",
                boolean("Whether to include drafts from spam and trash."),
            ),
        ToolSpec::new("get_draft", "Retrieve a specific draft.")
            .required("draft_id", string("Unique id of the draft to retrieve."))
            .required("user_id", user_id())
            .optional("format", format()),
        ToolSpec::new("send_draft", "Send an existing draft to its recipients.")
            .required("draft_id", string("Unique id of the draft to send."))
            .required("user_id", user_id()),
        ToolSpec::new("create_draft", "Create a draft email message.")
            .required("user_id", user_id())
            .optional("to", string("Comma-separated recipient email address(es)."))
            .optional("body", string("Content of the email message."))
            .optional("subject", string("Subject line of the email."))
            .optional("cc", string("Comma-separated CC recipient email address(es)."))
            .optional("bcc", string("Comma-separated BCC recipient email address(es)."))
            .optional("thread_id", string("Thread id the draft belongs to."))
            .optional("in_reply_to", string("Message id this draft replies to.")),
        ToolSpec::new("update_draft", "Update the recipients, subject, or body of a draft.")
            .required("user_id", user_id())
            .required("draft_id", string("Unique id of the draft to update."))
            .optional("body", string("Replacement body content."))
            .optional("subject", string("Replacement subject line."))
            .optional("add_to", string_array("Email addresses to add to the To field."))
            .optional("remove_to", string_array("Email addresses to remove from the To field."))
            .optional("add_cc", string_array("Email addresses to add to the Cc field."))
            .optional("remove_cc", string_array("Email addresses to remove from the Cc field."))
            .optional("add_bcc", string_array("Email addresses to add to the Bcc field."))
            .optional("remove_bcc", string_array("Email addresses to remove from the Bcc field.")),
        ToolSpec::new("delete_draft", "Permanently delete a draft.")
            .required("user_id", user_id())
            .required("draft_id", string("Unique id of the draft to delete.")),
    ]
}

#[async_trait]
impl ToolSurface for GmailTools {
    fn name(&self) -> &'static str {
        "gmail"
    }

    fn declarations(&self) -> Vec<ToolSpec> {
        declarations()
    }

    async fn call(&self, tool: &str, args: Value) -> ToolResult {
        super::dispatch_tool!(self, tool, args, {
            "get_profile" => get_profile,
            "list_messages" => list_messages,
            "get_email_message" => get_email_message,
            "send_message" => send_message,
            "modify_message_label" => modify_message_label,
            "trash_message" => trash_message,
            "untrash_message" => untrash_message,
            "list_drafts" => list_drafts,
            "get_draft" => get_draft,
            "send_draft" => send_draft,
            "create_draft" => create_draft,
            "update_draft" => update_draft,
            "delete_draft" => delete_draft,
        })
    }
}
