//! Google Drive tool surface: file listing, creation, content download
//! with text extraction, metadata updates, and trash management against the
//! Drive v3 API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::envelope::{self, Surface, ToolResult};
use super::{ToolSpec, ToolSurface, mime};
use crate::google::GoogleClient;

const SORT_KEYS: &[&str] = &[
    "folder",
    "modifiedByMeTime",
    "viewedByMeTime",
    "name",
    "starred",
    "name_natural",
    "quotaBytesUsed",
    "recency",
    "sharedWithMeTime",
    "createdTime",
    "modifiedTime",
];
const SPACES: &[&str] = &["drive", "appDataFolder", "photos"];
const METADATA_UPDATE_FIELDS: &[&str] = &["name", "description", "starred"];

#[derive(Deserialize)]
pub struct ListFilesArgs {
    pub max_results: i64,
    pub keyword: Option<String>,
    pub order_by: Option<Vec<String>>,
    pub spaces: Option<Vec<String>>,
    pub drive_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateFileArgs {
    pub file_name: String,
    pub target_mime_type: String,
    pub folder_id: Option<String>,
    pub enforce_single_parent: Option<bool>,
    pub use_content_as_indexable_text: Option<bool>,
}

#[derive(Deserialize)]
pub struct FileIdArgs {
    pub file_id: String,
}

#[derive(Deserialize)]
pub struct UpdateFileMetadataArgs {
    pub file_id: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
    pub add_parents: Option<Vec<String>>,
    pub remove_parents: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct FetchFileMetadataArgs {
    pub file_id: String,
    pub metadata: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct CopyFileArgs {
    pub file_id: String,
    pub new_name: Option<String>,
    pub parent_folder_id: Option<String>,
    pub enforce_single_parent: Option<bool>,
}

#[derive(Deserialize)]
pub struct EmptyTrashArgs {}

pub struct DriveTools {
    client: GoogleClient,
}

impl DriveTools {
    pub fn new(client: GoogleClient) -> Self {
        Self { client }
    }

    pub async fn list_files(&self, args: ListFilesArgs) -> ToolResult {
        envelope::guard(Surface::Drive, async {
            if let Some(err) = super::validate::check_range("max_results", args.max_results, 1, 15)
            {
                return Ok(ToolResult::error(err));
            }
            // Sort keys may carry a trailing " desc"; only the key itself is
            // checked.
            if let Some(order_by) = &args.order_by {
                let invalid: Vec<&String> = order_by
                    .iter()
                    .filter(|k| {
                        !SORT_KEYS.contains(&k.split_whitespace().next().unwrap_or_default())
                    })
                    .collect();
                if !invalid.is_empty() {
                    return Ok(ToolResult::error(format!(
                        "invalid sort keys: {:?}",
                        invalid
                    )));
                }
            }
            if let Some(spaces) = &args.spaces {
                let invalid: Vec<&String> = spaces
                    .iter()
                    .filter(|s| {
                        !SPACES.contains(&s.split_whitespace().next().unwrap_or_default())
                    })
                    .collect();
                if !invalid.is_empty() {
                    return Ok(ToolResult::error(format!("invalid spaces: {:?}", invalid)));
                }
            }

            let mut query = vec![
                ("pageSize", args.max_results.to_string()),
                (
                    "fields",
                    "nextPageToken, files(id, name, webViewLink)".to_string(),
                ),
            ];
            if let Some(keyword) = args.keyword.as_deref().filter(|k| !k.is_empty()) {
                let escaped = keyword.replace('"', "\\\"");
                query.push(("q", format!("name contains \"{}\"", escaped)));
            }
            if let Some(order_by) = args.order_by.as_ref().filter(|o| !o.is_empty()) {
                query.push(("orderBy", order_by.join(", ")));
            }
            if let Some(spaces) = args.spaces.as_ref().filter(|s| !s.is_empty()) {
                query.push(("spaces", spaces.join(", ")));
            }
            if let Some(drive_id) = &args.drive_id {
                query.push(("driveId", drive_id.clone()));
            }

            let url = self.client.url("drive/v3/files", &query)?;
            let response = self.client.get(url).await?;
            let files = response["files"].as_array().cloned().unwrap_or_default();
            if files.is_empty() {
                return Ok(ToolResult::not_found("no files found"));
            }
            Ok(ToolResult::success().with("files", files))
        })
        .await
    }

    pub async fn create_file(&self, args: CreateFileArgs) -> ToolResult {
        envelope::guard(Surface::Drive, async {
            if args.file_name.trim().is_empty() {
                return Ok(ToolResult::error("file name cannot be empty"));
            }
            if args.target_mime_type.trim().is_empty() {
                return Ok(ToolResult::error("file MIME type is required"));
            }
            let mut body = json!({
                "name": args.file_name.trim(),
                "mimeType": args.target_mime_type.trim(),
            });
            if let Some(folder_id) = args.folder_id.as_deref().map(str::trim) {
                if !folder_id.is_empty() {
                    body["parents"] = json!([folder_id]);
                }
            }
            let mut query = vec![("fields", "id, name, webViewLink, mimeType".to_string())];
            if let Some(single_parent) = args.enforce_single_parent {
                query.push(("enforceSingleParent", single_parent.to_string()));
            }
            if let Some(indexable) = args.use_content_as_indexable_text {
                query.push(("useContentAsIndexableText", indexable.to_string()));
            }
            let url = self.client.url("drive/v3/files", &query)?;
            let created = self.client.post(url, &body).await?;
            Ok(ToolResult::success()
                .with("id", &created["id"])
                .with("name", &created["name"])
                .with("webViewLink", &created["webViewLink"]))
        })
        .await
    }

    /// Download a file's content as text. Google Workspace files are
    /// exported to a portable format first; binary uploads are downloaded
    /// directly and decoded.
    pub async fn fetch_file_content(&self, args: FileIdArgs) -> ToolResult {
        envelope::guard(Surface::Drive, async {
            if args.file_id.trim().is_empty() {
                return Ok(ToolResult::error("file id is required"));
            }
            let url = self.client.url(
                &format!("drive/v3/files/{}", args.file_id),
                &[("fields", "mimeType, name, capabilities".to_string())],
            )?;
            let metadata = self.client.get(url).await?;

            let capabilities = &metadata["capabilities"];
            let can_download = capabilities["canDownload"].as_bool().unwrap_or(true);
            let can_read_drive = capabilities["canReadDrive"].as_bool().unwrap_or(true);
            if !can_download && !can_read_drive {
                return Ok(ToolResult::error(
                    "you do not have permission to export this file",
                ));
            }

            let mime_type = metadata["mimeType"].as_str().unwrap_or_default().to_string();
            if mime_type.starts_with("application/vnd.google-apps.") {
                let export_mime = if mime_type.contains("document") {
                    "text/plain"
                } else if mime_type.contains("spreadsheet") {
                    "text/csv"
                } else if mime_type.contains("presentation") {
                    "application/pdf"
                } else {
                    return Ok(ToolResult::error(format!(
                        "unsupported workspace file type: {}",
                        mime_type
                    )));
                };
                if !can_download {
                    return Ok(ToolResult::error(
                        "you do not have permission to export this file",
                    ));
                }
                let url = self.client.url(
                    &format!("drive/v3/files/{}/export", args.file_id),
                    &[("mimeType", export_mime.to_string())],
                )?;
                let bytes = self.client.get_bytes(url).await?;
                return Ok(ToolResult::success()
                    .with("content", mime::extract_text(export_mime, &bytes)?));
            }

            let url = self.client.url(
                &format!("drive/v3/files/{}", args.file_id),
                &[("alt", "media".to_string())],
            )?;
            let bytes = self.client.get_bytes(url).await?;
            Ok(ToolResult::success().with("content", mime::extract_text(&mime_type, &bytes)?))
        })
        .await
    }

    pub async fn update_file_metadata(&self, args: UpdateFileMetadataArgs) -> ToolResult {
        envelope::guard(Surface::Drive, async {
            if args.file_id.trim().is_empty() {
                return Ok(ToolResult::error("file id is required"));
            }
            if args.metadata.is_empty()
                && args.add_parents.is_none()
                && args.remove_parents.is_none()
            {
                return Ok(ToolResult::error("metadata is required"));
            }

            // Only a small allow-list of metadata keys may be patched;
            // anything else is dropped silently.
            let body: serde_json::Map<String, Value> = args
                .metadata
                .iter()
                .filter(|(k, _)| METADATA_UPDATE_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            let mut query = vec![
                (
                    "fields",
                    "id, name, mimeType, webViewLink, description, starred, modifiedTime, parents"
                        .to_string(),
                ),
                ("supportsAllDrives", "true".to_string()),
            ];
            let added_parents = args.add_parents.as_ref().map(|p| p.join(", "));
            let removed_parents = args.remove_parents.as_ref().map(|p| p.join(", "));
            if let Some(add) = &added_parents {
                query.push(("addParents", add.clone()));
            }
            if let Some(remove) = &removed_parents {
                query.push(("removeParents", remove.clone()));
            }

            let url = self
                .client
                .url(&format!("drive/v3/files/{}", args.file_id), &query)?;
            let mut updated = self.client.patch(url, &Value::Object(body)).await?;
            updated["addedParents"] = added_parents.map(Value::String).unwrap_or(Value::Null);
            updated["removedParents"] = removed_parents.map(Value::String).unwrap_or(Value::Null);
            Ok(ToolResult::success().with("updated_file_metadata", updated))
        })
        .await
    }

    pub async fn delete_file(&self, args: FileIdArgs) -> ToolResult {
        envelope::guard(Surface::Drive, async {
            if args.file_id.trim().is_empty() {
                return Ok(ToolResult::error("file id is required"));
            }
            let url = self.client.url(
                &format!("drive/v3/files/{}", args.file_id),
                &[("supportsAllDrives", "true".to_string())],
            )?;
            self.client.delete(url).await?;
            Ok(ToolResult::success_msg(format!(
                "file with id '{}' deleted successfully",
                args.file_id
            )))
        })
        .await
    }

    pub async fn fetch_file_metadata(&self, args: FetchFileMetadataArgs) -> ToolResult {
        envelope::guard(Surface::Drive, async {
            let fields = match args.metadata.as_ref().filter(|m| !m.is_empty()) {
                Some(fields) => fields.join(", "),
                None => "*".to_string(),
            };
            let url = self.client.url(
                &format!("drive/v3/files/{}", args.file_id),
                &[("fields", fields)],
            )?;
            let metadata = self.client.get(url).await?;
            if metadata.is_null()
                || metadata.as_object().map(|m| m.is_empty()).unwrap_or(false)
            {
                return Ok(ToolResult::success_msg(
                    "No metadata found for the specified fields",
                ));
            }
            Ok(ToolResult::success().with("file_metadata", metadata))
        })
        .await
    }

    pub async fn copy_file(&self, args: CopyFileArgs) -> ToolResult {
        envelope::guard(Surface::Drive, async {
            if args.file_id.trim().is_empty() {
                return Ok(ToolResult::error("File ID is required"));
            }
            let mut body = serde_json::Map::new();
            if let Some(new_name) = args.new_name.as_deref().map(str::trim) {
                if !new_name.is_empty() {
                    body.insert("name".to_string(), json!(new_name));
                }
            }
            if let Some(parent) = args.parent_folder_id.as_deref().filter(|p| !p.is_empty()) {
                body.insert("parents".to_string(), json!([parent]));
            }
            let mut query = vec![("fields", "id, name, webViewLink".to_string())];
            if let Some(single_parent) = args.enforce_single_parent {
                query.push(("enforceSingleParent", single_parent.to_string()));
            }
            let url = self.client.url(
                &format!("drive/v3/files/{}/copy", args.file_id.trim()),
                &query,
            )?;
            let copied = self.client.post(url, &Value::Object(body)).await?;
            Ok(ToolResult::success()
                .with("id", &copied["id"])
                .with("name", &copied["name"])
                .with("webViewLink", &copied["webViewLink"]))
        })
        .await
    }

    pub async fn empty_trash(&self, _args: EmptyTrashArgs) -> ToolResult {
        envelope::guard(Surface::Drive, async {
            let url = self.client.url("drive/v3/files/trash", &[])?;
            self.client.delete(url).await?;
            Ok(ToolResult::success_msg("trash emptied successfully"))
        })
        .await
    }
}

pub fn declarations() -> Vec<ToolSpec> {
    use super::{boolean, integer, string, string_array};

    vec![
        ToolSpec::new("list_files", "List files from the user's Drive.")
            .required("max_results", integer("Maximum number of files to retrieve (1-15)."))
            .optional("keyword", string("Keyword to search for in file names."))
            .optional(
                "order_by",
                string_array("Sort keys to order results, each optionally suffixed with ' desc'."),
            )
            .optional("spaces", string_array("Drive spaces to search, like 'drive' or 'photos'."))
            .optional("drive_id", string("Id of the shared drive to search.")),
        ToolSpec::new("create_file", "Create a new file or folder.")
            .required("file_name", string("Name of the file to create."))
            .required("target_mime_type", string("MIME type of the file to create."))
            .optional("folder_id", string("Id of the parent folder."))
            .optional(
                "enforce_single_parent",
                boolean("Whether the file must have a single parent folder."),
            )
            .optional(
                "use_content_as_indexable_text",
                boolean("Whether to use the file content as indexable text."),
            ),
        ToolSpec::new("fetch_file_content", "Download a file's content as text.")
            .required("file_id", string("Id of the file to fetch.")),
        ToolSpec::new("update_file_metadata", "Update metadata or parents of a file.")
            .required("file_id", string("Unique id of the file to update."))
            .optional(
                "metadata",
                super::Property {
                    r#type: "object".to_string(),
                    description: "Metadata fields to update (name, description, starred)."
                        .to_string(),
                    r#enum: None,
                    items: None,
                },
            )
            .optional("add_parents", string_array("Folder ids to add as parents."))
            .optional("remove_parents", string_array("Folder ids to remove from parents.")),
        ToolSpec::new("delete_file", "Permanently delete a file.")
            .required("file_id", string("Unique id of the file to delete.")),
        ToolSpec::new("fetch_file_metadata", "Retrieve metadata for a file.")
            .required("file_id", string("Id of the file whose metadata is retrieved."))
            .optional("metadata", string_array("Metadata fields to fetch; all when omitted.")),
        ToolSpec::new("copy_file", "Create a copy of an existing file.")
            .required("file_id", string("Id of the file to copy."))
            .optional("new_name", string("New name for the copied file."))
            .optional("parent_folder_id", string("Folder id to place the copy in."))
            .optional(
                "enforce_single_parent",
                boolean("Whether the file must have a single parent folder."),
            ),
        ToolSpec::new("empty_trash", "Permanently delete all trashed files."),
    ]
}

#[async_trait]
impl ToolSurface for DriveTools {
    fn name(&self) -> &'static str {
        "drive"
    }

    fn declarations(&self) -> Vec<ToolSpec> {
        declarations()
    }

    async fn call(&self, tool: &str, args: Value) -> ToolResult {
        super::dispatch_tool!(self, tool, args, {
            "list_files" => list_files,
            "create_file" => create_file,
            "fetch_file_content" => fetch_file_content,
            "update_file_metadata" => update_file_metadata,
            "delete_file" => delete_file,
            "fetch_file_metadata" => fetch_file_metadata,
            "copy_file" => copy_file,
            "empty_trash" => empty_trash,
        })
    }
}
