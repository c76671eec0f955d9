//! Google Tasks tool surface: tasklist management and task CRUD against the
//! Tasks v1 API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::envelope::{self, Surface, ToolResult};
use super::{ToolSpec, ToolSurface, validate};
use crate::google::GoogleClient;

const TASK_STATUSES: &[&str] = &["needsAction", "completed"];
const MAX_TITLE_LEN: usize = 1024;
const MAX_NOTES_LEN: usize = 8192;

fn check_tasklist_id(tasklist_id: &str) -> Option<ToolResult> {
    if tasklist_id.trim().is_empty() {
        return Some(ToolResult::error("Tasklist ID cannot be empty."));
    }
    None
}

fn check_task_id(task_id: &str) -> Option<ToolResult> {
    if task_id.trim().is_empty() {
        return Some(ToolResult::error("Task ID cannot be empty."));
    }
    None
}

fn invalid_timestamp(field: &str, value: &str) -> ToolResult {
    ToolResult::error(format!(
        "Invalid {} format: '{}'. Expected RFC3339 format (e.g., 2023-10-01T12:00:00Z).",
        field, value
    ))
}

/// Trim the provider's tasklist resource down to the fields callers use.
fn shape_tasklist(value: &Value) -> Value {
    json!({
        "etag": value["etag"].as_str().unwrap_or_default(),
        "tasklist_id": value["id"].as_str().unwrap_or_default(),
        "title": value["title"].as_str().unwrap_or_default(),
        "updated": value["updated"].as_str().unwrap_or_default(),
        "self_link": value["selfLink"].as_str().unwrap_or_default(),
    })
}

#[derive(Deserialize)]
pub struct ListTasklistsArgs {
    pub max_results: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateTasklistArgs {
    pub title: String,
}

#[derive(Deserialize)]
pub struct TasklistIdArgs {
    pub tasklist_id: String,
}

#[derive(Deserialize)]
pub struct UpdateTasklistArgs {
    pub tasklist_id: String,
    pub new_title: String,
}

#[derive(Deserialize)]
pub struct ListTasksArgs {
    pub tasklist_id: String,
    pub completed_max: Option<String>,
    pub completed_min: Option<String>,
    pub due_max: Option<String>,
    pub due_min: Option<String>,
    pub max_results: Option<i64>,
    pub show_assigned: Option<bool>,
    pub show_completed: Option<bool>,
    pub show_deleted: Option<bool>,
    pub show_hidden: Option<bool>,
    pub updated_min: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateTaskArgs {
    pub tasklist_id: String,
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct TaskRefArgs {
    pub tasklist_id: String,
    pub task_id: String,
}

#[derive(Deserialize)]
pub struct UpdateTaskArgs {
    pub tasklist_id: String,
    pub task_id: String,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct MoveTaskArgs {
    pub tasklist_id: String,
    pub task_id: String,
    pub destination_tasklist_id: Option<String>,
    pub parent_task_id: Option<String>,
    pub previous_task_id: Option<String>,
}

pub struct TasksTools {
    client: GoogleClient,
}

impl TasksTools {
    pub fn new(client: GoogleClient) -> Self {
        Self { client }
    }

    pub async fn list_tasklists(&self, args: ListTasklistsArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            let max_results = args.max_results.unwrap_or(5);
            if let Some(err) = validate::check_range("max_results", max_results, 1, 1000) {
                return Ok(ToolResult::error(err));
            }
            let url = self.client.url(
                "tasks/v1/users/@me/lists",
                &[("maxResults", max_results.to_string())],
            )?;
            let response = self.client.get(url).await?;
            let items = response["items"].as_array().cloned().unwrap_or_default();
            if items.is_empty() {
                return Ok(ToolResult::not_found(
                    "No tasklists found in the user's Google Tasks account.",
                ));
            }
            let tasklists: Vec<Value> = items.iter().map(shape_tasklist).collect();
            Ok(ToolResult::success().with("tasklists", tasklists))
        })
        .await
    }

    pub async fn create_tasklist(&self, args: CreateTasklistArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if args.title.trim().is_empty() {
                return Ok(ToolResult::error("Tasklist title cannot be empty."));
            }
            if args.title.chars().count() > MAX_TITLE_LEN {
                return Ok(ToolResult::error(
                    "Title exceeds maximum length of 1024 characters.",
                ));
            }
            let url = self.client.url("tasks/v1/users/@me/lists", &[])?;
            let response = self
                .client
                .post(url, &json!({ "title": args.title.trim() }))
                .await?;
            Ok(ToolResult::success().with("tasklist", shape_tasklist(&response)))
        })
        .await
    }

    pub async fn get_tasklist(&self, args: TasklistIdArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if args.tasklist_id.trim().is_empty() {
                return Ok(ToolResult::error("Tasklist Id cannot be empty."));
            }
            let url = self.client.url(
                &format!("tasks/v1/users/@me/lists/{}", args.tasklist_id.trim()),
                &[],
            )?;
            let response = self.client.get(url).await?;
            if response.is_null() {
                return Ok(ToolResult::not_found(format!(
                    "No tasklist found with ID: {}",
                    args.tasklist_id
                )));
            }
            Ok(ToolResult::success().with("tasklist", shape_tasklist(&response)))
        })
        .await
    }

    pub async fn update_tasklist(&self, args: UpdateTasklistArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if args.tasklist_id.trim().is_empty() {
                return Ok(ToolResult::error("Tasklist Id cannot be empty."));
            }
            if args.new_title.trim().is_empty() {
                return Ok(ToolResult::error("New tasklist title cannot be empty."));
            }
            if args.new_title.chars().count() > MAX_TITLE_LEN {
                return Ok(ToolResult::error(
                    "Title exceeds maximum length of 1024 characters.",
                ));
            }
            let url = self.client.url(
                &format!("tasks/v1/users/@me/lists/{}", args.tasklist_id.trim()),
                &[],
            )?;
            let response = self
                .client
                .patch(url, &json!({ "title": args.new_title.trim() }))
                .await?;
            if response.is_null() {
                return Ok(ToolResult::not_found(format!(
                    "No tasklist found with ID: {}",
                    args.tasklist_id
                )));
            }
            Ok(ToolResult::success().with("tasklist", shape_tasklist(&response)))
        })
        .await
    }

    pub async fn delete_tasklist(&self, args: TasklistIdArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if let Some(err) = check_tasklist_id(&args.tasklist_id) {
                return Ok(err);
            }
            let url = self.client.url(
                &format!("tasks/v1/users/@me/lists/{}", args.tasklist_id.trim()),
                &[],
            )?;
            self.client.delete(url).await?;
            Ok(ToolResult::success_msg(format!(
                "Tasklist with ID `{}` deleted successfully.",
                args.tasklist_id
            )))
        })
        .await
    }

    /// Remove all completed tasks from a tasklist. The tasks stay in the
    /// account but no longer appear in the list's default view.
    pub async fn clear_tasklist(&self, args: TasklistIdArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if let Some(err) = check_tasklist_id(&args.tasklist_id) {
                return Ok(err);
            }
            let url = self.client.url(
                &format!("tasks/v1/lists/{}/clear", args.tasklist_id.trim()),
                &[],
            )?;
            self.client.post_empty(url).await?;
            Ok(ToolResult::success_msg(format!(
                "Completed tasks cleared from tasklist `{}`.",
                args.tasklist_id
            )))
        })
        .await
    }

    pub async fn list_tasks(&self, args: ListTasksArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if let Some(err) = check_tasklist_id(&args.tasklist_id) {
                return Ok(err);
            }
            for (field, value) in [
                ("completed_max", &args.completed_max),
                ("completed_min", &args.completed_min),
                ("due_max", &args.due_max),
                ("due_min", &args.due_min),
                ("updated_min", &args.updated_min),
            ] {
                if let Some(value) = value {
                    if !validate::validate_rfc3339_timestamp(value) {
                        return Ok(invalid_timestamp(field, value));
                    }
                }
            }
            let max_results = args.max_results.unwrap_or(20);
            if let Some(err) = validate::check_range("max_results", max_results, 1, 100) {
                return Ok(ToolResult::error(err));
            }
            // Completed tasks are hidden by default; asking for them implies
            // showing hidden ones too.
            let show_hidden = if args.show_completed == Some(true) {
                Some(true)
            } else {
                args.show_hidden
            };

            let mut query = vec![("maxResults", max_results.to_string())];
            if let Some(completed_max) = &args.completed_max {
                query.push(("completedMax", completed_max.clone()));
            }
            if let Some(completed_min) = &args.completed_min {
                query.push(("completedMin", completed_min.clone()));
            }
            if let Some(due_max) = &args.due_max {
                query.push(("dueMax", due_max.clone()));
            }
            if let Some(due_min) = &args.due_min {
                query.push(("dueMin", due_min.clone()));
            }
            if let Some(show_assigned) = args.show_assigned {
                query.push(("showAssigned", show_assigned.to_string()));
            }
            if let Some(show_completed) = args.show_completed {
                query.push(("showCompleted", show_completed.to_string()));
            }
            if let Some(show_deleted) = args.show_deleted {
                query.push(("showDeleted", show_deleted.to_string()));
            }
            if let Some(show_hidden) = show_hidden {
                query.push(("showHidden", show_hidden.to_string()));
            }
            if let Some(updated_min) = &args.updated_min {
                query.push(("updatedMin", updated_min.clone()));
            }

            let url = self.client.url(
                &format!("tasks/v1/lists/{}/tasks", args.tasklist_id),
                &query,
            )?;
            let response = self.client.get(url).await?;
            let items = response["items"].as_array().cloned().unwrap_or_default();
            if items.is_empty() {
                return Ok(ToolResult::not_found(format!(
                    "No tasks found in tasklist {}",
                    args.tasklist_id
                )));
            }
            Ok(ToolResult::success().with("tasks", items))
        })
        .await
    }

    pub async fn create_task(&self, args: CreateTaskArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if let Some(err) = check_tasklist_id(&args.tasklist_id) {
                return Ok(err);
            }
            if args.title.trim().is_empty() {
                return Ok(ToolResult::error("Task title cannot be empty."));
            }
            if args.title.chars().count() > MAX_TITLE_LEN {
                return Ok(ToolResult::error("Task title exceeds 1024 characters."));
            }
            if let Some(notes) = &args.notes {
                if notes.chars().count() > MAX_NOTES_LEN {
                    return Ok(ToolResult::error("Task notes exceed 8192 characters."));
                }
            }
            if let Some(due) = &args.due {
                if !validate::validate_rfc3339_timestamp(due) {
                    return Ok(invalid_timestamp("due", due));
                }
            }
            let status = args
                .status
                .clone()
                .unwrap_or_else(|| "needsAction".to_string());
            if !TASK_STATUSES.contains(&status.as_str()) {
                return Ok(ToolResult::error(format!(
                    "Invalid status value: `{}`. Must be one of these: `needsAction` or `completed`.",
                    status
                )));
            }

            let mut body = json!({ "title": args.title, "status": status });
            if let Some(notes) = &args.notes {
                body["notes"] = json!(notes);
            }
            if let Some(due) = &args.due {
                body["due"] = json!(due);
            }

            let url = self
                .client
                .url(&format!("tasks/v1/lists/{}/tasks", args.tasklist_id), &[])?;
            let response = self.client.post(url, &body).await?;
            if response["id"].is_null() {
                return Ok(ToolResult::error("Failed to create task."));
            }
            Ok(ToolResult::success().with("task", response))
        })
        .await
    }

    pub async fn get_task(&self, args: TaskRefArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if let Some(err) = check_tasklist_id(&args.tasklist_id) {
                return Ok(err);
            }
            if let Some(err) = check_task_id(&args.task_id) {
                return Ok(err);
            }
            let url = self.client.url(
                &format!("tasks/v1/lists/{}/tasks/{}", args.tasklist_id, args.task_id),
                &[],
            )?;
            let response = self.client.get(url).await?;
            if response.is_null() {
                return Ok(ToolResult::error(format!(
                    "Task {} not found in tasklist {}.",
                    args.task_id, args.tasklist_id
                )));
            }
            Ok(ToolResult::success().with("task", response))
        })
        .await
    }

    pub async fn update_task(&self, args: UpdateTaskArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if let Some(err) = check_tasklist_id(&args.tasklist_id) {
                return Ok(err);
            }
            if let Some(err) = check_task_id(&args.task_id) {
                return Ok(err);
            }
            if let Some(title) = &args.title {
                if title.chars().count() > MAX_TITLE_LEN {
                    return Ok(ToolResult::error("Task title exceeds 1024 characters."));
                }
            }
            if let Some(notes) = &args.notes {
                if notes.chars().count() > MAX_NOTES_LEN {
                    return Ok(ToolResult::error("Task notes exceed 8192 characters."));
                }
            }
            if let Some(due) = &args.due {
                if !validate::validate_rfc3339_timestamp(due) {
                    return Ok(invalid_timestamp("due", due));
                }
            }
            if let Some(status) = &args.status {
                if !TASK_STATUSES.contains(&status.as_str()) {
                    return Ok(ToolResult::error(format!(
                        "Invalid status value: `{}`. Must be 'needsAction' or 'completed'.",
                        status
                    )));
                }
            }

            let mut body = serde_json::Map::new();
            if let Some(title) = &args.title {
                body.insert("title".to_string(), json!(title));
            }
            if let Some(notes) = &args.notes {
                body.insert("notes".to_string(), json!(notes));
            }
            if let Some(due) = &args.due {
                body.insert("due".to_string(), json!(due));
            }
            if let Some(status) = &args.status {
                body.insert("status".to_string(), json!(status));
            }
            if body.is_empty() {
                return Ok(ToolResult::error(format!(
                    "No fields provided to update in task `{}`.",
                    args.task_id
                )));
            }

            let url = self.client.url(
                &format!("tasks/v1/lists/{}/tasks/{}", args.tasklist_id, args.task_id),
                &[],
            )?;
            let response = self.client.patch(url, &Value::Object(body)).await?;
            if response["id"].is_null() {
                return Ok(ToolResult::error(format!(
                    "Failed to update task {} in {}.",
                    args.task_id, args.tasklist_id
                )));
            }
            Ok(ToolResult::success().with("task", response))
        })
        .await
    }

    pub async fn move_task(&self, args: MoveTaskArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if let Some(err) = check_tasklist_id(&args.tasklist_id) {
                return Ok(err);
            }
            if let Some(err) = check_task_id(&args.task_id) {
                return Ok(err);
            }
            if let Some(destination) = &args.destination_tasklist_id {
                if destination.trim().is_empty() {
                    return Ok(ToolResult::error(format!(
                        "Invalid destination_tasklist: {}",
                        destination
                    )));
                }
            }
            if let Some(parent) = &args.parent_task_id {
                if parent.trim().is_empty() {
                    return Ok(ToolResult::error(format!(
                        "Invalid value provided for parent: {}",
                        parent
                    )));
                }
            }
            if let Some(previous) = &args.previous_task_id {
                if previous.trim().is_empty() {
                    return Ok(ToolResult::error(format!(
                        "Invalid value provided for previous: {}",
                        previous
                    )));
                }
            }

            let mut query = Vec::new();
            if let Some(destination) = &args.destination_tasklist_id {
                query.push(("destinationTasklist", destination.clone()));
            }
            if let Some(parent) = &args.parent_task_id {
                query.push(("parent", parent.clone()));
            }
            if let Some(previous) = &args.previous_task_id {
                query.push(("previous", previous.clone()));
            }
            let url = self.client.url(
                &format!(
                    "tasks/v1/lists/{}/tasks/{}/move",
                    args.tasklist_id, args.task_id
                ),
                &query,
            )?;
            let response = self.client.post_empty(url).await?;
            if response.is_null() {
                return Ok(ToolResult::error(format!(
                    "Failed to move task {} in tasklist {}",
                    args.task_id, args.tasklist_id
                )));
            }
            Ok(ToolResult::success().with("task", response))
        })
        .await
    }

    pub async fn delete_task(&self, args: TaskRefArgs) -> ToolResult {
        envelope::guard(Surface::Tasks, async {
            if let Some(err) = check_tasklist_id(&args.tasklist_id) {
                return Ok(err);
            }
            if let Some(err) = check_task_id(&args.task_id) {
                return Ok(err);
            }
            let url = self.client.url(
                &format!("tasks/v1/lists/{}/tasks/{}", args.tasklist_id, args.task_id),
                &[],
            )?;
            self.client.delete(url).await?;
            Ok(ToolResult::success_msg(format!(
                "Task {} deleted from tasklist `{}`",
                args.task_id, args.tasklist_id
            )))
        })
        .await
    }
}

pub fn declarations() -> Vec<ToolSpec> {
    use super::{boolean, enumerated, integer, string};

    let tasklist_id = || string("Unique id of the tasklist.");
    let task_id = || string("Unique id of the task.");

    vec![
        ToolSpec::new("list_tasklists", "List the user's tasklists.").optional(
            "max_results",
            integer("Maximum number of tasklists to return (1-1000, default 5)."),
        ),
        ToolSpec::new("create_tasklist", "Create a new tasklist.")
            .required("title", string("Title of the tasklist to create.")),
        ToolSpec::new("get_tasklist", "Retrieve a tasklist.")
            .required("tasklist_id", tasklist_id()),
        ToolSpec::new("update_tasklist", "Rename a tasklist.")
            .required("tasklist_id", tasklist_id())
            .required("new_title", string("New title for the tasklist.")),
        ToolSpec::new("delete_tasklist", "Delete a tasklist and all its tasks.")
            .required("tasklist_id", tasklist_id()),
        ToolSpec::new("clear_tasklist", "Clear completed tasks from a tasklist.")
            .required("tasklist_id", tasklist_id()),
        ToolSpec::new("list_tasks", "List tasks in a tasklist.")
            .required("tasklist_id", tasklist_id())
            .optional(
                "completed_max",
                string("Upper bound for a task's completion date (RFC3339)."),
            )
            .optional(
                "completed_min",
                string("Lower bound for a task's completion date (RFC3339)."),
            )
            .optional(
                "due_max",
                string("Upper bound for a task's due date (RFC3339)."),
            )
            .optional(
                "due_min",
                string("Lower bound for a task's due date (RFC3339)."),
            )
            .optional(
                "max_results",
                integer("Maximum number of tasks to return (1-100, default 20)."),
            )
            .optional("show_assigned", boolean("Whether to include assigned tasks."))
            .optional(
                "show_completed",
                boolean("Whether to include completed tasks."),
            )
            .optional("show_deleted", boolean("Whether to include deleted tasks."))
            .optional("show_hidden", boolean("Whether to include hidden tasks."))
            .optional(
                "updated_min",
                string("Lower bound for a task's last modification time (RFC3339)."),
            ),
        ToolSpec::new("create_task", "Create a task in a tasklist.")
            .required("tasklist_id", tasklist_id())
            .required("title", string("Title of the task."))
            .optional("notes", string("Notes describing the task."))
            .optional("due", string("Due date of the task (RFC3339)."))
            .optional("status", enumerated("Status of the task.", TASK_STATUSES)),
        ToolSpec::new("get_task", "Retrieve a task from a tasklist.")
            .required("tasklist_id", tasklist_id())
            .required("task_id", task_id()),
        ToolSpec::new("update_task", "Update fields of a task.")
            .required("tasklist_id", tasklist_id())
            .required("task_id", task_id())
            .optional("title", string("New title of the task."))
            .optional("notes", string("New notes for the task."))
            .optional("due", string("Updated due date (RFC3339)."))
            .optional(
                "status",
                enumerated("Updated status of the task.", TASK_STATUSES),
            ),
        ToolSpec::new("move_task", "Move a task within or across tasklists.")
            .required("tasklist_id", tasklist_id())
            .required("task_id", task_id())
            .optional(
                "destination_tasklist_id",
                string("Destination tasklist id."),
            )
            .optional("parent_task_id", string("New parent task id."))
            .optional(
                "previous_task_id",
                string("Id of the new previous sibling task."),
            ),
        ToolSpec::new("delete_task", "Delete a task from a tasklist.")
            .required("tasklist_id", tasklist_id())
            .required("task_id", task_id()),
    ]
}

#[async_trait]
impl ToolSurface for TasksTools {
    fn name(&self) -> &'static str {
        "tasks"
    }

    fn declarations(&self) -> Vec<ToolSpec> {
        declarations()
    }

    async fn call(&self, tool: &str, args: Value) -> ToolResult {
        super::dispatch_tool!(self, tool, args, {
            "list_tasklists" => list_tasklists,
            "create_tasklist" => create_tasklist,
            "get_tasklist" => get_tasklist,
            "update_tasklist" => update_tasklist,
            "delete_tasklist" => delete_tasklist,
            "clear_tasklist" => clear_tasklist,
            "list_tasks" => list_tasks,
            "create_task" => create_task,
            "get_task" => get_task,
            "update_task" => update_task,
            "move_task" => move_task,
            "delete_task" => delete_task,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::TokenSource;
    use crate::tools::Status;

    fn tools(server: &mockito::Server) -> TasksTools {
        TasksTools::new(GoogleClient::new(
            server.url(),
            TokenSource::Fixed("test-token".to_string()),
        ))
    }

    #[tokio::test]
    async fn list_tasklists_defaults_to_five_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tasks/v1/users/@me/lists")
            .match_query(mockito::Matcher::UrlEncoded(
                "maxResults".to_string(),
                "5".to_string(),
            ))
            .with_status(200)
            .with_body(
                r#"{"items": [{"id": "tl1", "title": "Inbox", "etag": "e1",
                    "updated": "2024-01-01T00:00:00Z", "selfLink": "https://example.com/tl1"}]}"#,
            )
            .create_async()
            .await;

        let result = tools(&server)
            .list_tasklists(ListTasklistsArgs { max_results: None })
            .await;
        assert_eq!(result.status(), Status::Success);
        let tasklists = result.get("tasklists").unwrap().as_array().unwrap();
        assert_eq!(tasklists[0]["tasklist_id"], "tl1");
        assert_eq!(tasklists[0]["title"], "Inbox");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_tasklists_range_check() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .list_tasklists(ListTasklistsArgs {
                max_results: Some(5000),
            })
            .await;
        assert_eq!(
            result.message(),
            Some("Invalid max_results value: 5000. Must be between 1 and 1000.")
        );
    }

    #[tokio::test]
    async fn create_tasklist_rejects_oversized_titles() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .create_tasklist(CreateTasklistArgs {
                title: "x".repeat(1025),
            })
            .await;
        assert_eq!(
            result.message(),
            Some("Title exceeds maximum length of 1024 characters.")
        );
    }

    #[tokio::test]
    async fn list_tasks_forces_show_hidden_with_completed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tasks/v1/lists/tl1/tasks")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("maxResults".to_string(), "20".to_string()),
                mockito::Matcher::UrlEncoded("showCompleted".to_string(), "true".to_string()),
                mockito::Matcher::UrlEncoded("showHidden".to_string(), "true".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"items": [{"id": "t1", "title": "Ship it"}]}"#)
            .create_async()
            .await;

        let result = tools(&server)
            .list_tasks(ListTasksArgs {
                tasklist_id: "tl1".to_string(),
                completed_max: None,
                completed_min: None,
                due_max: None,
                due_min: None,
                max_results: None,
                show_assigned: None,
                show_completed: Some(true),
                show_deleted: None,
                show_hidden: None,
                updated_min: None,
            })
            .await;
        assert_eq!(result.status(), Status::Success);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_tasks_validates_due_bounds() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .list_tasks(ListTasksArgs {
                tasklist_id: "tl1".to_string(),
                completed_max: None,
                completed_min: None,
                due_max: Some("next week".to_string()),
                due_min: None,
                max_results: None,
                show_assigned: None,
                show_completed: None,
                show_deleted: None,
                show_hidden: None,
                updated_min: None,
            })
            .await;
        assert_eq!(
            result.message(),
            Some(
                "Invalid due_max format: 'next week'. Expected RFC3339 format (e.g., 2023-10-01T12:00:00Z)."
            )
        );
    }

    #[tokio::test]
    async fn create_task_defaults_status_to_needs_action() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks/v1/lists/tl1/tasks")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "title": "Ship it", "status": "needsAction"
            })))
            .with_status(200)
            .with_body(r#"{"id": "t1", "title": "Ship it", "status": "needsAction"}"#)
            .create_async()
            .await;

        let result = tools(&server)
            .create_task(CreateTaskArgs {
                tasklist_id: "tl1".to_string(),
                title: "Ship it".to_string(),
                notes: None,
                due: None,
                status: None,
            })
            .await;
        assert_eq!(result.status(), Status::Success);
        assert_eq!(result.get("task").unwrap()["id"], "t1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_task_rejects_unknown_status() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .create_task(CreateTaskArgs {
                tasklist_id: "tl1".to_string(),
                title: "Ship it".to_string(),
                notes: None,
                due: None,
                status: Some("done".to_string()),
            })
            .await;
        assert_eq!(
            result.message(),
            Some(
                "Invalid status value: `done`. Must be one of these: `needsAction` or `completed`."
            )
        );
    }

    #[tokio::test]
    async fn update_task_requires_some_field() {
        let server = mockito::Server::new_async().await;
        let result = tools(&server)
            .update_task(UpdateTaskArgs {
                tasklist_id: "tl1".to_string(),
                task_id: "t1".to_string(),
                title: None,
                notes: None,
                due: None,
                status: None,
            })
            .await;
        assert_eq!(
            result.message(),
            Some("No fields provided to update in task `t1`.")
        );
    }

    #[tokio::test]
    async fn move_task_passes_destination_as_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tasks/v1/lists/tl1/tasks/t1/move")
            .match_query(mockito::Matcher::UrlEncoded(
                "destinationTasklist".to_string(),
                "tl2".to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"id": "t1", "position": "000001"}"#)
            .create_async()
            .await;

        let result = tools(&server)
            .move_task(MoveTaskArgs {
                tasklist_id: "tl1".to_string(),
                task_id: "t1".to_string(),
                destination_tasklist_id: Some("tl2".to_string()),
                parent_task_id: None,
                previous_task_id: None,
            })
            .await;
        assert_eq!(result.status(), Status::Success);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn clear_tasklist_reports_cleared() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/tasks/v1/lists/tl1/clear")
            .with_status(204)
            .create_async()
            .await;

        let result = tools(&server)
            .clear_tasklist(TasklistIdArgs {
                tasklist_id: "tl1".to_string(),
            })
            .await;
        assert_eq!(
            result.message(),
            Some("Completed tasks cleared from tasklist `tl1`.")
        );
    }

    #[tokio::test]
    async fn delete_task_confirms_removal() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/tasks/v1/lists/tl1/tasks/t1")
            .with_status(204)
            .create_async()
            .await;

        let result = tools(&server)
            .delete_task(TaskRefArgs {
                tasklist_id: "tl1".to_string(),
                task_id: "t1".to_string(),
            })
            .await;
        assert_eq!(result.message(), Some("Task t1 deleted from tasklist `tl1`"));
    }
}
