//! Tool surfaces exposed to the orchestrator. Each surface owns a set of
//! named operations, publishes their JSON schema declarations, and
//! dispatches incoming calls by tool name.

pub mod calendar;
pub mod drive;
pub mod envelope;
pub mod gmail;
pub mod mime;
pub mod tasks;
pub mod validate;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::AppConfig;
use crate::google::{GoogleClient, TokenSource};

pub use envelope::{Status, Surface, ToolResult};

#[derive(Clone, Serialize)]
pub struct Property {
    pub r#type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Property>>,
}

pub fn string(description: &str) -> Property {
    Property {
        r#type: "string".to_string(),
        description: description.to_string(),
        r#enum: None,
        items: None,
    }
}

pub fn integer(description: &str) -> Property {
    Property {
        r#type: "integer".to_string(),
        description: description.to_string(),
        r#enum: None,
        items: None,
    }
}

pub fn boolean(description: &str) -> Property {
    Property {
        r#type: "boolean".to_string(),
        description: description.to_string(),
        r#enum: None,
        items: None,
    }
}

pub fn enumerated(description: &str, values: &[&str]) -> Property {
    Property {
        r#type: "string".to_string(),
        description: description.to_string(),
        r#enum: Some(values.iter().map(|v| v.to_string()).collect()),
        items: None,
    }
}

pub fn string_array(description: &str) -> Property {
    Property {
        r#type: "array".to_string(),
        description: description.to_string(),
        r#enum: None,
        items: Some(Box::new(string("element"))),
    }
}

#[derive(Serialize)]
pub struct Parameters {
    pub r#type: String,
    pub properties: BTreeMap<String, Property>,
    pub required: Vec<String>,
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

/// Declaration of a single tool, serialized into the `tools/list` response.
#[derive(Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Parameters,
    pub strict: bool,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: Parameters {
                r#type: "object".to_string(),
                properties: BTreeMap::new(),
                required: Vec::new(),
                additional_properties: false,
            },
            strict: true,
        }
    }

    pub fn required(mut self, name: &str, property: Property) -> Self {
        self.parameters.required.push(name.to_string());
        self.parameters.properties.insert(name.to_string(), property);
        self
    }

    pub fn optional(mut self, name: &str, property: Property) -> Self {
        self.parameters.properties.insert(name.to_string(), property);
        self
    }
}

/// A group of tools sharing one provider client and OAuth scope.
#[async_trait]
pub trait ToolSurface: Send + Sync {
    fn name(&self) -> &'static str;
    fn declarations(&self) -> Vec<ToolSpec>;
    async fn call(&self, tool: &str, args: Value) -> ToolResult;
}

/// Route a call to the matching operation, deserializing the argument
/// object into the operation's argument struct first.
macro_rules! dispatch_tool {
    ($self:ident, $tool:ident, $args:ident, { $($name:literal => $method:ident),* $(,)? }) => {
        match $tool {
            $(
                $name => match serde_json::from_value($args) {
                    Ok(parsed) => $self.$method(parsed).await,
                    Err(err) => $crate::tools::ToolResult::error(format!(
                        "Invalid arguments for {}: {}",
                        $tool, err
                    )),
                },
            )*
            _ => $crate::tools::ToolResult::error(format!("Unknown tool: {}", $tool)),
        }
    };
}
pub(crate) use dispatch_tool;

/// Construct the surface selected on the command line, wired to its API
/// base URL from the config.
pub fn build_surface(
    surface: Surface,
    config: &AppConfig,
    token: TokenSource,
) -> Box<dyn ToolSurface> {
    match surface {
        Surface::Gmail => Box::new(gmail::GmailTools::new(GoogleClient::new(
            &config.gmail_api_base_url,
            token,
        ))),
        Surface::Calendar => Box::new(calendar::CalendarTools::new(GoogleClient::new(
            &config.calendar_api_base_url,
            token,
        ))),
        Surface::Drive => Box::new(drive::DriveTools::new(GoogleClient::new(
            &config.drive_api_base_url,
            token,
        ))),
        Surface::Tasks => Box::new(tasks::TasksTools::new(GoogleClient::new(
            &config.tasks_api_base_url,
            token,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_spec_serializes_with_json_schema_keywords() {
        let spec = ToolSpec::new("list_messages", "List messages.")
            .required("user_id", string("User id."))
            .optional("max_results", integer("Cap on results."))
            .optional("format", enumerated("Payload format.", &["full", "minimal"]));
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["name"], "list_messages");
        assert_eq!(json["parameters"]["type"], "object");
        assert_eq!(json["parameters"]["required"], serde_json::json!(["user_id"]));
        assert_eq!(json["parameters"]["additionalProperties"], false);
        assert_eq!(
            json["parameters"]["properties"]["format"]["enum"],
            serde_json::json!(["full", "minimal"])
        );
        assert_eq!(json["strict"], true);
    }

    #[test]
    fn array_properties_carry_item_schemas() {
        let json = serde_json::to_value(string_array("Label ids.")).unwrap();
        assert_eq!(json["type"], "array");
        assert_eq!(json["items"]["type"], "string");
    }
}
