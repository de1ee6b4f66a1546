//! Tool shapes the agent works with.
//!
//! Decoded from the `rmcp` model through its JSON form so that the agent only
//! depends on the fields it reads.

use serde::Deserialize;
use serde_json::Value;

use super::McpError;

#[derive(Debug, Clone, Deserialize)]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default = "empty_schema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

impl McpTool {
    pub(crate) fn from_wire(tool: rmcp::model::Tool) -> Result<Self, McpError> {
        Ok(serde_json::from_value(serde_json::to_value(tool)?)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        #[serde(rename = "mimeType", default)]
        mime_type: Option<String>,
    },
    Resource {
        resource: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl CallToolResult {
    pub(crate) fn from_wire(result: rmcp::model::CallToolResult) -> Result<Self, McpError> {
        Ok(serde_json::from_value(serde_json::to_value(result)?)?)
    }

    /// A result with nothing the agent could read back
    pub fn is_empty(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Flatten the content blocks into text for the LLM
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ToolContent::Text { text } => Some(text.clone()),
                ToolContent::Image { mime_type } => Some(match mime_type {
                    Some(mime_type) => format!("[{} image]", mime_type),
                    None => "[image]".to_string(),
                }),
                ToolContent::Resource { resource } => resource["text"]
                    .as_str()
                    .map(str::to_string)
                    .or_else(|| resource["uri"].as_str().map(|uri| format!("[resource {}]", uri))),
                ToolContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
