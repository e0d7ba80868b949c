//! Tool definitions and registry for MCP server.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use crate::error::{Error, Result};
use crate::protocol::{ContentItem, ToolCallResult, ToolDefinition};
use crate::wiki::{EditRequest, WikiClient, DEFAULT_SUMMARY};

/// Tool trait for implementing MCP tools.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolCallResult>;
}

/// Context passed to tools during execution.
pub struct ToolContext {
    /// Client for the configured wiki. Holds no session state; every edit
    /// opens its own session.
    pub wiki: WikiClient,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(wiki: WikiClient) -> Self {
        Self { wiki }
    }
}

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    context: Arc<ToolContext>,
}

impl ToolRegistry {
    /// Create a new tool registry with the built-in tools.
    pub fn new(wiki: WikiClient) -> Self {
        let context = Arc::new(ToolContext::new(wiki));
        let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();

        let edit_page_tool = Arc::new(EditPageTool);
        tools.insert(edit_page_tool.definition().name.clone(), edit_page_tool);

        Self { tools, context }
    }

    /// Get tool definitions, sorted by name.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<_> = self.tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, arguments: serde_json::Value) -> Result<ToolCallResult> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        tool.execute(arguments, &self.context).await
    }
}

// ============================================================================
// Built-in Tools
// ============================================================================

/// Tool for creating or editing a wiki page.
pub struct EditPageTool;

#[async_trait::async_trait]
impl Tool for EditPageTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "edit_page".into(),
            description: "Create or update a page on a MediaWiki wiki via the Action API.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "Page title to edit or create"
                    },
                    "text": {
                        "type": "string",
                        "description": "Full wikitext replacement"
                    },
                    "appendtext": {
                        "type": "string",
                        "description": "Text to append to the existing page content"
                    },
                    "summary": {
                        "type": "string",
                        "default": DEFAULT_SUMMARY,
                        "description": "Edit summary (edit comment)"
                    },
                    "username": {
                        "type": "string",
                        "description": "Optional username for login. If omitted, the edit is anonymous (if allowed)."
                    },
                    "password": {
                        "type": "string",
                        "description": "Password corresponding to the username."
                    }
                },
                "required": ["title"],
                "additionalProperties": false
            }),
        }
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolCallResult> {
        if arguments.is_null() {
            return Err(Error::InvalidParams(
                "Arguments are required for tool invocation.".into(),
            ));
        }

        let request: EditRequest =
            serde_json::from_value(arguments).map_err(|e| Error::InvalidParams(e.to_string()))?;

        let body = context.wiki.edit_page(&request).await?;

        Ok(ToolCallResult {
            content: vec![ContentItem::text(serde_json::to_string_pretty(&body)?)],
            is_error: false,
        })
    }
}
