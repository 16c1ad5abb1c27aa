// Tool trait, registry and JSON schema helpers

use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult>;

    /// Whether the tool changes remote state
    fn access(&self) -> ToolAccess {
        ToolAccess::Read
    }
}

/// Effect of a tool on the remote platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ToolAccess {
    /// Read-only operations, served through the response cache
    Read,
    /// Creates or modifies remote data and invalidates related cache entries
    Write,
}

/// Tool registry for managing available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let schema = tool.schema();
        self.tools.insert(schema.name, tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool schemas, sorted by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Names of the tools with the given access, sorted
    pub fn names_with_access(&self, access: ToolAccess) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .iter()
            .filter(|(_, tool)| tool.access() == access)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}

/// Properties shared by every cursor-paginated list tool
pub fn pagination_properties() -> serde_json::Map<String, serde_json::Value> {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "per_page".to_string(),
        json_schema_integer("Results per page (1-1000, default 500)"),
    );
    properties.insert(
        "after".to_string(),
        json_schema_string("Cursor for the page after this one"),
    );
    properties.insert(
        "before".to_string(),
        json_schema_string("Cursor for the page before this one"),
    );
    properties.insert(
        "include_total_count".to_string(),
        json_schema_boolean("Include the total number of records (slower)"),
    );
    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CallToolResult;

    struct Named(&'static str, ToolAccess);

    #[async_trait::async_trait]
    impl Tool for Named {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.0.to_string(),
                description: String::new(),
                input_schema: json_schema_object(serde_json::json!({}), vec![]),
            }
        }

        async fn execute(&self, _arguments: serde_json::Value) -> Result<CallToolResult> {
            Ok(CallToolResult::text(self.0))
        }

        fn access(&self) -> ToolAccess {
            self.1
        }
    }

    #[test]
    fn test_schemas_sorted_and_access_split() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Named("list_tags", ToolAccess::Read)));
        registry.register(Arc::new(Named("create_tag", ToolAccess::Write)));
        registry.register(Arc::new(Named("get_account", ToolAccess::Read)));

        let names: Vec<String> = registry.list_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["create_tag", "get_account", "list_tags"]);
        assert_eq!(registry.names_with_access(ToolAccess::Write), vec!["create_tag"]);
        assert!(registry.contains("list_tags"));
        assert!(registry.get("missing").is_none());
    }
}
