//! Tool registry - named handlers looked up by the dispatcher

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Arguments, Tool};
use crate::error::Error;
use crate::rpc::RpcClient;
use crate::Result;

/// Tool definition: name, description and argument schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    /// Names listed under the schema's `required` key.
    pub fn required_arguments(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Check that every required argument is present and non-null.
    pub fn validate(&self, arguments: &Arguments) -> Result<()> {
        for name in self.required_arguments() {
            match arguments.get(name) {
                Some(value) if !value.is_null() => {}
                _ => {
                    return Err(Error::MissingArgument {
                        tool: self.name.clone(),
                        argument: name.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Copy of `arguments` with schema defaults filled in for absent keys.
    pub fn with_defaults(&self, arguments: &Arguments) -> Arguments {
        let mut filled = arguments.clone();
        let properties = self
            .parameters
            .get("properties")
            .and_then(Value::as_object);

        if let Some(properties) = properties {
            for (name, schema) in properties {
                if let Some(default) = schema.get("default") {
                    filled.entry(name.clone()).or_insert_with(|| default.clone());
                }
            }
        }

        filled
    }
}

/// Registry of tool handlers keyed by name. Cheap to clone and read-only
/// once built.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the ARGO tools answered from local sample data
    pub fn simulation() -> Self {
        let mut registry = Self::new();
        for tool in super::simulation::tools() {
            registry.register_arc(tool);
        }
        registry
    }

    /// Registry with the ARGO tools forwarded to a remote tool server
    pub fn remote(client: Arc<RpcClient>) -> Self {
        let mut registry = Self::new();
        for tool in super::remote::tools(client) {
            registry.register_arc(tool);
        }
        registry
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Tool definitions, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.to_definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Registered tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::EchoTool;
    use serde_json::json;

    fn definition() -> ToolDefinition {
        ToolDefinition {
            name: "getARGOByLocation".to_string(),
            description: String::new(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "latitude": {"type": "number"},
                    "longitude": {"type": "number"},
                    "radius": {"type": "number", "default": 100}
                },
                "required": ["latitude", "longitude"]
            }),
        }
    }

    #[test]
    fn test_registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool::new("echo"));

        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.tool_names(), vec!["echo"]);
    }

    #[test]
    fn test_simulation_registry_has_argo_tools() {
        let registry = ToolRegistry::simulation();
        assert_eq!(
            registry.tool_names(),
            vec!["getARGOByDateRange", "getARGOByLocation", "queryARGO", "retrieveARGO"]
        );
    }

    #[test]
    fn test_validate_reports_first_missing_argument() {
        let mut args = Arguments::new();
        args.insert("latitude".to_string(), json!(-5.0));

        let err = definition().validate(&args).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required argument 'longitude' for tool 'getARGOByLocation'"
        );
    }

    #[test]
    fn test_null_counts_as_missing() {
        let mut args = Arguments::new();
        args.insert("latitude".to_string(), json!(1.0));
        args.insert("longitude".to_string(), Value::Null);
        assert!(definition().validate(&args).is_err());
    }

    #[test]
    fn test_defaults_do_not_override_given_values() {
        let mut args = Arguments::new();
        args.insert("latitude".to_string(), json!(1.0));
        let filled = definition().with_defaults(&args);
        assert_eq!(filled["radius"], json!(100));

        args.insert("radius".to_string(), json!(25));
        let filled = definition().with_defaults(&args);
        assert_eq!(filled["radius"], json!(25));
    }
}
