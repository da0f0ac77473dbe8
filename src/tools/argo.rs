//! ARGO float data tools: names, descriptions and argument schemas.
//!
//! Both the simulated and the remote handlers share these definitions, so
//! the dispatcher enforces the same required arguments and defaults in
//! either mode.

use serde_json::{json, Value};

/// The four data-retrieval tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgoTool {
    Query,
    Retrieve,
    ByLocation,
    ByDateRange,
}

impl ArgoTool {
    pub const ALL: [ArgoTool; 4] = [
        ArgoTool::Query,
        ArgoTool::Retrieve,
        ArgoTool::ByLocation,
        ArgoTool::ByDateRange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArgoTool::Query => "queryARGO",
            ArgoTool::Retrieve => "retrieveARGO",
            ArgoTool::ByLocation => "getARGOByLocation",
            ArgoTool::ByDateRange => "getARGOByDateRange",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ArgoTool::Query => "Execute SQL queries on the argo_profiles table",
            ArgoTool::Retrieve => "Semantic vector search over profiles using natural language",
            ArgoTool::ByLocation => "Find profiles near geographic coordinates",
            ArgoTool::ByDateRange => "Retrieve profiles within a date range",
        }
    }

    pub fn parameters(&self) -> Value {
        match self {
            ArgoTool::Query => json!({
                "type": "object",
                "properties": {
                    "sql": {"type": "string", "description": "SQL query against argo_profiles"},
                    "page": {"type": "integer", "default": 1},
                    "pageSize": {"type": "integer", "default": 100}
                },
                "required": ["sql"]
            }),
            ArgoTool::Retrieve => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Natural language description"},
                    "limit": {"type": "integer", "default": 10}
                },
                "required": ["query"]
            }),
            ArgoTool::ByLocation => json!({
                "type": "object",
                "properties": {
                    "latitude": {"type": "number"},
                    "longitude": {"type": "number"},
                    "radius": {"type": "number", "description": "Search radius in km", "default": 100}
                },
                "required": ["latitude", "longitude"]
            }),
            ArgoTool::ByDateRange => json!({
                "type": "object",
                "properties": {
                    "startDate": {"type": "string", "description": "ISO 8601 date"},
                    "endDate": {"type": "string", "description": "ISO 8601 date"},
                    "page": {"type": "integer", "default": 1},
                    "pageSize": {"type": "integer", "default": 100}
                },
                "required": ["startDate", "endDate"]
            }),
        }
    }
}
