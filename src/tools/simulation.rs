//! Simulated ARGO tools - answer from fixed sample profiles, no network.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::argo::ArgoTool;
use super::{Arguments, Tool, ToolEnvelope};
use crate::error::Error;
use crate::Result;

/// ARGO tool backed by in-memory sample data
pub struct SimulatedArgoTool {
    tool: ArgoTool,
}

impl SimulatedArgoTool {
    pub fn new(tool: ArgoTool) -> Self {
        Self { tool }
    }
}

/// All four simulated tools
pub fn tools() -> Vec<Arc<dyn Tool>> {
    ArgoTool::ALL
        .into_iter()
        .map(|t| Arc::new(SimulatedArgoTool::new(t)) as Arc<dyn Tool>)
        .collect()
}

#[async_trait]
impl Tool for SimulatedArgoTool {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn description(&self) -> &str {
        self.tool.description()
    }

    fn parameters(&self) -> Value {
        self.tool.parameters()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<ToolEnvelope> {
        let envelope = match self.tool {
            ArgoTool::Query => {
                let profiles = json!([
                    profile(1, "D1901393_001.nc", "2023-06-15T12:00:00Z", -5.2, 67.8, 45.5, 28.5, 35.2),
                    profile(2, "D1901394_002.nc", "2023-07-20T12:00:00Z", -8.1, 72.3, 32.8, 29.2, 34.8),
                ]);
                ToolEnvelope::success(json!({
                    "data": profiles,
                    "metadata": {
                        "total_count": 2,
                        "page": arguments.get("page").cloned().unwrap_or(json!(1)),
                        "page_size": arguments.get("pageSize").cloned().unwrap_or(json!(100)),
                        "has_next": false,
                        "query_time": now(),
                        "source": "supabase_postgres",
                        "region": "Indian Ocean"
                    }
                }))
                .with_metadata(metadata("supabase_postgres", 150))
            }
            ArgoTool::Retrieve => {
                let mut sample = profile(3, "D1901395_003.nc", "2023-08-01T12:00:00Z", -12.5, 78.9, 28.3, 30.1, 34.5);
                sample["summary"] = json!(
                    "SW Monsoon profile with shallow mixed layer and strong thermocline, reduced surface salinity"
                );
                ToolEnvelope::success(json!({
                    "profiles": [sample],
                    "similarities": [0.92],
                    "metadata": {
                        "query": arguments.get("query").cloned().unwrap_or(json!("")),
                        "total_results": 1,
                        "search_time": now(),
                        "source": "faiss_vector_search",
                        "region": "Indian Ocean",
                        "seasonal_context": "SW Monsoon period"
                    }
                }))
                .with_metadata(metadata("faiss_vector_search", 85))
            }
            ArgoTool::ByLocation => {
                let latitude = number(arguments, "latitude")?;
                let longitude = number(arguments, "longitude")?;
                ToolEnvelope::success(json!({
                    "profiles": [{
                        "id": "argo_loc_001",
                        "platform_number": "1901396",
                        "latitude": latitude + 0.1,
                        "longitude": longitude - 0.1,
                        "date": "2023-03-01T12:00:00Z",
                        "surface_temp": 20.1,
                        "surface_sal": 36.5
                    }],
                    "location": {
                        "latitude": latitude,
                        "longitude": longitude,
                        "radius": arguments.get("radius").cloned().unwrap_or(json!(100))
                    },
                    "count": 1
                }))
                .with_metadata(metadata("supabase_postgres", 120))
            }
            ArgoTool::ByDateRange => ToolEnvelope::success(json!({
                "profiles": [{
                    "id": "argo_date_001",
                    "platform_number": "1901397",
                    "latitude": 25.5,
                    "longitude": -80.2,
                    "date": "2023-06-15T12:00:00Z",
                    "surface_temp": 28.5,
                    "surface_sal": 36.8
                }],
                "dateRange": {
                    "startDate": arguments.get("startDate"),
                    "endDate": arguments.get("endDate")
                },
                "count": 1
            }))
            .with_metadata(metadata("supabase_postgres", 95)),
        };

        Ok(envelope)
    }
}

#[allow(clippy::too_many_arguments)]
fn profile(
    id: u32,
    file: &str,
    date: &str,
    lat: f64,
    lon: f64,
    mld: f64,
    surface_temp: f64,
    surface_sal: f64,
) -> Value {
    json!({
        "id": id,
        "file": file,
        "date": date,
        "lat": lat,
        "lon": lon,
        "mld": mld,
        "surfacetemp": surface_temp,
        "surfacesal": surface_sal,
        "direction": "ascending"
    })
}

fn number(arguments: &Arguments, key: &str) -> Result<f64> {
    arguments
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::Tool(format!("'{key}' must be a number")))
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn metadata(source: &str, execution_time_ms: u64) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("timestamp".to_string(), json!(now()));
    metadata.insert("source".to_string(), json!(source));
    metadata.insert("execution_time".to_string(), json!(execution_time_ms));
    metadata.insert("region".to_string(), json!("Indian Ocean"));
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_location_echoes_coordinates() {
        let tool = SimulatedArgoTool::new(ArgoTool::ByLocation);
        let mut args = Arguments::new();
        args.insert("latitude".to_string(), json!(10.0));
        args.insert("longitude".to_string(), json!(60.0));
        args.insert("radius".to_string(), json!(50));

        let envelope = tool.invoke(&args).await.unwrap();
        let data = envelope.data.unwrap();
        assert_eq!(data["location"]["radius"], json!(50));
        assert_eq!(data["location"]["latitude"], json!(10.0));
        assert_eq!(envelope.metadata.unwrap()["source"], json!("supabase_postgres"));
    }

    #[tokio::test]
    async fn test_location_rejects_non_numeric_coordinates() {
        let tool = SimulatedArgoTool::new(ArgoTool::ByLocation);
        let mut args = Arguments::new();
        args.insert("latitude".to_string(), json!("ten north"));
        args.insert("longitude".to_string(), json!(70.0));

        let err = tool.invoke(&args).await.unwrap_err();
        assert_eq!(err.to_string(), "Tool error: 'latitude' must be a number");
    }

    #[tokio::test]
    async fn test_query_returns_profiles() {
        let tool = SimulatedArgoTool::new(ArgoTool::Query);
        let envelope = tool.invoke(&Arguments::new()).await.unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap()["data"].as_array().unwrap().len(), 2);
    }
}
