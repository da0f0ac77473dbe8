//! Prompt text for the draft and synthesis calls.

use crate::tools::{ToolDefinition, ToolResult, DIRECTIVE_MARKER};
use crate::Result;

const DOMAIN_PROMPT: &str = r#"You are an expert oceanographic data analyst specializing in Indian Ocean ARGO float data.

ARGO PROFILE SCHEMA (table argo_profiles):
- id, file, date, lat, lon
- mld: Mixed Layer Depth (m)
- thermoclinedepth, salinitymindepth, salinitymaxdepth (m)
- meanstratification: mean stratification index
- ohc_0_200m: Ocean Heat Content 0-200m (J/m^2)
- surfacetemp (degC), surfacesal (PSU)
- n_levels, direction (ascending/descending)

REGIONAL CONTEXT:
- SW Monsoon runs June-September, NE Monsoon December-March
- Bay of Bengal surface freshening, Arabian Sea high salinity
- Strong thermoclines and variable mixed layer depths

Always give Indian Ocean context, relate mixed layer depth and salinity to the monsoon cycle, and use proper units."#;

/// Instructions appended to the tool results for the synthesis call.
pub const SYNTHESIS_INSTRUCTIONS: &str = r#"Please:
1. Synthesize the data into a coherent response
2. Include relevant oceanographic context and interpretation
3. Highlight key findings and patterns
4. Mention data quality and reliability where relevant
5. Use appropriate scientific terminology
6. Format the response clearly with proper units

Provide a natural language response that directly answers the user's question."#;

/// System prompt listing the available tools and the directive format.
pub fn system_prompt(tools: &[ToolDefinition]) -> String {
    let mut prompt = String::with_capacity(DOMAIN_PROMPT.len() + 256 * tools.len());
    prompt.push_str(DOMAIN_PROMPT);
    prompt.push_str("\n\nAVAILABLE TOOLS:\n");

    for (i, tool) in tools.iter().enumerate() {
        let required = tool.required_arguments().join(", ");
        prompt.push_str(&format!(
            "{}. {} - {}\n   Required arguments: {}\n   Schema: {}\n",
            i + 1,
            tool.name,
            tool.description,
            if required.is_empty() { "none" } else { required.as_str() },
            tool.parameters
        ));
    }

    prompt.push_str(&format!(
        "\nWhen you need to use a tool, put each request on its own line as:\n{} {{\"tool\": \"toolName\", \"arguments\": {{...}}, \"call_id\": \"unique_id\"}}",
        DIRECTIVE_MARKER
    ));
    prompt
}

/// User content for the synthesis call: serialized results plus instructions.
pub fn synthesis_prompt(results: &[ToolResult]) -> Result<String> {
    let summaries: Vec<serde_json::Value> = results.iter().map(ToolResult::summary).collect();
    let serialized = serde_json::to_string_pretty(&summaries)?;

    Ok(format!(
        "Based on the tool execution results below, provide a comprehensive answer to the user's query.\n\nTOOL RESULTS:\n{}\n\n{}",
        serialized, SYNTHESIS_INSTRUCTIONS
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;

    #[test]
    fn test_system_prompt_lists_tools_and_marker() {
        let prompt = system_prompt(&ToolRegistry::simulation().definitions());
        assert!(prompt.contains("getARGOByLocation"));
        assert!(prompt.contains("Required arguments: latitude, longitude"));
        assert!(prompt.contains("TOOL_CALL:"));
    }

    #[test]
    fn test_synthesis_prompt_contains_results() {
        let prompt = synthesis_prompt(&[ToolResult::failure("c7", "Unknown tool: foo")]).unwrap();
        assert!(prompt.contains("\"call_id\": \"c7\""));
        assert!(prompt.contains("Unknown tool: foo"));
        assert!(prompt.contains("data quality"));
    }
}
