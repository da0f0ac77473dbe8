//! Directive parser - extracts tool calls from free-form model output.
//!
//! Parsing runs in two steps. [`lex`] splits the text into [`Segment`]s,
//! finding each `TOOL_CALL:` marker and the balanced JSON object after it
//! (string literals and escapes are honoured, so nested objects and braces
//! inside values are fine). [`ToolCallParser::parse`] then decodes every
//! directive segment into a [`ToolCall`], skipping the ones that fail.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use super::{Arguments, ToolCall};
use crate::error::Error;
use crate::Result;

/// Marker that introduces a tool directive in model output.
pub const DIRECTIVE_MARKER: &str = "TOOL_CALL:";

/// A lexed slice of model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Plain prose between directives.
    Text(&'a str),
    /// The JSON object following a marker, braces included.
    Directive(&'a str),
    /// A marker without a balanced object after it. Holds everything up to
    /// the next marker.
    Malformed(&'a str),
}

impl Segment<'_> {
    fn is_directive(&self) -> bool {
        matches!(self, Segment::Directive(_) | Segment::Malformed(_))
    }
}

/// Split `text` into prose and directive segments, left to right.
pub fn lex(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while let Some(found) = text[pos..].find(DIRECTIVE_MARKER) {
        let marker_at = pos + found;
        if marker_at > pos {
            segments.push(Segment::Text(&text[pos..marker_at]));
        }

        let after_marker = marker_at + DIRECTIVE_MARKER.len();
        let body_start = after_marker + leading_whitespace(&text[after_marker..]);

        match scan_object(&text[body_start..]) {
            Some(len) => {
                segments.push(Segment::Directive(&text[body_start..body_start + len]));
                pos = body_start + len;
            }
            None => {
                let end = text[after_marker..]
                    .find(DIRECTIVE_MARKER)
                    .map(|i| after_marker + i)
                    .unwrap_or(text.len());
                segments.push(Segment::Malformed(&text[after_marker..end]));
                pos = end;
            }
        }
    }

    if pos < text.len() {
        segments.push(Segment::Text(&text[pos..]));
    }

    segments
}

fn leading_whitespace(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Length of the balanced `{...}` at the start of `s`, if there is one.
fn scan_object(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extracts [`ToolCall`]s from assistant text.
pub struct ToolCallParser;

impl ToolCallParser {
    /// Check whether the text contains at least one directive marker.
    pub fn contains_directive(text: &str) -> bool {
        text.contains(DIRECTIVE_MARKER)
    }

    /// Extract tool calls in order of appearance.
    ///
    /// Malformed directives are logged and skipped. Calls without a
    /// `call_id` get `call_<n>`, where `n` is the directive's position among
    /// all markers in the text. Ids are unique within the returned batch.
    pub fn parse(text: &str) -> Vec<ToolCall> {
        let mut calls = Vec::new();
        let mut seen = HashSet::new();

        let directives = lex(text).into_iter().filter(Segment::is_directive);

        for (position, segment) in directives.enumerate() {
            let body = match segment {
                Segment::Directive(body) => body,
                Segment::Malformed(rest) => {
                    warn!(position, "Skipping tool directive without a JSON object: {}", preview(rest));
                    continue;
                }
                Segment::Text(_) => continue,
            };

            match decode_directive(body) {
                Ok((tool_name, arguments, call_id)) => {
                    let call_id = unique_id(
                        call_id.unwrap_or_else(|| format!("call_{position}")),
                        &mut seen,
                    );
                    debug!(tool = %tool_name, call_id = %call_id, "Extracted tool call");
                    calls.push(ToolCall {
                        tool_name,
                        arguments,
                        call_id,
                    });
                }
                Err(e) => {
                    warn!(position, "Skipping tool directive: {}", e);
                }
            }
        }

        calls
    }
}

fn decode_directive(body: &str) -> Result<(String, Arguments, Option<String>)> {
    let value: Value = serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;
    let mut object = match value {
        Value::Object(object) => object,
        _ => return Err(Error::Parse("directive is not a JSON object".to_string())),
    };

    let tool_name = match object.remove("tool") {
        Some(Value::String(name)) if !name.is_empty() => name,
        Some(_) => return Err(Error::Parse("'tool' must be a non-empty string".to_string())),
        None => return Err(Error::Parse("missing 'tool'".to_string())),
    };

    let arguments = match object.remove("arguments") {
        Some(Value::Object(arguments)) => arguments,
        Some(_) => return Err(Error::Parse("'arguments' must be an object".to_string())),
        None => return Err(Error::Parse("missing 'arguments'".to_string())),
    };

    let call_id = match object.remove("call_id") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => return Err(Error::Parse("'call_id' must be a string".to_string())),
    };

    Ok((tool_name, arguments, call_id))
}

fn unique_id(id: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(id.clone()) {
        return id;
    }

    let mut n = 1;
    loop {
        let candidate = format!("{id}_{n}");
        if seen.insert(candidate.clone()) {
            warn!("Duplicate call_id '{}' renamed to '{}'", id, candidate);
            return candidate;
        }
        n += 1;
    }
}

fn preview(s: &str) -> String {
    let trimmed = s.trim();
    match trimmed.char_indices().nth(60) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_skips_malformed_trailing_directive() {
        let text = r#"Salinity? TOOL_CALL: {"tool":"queryARGO","arguments":{"sql":"SELECT 1"},"call_id":"c1"} more text TOOL_CALL: {bad json"#;
        let calls = ToolCallParser::parse(text);

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "queryARGO");
        assert_eq!(calls[0].call_id, "c1");
        assert_eq!(calls[0].arguments.get("sql"), Some(&json!("SELECT 1")));
    }

    #[test]
    fn test_no_directives() {
        assert!(ToolCallParser::parse("The mixed layer is shallow here.").is_empty());
        assert!(!ToolCallParser::contains_directive("plain answer"));
    }

    #[test]
    fn test_nested_objects_and_braces_in_strings() {
        let text = r#"TOOL_CALL: {"tool": "queryARGO", "arguments": {"sql": "SELECT '}' FROM t", "filter": {"lat": {"min": -10}}}}"#;
        let calls = ToolCallParser::parse(text);

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments["sql"], json!("SELECT '}' FROM t"));
        assert_eq!(calls[0].arguments["filter"]["lat"]["min"], json!(-10));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"TOOL_CALL: {"tool": "retrieveARGO", "arguments": {"query": "say \"}\" please"}}"#;
        let calls = ToolCallParser::parse(text);

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].arguments["query"], json!("say \"}\" please"));
    }

    #[test]
    fn test_order_preserved_with_interleaved_malformed() {
        let text = concat!(
            r#"TOOL_CALL: {"tool": "a", "arguments": {}} "#,
            r#"TOOL_CALL: {"tool": "missing_args"} "#,
            r#"TOOL_CALL: {"tool": "b", "arguments": {}} "#,
            "TOOL_CALL: not json at all ",
            r#"TOOL_CALL: {"arguments": {}} "#,
            r#"TOOL_CALL: {"tool": "c", "arguments": {"x": 1}}"#,
        );
        let calls = ToolCallParser::parse(text);

        let names: Vec<&str> = calls.iter().map(|c| c.tool_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_synthetic_ids_follow_position() {
        let text = concat!(
            r#"TOOL_CALL: {"tool": "a", "arguments": {}}"#,
            "\n",
            r#"TOOL_CALL: {"tool": "b", "arguments": {}, "call_id": "mine"}"#,
            "\n",
            r#"TOOL_CALL: {"tool": "c", "arguments": {}}"#,
        );
        let ids: Vec<String> = ToolCallParser::parse(text)
            .into_iter()
            .map(|c| c.call_id)
            .collect();
        assert_eq!(ids, vec!["call_0", "mine", "call_2"]);

        // Same input, same ids.
        let again: Vec<String> = ToolCallParser::parse(text)
            .into_iter()
            .map(|c| c.call_id)
            .collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn test_duplicate_ids_made_unique() {
        let text = concat!(
            r#"TOOL_CALL: {"tool": "a", "arguments": {}, "call_id": "x"} "#,
            r#"TOOL_CALL: {"tool": "b", "arguments": {}, "call_id": "x"}"#,
        );
        let calls = ToolCallParser::parse(text);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].call_id, "x");
        assert_eq!(calls[1].call_id, "x_1");
    }

    #[test]
    fn test_arguments_must_be_object() {
        let text = r#"TOOL_CALL: {"tool": "a", "arguments": [1, 2]}"#;
        assert!(ToolCallParser::parse(text).is_empty());
    }

    #[test]
    fn test_lex_segments() {
        let text = r#"intro TOOL_CALL: {"tool": "a", "arguments": {}} outro TOOL_CALL: {oops"#;
        let segments = lex(text);

        assert_eq!(
            segments,
            vec![
                Segment::Text("intro "),
                Segment::Directive(r#"{"tool": "a", "arguments": {}}"#),
                Segment::Text(" outro "),
                Segment::Malformed(" {oops"),
            ]
        );
    }

    #[test]
    fn test_unbalanced_directive_does_not_swallow_next_one() {
        let text = r#"TOOL_CALL: {"tool": "a", TOOL_CALL: {"tool": "b", "arguments": {}}"#;
        let calls = ToolCallParser::parse(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "b");
        assert_eq!(calls[0].call_id, "call_1");
    }
}
