use colored::*;
use terminal_size::{terminal_size, Height, Width};

use crate::tools::{ToolCall, ToolDefinition, ToolResult};

pub fn print_header(model: &str, provider: &str, tool_mode: &str) {
    let (width, _) = terminal_size().unwrap_or((Width(80), Height(24)));
    let line = "─".repeat(width.0 as usize);
    println!("{}", line.black().bold());

    let name = "argo-agent".cyan().bold();
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  🌊 {} {}", name, version);

    let info = format!("  {}  •  {}  •  tools: {}", model, provider, tool_mode).cyan();
    println!("{}", info);

    println!("{}", line.black().bold());
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠️ ".yellow().bold(), msg.yellow());
}

pub fn print_error(msg: &str) {
    println!("  {} {}", "❌".red().bold(), msg.red());
}

pub fn print_thinking(msg: &str) {
    println!("  {} {}...", "∴".magenta(), msg);
}

/// One line per call with its outcome
pub fn print_tool_trace(calls: &[ToolCall], results: &[ToolResult]) {
    for (call, result) in calls.iter().zip(results) {
        let status = if result.success {
            "ok".green().bold()
        } else {
            "failed".red().bold()
        };
        println!(
            "  {} {} [{}] {}",
            "⚙".magenta(),
            call.tool_name.cyan(),
            call.call_id,
            status
        );
        if let Some(error) = &result.error {
            println!("      {}", error.red());
        }
    }
}

pub fn print_tool_definition(tool: &ToolDefinition) {
    println!("  {} {}", tool.name.cyan().bold(), tool.description);
    let required = tool.required_arguments();
    if !required.is_empty() {
        println!("      required: {}", required.join(", "));
    }
}
