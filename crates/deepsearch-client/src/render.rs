//! Terminal rendering of streamed chat events
//!
//! Text is printed raw as it arrives. Tool invocations show as one-line panel
//! headers; with `expand_tools` the arguments and result JSON follow.

use colored::Colorize;
use deepsearch_core::{OutputEvent, SourceRef};
use serde_json::Value;

const TOOL_ICON: &str = "🔧";

/// Shown instead of submitting when there is no session
pub fn sign_in_prompt() -> String {
    format!(
        "{} You need to sign in to chat. Pass a token with {}.",
        "!".yellow(),
        "--token".bold()
    )
}

/// Stateful event → text renderer for one terminal session
#[derive(Debug, Default)]
pub struct Renderer {
    expand_tools: bool,
    /// Whether the cursor sits mid-line after streamed text
    mid_line: bool,
}

impl Renderer {
    pub fn new(expand_tools: bool) -> Self {
        Self {
            expand_tools,
            mid_line: false,
        }
    }

    /// Text to print for `event`, possibly empty
    pub fn render(&mut self, event: &OutputEvent) -> String {
        match event {
            OutputEvent::TextDelta { text } => {
                self.mid_line = !text.ends_with('\n');
                text.clone()
            }
            OutputEvent::ToolCallStreamingStart { tool_name, .. } => {
                self.block(tool_header(tool_name, "calling...").dimmed().to_string())
            }
            OutputEvent::ToolCallDelta { .. } => String::new(),
            OutputEvent::ToolCallStart { args, .. } => {
                if self.expand_tools {
                    self.block(format!("   args: {}", compact(args)).dimmed().to_string())
                } else {
                    String::new()
                }
            }
            OutputEvent::ToolCallResult {
                tool_name,
                result,
                is_error,
                ..
            } => {
                let header = if *is_error {
                    tool_header(tool_name, "failed").red().to_string()
                } else {
                    tool_header(tool_name, &result_summary(result)).dimmed().to_string()
                };
                let mut out = self.block(header);
                if self.expand_tools {
                    out.push_str(&indent(&pretty(result)));
                    out.push('\n');
                }
                out
            }
            OutputEvent::Source { source } => self.block(source_line(source)),
            OutputEvent::Done { .. } => {
                let out = if self.mid_line { "\n".to_string() } else { String::new() };
                self.mid_line = false;
                out
            }
            OutputEvent::Error { message } => self.block(format!("{} {}", "✗".red(), message.red())),
        }
    }

    /// A full line, starting on a fresh line
    fn block(&mut self, line: String) -> String {
        let prefix = if self.mid_line { "\n" } else { "" };
        self.mid_line = false;
        format!("{prefix}{line}\n")
    }
}

fn tool_header(tool_name: &str, status: &str) -> String {
    format!("{TOOL_ICON} {tool_name} ({status})")
}

fn result_summary(result: &Value) -> String {
    match result.as_array() {
        Some(items) if items.len() == 1 => "1 result".to_string(),
        Some(items) => format!("{} results", items.len()),
        None => "done".to_string(),
    }
}

fn source_line(source: &SourceRef) -> String {
    format!("Source: {} <{}>", source.display_title(), source.url)
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("   {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
