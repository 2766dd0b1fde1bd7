use super::types::{AnthropicMessage, AnthropicTool, AnthropicUsage};
use crate::completion::{CompletionRequest, TokenUsage};
use crate::message::MessageRole;
use crate::tools::ToolDefinition;

/// Build the system field and message list for the Claude API.
///
/// Claude takes the system instruction as a dedicated field; the unified
/// request's `system` and any stray system-role messages are merged into it.
pub(crate) fn convert_messages(
    request: &CompletionRequest,
) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system_parts = Vec::new();
    if let Some(system) = &request.system {
        if !system.is_empty() {
            system_parts.push(system.clone());
        }
    }

    let mut messages = Vec::new();
    for msg in &request.messages {
        match msg.role {
            MessageRole::System => {
                if !msg.content.is_empty() {
                    system_parts.push(msg.content.clone());
                }
            }
            MessageRole::User => messages.push(AnthropicMessage {
                role: "user".to_string(),
                content: msg.content.clone(),
            }),
            MessageRole::Assistant => messages.push(AnthropicMessage {
                role: "assistant".to_string(),
                content: msg.content.clone(),
            }),
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    (system, messages)
}

/// Convert tool definitions to Anthropic format
pub(crate) fn convert_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
    tools
        .iter()
        .map(|tool| AnthropicTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: tool.parameters.clone(),
        })
        .collect()
}

/// Map Claude usage fields onto the canonical shape.
///
/// `input_tokens` already excludes cached tokens on this API, so the
/// categories map directly; the total comes from the reconciliation rule,
/// never from the vendor.
pub(crate) fn convert_usage(usage: &AnthropicUsage) -> TokenUsage {
    TokenUsage::new(usage.input_tokens, usage.output_tokens).with_cache_tokens(
        usage.cache_creation_input_tokens,
        usage.cache_read_input_tokens,
    )
}
