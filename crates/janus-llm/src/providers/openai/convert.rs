use super::types::{ChatFunction, ChatMessage, ChatTool, ChatUsage};
use crate::completion::{CompletionRequest, TokenUsage};
use crate::tools::ToolDefinition;

/// Build the message list for an OpenAI-compatible API.
///
/// This API has no dedicated system field, so the unified request's system
/// instruction is prepended as the first message with role "system".
pub(crate) fn convert_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);

    if let Some(system) = &request.system {
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
    }

    for msg in &request.messages {
        messages.push(ChatMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        });
    }

    messages
}

/// Convert tool definitions to OpenAI function format
pub(crate) fn convert_tools(tools: &[ToolDefinition]) -> Vec<ChatTool> {
    tools
        .iter()
        .map(|tool| ChatTool {
            r#type: "function".to_string(),
            function: ChatFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        })
        .collect()
}

/// Map OpenAI usage fields onto the canonical shape.
///
/// `prompt_tokens` includes cached tokens and `completion_tokens` includes
/// reasoning tokens on this API, so both sub-categories are carved out of
/// their parent counts before reconciliation.
pub(crate) fn convert_usage(usage: &ChatUsage) -> TokenUsage {
    let cached = usage
        .prompt_tokens_details
        .as_ref()
        .and_then(|d| d.cached_tokens)
        .unwrap_or(0);
    let reasoning = usage
        .completion_tokens_details
        .as_ref()
        .and_then(|d| d.reasoning_tokens)
        .unwrap_or(0);

    TokenUsage::new(
        usage.prompt_tokens.saturating_sub(cached),
        usage.completion_tokens.saturating_sub(reasoning),
    )
    .with_cache_tokens(0, cached)
    .with_reasoning_tokens(reasoning)
}
