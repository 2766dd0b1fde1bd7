use super::types::{
    FunctionDeclaration, GeminiContent, GeminiPart, GeminiTool, UsageMetadata,
};
use crate::completion::{CompletionRequest, TokenUsage};
use crate::message::MessageRole;
use crate::tools::ToolDefinition;

fn text_content(role: Option<&str>, text: &str) -> GeminiContent {
    GeminiContent {
        role: role.map(str::to_string),
        parts: vec![GeminiPart {
            text: Some(text.to_string()),
        }],
    }
}

/// Build the systemInstruction field and contents list for the Gemini API.
///
/// Gemini takes the system instruction as a dedicated `systemInstruction`
/// content and calls the assistant role "model".
pub(crate) fn convert_messages(
    request: &CompletionRequest,
) -> (Option<GeminiContent>, Vec<GeminiContent>) {
    let mut system_parts = Vec::new();
    if let Some(system) = &request.system {
        if !system.is_empty() {
            system_parts.push(system.clone());
        }
    }

    let mut contents = Vec::new();
    for msg in &request.messages {
        match msg.role {
            MessageRole::System => {
                if !msg.content.is_empty() {
                    system_parts.push(msg.content.clone());
                }
            }
            MessageRole::User => contents.push(text_content(Some("user"), &msg.content)),
            MessageRole::Assistant => contents.push(text_content(Some("model"), &msg.content)),
        }
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(text_content(None, &system_parts.join("\n\n")))
    };

    (system_instruction, contents)
}

/// Convert tool definitions to Gemini function declarations
pub(crate) fn convert_tools(tools: &[ToolDefinition]) -> Vec<GeminiTool> {
    vec![GeminiTool {
        function_declarations: tools
            .iter()
            .map(|tool| FunctionDeclaration {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            })
            .collect(),
    }]
}

/// Map Gemini usageMetadata onto the canonical shape.
///
/// `promptTokenCount` includes cached content tokens, so the cache-read
/// category is carved out of it; thinking tokens map to the reasoning
/// category. The vendor's `totalTokenCount` is ignored in favor of the
/// reconciliation rule.
pub(crate) fn convert_usage(usage: &UsageMetadata) -> TokenUsage {
    TokenUsage::new(
        usage
            .prompt_token_count
            .saturating_sub(usage.cached_content_token_count),
        usage.candidates_token_count,
    )
    .with_cache_tokens(0, usage.cached_content_token_count)
    .with_reasoning_tokens(usage.thoughts_token_count)
}

/// Join the text parts of a candidate's content.
pub(crate) fn extract_text(content: &GeminiContent) -> String {
    content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}
