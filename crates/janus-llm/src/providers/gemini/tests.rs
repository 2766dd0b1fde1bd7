use super::convert::{convert_messages, convert_usage, extract_text};
use super::types::{GeminiResponse, UsageMetadata};
use crate::completion::CompletionRequest;
use crate::message::Message;

#[test]
fn test_assistant_role_becomes_model() {
    let request = CompletionRequest::new("gemini-2.5-flash")
        .with_system("Be brief")
        .with_message(Message::user("Hello"))
        .with_message(Message::assistant("Hi"));

    let (system, contents) = convert_messages(&request);

    assert!(system.is_some());
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0].role.as_deref(), Some("user"));
    assert_eq!(contents[1].role.as_deref(), Some("model"));
}

#[test]
fn test_system_instruction_has_no_role() {
    let request = CompletionRequest::new("m").with_system("Be brief");
    let (system, _) = convert_messages(&request);

    let system = system.unwrap();
    assert!(system.role.is_none());
    assert_eq!(extract_text(&system), "Be brief");
}

#[test]
fn test_usage_mapping_carves_cached_and_thinking() {
    let usage = UsageMetadata {
        prompt_token_count: 1000,
        candidates_token_count: 200,
        cached_content_token_count: 600,
        thoughts_token_count: 50,
    };

    let mapped = convert_usage(&usage);

    assert_eq!(mapped.input_tokens, 400);
    assert_eq!(mapped.cache_read_tokens, 600);
    assert_eq!(mapped.output_tokens, 200);
    assert_eq!(mapped.reasoning_tokens, 50);
    assert_eq!(mapped.total_tokens, 400 + 200 + 50);
}

#[test]
fn test_response_parsing_camel_case() {
    let parsed: GeminiResponse = serde_json::from_str(
        r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "there"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 7,
                "candidatesTokenCount": 3,
                "totalTokenCount": 10
            },
            "modelVersion": "gemini-2.5-flash-002"
        }"#,
    )
    .unwrap();

    let candidate = &parsed.candidates[0];
    assert_eq!(
        extract_text(candidate.content.as_ref().unwrap()),
        "Hello there"
    );
    assert_eq!(candidate.finish_reason.as_deref(), Some("STOP"));
    assert_eq!(parsed.usage_metadata.unwrap().prompt_token_count, 7);
    assert_eq!(parsed.model_version.as_deref(), Some("gemini-2.5-flash-002"));
}
