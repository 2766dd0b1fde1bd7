use super::convert::{convert_messages, convert_usage};
use super::types::{ChatChunk, ChatUsage, MODELS};
use crate::completion::CompletionRequest;
use crate::message::Message;

#[test]
fn test_available_models() {
    assert!(MODELS.contains(&"gpt-5"));
    assert!(MODELS.contains(&"gpt-4o-mini"));
}

#[test]
fn test_system_prepended_as_first_message() {
    let request = CompletionRequest::new("gpt-5")
        .with_system("You are helpful")
        .with_message(Message::user("Hello"));

    let messages = convert_messages(&request);

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "system");
    assert_eq!(messages[0].content, "You are helpful");
    assert_eq!(messages[1].role, "user");
}

#[test]
fn test_no_system_message_without_instruction() {
    let request = CompletionRequest::new("gpt-5").with_message(Message::user("Hello"));
    let messages = convert_messages(&request);

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, "user");
}

#[test]
fn test_usage_mapping_carves_out_subcategories() {
    let usage: ChatUsage = serde_json::from_str(
        r#"{
            "prompt_tokens": 1000,
            "completion_tokens": 500,
            "total_tokens": 1500,
            "prompt_tokens_details": {"cached_tokens": 800},
            "completion_tokens_details": {"reasoning_tokens": 100}
        }"#,
    )
    .unwrap();

    let mapped = convert_usage(&usage);

    // cached tokens carved out of prompt, reasoning carved out of completion
    assert_eq!(mapped.input_tokens, 200);
    assert_eq!(mapped.cache_read_tokens, 800);
    assert_eq!(mapped.output_tokens, 400);
    assert_eq!(mapped.reasoning_tokens, 100);
    // total reconciled (input + output + reasoning), not the vendor's 1500
    assert_eq!(mapped.total_tokens, 700);
}

#[test]
fn test_usage_mapping_without_details() {
    let usage: ChatUsage =
        serde_json::from_str(r#"{"prompt_tokens": 10, "completion_tokens": 5}"#).unwrap();
    let mapped = convert_usage(&usage);

    assert_eq!(mapped.input_tokens, 10);
    assert_eq!(mapped.output_tokens, 5);
    assert_eq!(mapped.total_tokens, 15);
}

#[test]
fn test_stream_chunk_parsing() {
    let delta: ChatChunk = serde_json::from_str(
        r#"{"choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":null}]}"#,
    )
    .unwrap();
    assert_eq!(delta.choices[0].delta.content.as_deref(), Some("Hi"));

    // Terminal usage frame: empty choices, usage present.
    let terminal: ChatChunk = serde_json::from_str(
        r#"{"choices":[],"usage":{"prompt_tokens":9,"completion_tokens":12}}"#,
    )
    .unwrap();
    assert!(terminal.choices.is_empty());
    assert_eq!(terminal.usage.unwrap().completion_tokens, 12);
}
