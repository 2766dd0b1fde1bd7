use super::convert::{convert_messages, convert_usage};
use super::types::{AnthropicStreamEvent, AnthropicUsage, MODELS};
use crate::completion::CompletionRequest;
use crate::message::Message;

#[test]
fn test_available_models() {
    assert!(MODELS.contains(&"claude-sonnet-4-5-20250929"));
    assert!(MODELS.contains(&"claude-opus-4-5-20250514"));
}

#[test]
fn test_system_goes_to_dedicated_field() {
    let request = CompletionRequest::new("claude-sonnet-4-5-20250929")
        .with_system("You are helpful")
        .with_message(Message::user("Hello"))
        .with_message(Message::assistant("Hi there!"));

    let (system, messages) = convert_messages(&request);

    assert_eq!(system.as_deref(), Some("You are helpful"));
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "user");
    assert_eq!(messages[1].role, "assistant");
}

#[test]
fn test_stray_system_messages_merge_into_field() {
    let request = CompletionRequest::new("m")
        .with_system("a")
        .with_message(Message::system("b"))
        .with_message(Message::user("hi"));

    let (system, messages) = convert_messages(&request);

    assert_eq!(system.as_deref(), Some("a\n\nb"));
    assert_eq!(messages.len(), 1);
}

#[test]
fn test_usage_mapping_includes_cache_categories() {
    let vendor_usage = AnthropicUsage {
        input_tokens: 100,
        output_tokens: 50,
        cache_creation_input_tokens: 30,
        cache_read_input_tokens: 400,
    };

    let usage = convert_usage(&vendor_usage);
    assert_eq!(usage.input_tokens, 100);
    assert_eq!(usage.output_tokens, 50);
    assert_eq!(usage.cache_creation_tokens, 30);
    assert_eq!(usage.cache_read_tokens, 400);
    // cache-read excluded from the reconciled total
    assert_eq!(usage.total_tokens, 180);
}

#[test]
fn test_stream_event_parsing() {
    let start: AnthropicStreamEvent = serde_json::from_str(
        r#"{"type":"message_start","message":{"usage":{"input_tokens":25,"output_tokens":1}}}"#,
    )
    .unwrap();
    assert!(matches!(start, AnthropicStreamEvent::MessageStart { .. }));

    let delta: AnthropicStreamEvent = serde_json::from_str(
        r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#,
    )
    .unwrap();
    match delta {
        AnthropicStreamEvent::ContentBlockDelta { delta } => {
            assert_eq!(delta.text.as_deref(), Some("Hi"));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let terminal: AnthropicStreamEvent = serde_json::from_str(
        r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":12}}"#,
    )
    .unwrap();
    match terminal {
        AnthropicStreamEvent::MessageDelta { delta, usage } => {
            assert_eq!(delta.stop_reason.as_deref(), Some("end_turn"));
            assert_eq!(usage.unwrap().output_tokens, 12);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // Unknown event types are tolerated, not an error.
    let other: AnthropicStreamEvent =
        serde_json::from_str(r#"{"type":"content_block_stop","index":0}"#).unwrap();
    assert!(matches!(other, AnthropicStreamEvent::Other));
}
