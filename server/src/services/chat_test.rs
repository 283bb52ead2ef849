use super::*;
use crate::llm::types::ContentBlock;
use crate::state::test_helpers::{MockLlm, text_response};

fn body(value: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

fn synthetic_history(n: usize) -> Vec<Message> {
    (0..n)
        .map(|i| if i % 2 == 0 { Message::user(format!("u{i}")) } else { Message::assistant(format!("a{i}")) })
        .collect()
}

fn turn_role(role: Role) -> TurnRole {
    match role {
        Role::User => TurnRole::User,
        Role::Assistant => TurnRole::Assistant,
        Role::System => panic!("system messages never reach the turn list"),
    }
}

// =========================================================================
// parse_request
// =========================================================================

#[test]
fn parse_missing_message_is_missing() {
    let err = parse_request(&body(serde_json::json!({}))).unwrap_err();
    assert!(matches!(err, ChatError::MissingMessage));
}

#[test]
fn parse_empty_or_blank_message_is_missing() {
    for message in ["", "   ", "\n\t"] {
        let err = parse_request(&body(serde_json::json!({ "message": message }))).unwrap_err();
        assert!(matches!(err, ChatError::MissingMessage), "expected missing for {message:?}");
    }
}

#[test]
fn parse_non_string_message_is_missing() {
    for message in [serde_json::json!(null), serde_json::json!(42), serde_json::json!({"text": "hi"})] {
        let err = parse_request(&body(serde_json::json!({ "message": message }))).unwrap_err();
        assert!(matches!(err, ChatError::MissingMessage));
    }
}

#[test]
fn parse_non_object_body_is_missing() {
    let err = parse_request(b"[1,2,3]").unwrap_err();
    assert!(matches!(err, ChatError::MissingMessage));
}

#[test]
fn parse_invalid_json_is_malformed() {
    let err = parse_request(b"not json").unwrap_err();
    assert!(matches!(err, ChatError::MalformedBody(_)));
    let err = parse_request(b"").unwrap_err();
    assert!(matches!(err, ChatError::MalformedBody(_)));
}

#[test]
fn parse_history_defaults_to_empty() {
    let turn = parse_request(&body(serde_json::json!({ "message": "hello" }))).unwrap();
    assert_eq!(turn, ChatTurn { message: "hello".into(), history: vec![] });
}

#[test]
fn parse_non_array_history_is_ignored() {
    let turn = parse_request(&body(serde_json::json!({ "message": "hello", "conversationHistory": "nope" }))).unwrap();
    assert!(turn.history.is_empty());
}

#[test]
fn parse_drops_malformed_history_entries() {
    let turn = parse_request(&body(serde_json::json!({
        "message": "next",
        "conversationHistory": [
            { "role": "user", "content": "kept 1" },
            { "role": "user" },
            { "content": "no role" },
            { "role": "tool", "content": "bad role" },
            { "role": "", "content": "empty role" },
            { "role": "assistant", "content": "" },
            { "role": "assistant", "content": "   " },
            { "role": "assistant", "content": 7 },
            { "role": 1, "content": "numeric role" },
            "just a string",
            null,
            { "role": "assistant", "content": "kept 2" },
            { "role": "system", "content": "kept 3" }
        ]
    })))
    .unwrap();

    assert_eq!(
        turn.history,
        vec![Message::user("kept 1"), Message::assistant("kept 2"), Message::system("kept 3")]
    );
}

// =========================================================================
// compose: window
// =========================================================================

#[test]
fn sliding_window_keeps_tail() {
    let kept = sliding_window(synthetic_history(5), 3);
    assert_eq!(kept, synthetic_history(5)[2..].to_vec());
}

#[test]
fn sliding_window_shorter_than_limit_is_untouched() {
    assert_eq!(sliding_window(synthetic_history(4), 20), synthetic_history(4));
    assert!(sliding_window(Vec::new(), 20).is_empty());
}

#[test]
fn compose_forwards_exactly_last_twenty_of_twenty_five() {
    let history = synthetic_history(25);
    let request = compose(ChatTurn { message: "newest".into(), history: history.clone() });

    assert_eq!(request.messages.len(), HISTORY_WINDOW);

    // 25 history + 1 new = 26; the oldest 6 are dropped.
    let mut expected: Vec<types::Message> = history[6..]
        .iter()
        .map(|m| types::Message { role: turn_role(m.role), content: m.content.clone() })
        .collect();
    expected.push(types::Message { role: TurnRole::User, content: "newest".into() });
    assert_eq!(request.messages, expected);
}

#[test]
fn compose_appends_user_message_last() {
    let request = compose(ChatTurn { message: "hello".into(), history: vec![] });
    assert_eq!(request.messages, vec![types::Message { role: TurnRole::User, content: "hello".into() }]);
    assert_eq!(request.system, DEFAULT_INSTRUCTION);
}

// =========================================================================
// compose: system extraction
// =========================================================================

#[test]
fn compose_extracts_and_merges_system_messages_in_order() {
    let request = compose(ChatTurn {
        message: "q".into(),
        history: vec![
            Message::system("context A"),
            Message::user("u1"),
            Message::system("context B"),
            Message::assistant("a1"),
        ],
    });

    assert_eq!(request.system, format!("context A\n\ncontext B\n\n{DEFAULT_INSTRUCTION}"));
    assert_eq!(
        request.messages,
        vec![
            types::Message { role: TurnRole::User, content: "u1".into() },
            types::Message { role: TurnRole::Assistant, content: "a1".into() },
            types::Message { role: TurnRole::User, content: "q".into() },
        ]
    );
}

#[test]
fn compose_drops_system_message_outside_window() {
    let mut history = vec![Message::system("old context")];
    history.extend(synthetic_history(20));
    let request = compose(ChatTurn { message: "q".into(), history });

    assert_eq!(request.system, DEFAULT_INSTRUCTION);
    assert_eq!(request.messages.len(), HISTORY_WINDOW);
}

#[test]
fn compose_system_inside_window_shrinks_turn_list() {
    let mut history = vec![Message::system("ctx")];
    history.extend(synthetic_history(18));
    let request = compose(ChatTurn { message: "q".into(), history });

    assert!(request.system.starts_with("ctx\n\n"));
    assert_eq!(request.messages.len(), 19);
}

#[test]
fn merge_system_without_parts_is_default_instruction() {
    assert_eq!(merge_system(&[]), DEFAULT_INSTRUCTION);
}

// =========================================================================
// reply_text
// =========================================================================

#[test]
fn reply_text_takes_first_text_block() {
    let resp = text_response(vec![
        ContentBlock::Unknown,
        ContentBlock::Text { text: "one".into() },
        ContentBlock::Text { text: "two".into() },
    ]);
    assert_eq!(reply_text(&resp).unwrap(), "one");
}

#[test]
fn reply_text_without_text_is_empty_reply() {
    let err = reply_text(&text_response(vec![])).unwrap_err();
    assert!(matches!(err, ChatError::EmptyReply));
}

// =========================================================================
// handle_chat
// =========================================================================

#[tokio::test]
async fn handle_chat_calls_llm_with_fixed_max_tokens() {
    let mock = Arc::new(MockLlm::replying("Hi there"));
    let llm: Arc<dyn LlmChat> = mock.clone();

    let reply = handle_chat(Some(&llm), &body(serde_json::json!({ "message": "hello" })))
        .await
        .unwrap();
    assert_eq!(reply, "Hi there");

    let calls = mock.recorded();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].max_tokens, MAX_TOKENS);
    assert_eq!(calls[0].system, DEFAULT_INSTRUCTION);
    assert_eq!(calls[0].messages, vec![types::Message { role: TurnRole::User, content: "hello".into() }]);
}

#[tokio::test]
async fn handle_chat_missing_message_skips_llm() {
    let mock = Arc::new(MockLlm::replying("unused"));
    let llm: Arc<dyn LlmChat> = mock.clone();

    let err = handle_chat(Some(&llm), b"{}").await.unwrap_err();
    assert!(matches!(err, ChatError::MissingMessage));
    assert!(mock.recorded().is_empty());
}

#[tokio::test]
async fn handle_chat_missing_message_wins_over_missing_llm() {
    let err = handle_chat(None, b"{}").await.unwrap_err();
    assert!(matches!(err, ChatError::MissingMessage));
}

#[tokio::test]
async fn handle_chat_without_llm_is_not_configured() {
    let err = handle_chat(None, br#"{"message":"hello"}"#).await.unwrap_err();
    assert!(matches!(err, ChatError::LlmNotConfigured));
}

#[tokio::test]
async fn handle_chat_propagates_llm_error() {
    let llm: Arc<dyn LlmChat> =
        Arc::new(MockLlm::with_result(Err(LlmError::ApiResponse { status: 500, body: "boom".into() })));

    let err = handle_chat(Some(&llm), br#"{"message":"hello"}"#).await.unwrap_err();
    assert!(matches!(err, ChatError::Llm(LlmError::ApiResponse { status: 500, .. })));
}
