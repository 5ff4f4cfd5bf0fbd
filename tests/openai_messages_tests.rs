// Integration tests for OpenAI wire types
//
// These tests verify request bodies serialize the way the API expects and
// that responses (including partial or error ones) deserialize.

use anyhow::Result;
use interview_coach::openai::messages::{ApiErrorResponse, ChatRequest, ChatResponse, SpeechRequest, TranscriptionResponse};
use serde_json::json;

#[test]
fn test_chat_request_is_single_user_turn() -> Result<()> {
    let request = ChatRequest::user("gpt-4o", "Generate 3 questions");
    let value = serde_json::to_value(&request)?;

    assert_eq!(
        value,
        json!({
            "model": "gpt-4o",
            "messages": [{ "role": "user", "content": "Generate 3 questions" }]
        })
    );
    Ok(())
}

#[test]
fn test_chat_response_first_text() -> Result<()> {
    let body = json!({
        "id": "chatcmpl-1",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": "What is your greatest strength?" } },
            { "index": 1, "message": { "role": "assistant", "content": "ignored" } }
        ],
        "usage": { "total_tokens": 12 }
    });

    let response: ChatResponse = serde_json::from_value(body)?;
    assert_eq!(response.first_text(), Some("What is your greatest strength?"));
    Ok(())
}

#[test]
fn test_chat_response_without_content() -> Result<()> {
    let response: ChatResponse = serde_json::from_value(json!({
        "choices": [{ "message": { "role": "assistant", "content": null } }]
    }))?;
    assert_eq!(response.first_text(), None);

    let empty: ChatResponse = serde_json::from_value(json!({ "choices": [] }))?;
    assert_eq!(empty.first_text(), None);
    Ok(())
}

#[test]
fn test_transcription_and_error_bodies() -> Result<()> {
    let transcription: TranscriptionResponse = serde_json::from_str(r#"{"text":"I led a team of five."}"#)?;
    assert_eq!(transcription.text, "I led a team of five.");

    let error: ApiErrorResponse = serde_json::from_str(
        r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#,
    )?;
    assert_eq!(error.error.message, "Incorrect API key provided");
    Ok(())
}

#[test]
fn test_speech_request_body() -> Result<()> {
    let request = SpeechRequest {
        model: "tts-1-hd".to_string(),
        voice: "nova".to_string(),
        input: "Welcome!".to_string(),
    };

    assert_eq!(
        serde_json::to_value(&request)?,
        json!({ "model": "tts-1-hd", "voice": "nova", "input": "Welcome!" })
    );
    Ok(())
}
