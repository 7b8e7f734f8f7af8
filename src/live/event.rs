//! Wire messages for the live transcription session.
//!
//! Server messages arrive as JSON text frames; a single frame can carry
//! several of the things we care about (a transcript fragment and a
//! resumption update, say), so parsing returns a list of events. Everything
//! we do not recognize is ignored.

use crate::error::{ParleyError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

/// An event emitted by the live session, as a closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    /// Session handshake finished; audio may be sent.
    SetupComplete,
    /// An incremental piece of input transcription.
    Fragment(String),
    /// The speaker was interrupted; the current utterance is over.
    Interrupted,
    /// The server will close the connection soon.
    CloseWarning { time_left: Option<String> },
    /// A new resumption handle; supersedes any previous one.
    ResumptionUpdate { handle: String },
}

/// Parse a server text frame into zero or more events.
///
/// Unknown fields are skipped; malformed JSON is an error (the supervisor
/// treats it as a stream failure).
pub fn parse_server_message(text: &str) -> Result<Vec<LiveEvent>> {
    let value: Value = serde_json::from_str(text).map_err(|e| ParleyError::LiveEvent {
        message: format!("invalid JSON frame: {}", e),
    })?;

    let mut events = Vec::new();

    if value.get("setupComplete").is_some() {
        events.push(LiveEvent::SetupComplete);
    }

    if let Some(update) = value.get("sessionResumptionUpdate") {
        let resumable = update
            .get("resumable")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if resumable
            && let Some(handle) = update.get("newHandle").and_then(Value::as_str)
            && !handle.is_empty()
        {
            events.push(LiveEvent::ResumptionUpdate {
                handle: handle.to_string(),
            });
        }
    }

    if let Some(go_away) = value.get("goAway") {
        let time_left = go_away
            .get("timeLeft")
            .and_then(Value::as_str)
            .map(str::to_string);
        events.push(LiveEvent::CloseWarning { time_left });
    }

    if let Some(content) = value.get("serverContent") {
        if content
            .get("interrupted")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            events.push(LiveEvent::Interrupted);
        }

        if let Some(text) = content
            .get("inputTranscription")
            .and_then(|t| t.get("text"))
            .and_then(Value::as_str)
            && !text.is_empty()
        {
            events.push(LiveEvent::Fragment(text.to_string()));
        }
    }

    Ok(events)
}

/// Build the session setup frame.
///
/// The model only transcribes - response audio is requested (the native
/// audio model requires it) but discarded. Activity detection runs at high
/// sensitivity so utterance boundaries arrive quickly, and sliding-window
/// context compression keeps the session usable past its nominal size.
pub fn setup_message(
    model: &str,
    instruction: Option<&str>,
    resume_handle: Option<&str>,
) -> String {
    let mut setup = json!({
        "model": format!("models/{}", model),
        "generationConfig": {
            "responseModalities": ["AUDIO"]
        },
        "inputAudioTranscription": {},
        "realtimeInputConfig": {
            "automaticActivityDetection": {
                "disabled": false,
                "startOfSpeechSensitivity": "START_SENSITIVITY_HIGH",
                "endOfSpeechSensitivity": "END_SENSITIVITY_HIGH",
                "prefixPaddingMs": 200,
                "silenceDurationMs": 100,
            }
        },
        "contextWindowCompression": {
            "slidingWindow": {}
        },
        "sessionResumption": {},
    });

    if let Some(text) = instruction {
        setup["systemInstruction"] = json!({
            "parts": [{ "text": format!("{} Do not respond, just listen and transcribe.", text) }]
        });
    }
    if let Some(handle) = resume_handle {
        setup["sessionResumption"] = json!({ "handle": handle });
    }

    json!({ "setup": setup }).to_string()
}

/// Build a realtime audio frame carrying raw PCM samples.
pub fn audio_message(samples: &[i16], sample_rate: u32) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    let data = BASE64.encode(&bytes);

    json!({
        "realtime_input": {
            "media_chunks": [{
                "data": data,
                "mime_type": format!("audio/pcm;rate={}", sample_rate),
            }]
        }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment() {
        let msg = r#"{"serverContent":{"inputTranscription":{"text":"hello "}}}"#;
        let events = parse_server_message(msg).unwrap();
        assert_eq!(events, vec![LiveEvent::Fragment("hello ".to_string())]);
    }

    #[test]
    fn test_parse_interrupted() {
        let msg = r#"{"serverContent":{"interrupted":true}}"#;
        let events = parse_server_message(msg).unwrap();
        assert_eq!(events, vec![LiveEvent::Interrupted]);
    }

    #[test]
    fn test_parse_resumption_update() {
        let msg = r#"{"sessionResumptionUpdate":{"resumable":true,"newHandle":"abc123"}}"#;
        let events = parse_server_message(msg).unwrap();
        assert_eq!(
            events,
            vec![LiveEvent::ResumptionUpdate {
                handle: "abc123".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_non_resumable_update_is_ignored() {
        let msg = r#"{"sessionResumptionUpdate":{"resumable":false,"newHandle":"abc123"}}"#;
        assert!(parse_server_message(msg).unwrap().is_empty());
    }

    #[test]
    fn test_parse_go_away() {
        let msg = r#"{"goAway":{"timeLeft":"30s"}}"#;
        let events = parse_server_message(msg).unwrap();
        assert_eq!(
            events,
            vec![LiveEvent::CloseWarning {
                time_left: Some("30s".to_string())
            }]
        );
    }

    #[test]
    fn test_parse_setup_complete() {
        let events = parse_server_message(r#"{"setupComplete":{}}"#).unwrap();
        assert_eq!(events, vec![LiveEvent::SetupComplete]);
    }

    #[test]
    fn test_parse_combined_frame() {
        let msg = r#"{
            "sessionResumptionUpdate":{"resumable":true,"newHandle":"h2"},
            "serverContent":{"inputTranscription":{"text":"안녕"}}
        }"#;
        let events = parse_server_message(msg).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], LiveEvent::ResumptionUpdate { .. }));
        assert_eq!(events[1], LiveEvent::Fragment("안녕".to_string()));
    }

    #[test]
    fn test_parse_unknown_fields_ignored() {
        let msg = r#"{"usageMetadata":{"totalTokenCount":10}}"#;
        assert!(parse_server_message(msg).unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_json_is_error() {
        assert!(parse_server_message("not json").is_err());
    }

    #[test]
    fn test_setup_message_with_instruction_and_handle() {
        let msg = setup_message("test-model", Some("Transcribe only English."), Some("h1"));
        let value: Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(value["setup"]["model"], "models/test-model");
        assert_eq!(value["setup"]["sessionResumption"]["handle"], "h1");
        let instruction = value["setup"]["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap();
        assert!(instruction.starts_with("Transcribe only English."));
        assert!(instruction.contains("just listen"));
    }

    #[test]
    fn test_setup_message_fresh_session_has_empty_resumption() {
        let msg = setup_message("test-model", None, None);
        let value: Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(value["setup"]["sessionResumption"], json!({}));
        assert!(value["setup"].get("systemInstruction").is_none());
    }

    #[test]
    fn test_audio_message_encodes_little_endian_pcm() {
        let msg = audio_message(&[1i16, -2], 16_000);
        let value: Value = serde_json::from_str(&msg).unwrap();
        let chunk = &value["realtime_input"]["media_chunks"][0];
        assert_eq!(chunk["mime_type"], "audio/pcm;rate=16000");

        let decoded = BASE64.decode(chunk["data"].as_str().unwrap()).unwrap();
        assert_eq!(decoded, vec![0x01, 0x00, 0xfe, 0xff]);
    }
}
