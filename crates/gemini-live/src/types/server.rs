use crate::types::{Blob, Content};

/// One JSON message from the server. Exactly one field is normally set.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    pub setup_complete: Option<SetupComplete>,
    pub server_content: Option<ServerContent>,
    pub usage_metadata: Option<UsageMetadata>,
    pub go_away: Option<GoAway>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct SetupComplete {}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    pub model_turn: Option<Content>,
    pub turn_complete: Option<bool>,
    pub interrupted: Option<bool>,
    pub generation_complete: Option<bool>,
    pub input_transcription: Option<Transcription>,
    pub output_transcription: Option<Transcription>,
}

impl ServerContent {
    /// Inline audio blobs of the model turn, in order.
    pub fn audio_chunks(&self) -> impl Iterator<Item = &Blob> {
        self.model_turn
            .iter()
            .flat_map(|turn| turn.parts.iter())
            .filter_map(|part| part.inline_data.as_ref())
            .filter(|blob| blob.is_audio())
    }

    pub fn is_turn_complete(&self) -> bool {
        self.turn_complete == Some(true)
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted == Some(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: i64,
    #[serde(default)]
    pub response_token_count: i64,
    #[serde(default)]
    pub total_token_count: i64,
}

/// Notice that the server will close the connection soon.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoAway {
    pub time_left: Option<String>,
}

/// What subscribers receive from the connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Message(ServerMessage),
    Error(String),
    Close { reason: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_complete() {
        let msg: ServerMessage = serde_json::from_str(r#"{"setupComplete": {}}"#).unwrap();
        assert_eq!(msg.setup_complete, Some(SetupComplete {}));
        assert!(msg.server_content.is_none());
    }

    #[test]
    fn test_server_content_with_audio_and_transcription() {
        let text = r#"{
            "serverContent": {
                "modelTurn": {
                    "role": "model",
                    "parts": [
                        { "inlineData": { "mimeType": "audio/pcm;rate=24000", "data": "AAAA" } },
                        { "text": "thinking" },
                        { "inlineData": { "mimeType": "audio/pcm;rate=24000", "data": "BBBB" } }
                    ]
                },
                "outputTranscription": { "text": "Hello there" }
            }
        }"#;
        let msg: ServerMessage = serde_json::from_str(text).unwrap();
        let content = msg.server_content.unwrap();

        let audio: Vec<&str> = content.audio_chunks().map(|b| b.data.as_str()).collect();
        assert_eq!(audio, vec!["AAAA", "BBBB"]);
        assert_eq!(content.output_transcription.as_ref().unwrap().text, "Hello there");
        assert!(!content.is_turn_complete());
    }

    #[test]
    fn test_turn_complete_and_interrupted_flags() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"serverContent": {"turnComplete": true, "interrupted": true}}"#)
                .unwrap();
        let content = msg.server_content.unwrap();
        assert!(content.is_turn_complete());
        assert!(content.is_interrupted());
        assert_eq!(content.audio_chunks().count(), 0);
    }

    #[test]
    fn test_usage_and_go_away_ignore_unknown_fields() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{"usageMetadata": {"promptTokenCount": 10, "responseTokenCount": 5, "totalTokenCount": 15, "promptTokensDetails": []}}"#,
        )
        .unwrap();
        assert_eq!(msg.usage_metadata.unwrap().total_token_count, 15);

        let msg: ServerMessage = serde_json::from_str(r#"{"goAway": {"timeLeft": "10s"}}"#).unwrap();
        assert_eq!(msg.go_away.unwrap().time_left.as_deref(), Some("10s"));
    }
}
