use gemini_live::ServerRx;
use gemini_live::types::ServerEvent;
use tokio::sync::broadcast::error::RecvError;
use tutor_core::VoiceEvent;

/// Maps one Live API event onto voice-session events, in the order they
/// must be handled: barge-in first, then transcripts and audio, and the end
/// of the turn last.
pub fn translate(event: ServerEvent) -> Vec<VoiceEvent> {
    let message = match event {
        ServerEvent::Message(message) => message,
        ServerEvent::Error(reason) => return vec![VoiceEvent::Error(reason)],
        ServerEvent::Close { reason } => {
            tracing::info!("Live session closed: {}", reason.as_deref().unwrap_or("no reason"));
            return vec![VoiceEvent::Closed];
        }
    };

    let mut events = Vec::new();
    if message.setup_complete.is_some() {
        events.push(VoiceEvent::SessionOpened);
    }
    if let Some(go_away) = &message.go_away {
        tracing::warn!(
            "Server will close the session soon (time left: {})",
            go_away.time_left.as_deref().unwrap_or("unknown")
        );
    }
    if let Some(content) = message.server_content {
        if content.is_interrupted() {
            events.push(VoiceEvent::Interrupted);
        }
        if let Some(t) = &content.input_transcription {
            events.push(VoiceEvent::InputTranscript(t.text.clone()));
        }
        if let Some(t) = &content.output_transcription {
            events.push(VoiceEvent::OutputTranscript(t.text.clone()));
        }
        events.extend(
            content
                .audio_chunks()
                .map(|blob| VoiceEvent::Audio(blob.data.clone())),
        );
        if content.is_turn_complete() {
            events.push(VoiceEvent::TurnComplete);
        }
    }
    events
}

/// Forwards translated events from the Live client onto an mpsc channel.
/// The channel ends with `Closed` once the connection goes away.
pub fn spawn_translation(mut live_rx: ServerRx) -> tokio::sync::mpsc::Receiver<VoiceEvent> {
    let (tx, rx) = tokio::sync::mpsc::channel(128);
    tokio::spawn(async move {
        loop {
            match live_rx.recv().await {
                Ok(event) => {
                    let terminal = !matches!(event, ServerEvent::Message(_));
                    for voice_event in translate(event) {
                        if tx.send(voice_event).await.is_err() {
                            return; // Receiver dropped
                        }
                    }
                    if terminal {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("Live event stream lagged by {} messages.", n);
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Live event channel closed.");
                    let _ = tx.send(VoiceEvent::Closed).await;
                    break;
                }
            }
        }
        tracing::debug!("Live event translation stopped.");
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemini_live::types::ServerMessage;
    use tokio::sync::broadcast;

    fn message(json: &str) -> ServerEvent {
        ServerEvent::Message(serde_json::from_str::<ServerMessage>(json).unwrap())
    }

    #[test]
    fn test_setup_complete_opens_session() {
        assert_eq!(
            translate(message(r#"{"setupComplete": {}}"#)),
            vec![VoiceEvent::SessionOpened]
        );
    }

    #[test]
    fn test_content_order() {
        let events = translate(message(
            r#"{"serverContent": {
                "interrupted": true,
                "inputTranscription": {"text": "hi"},
                "outputTranscription": {"text": "hello"},
                "modelTurn": {"parts": [
                    {"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "AAAA"}},
                    {"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "BBBB"}}
                ]},
                "turnComplete": true
            }}"#,
        ));
        assert_eq!(
            events,
            vec![
                VoiceEvent::Interrupted,
                VoiceEvent::InputTranscript("hi".into()),
                VoiceEvent::OutputTranscript("hello".into()),
                VoiceEvent::Audio("AAAA".into()),
                VoiceEvent::Audio("BBBB".into()),
                VoiceEvent::TurnComplete,
            ]
        );
    }

    #[test]
    fn test_usage_only_message_yields_nothing() {
        assert!(translate(message(r#"{"usageMetadata": {"totalTokenCount": 5}}"#)).is_empty());
    }

    #[tokio::test]
    async fn test_translation_task_forwards_and_closes() {
        let (live_tx, live_rx) = broadcast::channel(16);
        let mut rx = spawn_translation(live_rx);

        live_tx.send(message(r#"{"setupComplete": {}}"#)).unwrap();
        live_tx
            .send(message(r#"{"serverContent": {"outputTranscription": {"text": "Hi!"}}}"#))
            .unwrap();
        live_tx.send(ServerEvent::Error("reset by peer".into())).unwrap();

        assert_eq!(rx.recv().await, Some(VoiceEvent::SessionOpened));
        assert_eq!(rx.recv().await, Some(VoiceEvent::OutputTranscript("Hi!".into())));
        assert_eq!(rx.recv().await, Some(VoiceEvent::Error("reset by peer".into())));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_dropped_client_reports_closed() {
        let (live_tx, live_rx) = broadcast::channel::<ServerEvent>(4);
        let mut rx = spawn_translation(live_rx);
        drop(live_tx);
        assert_eq!(rx.recv().await, Some(VoiceEvent::Closed));
        assert_eq!(rx.recv().await, None);
    }
}
