//! State of a spoken conversation, independent of any audio device or socket.

use std::fmt;

use crate::lesson::{ChatMessage, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceStatus {
    #[default]
    Idle,
    Connecting,
    Listening,
    Error,
}

impl VoiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VoiceStatus::Idle => "Start conversation with Lexi",
            VoiceStatus::Connecting => "Connecting...",
            VoiceStatus::Listening => "Listening... Stop when you're done",
            VoiceStatus::Error => "Error. Click to retry.",
        }
    }

    /// Wording for a terminal, where there is no button to click.
    pub fn terminal_label(&self) -> &'static str {
        match self {
            VoiceStatus::Idle => "Voice conversation with Lexi ended.",
            VoiceStatus::Connecting => "Connecting...",
            VoiceStatus::Listening => "Listening... Press Ctrl-C when you're done.",
            VoiceStatus::Error => "Error. Run the command again to retry.",
        }
    }
}

impl fmt::Display for VoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the duplex connection reports, reduced to what the session cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    SessionOpened,
    InputTranscript(String),
    OutputTranscript(String),
    /// Base64 PCM16 audio from the model.
    Audio(String),
    TurnComplete,
    /// The learner started speaking over the model.
    Interrupted,
    Error(String),
    Closed,
}

/// Collects transcription fragments until the turn completes.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    input: String,
    output: String,
}

impl TranscriptAccumulator {
    pub fn push_input(&mut self, fragment: &str) {
        self.input.push_str(fragment);
    }

    pub fn push_output(&mut self, fragment: &str) {
        self.output.push_str(fragment);
    }

    /// Drains the turn: user text first, then AI text, blanks skipped.
    pub fn flush(&mut self) -> Vec<ChatMessage> {
        let input = std::mem::take(&mut self.input);
        let output = std::mem::take(&mut self.output);
        [(Sender::User, input), (Sender::Ai, output)]
            .into_iter()
            .filter_map(|(sender, text)| {
                let text = text.trim();
                (!text.is_empty()).then(|| ChatMessage {
                    sender,
                    text: text.to_string(),
                })
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
    }
}

#[derive(Debug, Default)]
pub struct VoiceSession {
    status: VoiceStatus,
    transcript: Vec<ChatMessage>,
    pending: TranscriptAccumulator,
}

impl VoiceSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> VoiceStatus {
        self.status
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Begins connecting. Refused while a connection attempt is in flight.
    pub fn start(&mut self) -> bool {
        if self.status == VoiceStatus::Connecting {
            return false;
        }
        self.status = VoiceStatus::Connecting;
        self.transcript.clear();
        self.pending.clear();
        true
    }

    /// Ends the session. An error status is kept so it stays visible.
    pub fn stop(&mut self) {
        if self.status != VoiceStatus::Error {
            self.status = VoiceStatus::Idle;
        }
    }

    pub fn fail(&mut self, reason: &str) {
        tracing::error!("Voice session error: {}", reason);
        self.status = VoiceStatus::Error;
    }

    /// Applies one event and returns the transcript entries it completed.
    pub fn apply(&mut self, event: &VoiceEvent) -> Vec<ChatMessage> {
        match event {
            VoiceEvent::SessionOpened => {
                self.status = VoiceStatus::Listening;
            }
            VoiceEvent::InputTranscript(text) => self.pending.push_input(text),
            VoiceEvent::OutputTranscript(text) => self.pending.push_output(text),
            VoiceEvent::TurnComplete => {
                let entries = self.pending.flush();
                self.transcript.extend(entries.iter().cloned());
                return entries;
            }
            VoiceEvent::Error(reason) => {
                self.fail(reason);
                self.stop();
            }
            VoiceEvent::Closed => self.stop(),
            VoiceEvent::Audio(_) | VoiceEvent::Interrupted => {}
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_orders_user_then_ai_and_skips_blanks() {
        let mut acc = TranscriptAccumulator::default();
        acc.push_output(" Hello");
        acc.push_output(" there! ");
        acc.push_input("   ");
        assert_eq!(acc.flush(), vec![ChatMessage::ai("Hello there!")]);

        acc.push_input("How are");
        acc.push_input(" you?");
        acc.push_output("Fine.");
        assert_eq!(
            acc.flush(),
            vec![ChatMessage::user("How are you?"), ChatMessage::ai("Fine.")]
        );
        assert!(acc.flush().is_empty());
    }

    #[test]
    fn test_lifecycle() {
        let mut session = VoiceSession::new();
        assert_eq!(session.status(), VoiceStatus::Idle);
        assert_eq!(session.status().to_string(), "Start conversation with Lexi");

        assert!(session.start());
        assert!(!session.start(), "cannot start twice while connecting");
        assert_eq!(session.status(), VoiceStatus::Connecting);

        session.apply(&VoiceEvent::SessionOpened);
        assert_eq!(session.status(), VoiceStatus::Listening);

        session.apply(&VoiceEvent::InputTranscript("Hi Lexi".into()));
        session.apply(&VoiceEvent::OutputTranscript("Hi!".into()));
        assert!(session.transcript().is_empty());
        let done = session.apply(&VoiceEvent::TurnComplete);
        assert_eq!(done.len(), 2);
        assert_eq!(session.transcript().len(), 2);

        session.stop();
        session.stop();
        assert_eq!(session.status(), VoiceStatus::Idle);
    }

    #[test]
    fn test_error_survives_close() {
        let mut session = VoiceSession::new();
        session.start();
        session.apply(&VoiceEvent::Error("socket reset".into()));
        session.apply(&VoiceEvent::Closed);
        assert_eq!(session.status(), VoiceStatus::Error);
        assert_eq!(session.status().label(), "Error. Click to retry.");
    }

    #[test]
    fn test_restart_clears_transcript() {
        let mut session = VoiceSession::new();
        session.start();
        session.apply(&VoiceEvent::SessionOpened);
        session.apply(&VoiceEvent::InputTranscript("half a sentence".into()));
        session.apply(&VoiceEvent::OutputTranscript("Sure".into()));
        session.apply(&VoiceEvent::TurnComplete);
        session.apply(&VoiceEvent::InputTranscript("dangling".into()));
        session.stop();

        assert!(session.start());
        assert!(session.transcript().is_empty());
        session.apply(&VoiceEvent::TurnComplete);
        assert!(session.transcript().is_empty(), "pending text was discarded");
    }
}
