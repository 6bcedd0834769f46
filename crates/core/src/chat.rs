use crate::lesson::ChatMessage;
use crate::tutor::Tutor;

pub const GREETING: &str = "Hi there! I'm Lexi, your AI English tutor. Let's practice your English. What would you like to talk about today?";
pub const CONNECTION_TROUBLE: &str =
    "Sorry, I'm having a little trouble connecting right now. Please try again in a moment.";

/// A text conversation with the tutor.
///
/// `messages` is what the learner sees, greeting and apologies included.
/// `history` is what the model sees: only completed user/AI exchanges.
pub struct ChatSession {
    system_instruction: String,
    messages: Vec<ChatMessage>,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(system_instruction: &str) -> Self {
        Self {
            system_instruction: system_instruction.to_string(),
            messages: vec![ChatMessage::ai(GREETING)],
            history: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Sends one user message and returns the AI message that was appended,
    /// or `None` when the input was blank.
    pub async fn send(&mut self, tutor: &dyn Tutor, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let user = ChatMessage::user(text);
        self.messages.push(user.clone());

        let mut turn = self.history.clone();
        turn.push(user.clone());

        match tutor.chat(&self.system_instruction, &turn).await {
            Ok(reply) => {
                let reply = ChatMessage::ai(&reply);
                self.history.push(user);
                self.history.push(reply.clone());
                self.messages.push(reply);
            }
            Err(e) => {
                tracing::error!("Chat request failed: {}", e);
                self.messages.push(ChatMessage::ai(CONNECTION_TROUBLE));
            }
        }
        self.messages.last()
    }

    /// Starts over with a fresh greeting and no model history.
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::ai(GREETING)];
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::Sender;
    use crate::tutor::{MockTutor, TutorError};

    #[tokio::test]
    async fn test_starts_with_greeting() {
        let session = ChatSession::new("persona");
        assert_eq!(session.messages(), &[ChatMessage::ai(GREETING)]);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut tutor = MockTutor::new();
        tutor.expect_chat().never();
        let mut session = ChatSession::new("persona");

        assert!(session.send(&tutor, "   ").await.is_none());
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_is_appended_and_history_grows() {
        let mut tutor = MockTutor::new();
        tutor.expect_chat().times(2).returning(|instruction, history| {
            assert_eq!(instruction, "persona");
            match history.len() {
                1 => {
                    assert_eq!(history, &[ChatMessage::user("I goed to the park")]);
                    Ok("Nice! We say \"I went to the park\".".to_string())
                }
                _ => {
                    assert_eq!(history.len(), 3);
                    assert_eq!(history[1].sender, Sender::Ai);
                    Ok("Tell me more!".to_string())
                }
            }
        });

        let mut session = ChatSession::new("persona");
        let reply = session.send(&tutor, "  I goed to the park ").await.cloned();
        assert_eq!(reply.map(|m| m.sender), Some(Sender::Ai));
        session.send(&tutor, "It was sunny").await;

        assert_eq!(session.messages().len(), 5);
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.messages()[4].text, "Tell me more!");
    }

    #[tokio::test]
    async fn test_failure_appends_apology_without_touching_history() {
        let mut tutor = MockTutor::new();
        tutor
            .expect_chat()
            .returning(|_, _| Err(TutorError::EmptyResponse));

        let mut session = ChatSession::new("persona");
        let reply = session.send(&tutor, "hello").await.cloned();

        assert_eq!(reply, Some(ChatMessage::ai(CONNECTION_TROUBLE)));
        assert_eq!(session.messages().len(), 3);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_reset_restores_greeting() {
        let mut tutor = MockTutor::new();
        tutor.expect_chat().returning(|_, _| Ok("hi".to_string()));

        let mut session = ChatSession::new("persona");
        session.send(&tutor, "hello").await;
        session.reset();

        assert_eq!(session.messages(), &[ChatMessage::ai(GREETING)]);
        assert!(session.history().is_empty());
    }
}
