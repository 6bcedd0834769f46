//! Text chat loop.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tutor_core::{ChatSession, Tutor};

use crate::render::chat_line;

pub const RESET_COMMAND: &str = "/reset";
pub const QUIT_COMMAND: &str = "/quit";

/// Runs the conversation until `/quit` or end of input.
pub async fn run_chat<R, W>(
    tutor: &dyn Tutor,
    session: &mut ChatSession,
    input: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "Type a message and press Enter. {} starts over, {} leaves.",
        RESET_COMMAND, QUIT_COMMAND
    )?;
    for message in session.messages() {
        writeln!(out, "{}", chat_line(message))?;
    }

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            QUIT_COMMAND => break,
            RESET_COMMAND => {
                session.reset();
                tracing::debug!("Chat session reset");
                for message in session.messages() {
                    writeln!(out, "{}", chat_line(message))?;
                }
            }
            text => {
                if let Some(reply) = session.send(tutor, text).await {
                    writeln!(out, "{}", chat_line(reply))?;
                }
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::OfflineTutor;
    use tutor_core::chat::GREETING;

    #[tokio::test]
    async fn test_chat_loop_handles_commands() -> Result<()> {
        let tutor = OfflineTutor::new();
        let mut session = ChatSession::new("persona");
        let input: &[u8] = b"I like tea\n\n/reset\nHello again\n/quit\nnever read\n";
        let mut out = Vec::new();

        run_chat(&tutor, &mut session, input, &mut out).await?;
        let out = String::from_utf8(out)?;

        assert!(out.contains("Lexi: That's interesting! You said: \"I like tea\"."));
        assert_eq!(out.matches(GREETING).count(), 2);
        assert!(!out.contains("never read"));
        // After the reset only the greeting and the last exchange remain.
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[1].text, "Hello again");
        Ok(())
    }
}
