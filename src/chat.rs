//! Interactive chat loop.
//!
//! Reads one line at a time, short-circuits on the exit word, otherwise
//! forwards the line to the assistant and prints the labeled answer. The
//! loop is generic over its reader, writer, and assistant so it can be
//! driven by stdin in production and by buffers plus a mock in tests.

use anyhow::Result;
use async_trait::async_trait;
use std::io::{BufRead, Write};

/// Anything that can answer a question. Implemented by [`crate::rag::Rag`]
/// and by mocks in tests.
#[async_trait]
pub trait Assistant {
    async fn ask(&mut self, question: &str) -> Result<String>;
}

/// Run the chat loop until the exit word or EOF.
///
/// Every non-exit line — empty lines included — is forwarded verbatim as a
/// question; there is no input validation beyond the sentinel check. Errors
/// from the assistant propagate and terminate the loop.
pub async fn run_chat_loop<R, W, A>(
    mut reader: R,
    mut writer: W,
    assistant: &mut A,
    exit_word: &str,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    A: Assistant + Send,
{
    writeln!(writer, "Digite '{}' para fechar o chat", exit_word)?;

    loop {
        write!(writer, "Prompt: ")?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            // EOF behaves like the exit word
            break;
        }

        let question = line.trim_end_matches(['\n', '\r']);
        if question == exit_word {
            break;
        }

        let answer = assistant.ask(question).await?;
        writeln!(writer, "Resposta: {}", answer)?;
    }

    Ok(())
}
