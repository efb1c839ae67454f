//! Prompt rendering.
//!
//! Builds the fixed three-part prompt sent to the chat model: a system
//! instruction embedding the retrieved context, the prior conversation
//! turns, and the new question as the final user message. The structure is
//! deterministic for a given (context, history, question) triple.

use crate::llm::ChatMessage;
use crate::models::{ScoredChunk, Turn};

const SYSTEM_TEMPLATE: &str = "Você é um assistente responsável por responder perguntas sobre \
documentos. Responda a pergunta do usuário com um nível de detalhes razoável e baseando-se \
no(s) seguinte(s) documento(s) de contexto:\n\n{context}";

/// Render the chat prompt for one question.
pub fn render(context: &[ScoredChunk], history: &[Turn], question: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2 + history.len() * 2);

    messages.push(ChatMessage::system(
        SYSTEM_TEMPLATE.replace("{context}", &render_context(context)),
    ));

    for turn in history {
        messages.push(ChatMessage::user(turn.question.clone()));
        messages.push(ChatMessage::assistant(turn.answer.clone()));
    }

    messages.push(ChatMessage::user(question));

    messages
}

/// One block per retrieved chunk, labeled with its source path so the model
/// can cite where an answer came from.
fn render_context(context: &[ScoredChunk]) -> String {
    if context.is_empty() {
        return "(nenhum documento relevante encontrado)".to_string();
    }

    context
        .iter()
        .map(|sc| format!("[{}]\n{}", sc.chunk.source, sc.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::models::DocChunk;

    fn scored(text: &str, source: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: DocChunk {
                text: text.to_string(),
                source: source.to_string(),
            },
            score: 0.5,
        }
    }

    #[test]
    fn test_three_part_structure() {
        let context = vec![scored("The sky is blue.", "notes.txt")];
        let history = vec![Turn {
            question: "q1".to_string(),
            answer: "a1".to_string(),
        }];

        let messages = render(&context, &history, "What color is the sky?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "q1");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "a1");
        assert_eq!(messages[3].role, Role::User);
        assert_eq!(messages[3].content, "What color is the sky?");
    }

    #[test]
    fn test_context_embedded_in_system_message() {
        let context = vec![
            scored("The sky is blue.", "notes.txt"),
            scored("Grass is green.", "garden.md"),
        ];
        let messages = render(&context, &[], "colors?");

        assert!(messages[0].content.contains("The sky is blue."));
        assert!(messages[0].content.contains("[notes.txt]"));
        assert!(messages[0].content.contains("[garden.md]"));
        assert!(!messages[0].content.contains("{context}"));
    }

    #[test]
    fn test_empty_context_placeholder() {
        let messages = render(&[], &[], "anything");
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("nenhum documento"));
    }

    #[test]
    fn test_deterministic() {
        let context = vec![scored("A", "a.txt"), scored("B", "b.txt")];
        let history = vec![Turn {
            question: "q".to_string(),
            answer: "a".to_string(),
        }];
        let m1 = render(&context, &history, "question");
        let m2 = render(&context, &history, "question");
        assert_eq!(m1, m2);
    }
}
