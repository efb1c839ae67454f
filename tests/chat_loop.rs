//! End-to-end tests for the chat loop and the offline half of the pipeline
//! (loading, chunking, prompt rendering, memory), driven through the public
//! API with a scripted assistant instead of live services.

use std::fs;
use std::io::Cursor;

use anyhow::Result;
use async_trait::async_trait;

use docchat::chat::{run_chat_loop, Assistant};
use docchat::config::Config;
use docchat::loader::load_documents;
use docchat::memory::ConversationMemory;
use docchat::models::{DocChunk, ScoredChunk, Turn};
use docchat::prompt;

/// An assistant whose answers come from a fixed script, recording every
/// question it is asked.
struct ScriptedAssistant {
    questions: Vec<String>,
    answers: Vec<String>,
}

impl ScriptedAssistant {
    fn new(answers: &[&str]) -> Self {
        Self {
            questions: Vec::new(),
            answers: answers.iter().rev().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn ask(&mut self, question: &str) -> Result<String> {
        self.questions.push(question.to_string());
        Ok(self.answers.pop().unwrap_or_else(|| "…".to_string()))
    }
}

#[tokio::test]
async fn exit_word_as_first_line_never_reaches_the_assistant() {
    let mut assistant = ScriptedAssistant::new(&[]);
    let mut output = Vec::new();

    run_chat_loop(Cursor::new("sair\n"), &mut output, &mut assistant, "sair")
        .await
        .unwrap();

    assert!(assistant.questions.is_empty());
    let printed = String::from_utf8(output).unwrap();
    assert!(printed.contains("Digite 'sair' para fechar o chat"));
    assert!(!printed.contains("Resposta:"));
}

#[tokio::test]
async fn every_non_exit_line_is_one_question() {
    let mut assistant = ScriptedAssistant::new(&["blue", "green"]);
    let mut output = Vec::new();

    run_chat_loop(
        Cursor::new("What color is the sky?\nAnd the grass?\nsair\n"),
        &mut output,
        &mut assistant,
        "sair",
    )
    .await
    .unwrap();

    assert_eq!(
        assistant.questions,
        vec!["What color is the sky?", "And the grass?"]
    );
    let printed = String::from_utf8(output).unwrap();
    assert!(printed.contains("Resposta: blue"));
    assert!(printed.contains("Resposta: green"));
}

#[tokio::test]
async fn configurable_exit_word_is_honored() {
    let mut assistant = ScriptedAssistant::new(&["ok"]);
    let mut output = Vec::new();

    run_chat_loop(
        Cursor::new("sair\nexit\n"),
        &mut output,
        &mut assistant,
        "exit",
    )
    .await
    .unwrap();

    // "sair" is just a question when the exit word is "exit"
    assert_eq!(assistant.questions, vec!["sair"]);
}

#[tokio::test]
async fn loaded_chunks_flow_into_a_deterministic_prompt() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("notes.txt"), "The sky is blue.").unwrap();

    let toml = format!("[documents]\nroot = \"{}\"\n", tmp.path().display());
    let cfg: Config = toml::from_str(&toml).unwrap();

    let chunks = load_documents(&cfg).await.unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].source, "notes.txt");

    let context: Vec<ScoredChunk> = chunks
        .into_iter()
        .map(|chunk| ScoredChunk { chunk, score: 1.0 })
        .collect();

    let rendered = prompt::render(&context, &[], "What color is the sky?");
    assert_eq!(rendered.len(), 2);
    assert!(rendered[0].content.contains("The sky is blue."));
    assert_eq!(rendered[1].content, "What color is the sky?");

    let again = prompt::render(&context, &[], "What color is the sky?");
    assert_eq!(rendered, again);
}

#[tokio::test]
async fn memory_keeps_only_recent_turns_across_a_session() {
    // chars-as-tokens estimator; budget fits two short turns
    let estimate = |text: &str| text.len();
    let mut memory = ConversationMemory::new(16);

    for i in 0..5 {
        memory.push(
            Turn {
                question: format!("q{}", i),
                answer: format!("a{}", i),
            },
            estimate,
        );
    }

    let questions: Vec<&str> = memory.turns().iter().map(|t| t.question.as_str()).collect();
    assert_eq!(questions, vec!["q1", "q2", "q3", "q4"]);
}

#[tokio::test]
async fn history_appears_between_system_and_question() {
    let context = vec![ScoredChunk {
        chunk: DocChunk {
            text: "ctx".to_string(),
            source: "a.txt".to_string(),
        },
        score: 0.9,
    }];
    let history = vec![
        Turn {
            question: "first?".to_string(),
            answer: "first!".to_string(),
        },
        Turn {
            question: "second?".to_string(),
            answer: "second!".to_string(),
        },
    ];

    let rendered = prompt::render(&context, &history, "third?");
    let contents: Vec<&str> = rendered.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        &contents[1..],
        &["first?", "first!", "second?", "second!", "third?"]
    );
}
