//! Self-querying retriever.
//!
//! Before touching the vector index, the question is handed to the chat
//! model itself, which translates it into a semantic query plus an optional
//! structured filter over the single recognized metadata attribute: the
//! document's source path. "What do the files under projects/ say about
//! deadlines?" becomes filter `source contains "projects"` plus semantic
//! query "deadlines". Planning failures never lose the question — the raw
//! text is used unfiltered.

use anyhow::Result;
use serde::Deserialize;

use crate::embedding::Embedder;
use crate::index::VectorIndex;
use crate::llm::{ChatMessage, ChatModel};
use crate::models::ScoredChunk;

const PLANNER_INSTRUCTIONS: &str = "You translate a user question about a personal document \
collection into a search plan. The only filterable attribute is \"source\", the directory \
path of the document. Reply with a single JSON object and nothing else:\n\
{\"query\": \"<semantic search query>\", \"source_filter\": <\"<path fragment>\" or null>}\n\
Set source_filter only when the question explicitly names a folder, path, or file; \
otherwise use null.";

/// The structured plan derived from a free-text question.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QueryPlan {
    pub query: String,
    #[serde(default)]
    pub source_filter: Option<String>,
}

pub struct Retriever {
    index: VectorIndex,
    embedder: Embedder,
    k: usize,
}

impl Retriever {
    pub fn new(index: VectorIndex, embedder: Embedder, k: usize) -> Self {
        Self { index, embedder, k }
    }

    /// Plan the query with the chat model, embed the semantic part, and run
    /// a filtered top-k search. At most `k` chunks are returned.
    pub async fn retrieve(&self, model: &ChatModel, question: &str) -> Result<Vec<ScoredChunk>> {
        let plan = self.plan(model, question).await;
        let vector = self.embedder.embed_query(&plan.query).await?;
        self.index
            .search(&vector, plan.source_filter.as_deref(), self.k)
            .await
    }

    /// Ask the model for a query plan; fall back to the raw question with
    /// no filter if the call or the parse fails.
    async fn plan(&self, model: &ChatModel, question: &str) -> QueryPlan {
        let messages = [
            ChatMessage::system(PLANNER_INSTRUCTIONS),
            ChatMessage::user(question),
        ];

        match model.complete(&messages).await {
            Ok(raw) => parse_plan(&raw, question),
            Err(_) => fallback_plan(question),
        }
    }
}

/// Parse the model's reply into a [`QueryPlan`]. Models routinely wrap JSON
/// in code fences or prose, so the first `{…}` span is extracted before
/// parsing. Anything unusable falls back to the raw question.
pub fn parse_plan(raw: &str, question: &str) -> QueryPlan {
    let candidate = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => return fallback_plan(question),
    };

    match serde_json::from_str::<QueryPlan>(candidate) {
        Ok(mut plan) => {
            if plan.query.trim().is_empty() {
                plan.query = question.to_string();
            }
            if matches!(plan.source_filter.as_deref(), Some(s) if s.trim().is_empty()) {
                plan.source_filter = None;
            }
            plan
        }
        Err(_) => fallback_plan(question),
    }
}

fn fallback_plan(question: &str) -> QueryPlan {
    QueryPlan {
        query: question.to_string(),
        source_filter: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json_plan() {
        let plan = parse_plan(
            r#"{"query": "deadlines", "source_filter": "projects"}"#,
            "whatever",
        );
        assert_eq!(plan.query, "deadlines");
        assert_eq!(plan.source_filter.as_deref(), Some("projects"));
    }

    #[test]
    fn test_parse_fenced_json_plan() {
        let raw = "```json\n{\"query\": \"sky color\", \"source_filter\": null}\n```";
        let plan = parse_plan(raw, "What color is the sky?");
        assert_eq!(plan.query, "sky color");
        assert_eq!(plan.source_filter, None);
    }

    #[test]
    fn test_parse_garbage_falls_back_to_question() {
        let plan = parse_plan("I cannot help with that.", "What color is the sky?");
        assert_eq!(plan.query, "What color is the sky?");
        assert_eq!(plan.source_filter, None);
    }

    #[test]
    fn test_parse_empty_query_falls_back() {
        let plan = parse_plan(r#"{"query": "  ", "source_filter": null}"#, "original");
        assert_eq!(plan.query, "original");
    }

    #[test]
    fn test_parse_missing_filter_field() {
        let plan = parse_plan(r#"{"query": "notes"}"#, "q");
        assert_eq!(plan.query, "notes");
        assert_eq!(plan.source_filter, None);
    }

    #[test]
    fn test_parse_blank_filter_dropped() {
        let plan = parse_plan(r#"{"query": "notes", "source_filter": ""}"#, "q");
        assert_eq!(plan.source_filter, None);
    }
}
