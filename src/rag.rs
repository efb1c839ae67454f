//! The orchestrator wiring the pipeline together.
//!
//! Construction runs the whole ingestion sequence synchronously: select the
//! chat model, load and split the documents, embed every chunk, upsert into
//! the vector index, then build the retriever and an empty conversation
//! memory. A failure anywhere in that sequence is fatal — there is nothing
//! useful to serve without a populated index and a live model client.

use anyhow::Result;
use async_trait::async_trait;

use crate::chat::Assistant;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::index::VectorIndex;
use crate::llm::ChatModel;
use crate::loader::load_documents;
use crate::memory::ConversationMemory;
use crate::models::Turn;
use crate::prompt;
use crate::retriever::Retriever;

pub struct Rag {
    model: ChatModel,
    retriever: Retriever,
    memory: ConversationMemory,
}

impl Rag {
    /// Build the full pipeline: model client, document ingestion, index
    /// population, retriever, memory. Blocks until ingestion completes.
    pub async fn new(config: &Config) -> Result<Self> {
        let model = ChatModel::new(&config.chat.model)?;
        let embedder = Embedder::new(model.provider(), &config.embedding)?;
        let index = VectorIndex::new(&config.index)?;

        println!("Carregando documentos...");
        let chunks = load_documents(config).await?;
        println!(
            "{} trechos de {} serão indexados em '{}'",
            chunks.len(),
            config.documents.root.display(),
            index.collection()
        );

        index.ensure_collection(embedder.dims()).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_texts(&texts).await?;
        index.upsert(&chunks, &vectors).await?;

        let retriever = Retriever::new(index, embedder, config.chat.retrieval_k);
        let memory = ConversationMemory::new(config.chat.memory_max_tokens);

        Ok(Self {
            model,
            retriever,
            memory,
        })
    }
}

#[async_trait]
impl Assistant for Rag {
    /// Answer one question: retrieve context, render the prompt, make a
    /// single completion call, then record the turn. A failed model call
    /// records nothing and the error propagates to the loop.
    async fn ask(&mut self, question: &str) -> Result<String> {
        let context = self.retriever.retrieve(&self.model, question).await?;
        let messages = prompt::render(&context, self.memory.turns(), question);

        let answer = self.model.complete(&messages).await?;

        self.memory.push(
            Turn {
                question: question.to_string(),
                answer: answer.clone(),
            },
            |text| self.model.estimate_tokens(text),
        );

        Ok(answer)
    }
}
