//! # docchat
//!
//! A retrieval-augmented chat CLI for your local documents.
//!
//! docchat loads the documents under a configured directory at startup,
//! splits them into chunks, embeds every chunk through a hosted embedding
//! API, and upserts the vectors into an external vector database. Each
//! question is then answered by a self-querying retriever (the chat model
//! derives an optional source-path filter plus a semantic query), a fixed
//! three-part prompt, and a single chat-model call, with prior turns kept
//! in a token-bounded conversation memory.
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌────────────┐
//! │ Documents │──▶│ Chunk + Embed │──▶│ Vector DB  │
//! └───────────┘   └──────────────┘   └─────┬──────┘
//!                                          │ top-k
//! stdin ──▶ chat loop ──▶ retriever ───────┘
//!               │             │
//!               │         prompt + memory
//!               ▼             ▼
//!            stdout ◀── chat model (OpenAI / Gemini)
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`loader`] | Recursive document loading |
//! | [`chunk`] | Text chunking |
//! | [`embedding`] | Embedding API clients |
//! | [`index`] | Vector database client |
//! | [`llm`] | Chat-model clients |
//! | [`retriever`] | Self-querying retrieval |
//! | [`memory`] | Token-bounded conversation memory |
//! | [`prompt`] | Prompt rendering |
//! | [`rag`] | Pipeline orchestration |
//! | [`chat`] | Interactive loop |

pub mod chat;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod index;
pub mod llm;
pub mod loader;
pub mod memory;
pub mod models;
pub mod prompt;
pub mod rag;
pub mod retriever;
