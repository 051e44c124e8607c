//! # Career Chat
//!
//! A retrieval-augmented chatbot that answers recruiter questions about a
//! job candidate, grounded in a small corpus of markdown biography and
//! resume documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌─────────────┐
//! │  Loader  │──▶│ Chunker  │──▶│ VectorStore │   (build time)
//! │  *.md    │   │ overlap  │   │ SQLite+cos  │
//! └──────────┘   └──────────┘   └──────┬──────┘
//!                                      │ similarity_search
//!                ┌─────────────────────┤
//!                ▼                     ▼
//!          ┌───────────┐        ┌───────────┐
//!          │  Context  │───────▶│ LlmClient │──▶ answer
//!          │ Formatter │        │  persona  │
//!          └───────────┘        └───────────┘
//!                    (query time, supervised by RagEngine)
//! ```
//!
//! The [`engine::RagEngine`] is the error boundary: retrieval failures
//! degrade to answering without context, generation failures are retried
//! once without context, and a second failure yields a fixed apologetic
//! reply, so `query()` always returns a string.
//!
//! ## Quick Start
//!
//! ```bash
//! cchat init                    # build the vector store from ./docs
//! cchat ask "What languages do you know?"
//! cchat chat                    # interactive loop
//! cchat serve                   # HTTP chat API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with defaults |
//! | [`models`] | Core data types |
//! | [`loader`] | Markdown document loading |
//! | [`chunk`] | Overlapping, boundary-preferring chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | SQLite-backed vector store |
//! | [`context`] | Retrieved-context formatting |
//! | [`llm`] | Language model client and persona |
//! | [`credentials`] | API token resolution cascade |
//! | [`engine`] | The RAG query pipeline |
//! | [`telemetry`] | Structured logging and domain events |
//! | [`server`] | HTTP chat host |

pub mod chunk;
pub mod config;
pub mod context;
pub mod credentials;
pub mod embedding;
pub mod engine;
pub mod llm;
pub mod loader;
pub mod models;
pub mod server;
pub mod store;
pub mod telemetry;
