//! The retrieval-augmented query pipeline.
//!
//! [`RagEngine`] owns one vector store and one language model client and
//! supervises the whole query path: retrieve → format context → generate,
//! with graceful degradation at every stage. Errors are threaded as values,
//! and the engine is the error boundary. [`RagEngine::query`] always
//! returns an answer string, never an error:
//!
//! 1. a retrieval failure drops to generation without context;
//! 2. a generation failure is retried once without context;
//! 3. a second failure yields a fixed apologetic reply.
//!
//! Each query is independent; the engine holds no conversational state.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use crate::chunk::Chunker;
use crate::config::Config;
use crate::context::format_context;
use crate::credentials;
use crate::llm::{LlmClient, LlmError, APOLOGY_REPLY};
use crate::loader;
use crate::models::Stats;
use crate::store::VectorStore;
use crate::telemetry;

pub struct RagEngine {
    config: Config,
    store: VectorStore,
    llm: LlmClient,
    chunker: Chunker,
}

impl RagEngine {
    /// Build the engine from configuration: open the collection, resolve an
    /// API credential, and eagerly index the documents directory when the
    /// collection is empty.
    ///
    /// Fails when the store cannot be opened or no credential resolves;
    /// initialization problems are fatal, unlike per-query failures.
    pub async fn new(config: Config) -> Result<Self> {
        let store = VectorStore::open(
            &config.store.persist_dir,
            &config.store.collection,
            config.embedding.clone(),
        )
        .await?;

        let token = credentials::resolve_token(&config.llm)
            .await?
            .ok_or(LlmError::MissingCredential)?;
        let llm = LlmClient::from_config(&config.llm, token)?;

        Self::with_components(config, store, llm).await
    }

    /// Build over explicit components. Hosts use [`RagEngine::new`]; this
    /// entry point exists for custom transports and tests.
    pub async fn with_components(
        config: Config,
        store: VectorStore,
        llm: LlmClient,
    ) -> Result<Self> {
        let chunker = Chunker::new(config.chunking.max_chars, config.chunking.overlap);
        let engine = Self {
            config,
            store,
            llm,
            chunker,
        };
        engine.ensure_indexed().await?;
        Ok(engine)
    }

    /// Index the configured documents directory when the collection is
    /// empty. A populated collection is left untouched, so repeated process
    /// restarts do not re-embed unchanged documents.
    async fn ensure_indexed(&self) -> Result<()> {
        if self.store.count().await? == 0 {
            let added = self.add_documents(None).await?;
            telemetry::system_event("startup_index", &format!("indexed {added} chunks"));
        } else {
            tracing::debug!("vector store already populated; skipping document reload");
        }
        Ok(())
    }

    /// Answer a question. Total: always returns a reply string.
    pub async fn query(&self, question: &str) -> String {
        let started = Instant::now();

        let context = match self
            .store
            .similarity_search(question, self.config.llm.top_k)
            .await
        {
            Ok(results) => format_context(&results),
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed; answering without context");
                None
            }
        };

        let answer = match self.llm.generate(question, context.as_deref()).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "generation failed; retrying without context");
                match self.llm.generate(question, None).await {
                    Ok(answer) => answer,
                    Err(e) => {
                        tracing::error!(error = %e, "generation failed twice; using fallback reply");
                        APOLOGY_REPLY.to_string()
                    }
                }
            }
        };

        telemetry::chat_interaction(question, &answer, started.elapsed().as_millis());
        answer
    }

    /// Load, chunk, embed, and store every markdown document under `path`
    /// (the configured documents directory when `None`). Returns the number
    /// of chunks added; an empty directory adds nothing and is reported as
    /// a warning, not an error.
    pub async fn add_documents(&self, path: Option<&Path>) -> Result<usize> {
        let dir = path.unwrap_or(&self.config.documents.dir);
        let documents = loader::load_documents(dir)?;

        if documents.is_empty() {
            tracing::warn!(dir = %dir.display(), "no markdown documents found");
            return Ok(0);
        }

        let chunks = self.chunker.chunk_documents(&documents);
        let (texts, metadatas): (Vec<_>, Vec<_>) =
            chunks.into_iter().map(|c| (c.text, c.metadata)).unzip();

        self.store.add_documents(&texts, &metadatas).await?;

        tracing::info!(
            documents = documents.len(),
            chunks = texts.len(),
            dir = %dir.display(),
            "indexed documents"
        );
        Ok(texts.len())
    }

    /// Empty the collection and rebuild it from the configured documents
    /// directory. Returns whether the rebuild succeeded.
    pub async fn reset_vector_store(&self) -> bool {
        match self.try_reset().await {
            Ok(added) => {
                telemetry::system_event("reindex", &format!("rebuilt collection with {added} chunks"));
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "vector store reset failed");
                false
            }
        }
    }

    async fn try_reset(&self) -> Result<usize> {
        self.store.reset().await?;
        self.add_documents(None).await
    }

    /// Current engine state. Hosts map an `Err` into an error payload and
    /// treat initialization as failed.
    pub async fn get_stats(&self) -> Result<Stats> {
        Ok(Stats {
            documents_loaded: self.store.count().await?,
            collection_name: self.store.collection_name().to_string(),
            model: self.llm.model_name().to_string(),
        })
    }
}
