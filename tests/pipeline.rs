//! End-to-end pipeline tests over temporary corpora.
//!
//! These exercise the engine through its public surface with the hashed
//! embedding provider (deterministic, offline) and injected chat backends,
//! so nothing here touches the network.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tempfile::TempDir;

use career_chat::config::{Config, EmbeddingConfig};
use career_chat::engine::RagEngine;
use career_chat::llm::{ChatBackend, LlmClient, LlmError, APOLOGY_REPLY};
use career_chat::store::VectorStore;

/// Answers differently depending on whether background context was supplied,
/// so tests can observe the retrieval → generation handoff.
struct EchoBackend;

#[async_trait]
impl ChatBackend for EchoBackend {
    async fn chat(&self, system: &str, _user: &str) -> Result<String, LlmError> {
        if system.contains("Your background and experience") {
            Ok("Grounded answer based on my background.".to_string())
        } else {
            Ok("General answer without any context.".to_string())
        }
    }
    fn model_name(&self) -> &str {
        "echo-test-model"
    }
}

/// Always fails, simulating an unreachable model endpoint.
struct FailingBackend;

#[async_trait]
impl ChatBackend for FailingBackend {
    async fn chat(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        })
    }
    fn model_name(&self) -> &str {
        "failing-test-model"
    }
}

fn hashed_embedding() -> EmbeddingConfig {
    EmbeddingConfig {
        provider: "hashed".to_string(),
        ..Default::default()
    }
}

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.documents.dir = root.join("docs");
    config.store.persist_dir = root.join("vector_store");
    config.chunking.max_chars = 200;
    config.chunking.overlap = 40;
    config.embedding = hashed_embedding();
    config
}

fn write_corpus(root: &Path) {
    let docs = root.join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(
        docs.join("skills.md"),
        "# Skills\n\nDeep experience with Python programming, data pipelines, and \
         distributed systems. Comfortable with Rust and SQL.",
    )
    .unwrap();
    fs::write(
        docs.join("experience.md"),
        "# Experience\n\nLed machine learning projects end to end, from data \
         collection through model deployment and monitoring.",
    )
    .unwrap();
}

async fn open_store(config: &Config) -> VectorStore {
    VectorStore::open(
        &config.store.persist_dir,
        &config.store.collection,
        config.embedding.clone(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn startup_indexes_corpus_and_answers_with_context() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let config = test_config(tmp.path());

    let store = open_store(&config).await;
    let engine = RagEngine::with_components(config, store, LlmClient::new(Box::new(EchoBackend)))
        .await
        .unwrap();

    let stats = engine.get_stats().await.unwrap();
    assert!(stats.documents_loaded > 0);
    assert_eq!(stats.collection_name, "candidate_profile");
    assert_eq!(stats.model, "echo-test-model");

    let answer = engine.query("Do you know Python?").await;
    assert_eq!(answer, "Grounded answer based on my background.");
}

#[tokio::test]
async fn startup_is_idempotent_over_populated_store() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let config = test_config(tmp.path());

    let first = RagEngine::with_components(
        config.clone(),
        open_store(&config).await,
        LlmClient::new(Box::new(EchoBackend)),
    )
    .await
    .unwrap();
    let count_after_first = first.get_stats().await.unwrap().documents_loaded;
    drop(first);

    // A second engine over the same store must not re-embed the corpus.
    let second = RagEngine::with_components(
        config.clone(),
        open_store(&config).await,
        LlmClient::new(Box::new(EchoBackend)),
    )
    .await
    .unwrap();
    assert_eq!(
        second.get_stats().await.unwrap().documents_loaded,
        count_after_first
    );
}

#[tokio::test]
async fn empty_corpus_still_answers() {
    let tmp = TempDir::new().unwrap();
    // No docs directory at all.
    let config = test_config(tmp.path());

    let engine = RagEngine::with_components(
        config.clone(),
        open_store(&config).await,
        LlmClient::new(Box::new(EchoBackend)),
    )
    .await
    .unwrap();

    assert_eq!(engine.get_stats().await.unwrap().documents_loaded, 0);

    let answer = engine.query("anything").await;
    assert!(!answer.is_empty());
    assert_eq!(answer, "General answer without any context.");
}

#[tokio::test]
async fn query_is_total_when_retrieval_and_generation_both_fail() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let config = test_config(tmp.path());

    // Populate the collection with working embeddings first.
    {
        let engine = RagEngine::with_components(
            config.clone(),
            open_store(&config).await,
            LlmClient::new(Box::new(EchoBackend)),
        )
        .await
        .unwrap();
        assert!(engine.get_stats().await.unwrap().documents_loaded > 0);
    }

    // Reopen with a disabled embedder (retrieval now errors) and a failing
    // chat backend (generation errors). The reply must still be the fixed
    // apology, not an error.
    let mut broken = config.clone();
    broken.embedding.provider = "disabled".to_string();
    let store = VectorStore::open(
        &broken.store.persist_dir,
        &broken.store.collection,
        broken.embedding.clone(),
    )
    .await
    .unwrap();

    let engine = RagEngine::with_components(broken, store, LlmClient::new(Box::new(FailingBackend)))
        .await
        .unwrap();

    let answer = engine.query("test").await;
    assert_eq!(answer, APOLOGY_REPLY);
}

#[tokio::test]
async fn add_documents_counts_and_grows_collection() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let config = test_config(tmp.path());

    let engine = RagEngine::with_components(
        config.clone(),
        open_store(&config).await,
        LlmClient::new(Box::new(EchoBackend)),
    )
    .await
    .unwrap();
    let initial = engine.get_stats().await.unwrap().documents_loaded;

    // A directory with no markdown is a warning, not an error.
    let empty_dir = tmp.path().join("empty");
    fs::create_dir_all(&empty_dir).unwrap();
    assert_eq!(engine.add_documents(Some(&empty_dir)).await.unwrap(), 0);

    // Re-adding the corpus grows the collection (no dedup).
    let added = engine
        .add_documents(Some(&config.documents.dir))
        .await
        .unwrap();
    assert!(added > 0);
    assert_eq!(
        engine.get_stats().await.unwrap().documents_loaded,
        initial + added
    );
}

#[tokio::test]
async fn reset_vector_store_rebuilds_from_corpus() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let config = test_config(tmp.path());

    let engine = RagEngine::with_components(
        config.clone(),
        open_store(&config).await,
        LlmClient::new(Box::new(EchoBackend)),
    )
    .await
    .unwrap();
    let initial = engine.get_stats().await.unwrap().documents_loaded;

    // Grow the collection past its clean state, then reset.
    engine
        .add_documents(Some(&config.documents.dir))
        .await
        .unwrap();
    assert!(engine.get_stats().await.unwrap().documents_loaded > initial);

    assert!(engine.reset_vector_store().await);
    assert_eq!(engine.get_stats().await.unwrap().documents_loaded, initial);
}

#[tokio::test]
async fn retrieval_failure_degrades_to_contextless_answer() {
    let tmp = TempDir::new().unwrap();
    write_corpus(tmp.path());
    let config = test_config(tmp.path());

    // Populate, then break only retrieval; generation still works.
    {
        RagEngine::with_components(
            config.clone(),
            open_store(&config).await,
            LlmClient::new(Box::new(EchoBackend)),
        )
        .await
        .unwrap();
    }

    let mut broken = config.clone();
    broken.embedding.provider = "disabled".to_string();
    let store = VectorStore::open(
        &broken.store.persist_dir,
        &broken.store.collection,
        broken.embedding.clone(),
    )
    .await
    .unwrap();

    let engine = RagEngine::with_components(broken, store, LlmClient::new(Box::new(EchoBackend)))
        .await
        .unwrap();

    let answer = engine.query("Do you know Python?").await;
    assert_eq!(answer, "General answer without any context.");
}
