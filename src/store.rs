//! SQLite-backed vector store.
//!
//! Owns the persistent collection of embedded chunks: each entry is a
//! `(text, metadata, embedding)` triple stored under a freshly generated
//! UUID. Collections are addressed by a `(persist_directory, collection)`
//! pair; several collections can share one database file. Similarity search
//! embeds the query, scores every entry in the collection by cosine
//! distance in Rust, and returns the closest `k`.
//!
//! Re-adding the same text grows the collection; there is no content
//! dedup. [`VectorStore::reset`] empties the collection for a full rebuild.
//!
//! The database runs in WAL mode, which tolerates concurrent readers plus a
//! single writer when multiple processes share the persisted collection.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use uuid::Uuid;

use crate::config::EmbeddingConfig;
use crate::embedding::{self, EmbeddingProvider};
use crate::models::{ChunkMetadata, SearchResult};

/// Typed errors for store operations.
///
/// `ArgumentMismatch` is a programmer error and should surface loudly;
/// the other variants wrap storage or embedding failures, which propagate
/// to the caller rather than being swallowed (a corrupted index is worse
/// than a visible failure).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("texts and metadatas must correspond one-to-one ({texts} texts, {metadatas} metadatas)")]
    ArgumentMismatch { texts: usize, metadatas: usize },
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("embedding error: {0}")]
    Embedding(#[source] anyhow::Error),
    #[error("metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct VectorStore {
    pool: SqlitePool,
    collection: String,
    embedding_config: EmbeddingConfig,
    provider: Box<dyn EmbeddingProvider>,
}

impl VectorStore {
    /// Open or create the named collection under `persist_dir`.
    ///
    /// Fails when the directory cannot be created or the database cannot be
    /// opened; construction errors are fatal and propagate to the caller.
    pub async fn open(
        persist_dir: &Path,
        collection: &str,
        embedding_config: EmbeddingConfig,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(persist_dir).map_err(|e| {
            anyhow::anyhow!(
                "Cannot create vector store directory {}: {}",
                persist_dir.display(),
                e
            )
        })?;

        let db_path = persist_dir.join("store.sqlite");
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // Idempotent schema setup
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                text TEXT NOT NULL,
                metadata_json TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_collection ON entries(collection)")
            .execute(&pool)
            .await?;

        let provider = embedding::create_provider(&embedding_config)?;

        Ok(Self {
            pool,
            collection: collection.to_string(),
            embedding_config,
            provider,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Embed and store `texts` with their corresponding `metadatas`.
    ///
    /// The two slices must correspond one-to-one; a length mismatch is
    /// rejected with [`StoreError::ArgumentMismatch`]. Empty input is a
    /// no-op. Each pair is stored under a freshly generated UUID, so
    /// re-adding identical content grows the collection.
    pub async fn add_documents(
        &self,
        texts: &[String],
        metadatas: &[ChunkMetadata],
    ) -> Result<(), StoreError> {
        if texts.len() != metadatas.len() {
            return Err(StoreError::ArgumentMismatch {
                texts: texts.len(),
                metadatas: metadatas.len(),
            });
        }
        if texts.is_empty() {
            return Ok(());
        }

        let embeddings = embedding::embed_texts(self.provider.as_ref(), &self.embedding_config, texts)
            .await
            .map_err(StoreError::Embedding)?;

        let mut tx = self.pool.begin().await?;

        for ((text, metadata), vector) in texts.iter().zip(metadatas).zip(&embeddings) {
            let metadata_json = serde_json::to_string(metadata)?;
            sqlx::query(
                "INSERT INTO entries (id, collection, text, metadata_json, embedding) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&self.collection)
            .bind(text)
            .bind(metadata_json)
            .bind(embedding::vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Return up to `k` entries closest to `query`, ordered by ascending
    /// cosine distance. An empty collection or `k == 0` yields an empty
    /// list, never an error.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        if k == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let query_vec =
            embedding::embed_query(self.provider.as_ref(), &self.embedding_config, query)
                .await
                .map_err(StoreError::Embedding)?;

        let rows = sqlx::query(
            "SELECT id, text, metadata_json, embedding FROM entries WHERE collection = ?",
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        let mut results: Vec<SearchResult> = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.get("embedding");
            let vector = embedding::blob_to_vec(&blob);
            let distance = 1.0 - embedding::cosine_similarity(&query_vec, &vector);

            let metadata_json: String = row.get("metadata_json");
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)?;

            results.push(SearchResult {
                document: row.get("text"),
                metadata,
                distance,
                id: row.get("id"),
            });
        }

        // Ascending distance: closest first. Ties keep row order, which is
        // stable for a given database.
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    /// Number of entries stored in this collection.
    pub async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE collection = ?")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Delete every entry in this collection, leaving it empty.
    pub async fn reset(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM entries WHERE collection = ?")
            .bind(&self.collection)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn hashed_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "hashed".to_string(),
            ..Default::default()
        }
    }

    async fn open_store(dir: &Path) -> VectorStore {
        VectorStore::open(dir, "test_collection", hashed_config())
            .await
            .unwrap()
    }

    fn sample_texts() -> Vec<String> {
        vec![
            "This is a document about Python programming and data science.".to_string(),
            "Machine learning is a subset of artificial intelligence.".to_string(),
            "ChromaDB is a vector database for storing embeddings.".to_string(),
            "Natural language processing involves analyzing human language.".to_string(),
        ]
    }

    fn sample_metadatas() -> Vec<ChunkMetadata> {
        ["python_doc.md", "ml_doc.md", "chroma_doc.md", "nlp_doc.md"]
            .iter()
            .map(|s| ChunkMetadata::from_source(*s))
            .collect()
    }

    #[tokio::test]
    async fn test_count_round_trip_and_reset() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(tmp.path()).await;

        assert_eq!(store.count().await.unwrap(), 0);

        store
            .add_documents(&sample_texts(), &sample_metadatas())
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 4);

        store.reset().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mismatched_lengths_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(tmp.path()).await;

        let texts = vec!["a".to_string(), "b".to_string()];
        let metadatas = vec![ChunkMetadata::from_source("x.md")];
        let err = store.add_documents(&texts, &metadatas).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ArgumentMismatch {
                texts: 2,
                metadatas: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_add_is_noop() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(tmp.path()).await;
        store.add_documents(&[], &[]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_empty_collection_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(tmp.path()).await;
        let results = store.similarity_search("anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_k_zero_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(tmp.path()).await;
        store
            .add_documents(&sample_texts(), &sample_metadatas())
            .await
            .unwrap();
        let results = store.similarity_search("python", 0).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_ordering_and_bound() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(tmp.path()).await;
        store
            .add_documents(&sample_texts(), &sample_metadatas())
            .await
            .unwrap();

        let results = store.similarity_search("machine learning", 3).await.unwrap();
        assert!(results.len() <= 3);
        for pair in results.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }

        // k larger than the collection returns everything there is
        let all = store.similarity_search("machine learning", 50).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_search_finds_relevant_document() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(tmp.path()).await;
        store
            .add_documents(&sample_texts(), &sample_metadatas())
            .await
            .unwrap();

        let results = store
            .similarity_search("Python programming", 1)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].document.contains("Python"));
        assert_eq!(results[0].metadata.source, "python_doc.md");
    }

    #[tokio::test]
    async fn test_duplicate_adds_grow_collection() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(tmp.path()).await;

        let texts = vec!["same text".to_string()];
        let metadatas = vec![ChunkMetadata::from_source("a.md")];
        store.add_documents(&texts, &metadatas).await.unwrap();
        store.add_documents(&texts, &metadatas).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = open_store(tmp.path()).await;
            store
                .add_documents(&sample_texts(), &sample_metadatas())
                .await
                .unwrap();
        }
        let reopened = open_store(tmp.path()).await;
        assert_eq!(reopened.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let store_a = open_store(tmp.path()).await;
        store_a
            .add_documents(
                &["alpha".to_string()],
                &[ChunkMetadata::from_source("a.md")],
            )
            .await
            .unwrap();

        let store_b = VectorStore::open(tmp.path(), "other_collection", hashed_config())
            .await
            .unwrap();
        assert_eq!(store_b.count().await.unwrap(), 0);
        assert_eq!(store_a.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disabled_provider_search_errors_on_populated_collection() {
        let tmp = TempDir::new().unwrap();
        {
            let store = open_store(tmp.path()).await;
            store
                .add_documents(&sample_texts(), &sample_metadatas())
                .await
                .unwrap();
        }

        let disabled = VectorStore::open(
            tmp.path(),
            "test_collection",
            EmbeddingConfig {
                provider: "disabled".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = disabled.similarity_search("anything", 3).await;
        assert!(matches!(err, Err(StoreError::Embedding(_))));
    }
}
