//! SQLite storage backend implementation.

use crate::chunk::{Chunk, ChunkId, ChunkMetadata};
use crate::content_hash::ContentHash;
use crate::error::{Error, Result};
use crate::query::SearchQuery;
use crate::storage::traits::{
    ChunkStore, CorpusStats, Embedding, QueryStore, SimilarityResult, StatsStore, VectorStore,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const CHUNK_COLUMNS: &str =
    "id, url, chunk_number, title, content, content_hash, source, url_path, chunk_size, crawled_at";

fn insert_chunk(conn: &Connection, chunk: &Chunk) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO chunks ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            CHUNK_COLUMNS
        ),
        params![
            chunk.id.as_str(),
            chunk.url,
            chunk.chunk_number as i64,
            chunk.title,
            chunk.content,
            chunk.content_hash.to_hex(),
            chunk.metadata.source,
            chunk.metadata.url_path,
            chunk.metadata.chunk_size as i64,
            format_timestamp(chunk.metadata.crawled_at),
        ],
    )
}

fn insert_embedding(conn: &Connection, id: &ChunkId, embedding: &Embedding) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO embeddings
        (chunk_id, model_id, vector, dimensions)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            id.as_str(),
            embedding.model_id,
            encode_vector(&embedding.vector),
            embedding.dimensions as i64,
        ],
    )
}

/// SQLite-based storage implementation.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite storage (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Store a chunk together with its embedding, atomically.
    pub async fn put_embedded(&self, chunk: &Chunk, embedding: &Embedding) -> Result<ChunkId> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_chunk(&tx, chunk)?;
        insert_embedding(&tx, &chunk.id, embedding)?;
        tx.commit()?;
        Ok(chunk.id.clone())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::Storage(format!("connection lock poisoned: {}", e)))
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            -- Chunks table
            CREATE TABLE IF NOT EXISTS chunks (
                id              TEXT PRIMARY KEY,
                url             TEXT NOT NULL,
                chunk_number    INTEGER NOT NULL,
                title           TEXT NOT NULL,
                content         TEXT NOT NULL,
                content_hash    TEXT NOT NULL,
                source          TEXT NOT NULL,
                url_path        TEXT NOT NULL,
                chunk_size      INTEGER NOT NULL,
                crawled_at      TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_url ON chunks(url);
            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);

            -- Embeddings table
            CREATE TABLE IF NOT EXISTS embeddings (
                chunk_id        TEXT PRIMARY KEY,
                model_id        TEXT NOT NULL,
                vector          BLOB NOT NULL,
                dimensions      INTEGER NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    /// Brute-force cosine ranking over stored embeddings, with optional filters.
    fn rank(
        &self,
        query: &Embedding,
        filter: Option<&SearchQuery>,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<SimilarityResult>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT e.chunk_id, e.vector, e.dimensions
            FROM embeddings e JOIN chunks c ON c.id = e.chunk_id
            WHERE (?1 IS NULL OR c.source = ?1)
              AND (?2 IS NULL OR instr(c.url, ?2) > 0)
              AND (?3 IS NULL OR c.crawled_at > ?3)
              AND (?4 IS NULL OR c.crawled_at < ?4)
            "#,
        )?;

        let source = filter.and_then(|f| f.source.clone());
        let url_pattern = filter.and_then(|f| f.url_pattern.clone());
        let after = filter.and_then(|f| f.after).map(format_timestamp);
        let before = filter.and_then(|f| f.before).map(format_timestamp);

        let rows = stmt.query_map(params![source, url_pattern, after, before], |row| {
            let id: String = row.get(0)?;
            let vector_bytes: Vec<u8> = row.get(1)?;
            let dimensions: i64 = row.get(2)?;
            Ok((id, decode_vector(&vector_bytes), dimensions as usize))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (id, vector, dimensions) = row?;
            // Vectors from another embedding model are not comparable
            if dimensions != query.dimensions {
                continue;
            }
            let candidate = Embedding {
                vector,
                model_id: String::new(),
                dimensions,
            };
            let similarity = query.cosine_similarity(&candidate);
            if similarity >= threshold {
                results.push(SimilarityResult {
                    chunk_id: ChunkId::from(id),
                    similarity,
                });
            }
        }

        results.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        results.truncate(limit);

        Ok(results)
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<Chunk> {
    let id: String = row.get(0)?;
    let hash_str: String = row.get(5)?;
    let crawled_at: String = row.get(9)?;

    let content_hash = ContentHash::from_hex(&hash_str).map_err(|e| conversion_error(5, e))?;
    let crawled_at = DateTime::parse_from_rfc3339(&crawled_at)
        .map_err(|e| conversion_error(9, e))?
        .with_timezone(&Utc);

    Ok(Chunk {
        id: ChunkId::from(id),
        url: row.get(1)?,
        chunk_number: row.get::<_, i64>(2)? as usize,
        title: row.get(3)?,
        content: row.get(4)?,
        content_hash,
        metadata: ChunkMetadata {
            source: row.get(6)?,
            url_path: row.get(7)?,
            chunk_size: row.get::<_, i64>(8)? as usize,
            crawled_at,
        },
    })
}

#[async_trait]
impl ChunkStore for SqliteStorage {
    async fn put(&self, chunk: &Chunk) -> Result<ChunkId> {
        let conn = self.conn()?;
        insert_chunk(&conn, chunk)?;
        Ok(chunk.id.clone())
    }

    async fn get(&self, id: &ChunkId) -> Result<Option<Chunk>> {
        let conn = self.conn()?;
        let chunk = conn
            .query_row(
                &format!("SELECT {} FROM chunks WHERE id = ?1", CHUNK_COLUMNS),
                params![id.as_str()],
                row_to_chunk,
            )
            .optional()?;
        Ok(chunk)
    }

    async fn exists(&self, id: &ChunkId) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn get_many(&self, ids: &[ChunkId]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for id in ids {
            if let Some(chunk) = ChunkStore::get(self, id).await? {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn content_hash_of(&self, id: &ChunkId) -> Result<Option<ContentHash>> {
        let conn = self.conn()?;
        let hash: Option<String> = conn
            .query_row(
                "SELECT content_hash FROM chunks WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match hash {
            Some(h) => ContentHash::from_hex(&h)
                .map(Some)
                .map_err(|e| Error::Storage(format!("corrupt content hash for {}: {}", id, e))),
            None => Ok(None),
        }
    }

    async fn touch(&self, id: &ChunkId, crawled_at: DateTime<Utc>) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE chunks SET crawled_at = ?2 WHERE id = ?1",
            params![id.as_str(), format_timestamp(crawled_at)],
        )?;
        Ok(updated > 0)
    }

    async fn delete_by_url(&self, url: &str) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM embeddings WHERE chunk_id IN (SELECT id FROM chunks WHERE url = ?1)",
            params![url],
        )?;
        let removed = tx.execute("DELETE FROM chunks WHERE url = ?1", params![url])?;
        tx.commit()?;
        Ok(removed)
    }
}

#[async_trait]
impl VectorStore for SqliteStorage {
    async fn put(&self, id: &ChunkId, embedding: &Embedding) -> Result<()> {
        let conn = self.conn()?;
        insert_embedding(&conn, id, embedding)?;
        Ok(())
    }

    async fn get(&self, id: &ChunkId) -> Result<Option<Embedding>> {
        let conn = self.conn()?;
        let embedding = conn
            .query_row(
                "SELECT model_id, vector, dimensions FROM embeddings WHERE chunk_id = ?1",
                params![id.as_str()],
                |row| {
                    let model_id: String = row.get(0)?;
                    let vector_bytes: Vec<u8> = row.get(1)?;
                    let dimensions: i64 = row.get(2)?;
                    Ok(Embedding {
                        vector: decode_vector(&vector_bytes),
                        model_id,
                        dimensions: dimensions as usize,
                    })
                },
            )
            .optional()?;
        Ok(embedding)
    }

    async fn search(
        &self,
        query: &Embedding,
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<SimilarityResult>> {
        self.rank(query, None, limit, threshold)
    }
}

#[async_trait]
impl QueryStore for SqliteStorage {
    async fn query(
        &self,
        query: &SearchQuery,
        embedding: &Embedding,
        threshold: f32,
    ) -> Result<Vec<SimilarityResult>> {
        self.rank(embedding, Some(query), query.limit, threshold)
    }
}

#[async_trait]
impl StatsStore for SqliteStorage {
    async fn stats(&self) -> Result<Option<CorpusStats>> {
        let conn = self.conn()?;

        let (doc_count, last_updated): (i64, Option<String>) = conn.query_row(
            "SELECT COUNT(*), MAX(crawled_at) FROM chunks",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        if doc_count == 0 {
            return Ok(None);
        }

        let distinct = |column: &str| -> Result<Vec<String>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT DISTINCT {col} FROM chunks ORDER BY {col}",
                col = column
            ))?;
            let values = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(values)
        };

        let urls = distinct("url")?;
        let domains = distinct("source")?;

        let last_updated = last_updated
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc));

        Ok(Some(CorpusStats {
            doc_count: doc_count as usize,
            urls,
            domains,
            last_updated,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::TestFixtures;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn test_chunk_store() {
        let storage = SqliteStorage::in_memory().unwrap();
        let chunk = TestFixtures::chunk("https://forum.example.com/t/1", 0, "How to treat a fever?");

        // Store chunk
        let id = ChunkStore::put(&storage, &chunk).await.unwrap();
        assert_eq!(id, chunk.id);

        // Retrieve chunk
        let retrieved = ChunkStore::get(&storage, &id).await.unwrap().unwrap();
        assert_eq!(retrieved.content, chunk.content);
        assert_eq!(retrieved.title, chunk.title);
        assert_eq!(retrieved.content_hash, chunk.content_hash);
        assert_eq!(retrieved.metadata, chunk.metadata);

        assert!(storage.exists(&id).await.unwrap());
        assert!(ChunkStore::get(&storage, &ChunkId::from("missing".to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_same_id() {
        let storage = SqliteStorage::in_memory().unwrap();
        let first = TestFixtures::chunk("https://forum.example.com/t/1", 0, "old answer");
        let second = TestFixtures::chunk("https://forum.example.com/t/1", 0, "new answer");

        ChunkStore::put(&storage, &first).await.unwrap();
        ChunkStore::put(&storage, &second).await.unwrap();

        assert_eq!(storage.count().await.unwrap(), 1);
        let hash = storage.content_hash_of(&first.id).await.unwrap();
        assert_eq!(hash, Some(second.content_hash));
    }

    #[tokio::test]
    async fn test_put_embedded_and_touch() {
        let storage = SqliteStorage::in_memory().unwrap();
        let mut chunk = TestFixtures::chunk("https://forum.example.com/t/1", 0, "fever");
        chunk.metadata.crawled_at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();

        storage
            .put_embedded(&chunk, &TestFixtures::embedding(3, "m1"))
            .await
            .unwrap();
        let embedding = VectorStore::get(&storage, &chunk.id).await.unwrap().unwrap();
        assert_eq!(embedding.model_id, "m1");

        let later = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        assert!(storage.touch(&chunk.id, later).await.unwrap());
        let touched = ChunkStore::get(&storage, &chunk.id).await.unwrap().unwrap();
        assert_eq!(touched.metadata.crawled_at, later);
        assert_eq!(touched.content, "fever");

        let missing = ChunkId::new("https://forum.example.com/t/404", 0);
        assert!(!storage.touch(&missing, later).await.unwrap());
    }

    #[tokio::test]
    async fn test_vector_store() {
        let storage = SqliteStorage::in_memory().unwrap();
        let id = ChunkId::new("https://forum.example.com/t/1", 0);
        let embedding = Embedding::new(vec![1.0, 0.5, 0.0], "test-model".to_string());

        VectorStore::put(&storage, &id, &embedding).await.unwrap();

        let retrieved = VectorStore::get(&storage, &id).await.unwrap().unwrap();
        assert_eq!(retrieved.vector, embedding.vector);
        assert_eq!(retrieved.model_id, embedding.model_id);
        assert_eq!(retrieved.dimensions, 3);
    }

    #[tokio::test]
    async fn test_vector_search() {
        let storage = SqliteStorage::in_memory().unwrap();

        let vectors = [
            ("https://forum.example.com/t/1", vec![1.0, 0.0, 0.0]),
            ("https://forum.example.com/t/2", vec![0.9, 0.1, 0.0]),
            ("https://forum.example.com/t/3", vec![0.0, 1.0, 0.0]),
        ];
        for (url, vector) in &vectors {
            let chunk = TestFixtures::chunk(url, 0, url);
            ChunkStore::put(&storage, &chunk).await.unwrap();
            VectorStore::put(&storage, &chunk.id, &Embedding::new(vector.clone(), "test".to_string()))
                .await
                .unwrap();
        }

        let query = Embedding::new(vec![1.0, 0.0, 0.0], "test".to_string());
        let results = storage.search(&query, 2, 0.8).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk_id, ChunkId::new("https://forum.example.com/t/1", 0));
        assert_eq!(results[1].chunk_id, ChunkId::new("https://forum.example.com/t/2", 0));
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn test_search_skips_other_dimensions() {
        let storage = SqliteStorage::in_memory().unwrap();
        let chunk = TestFixtures::chunk("https://forum.example.com/t/1", 0, "text");
        ChunkStore::put(&storage, &chunk).await.unwrap();
        VectorStore::put(&storage, &chunk.id, &Embedding::new(vec![1.0, 0.0], "old".to_string()))
            .await
            .unwrap();

        let query = Embedding::new(vec![1.0, 0.0, 0.0], "new".to_string());
        assert!(storage.search(&query, 3, -1.0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filtered_query() {
        let storage = SqliteStorage::in_memory().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let mut a = TestFixtures::chunk("https://a.example.com/forums/1", 0, "alpha");
        a.metadata.crawled_at = base;
        let mut b = TestFixtures::chunk("https://b.example.com/blog/1", 0, "beta");
        b.metadata.crawled_at = base + Duration::days(10);

        for chunk in [&a, &b] {
            ChunkStore::put(&storage, chunk).await.unwrap();
            VectorStore::put(&storage, &chunk.id, &Embedding::new(vec![1.0, 1.0], "t".to_string()))
                .await
                .unwrap();
        }
        let embedding = Embedding::new(vec![1.0, 1.0], "t".to_string());

        let q = SearchQuery::parse("anything source:a.example.com");
        let hits = storage.query(&q, &embedding, 0.0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, a.id);

        let q = SearchQuery::parse("anything url:/blog/");
        let hits = storage.query(&q, &embedding, 0.0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, b.id);

        let q = SearchQuery::parse("anything after:2024-03-05T00:00:00Z");
        let hits = storage.query(&q, &embedding, 0.0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, b.id);
    }

    #[tokio::test]
    async fn test_stats() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(storage.stats().await.unwrap().is_none());

        let early = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();

        let mut c1 = TestFixtures::chunk("https://b.example.com/t/1", 0, "one");
        c1.metadata.crawled_at = early;
        let mut c2 = TestFixtures::chunk("https://b.example.com/t/1", 1, "two");
        c2.metadata.crawled_at = late;
        let c3 = {
            let mut c = TestFixtures::chunk("https://a.example.com/t/9", 0, "three");
            c.metadata.crawled_at = early;
            c
        };
        for chunk in [&c1, &c2, &c3] {
            ChunkStore::put(&storage, chunk).await.unwrap();
        }

        let stats = storage.stats().await.unwrap().unwrap();
        assert_eq!(stats.doc_count, 3);
        assert_eq!(
            stats.urls,
            vec!["https://a.example.com/t/9".to_string(), "https://b.example.com/t/1".to_string()]
        );
        assert_eq!(stats.domains, vec!["a.example.com".to_string(), "b.example.com".to_string()]);
        assert_eq!(stats.last_updated, Some(late));
    }

    #[tokio::test]
    async fn test_delete_by_url() {
        let storage = SqliteStorage::in_memory().unwrap();
        for n in 0..3 {
            let chunk = TestFixtures::chunk("https://forum.example.com/t/1", n, &format!("part {}", n));
            ChunkStore::put(&storage, &chunk).await.unwrap();
            VectorStore::put(&storage, &chunk.id, &TestFixtures::embedding(4, "t"))
                .await
                .unwrap();
        }
        let other = TestFixtures::chunk("https://forum.example.com/t/2", 0, "keep");
        ChunkStore::put(&storage, &other).await.unwrap();

        let removed = storage.delete_by_url("https://forum.example.com/t/1").await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(storage.count().await.unwrap(), 1);
        assert!(VectorStore::get(&storage, &ChunkId::new("https://forum.example.com/t/1", 0))
            .await
            .unwrap()
            .is_none());
    }
}
