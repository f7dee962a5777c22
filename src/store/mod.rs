//! Document collection store integration
//!
//! This module provides:
//! - The `CollectionStore` trait over a remote, embedding-capable collection
//! - `Session` and `CollectionHandle`, which order the operations
//!   (connect, then schema, then import/query, then close)
//! - Dynamic batch import with a failure threshold
//! - A Weaviate REST implementation and an in-memory one

mod batch;
pub mod memory;
mod payload;
pub mod weaviate;

pub use batch::*;
pub use memory::MemoryStore;
pub use weaviate::WeaviateStore;

use crate::config::{BatchConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::models::{MatchedRecord, QaRecord, RECORD_PROPERTIES};
use async_trait::async_trait;
use indicatif::ProgressBar;
use std::cmp::Ordering;
use tracing::{debug, info};

/// Result of storing one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectOutcome {
    Stored,
    Failed(String),
}

/// Schema of a FAQ collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: String,
    pub properties: Vec<String>,
    /// Store module that embeds objects and queries
    pub vectorizer: String,
    /// Store module for grounded completions, if any
    pub generative: Option<String>,
}

impl CollectionSchema {
    /// Schema with the fixed `category`, `question`, `answer` properties
    pub fn faq(name: &str, config: &StoreConfig) -> Self {
        Self {
            name: name.to_string(),
            properties: RECORD_PROPERTIES.iter().map(|p| p.to_string()).collect(),
            vectorizer: config.vectorizer.clone(),
            generative: config.generative.clone(),
        }
    }
}

/// A remote document collection with server-side embeddings
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Whether the store accepts requests
    async fn is_ready(&self) -> Result<bool>;

    async fn collection_exists(&self, name: &str) -> Result<bool>;

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()>;

    /// Store records; returns one outcome per record, in input order
    async fn insert_objects(
        &self,
        collection: &str,
        records: &[QaRecord],
    ) -> Result<Vec<ObjectOutcome>>;

    async fn query_near_text(
        &self,
        collection: &str,
        text: &str,
        limit: usize,
    ) -> Result<Vec<MatchedRecord>>;

    /// Release the connection
    async fn close(&self) -> Result<()>;
}

/// An open connection to a store
///
/// `close` consumes the session, so nothing can use it afterwards.
pub struct Session<S: CollectionStore> {
    store: S,
    closed: bool,
}

impl<S: CollectionStore> Session<S> {
    /// Open a session; fails if the store is not ready
    pub async fn connect(store: S) -> Result<Self> {
        let ready = match store.is_ready().await {
            Ok(ready) => ready,
            Err(e) => {
                let _ = store.close().await;
                return Err(e);
            }
        };

        if !ready {
            let _ = store.close().await;
            return Err(Error::Connection("store reported not ready".to_string()));
        }

        debug!("Store session connected");
        Ok(Self {
            store,
            closed: false,
        })
    }

    /// Create a collection; an existing collection is an error
    pub async fn create_collection(
        &self,
        schema: &CollectionSchema,
    ) -> Result<CollectionHandle<'_, S>> {
        if self.store.collection_exists(&schema.name).await? {
            return Err(Error::CollectionExists(schema.name.clone()));
        }

        self.store.create_collection(schema).await?;
        info!("Collection {} created", schema.name);

        Ok(CollectionHandle {
            store: &self.store,
            name: schema.name.clone(),
        })
    }

    /// Handle to an existing collection
    pub async fn collection(&self, name: &str) -> Result<CollectionHandle<'_, S>> {
        if !self.store.collection_exists(name).await? {
            return Err(Error::CollectionNotFound(name.to_string()));
        }

        Ok(CollectionHandle {
            store: &self.store,
            name: name.to_string(),
        })
    }

    /// Close the session
    pub async fn close(mut self) -> Result<()> {
        self.closed = true;
        self.store.close().await?;
        debug!("Store session closed");
        Ok(())
    }
}

impl<S: CollectionStore> Drop for Session<S> {
    fn drop(&mut self) {
        if !self.closed {
            debug!("Store session dropped without close");
        }
    }
}

/// A collection within an open session
pub struct CollectionHandle<'a, S: CollectionStore> {
    store: &'a S,
    name: String,
}

impl<S: CollectionStore> CollectionHandle<'_, S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Import records in dynamically sized batches
    pub async fn batch_import(
        &self,
        records: &[QaRecord],
        config: &BatchConfig,
        progress: &ProgressBar,
    ) -> Result<BatchImportResult> {
        import_records(self.store, &self.name, records, config, progress).await
    }

    /// The `limit` stored records nearest to `text`, closest first
    pub async fn query_near_text(&self, text: &str, limit: usize) -> Result<Vec<MatchedRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut matches = self.store.query_near_text(&self.name, text, limit).await?;
        matches.sort_by(|a, b| match (a.distance, b.distance) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        matches.truncate(limit);

        debug!("Query on {} returned {} matches", self.name, matches.len());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str, answer: &str) -> QaRecord {
        QaRecord::new("General", question, answer).unwrap()
    }

    #[tokio::test]
    async fn test_connect_fails_when_not_ready_and_closes() {
        let store = MemoryStore::new().not_ready();
        let err = Session::connect(store.clone()).await.err().unwrap();

        assert!(matches!(err, Error::Connection(_)));
        assert_eq!(store.close_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_collection_twice_is_an_error() {
        let session = Session::connect(MemoryStore::new()).await.unwrap();
        let schema = CollectionSchema::faq("faq", &StoreConfig::default());

        let handle = session.create_collection(&schema).await.unwrap();
        assert_eq!(handle.name(), "faq");

        let err = session.create_collection(&schema).await.err().unwrap();
        assert!(matches!(err, Error::CollectionExists(name) if name == "faq"));

        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_collection_is_reported() {
        let session = Session::connect(MemoryStore::new()).await.unwrap();
        let err = session.collection("faq").await.err().unwrap();
        assert!(matches!(err, Error::CollectionNotFound(_)));
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_query_limit_and_order() {
        let store = MemoryStore::new();
        let session = Session::connect(store.clone()).await.unwrap();
        let schema = CollectionSchema::faq("faq", &StoreConfig::default());
        let handle = session.create_collection(&schema).await.unwrap();

        store
            .insert_objects(
                "faq",
                &[
                    record("Where is the keynote?", "Hall 3"),
                    record("Can I attend in person?", "Yes, attend in person at the venue"),
                    record("Is lunch provided?", "Yes"),
                ],
            )
            .await
            .unwrap();

        let matches = handle.query_near_text("attend in person", 2).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].record.question, "Can I attend in person?");
        assert!(matches[0].distance.unwrap() <= matches[1].distance.unwrap());

        assert!(handle.query_near_text("attend", 0).await.unwrap().is_empty());

        drop(handle);
        session.close().await.unwrap();
        assert!(store.is_closed().await);
    }

    #[test]
    fn test_faq_schema_properties() {
        let schema = CollectionSchema::faq("faq", &StoreConfig::default());
        assert_eq!(schema.properties, vec!["category", "question", "answer"]);
        assert_eq!(schema.vectorizer, "text2vec-weaviate");
        assert_eq!(schema.generative.as_deref(), Some("generative-cohere"));
    }
}
