//! In-memory collection store for testing without a Weaviate instance.
//!
//! Similarity is a bag-of-words cosine over question and answer text, which
//! is enough to exercise ordering and limits. Failures can be injected per
//! record, and every insert call is recorded.

use super::{CollectionSchema, CollectionStore, ObjectOutcome};
use crate::error::{Error, Result};
use crate::models::{MatchedRecord, QaRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type FailurePredicate = Arc<dyn Fn(&QaRecord) -> bool + Send + Sync>;

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, Vec<QaRecord>>,
    insert_calls: Vec<usize>,
    close_calls: usize,
}

/// In-memory collection store; clones share state
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    fail_when: Option<FailurePredicate>,
    ready: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            fail_when: None,
            ready: true,
        }
    }

    /// Reject every record matching the predicate
    pub fn with_failures(
        mut self,
        predicate: impl Fn(&QaRecord) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Some(Arc::new(predicate));
        self
    }

    /// Report not ready on connect
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Stored records of a collection in insertion order
    pub async fn records(&self, collection: &str) -> Vec<QaRecord> {
        self.state
            .read()
            .await
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Size of every insert call so far
    pub async fn insert_calls(&self) -> Vec<usize> {
        self.state.read().await.insert_calls.clone()
    }

    pub async fn close_count(&self) -> usize {
        self.state.read().await.close_calls
    }

    pub async fn is_closed(&self) -> bool {
        self.close_count().await > 0
    }

    fn tokens(text: &str) -> HashMap<String, f32> {
        let mut counts = HashMap::new();
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            *counts.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
        }
        counts
    }

    fn cosine_similarity(a: &HashMap<String, f32>, b: &HashMap<String, f32>) -> f32 {
        let dot: f32 = a
            .iter()
            .filter_map(|(token, x)| b.get(token).map(|y| x * y))
            .sum();
        let norm_a: f32 = a.values().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.values().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn is_ready(&self) -> Result<bool> {
        Ok(self.ready)
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.state.read().await.collections.contains_key(name))
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let mut state = self.state.write().await;
        if state.collections.contains_key(&schema.name) {
            return Err(Error::CollectionExists(schema.name.clone()));
        }
        state.collections.insert(schema.name.clone(), Vec::new());
        debug!("MemoryStore created collection {}", schema.name);
        Ok(())
    }

    async fn insert_objects(
        &self,
        collection: &str,
        records: &[QaRecord],
    ) -> Result<Vec<ObjectOutcome>> {
        let mut state = self.state.write().await;
        state.insert_calls.push(records.len());

        let stored = state.collections.entry(collection.to_string()).or_default();
        let mut outcomes = Vec::with_capacity(records.len());

        for record in records {
            let rejected = self.fail_when.as_ref().is_some_and(|f| f(record));
            if rejected {
                outcomes.push(ObjectOutcome::Failed(format!(
                    "vectorizer rejected '{}'",
                    record.question
                )));
                continue;
            }

            match stored.iter_mut().find(|r| r.object_id() == record.object_id()) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
            outcomes.push(ObjectOutcome::Stored);
        }

        Ok(outcomes)
    }

    async fn query_near_text(
        &self,
        collection: &str,
        text: &str,
        limit: usize,
    ) -> Result<Vec<MatchedRecord>> {
        let state = self.state.read().await;
        let stored = state
            .collections
            .get(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;

        let query = Self::tokens(text);
        let mut matches: Vec<MatchedRecord> = stored
            .iter()
            .map(|record| {
                let doc = Self::tokens(&format!("{} {}", record.question, record.answer));
                MatchedRecord {
                    id: record.object_id().to_string(),
                    distance: Some(1.0 - Self::cosine_similarity(&query, &doc)),
                    record: record.clone(),
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        Ok(matches)
    }

    async fn close(&self) -> Result<()> {
        self.state.write().await.close_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reimport_overwrites_same_record() {
        let store = MemoryStore::new();
        let record = QaRecord::new("General", "Q", "A").unwrap();

        store.insert_objects("faq", &[record.clone()]).await.unwrap();
        store.insert_objects("faq", &[record]).await.unwrap();

        assert_eq!(store.records("faq").await.len(), 1);
        assert_eq!(store.insert_calls().await, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_query_unknown_collection() {
        let store = MemoryStore::new();
        let err = store.query_near_text("nope", "x", 2).await.unwrap_err();
        assert!(matches!(err, Error::CollectionNotFound(_)));
    }
}
