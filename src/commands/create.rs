//! Create command implementation

use super::finish;
use crate::config::Config;
use crate::error::Result;
use crate::store::{CollectionSchema, CollectionStore, Session};
use serde::Serialize;
use tracing::info;

/// What `--create` set up
#[derive(Debug, Clone, Serialize)]
pub struct CreateResult {
    pub collection: String,
    pub properties: Vec<String>,
    pub vectorizer: String,
    pub generative: Option<String>,
}

/// Create the FAQ collection; fails if it already exists
pub async fn cmd_create<S: CollectionStore>(config: &Config, store: S) -> Result<CreateResult> {
    let schema = CollectionSchema::faq(&config.collection_name, &config.store);
    info!("Creating collection {}", schema.name);

    let session = Session::connect(store).await?;
    let outcome = session
        .create_collection(&schema)
        .await
        .map(|handle| CreateResult {
            collection: handle.name().to_string(),
            properties: schema.properties.clone(),
            vectorizer: schema.vectorizer.clone(),
            generative: schema.generative.clone(),
        });

    finish(session, outcome).await
}

/// Print the created collection to console
pub fn print_create_result(result: &CreateResult) {
    println!("✓ Collection '{}' created", result.collection);
    println!("  Properties: {}", result.properties.join(", "));
    println!("  Vectorizer: {}", result.vectorizer);
    if let Some(generative) = &result.generative {
        println!("  Generative: {}", generative);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_create_closes_session() {
        let store = MemoryStore::new();
        let result = cmd_create(&Config::default(), store.clone()).await.unwrap();

        assert_eq!(result.collection, "faq");
        assert_eq!(result.properties, vec!["category", "question", "answer"]);
        assert!(store.collection_exists("faq").await.unwrap());
        assert_eq!(store.close_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_twice_fails_and_still_closes() {
        let store = MemoryStore::new();
        let config = Config::default();

        cmd_create(&config, store.clone()).await.unwrap();
        let err = cmd_create(&config, store.clone()).await.unwrap_err();

        assert!(matches!(err, Error::CollectionExists(_)));
        assert_eq!(store.close_count().await, 2);
    }

    #[tokio::test]
    async fn test_unready_store_is_closed_without_creating() {
        let store = MemoryStore::new().not_ready();
        let err = cmd_create(&Config::default(), store.clone()).await.unwrap_err();

        assert!(matches!(err, Error::Connection(_)));
        assert!(!store.collection_exists("faq").await.unwrap());
        assert_eq!(store.close_count().await, 1);
    }
}
