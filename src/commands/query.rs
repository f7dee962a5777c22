//! Query command implementation

use super::finish;
use crate::config::Config;
use crate::error::Result;
use crate::models::MatchedRecord;
use crate::store::{CollectionStore, Session};
use serde::Serialize;
use tracing::info;

/// Query result for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub collection: String,
    pub matches: Vec<MatchedRecord>,
}

/// Find the `limit` records nearest to `query`
pub async fn cmd_query<S: CollectionStore>(
    config: &Config,
    store: S,
    query: &str,
    limit: usize,
) -> Result<QueryResult> {
    info!("Querying: {}", query);

    let session = Session::connect(store).await?;
    let outcome = async {
        let collection = session.collection(&config.collection_name).await?;
        collection.query_near_text(query, limit).await
    }
    .await;

    let matches = finish(session, outcome).await?;
    info!("Returning {} results", matches.len());

    Ok(QueryResult {
        query: query.to_string(),
        collection: config.collection_name.clone(),
        matches,
    })
}

/// Print query results to console
pub fn print_query_results(result: &QueryResult) {
    println!("\n🔍 Query: {}\n", result.query);
    println!("Found {} results:\n", result.matches.len());

    for (i, m) in result.matches.iter().enumerate() {
        match m.similarity() {
            Some(score) => println!("{}. [score: {:.3}] {}", i + 1, score, m.record.category),
            None => println!("{}. {}", i + 1, m.record.category),
        }
        println!("   Q: {}", m.record.question);
        println!("   A: {}\n", m.record.answer.replace('\n', " "));
    }
}
