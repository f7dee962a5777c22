//! Import command implementation

use super::finish;
use crate::config::Config;
use crate::crawl::Crawler;
use crate::error::Result;
use crate::extract::QaExtractor;
use crate::models::QaRecord;
use crate::progress::import_progress_bar;
use crate::store::{BatchImportResult, CollectionStore, Session};
use tracing::{info, warn};

/// Crawl from `seed_url` and extract QA records from everything visited
pub async fn collect_records(
    config: &Config,
    seed_url: &str,
    base_url: &str,
) -> Result<Vec<QaRecord>> {
    let crawler = Crawler::new(config.crawl.clone())?;
    let report = crawler.crawl(seed_url, base_url).await?;

    if !report.failed.is_empty() {
        warn!("{} pages could not be fetched", report.failed.len());
    }

    let extractor = QaExtractor::from_config(&config.extract);
    let records = extractor.extract(&report.text());
    info!(
        "Extracted {} records from {} pages",
        records.len(),
        report.pages.len()
    );

    if records.is_empty() {
        warn!("No question/answer pairs found under {}", base_url);
    }

    Ok(records)
}

/// Import records into the configured collection
pub async fn cmd_import<S: CollectionStore>(
    config: &Config,
    store: S,
    records: &[QaRecord],
) -> Result<BatchImportResult> {
    let session = Session::connect(store).await?;

    let outcome = async {
        let collection = session.collection(&config.collection_name).await?;
        let progress = import_progress_bar(records.len(), collection.name());
        let result = collection
            .batch_import(records, &config.batch, &progress)
            .await;
        progress.finish_and_clear();
        result
    }
    .await;

    if let Ok(result) = &outcome {
        info!(
            "Imported {}/{} records into {}",
            result.imported,
            records.len(),
            config.collection_name
        );
    }

    finish(session, outcome).await
}

/// Print import statistics to console
pub fn print_import_result(result: &BatchImportResult) {
    println!("\n📥 Import complete\n");
    println!("  Imported: {}", result.imported);
    println!("  Failed:   {}", result.failed);
    println!("  Batches:  {}", result.batches);
    if result.duplicates > 0 {
        println!("  Repeated: {} (sent once)", result.duplicates);
    }

    if result.stopped_early {
        println!(
            "\n⚠ Stopped after too many failures; {} records were not sent",
            result.skipped
        );
    }

    if let Some(first) = &result.first_failure {
        println!("\nFirst failed object:");
        println!("  Question: {}", first.record.question);
        println!("  Error: {}", first.message);
    }
}

/// Print extracted records as JSON (dry run)
pub fn print_records(records: &[QaRecord]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}
