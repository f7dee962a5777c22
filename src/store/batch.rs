//! Dynamic batch import
//!
//! Records go to the store in chunks whose size follows the store's
//! response time: fast round trips grow the next chunk, slow ones shrink it.
//! Once failures exceed `max_errors` the import stops and the rest of the
//! input is never sent. Nothing is retried or rolled back. Records sharing
//! an object id are sent once.

use super::{CollectionStore, ObjectOutcome};
use crate::config::BatchConfig;
use crate::error::{Error, Result};
use crate::models::QaRecord;
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Round trips faster than this grow the next batch
const FAST_BATCH: Duration = Duration::from_millis(500);

/// Round trips slower than this shrink the next batch
const SLOW_BATCH: Duration = Duration::from_secs(5);

/// A record the store refused
#[derive(Debug, Clone, Serialize)]
pub struct FailedObject {
    pub record: QaRecord,
    pub message: String,
}

/// Summary of one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchImportResult {
    /// Records sent to the store
    pub attempted: usize,
    /// Records the store accepted
    pub imported: usize,
    /// Records the store refused
    pub failed: usize,
    /// Records never sent because the import stopped
    pub skipped: usize,
    /// Repeats of an earlier record, never sent
    pub duplicates: usize,
    /// Number of requests made
    pub batches: usize,
    /// The first refused record, for diagnostics
    pub first_failure: Option<FailedObject>,
    /// Whether the failure threshold cut the import short
    pub stopped_early: bool,
}

/// Batch size that adapts to store latency
#[derive(Debug, Clone)]
pub struct DynamicBatchSize {
    current: usize,
    max: usize,
}

impl DynamicBatchSize {
    pub fn new(config: &BatchConfig) -> Self {
        let max = config.max_size.max(1);
        Self {
            current: config.initial_size.clamp(1, max),
            max,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Adjust the next size from the last round trip
    pub fn observe(&mut self, elapsed: Duration) {
        if elapsed < FAST_BATCH {
            self.current = (self.current * 2).min(self.max);
        } else if elapsed > SLOW_BATCH {
            self.current = (self.current / 2).max(1);
        }
    }
}

/// Send records to a collection in dynamic batches
pub async fn import_records<S: CollectionStore + ?Sized>(
    store: &S,
    collection: &str,
    records: &[QaRecord],
    config: &BatchConfig,
    progress: &ProgressBar,
) -> Result<BatchImportResult> {
    let mut result = BatchImportResult::default();

    let mut seen = HashSet::new();
    let unique: Vec<QaRecord> = records
        .iter()
        .filter(|r| seen.insert(r.object_id()))
        .cloned()
        .collect();
    result.duplicates = records.len() - unique.len();
    if result.duplicates > 0 {
        debug!("Dropping {} duplicate records", result.duplicates);
        progress.inc(result.duplicates as u64);
    }
    let records = unique.as_slice();

    let mut sizer = DynamicBatchSize::new(config);
    let mut offset = 0;

    while offset < records.len() {
        let size = sizer.current().min(records.len() - offset);
        let chunk = &records[offset..offset + size];

        let started = Instant::now();
        let outcomes = store.insert_objects(collection, chunk).await?;
        let elapsed = started.elapsed();

        if outcomes.len() != chunk.len() {
            return Err(Error::Store(format!(
                "store returned {} results for {} objects",
                outcomes.len(),
                chunk.len()
            )));
        }

        for (record, outcome) in chunk.iter().zip(outcomes) {
            match outcome {
                ObjectOutcome::Stored => result.imported += 1,
                ObjectOutcome::Failed(message) => {
                    debug!("Object rejected: {}", message);
                    result.failed += 1;
                    if result.first_failure.is_none() {
                        result.first_failure = Some(FailedObject {
                            record: record.clone(),
                            message,
                        });
                    }
                }
            }
        }

        offset += size;
        result.attempted += size;
        result.batches += 1;
        progress.inc(size as u64);
        sizer.observe(elapsed);

        if result.failed > config.max_errors {
            warn!("Batch import stopped due to excessive errors");
            result.stopped_early = offset < records.len();
            break;
        }
    }

    result.skipped = records.len() - result.attempted;
    Ok(result)
}
