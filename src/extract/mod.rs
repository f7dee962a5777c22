//! Question/answer extraction from page text
//!
//! Text is split into blocks on blank lines. Blocks pair up in order:
//! even blocks are questions, the following odd block is the answer.

mod category;

pub use category::*;

use crate::config::ExtractConfig;
use crate::models::QaRecord;
use tracing::debug;

/// Splits page text into categorised QA records
#[derive(Debug, Clone, Default)]
pub struct QaExtractor {
    rules: CategoryRules,
}

impl QaExtractor {
    pub fn new(rules: CategoryRules) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(CategoryRules::from_config(config))
    }

    pub fn rules(&self) -> &CategoryRules {
        &self.rules
    }

    /// Pair consecutive blocks into records; a trailing odd block is dropped
    pub fn extract(&self, raw_text: &str) -> Vec<QaRecord> {
        let blocks = split_blocks(raw_text);
        if blocks.len() % 2 == 1 {
            debug!("Discarding unpaired trailing block");
        }

        let mut records = Vec::with_capacity(blocks.len() / 2);
        for pair in blocks.chunks_exact(2) {
            let (question, answer) = (&pair[0], &pair[1]);
            let category = self.rules.categorize(question);
            match QaRecord::new(category, question, answer) {
                Some(record) => records.push(record),
                None => debug!("Dropping pair with an empty side"),
            }
        }

        debug!(
            "Extracted {} records from {} blocks",
            records.len(),
            blocks.len()
        );
        records
    }
}

/// Split text into blocks separated by one or more blank lines
///
/// Lines holding only whitespace count as blank. Blocks are trimmed and
/// never empty.
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n").trim().to_string());
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        blocks.push(current.join("\n").trim().to_string());
    }

    blocks
}
