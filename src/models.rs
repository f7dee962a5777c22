//! Records shared by the extractor and the collection store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Property names every FAQ collection carries.
pub const RECORD_PROPERTIES: [&str; 3] = ["category", "question", "answer"];

/// One question/answer pair scraped from a FAQ page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub category: String,
    pub question: String,
    pub answer: String,
}

impl QaRecord {
    /// Build a record from raw blocks; `None` when question or answer is blank.
    pub fn new(
        category: impl Into<String>,
        question: impl AsRef<str>,
        answer: impl AsRef<str>,
    ) -> Option<Self> {
        let question = question.as_ref().trim();
        let answer = answer.as_ref().trim();
        if question.is_empty() || answer.is_empty() {
            return None;
        }

        Some(Self {
            category: category.into(),
            question: question.to_string(),
            answer: answer.to_string(),
        })
    }

    /// Deterministic object id, so importing the same record twice overwrites it.
    pub fn object_id(&self) -> Uuid {
        let key = format!("{}\u{1f}{}\u{1f}{}", self.category, self.question, self.answer);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }
}

/// A stored record returned by a near-text query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedRecord {
    pub id: String,
    /// Vector distance reported by the store; lower is closer.
    pub distance: Option<f32>,
    #[serde(flatten)]
    pub record: QaRecord,
}

impl MatchedRecord {
    /// Cosine-style similarity derived from the distance (1.0 is identical).
    pub fn similarity(&self) -> Option<f32> {
        self.distance.map(|d| 1.0 - d)
    }
}
