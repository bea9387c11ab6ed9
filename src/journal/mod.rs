//! Journal entries and their persistence.

mod schema;
mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::ClassificationResult;

pub use schema::{Decoded, JournalDocument, LEGACY_CONFIDENCE, SchemaVersion, decode};
pub use store::{DEFAULT_RECENT_LIMIT, JOURNAL_FILE, JournalStore};

/// Owner of entries until accounts exist.
pub const DEFAULT_USER_ID: u64 = 1;

/// A stored journal entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub id: u64,
    pub user_id: u64,
    pub text: String,
    pub emotion: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl JournalEntry {
    /// The classification this entry was stored with.
    pub fn classification(&self) -> ClassificationResult {
        ClassificationResult {
            label: self.emotion.clone(),
            confidence: self.confidence,
        }
    }
}
