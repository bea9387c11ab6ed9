//! Versioned layout of the on-disk journal document.
//!
//! Every document declares `schema_version`. The version is checked once when
//! the store is opened; older layouts are upgraded in memory and written back,
//! newer or unknown ones are refused.
//!
//! - `1`: entries carry no `confidence`
//! - `2`: current layout

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DEFAULT_USER_ID, JournalEntry};

/// Confidence assigned to entries recorded before confidence was stored.
pub const LEGACY_CONFIDENCE: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    V1,
    V2,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V2;

    pub fn number(self) -> u32 {
        match self {
            SchemaVersion::V1 => 1,
            SchemaVersion::V2 => 2,
        }
    }
}

impl TryFrom<u32> for SchemaVersion {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(SchemaVersion::V1),
            2 => Ok(SchemaVersion::V2),
            other => bail!(
                "Unsupported journal schema version {} (this build supports up to {})",
                other,
                SchemaVersion::CURRENT.number()
            ),
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// Current document layout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JournalDocument {
    pub schema_version: u32,
    pub next_id: u64,
    pub entries: Vec<JournalEntry>,
}

impl Default for JournalDocument {
    fn default() -> Self {
        Self {
            schema_version: SchemaVersion::CURRENT.number(),
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct VersionProbe {
    schema_version: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct LegacyDocument {
    next_id: u64,
    entries: Vec<LegacyEntry>,
}

#[derive(Deserialize, Debug)]
struct LegacyEntry {
    id: u64,
    #[serde(default = "default_user_id")]
    user_id: u64,
    text: String,
    emotion: String,
    timestamp: DateTime<Utc>,
}

fn default_user_id() -> u64 {
    DEFAULT_USER_ID
}

impl From<LegacyEntry> for JournalEntry {
    fn from(e: LegacyEntry) -> Self {
        JournalEntry {
            id: e.id,
            user_id: e.user_id,
            text: e.text,
            emotion: e.emotion,
            confidence: LEGACY_CONFIDENCE,
            timestamp: e.timestamp,
        }
    }
}

/// A decoded document and the version it was stored as.
#[derive(Debug)]
pub struct Decoded {
    pub document: JournalDocument,
    pub stored_as: SchemaVersion,
}

impl Decoded {
    pub fn was_migrated(&self) -> bool {
        self.stored_as != SchemaVersion::CURRENT
    }
}

/// Parses a document of any supported version into the current layout.
pub fn decode(content: &str) -> Result<Decoded> {
    let probe: VersionProbe =
        serde_json::from_str(content).context("Journal file is not a valid JSON document")?;
    let version = probe
        .schema_version
        .context("Journal file does not declare a schema_version")?;
    let stored_as = SchemaVersion::try_from(version)?;

    let document = match stored_as {
        SchemaVersion::V1 => {
            let legacy: LegacyDocument =
                serde_json::from_str(content).context("Failed to parse v1 journal document")?;
            JournalDocument {
                schema_version: SchemaVersion::CURRENT.number(),
                next_id: legacy.next_id,
                entries: legacy.entries.into_iter().map(JournalEntry::from).collect(),
            }
        }
        SchemaVersion::V2 => {
            serde_json::from_str(content).context("Failed to parse v2 journal document")?
        }
    };

    Ok(Decoded {
        document,
        stored_as,
    })
}
