use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use super::{DEFAULT_USER_ID, Decoded, JournalDocument, JournalEntry, SchemaVersion, decode};
use crate::classify::ClassificationResult;
use crate::runtime::Runtime;

/// File name of the journal document inside the data directory.
pub const JOURNAL_FILE: &str = "entries.json";

/// Extension of the lock file kept next to the journal.
const LOCK_EXTENSION: &str = "json.lock";

/// How many entries a listing shows unless asked otherwise.
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Journal entries persisted as a single JSON document.
///
/// The schema contract is enforced in [`JournalStore::open`]; after that the
/// in-memory document is always in the current layout. Writers serialize on
/// a sibling lock file and re-read the document under the lock, so entries
/// stored by another process in the meantime are kept.
pub struct JournalStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    document: JournalDocument,
}

impl<'a, R: Runtime> JournalStore<'a, R> {
    /// Opens the journal under `home`, upgrading an older layout in place.
    ///
    /// A missing file yields an empty journal; nothing is written until the
    /// first insert.
    #[tracing::instrument(skip(runtime))]
    pub fn open(runtime: &'a R, home: &Path) -> Result<Self> {
        let path = home.join(JOURNAL_FILE);

        let Some(decoded) = read_document(runtime, &path)? else {
            debug!("No journal at {:?}, starting empty", path);
            return Ok(Self {
                runtime,
                path,
                document: JournalDocument::default(),
            });
        };

        let migrated = decoded.was_migrated();
        let stored_as = decoded.stored_as;
        let mut store = Self {
            runtime,
            path,
            document: decoded.document,
        };

        if migrated {
            warn!(
                "Journal {:?} uses schema {}, upgrading to {}",
                store.path,
                stored_as,
                SchemaVersion::CURRENT
            );
            store.locked(|store| store.save())?;
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.document.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.entries.is_empty()
    }

    /// Records a classified entry timestamped now.
    pub fn insert(&mut self, text: &str, result: &ClassificationResult) -> Result<JournalEntry> {
        self.insert_at(text, result, Utc::now())
    }

    /// The id comes from the document as it is on disk when the lock is
    /// taken, not from the copy read at open.
    pub fn insert_at(
        &mut self,
        text: &str,
        result: &ClassificationResult,
        timestamp: DateTime<Utc>,
    ) -> Result<JournalEntry> {
        let entry = self.locked(|store| {
            let entry = JournalEntry {
                id: store.document.next_id,
                user_id: DEFAULT_USER_ID,
                text: text.to_string(),
                emotion: result.label.clone(),
                confidence: result.confidence,
                timestamp,
            };

            store.document.next_id += 1;
            store.document.entries.push(entry.clone());

            if let Err(e) = store.save() {
                // Keep memory consistent with disk
                store.document.entries.pop();
                store.document.next_id -= 1;
                return Err(e);
            }
            Ok(entry)
        })?;

        info!("Stored journal entry #{} ({})", entry.id, entry.emotion);
        Ok(entry)
    }

    /// Newest entries first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<JournalEntry> {
        let mut entries = self.document.entries.clone();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        entries.truncate(limit);
        entries
    }

    /// Runs `f` holding the journal lock, on the document as currently stored.
    fn locked<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        let lock_path = self.path.with_extension(LOCK_EXTENSION);
        let _lock = self
            .runtime
            .lock_exclusive(&lock_path)
            .with_context(|| format!("Failed to lock journal {:?}", self.path))?;

        self.document = read_document(self.runtime, &self.path)?
            .map(|decoded| decoded.document)
            .unwrap_or_default();
        f(self)
    }

    fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.document)?;
        self.runtime
            .write_atomic(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to write journal {:?}", self.path))
    }
}

fn read_document<R: Runtime>(runtime: &R, path: &Path) -> Result<Option<Decoded>> {
    if !runtime.exists(path) {
        return Ok(None);
    }
    let content = runtime
        .read_to_string(path)
        .with_context(|| format!("Failed to read journal {:?}", path))?;
    let decoded = decode(&content).with_context(|| format!("Invalid journal {:?}", path))?;
    Ok(Some(decoded))
}
