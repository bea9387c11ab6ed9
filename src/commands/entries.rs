use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::{
    config::resolve_home,
    journal::{JournalEntry, JournalStore},
    runtime::Runtime,
};

/// Longest text preview shown in the plain listing.
const PREVIEW_CHARS: usize = 60;

/// List the most recent journal entries
#[tracing::instrument(skip(runtime, home))]
pub fn entries<R: Runtime>(
    runtime: R,
    home: Option<PathBuf>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let home = resolve_home(&runtime, home)?;
    debug!("Listing entries from {:?}", home);

    let store = JournalStore::open(&runtime, &home)?;
    let recent = store.recent(limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&recent)?);
        return Ok(());
    }

    if recent.is_empty() {
        println!("No journal entries yet.");
        return Ok(());
    }

    for entry in &recent {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

/// One listing line: id, timestamp, classification and a text preview.
pub fn format_entry(entry: &JournalEntry) -> String {
    format!(
        "#{:<4} {}  {:<22} {}",
        entry.id,
        entry.timestamp.format("%Y-%m-%d %H:%M"),
        entry.classification().to_string(),
        preview(&entry.text)
    )
}

fn preview(text: &str) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= PREVIEW_CHARS {
        return single_line;
    }
    let cut: String = single_line.chars().take(PREVIEW_CHARS - 3).collect();
    format!("{}...", cut)
}
