//! File system operations (read, atomic write, lock, directory).

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::{FileLock, RealRuntime};

impl RealRuntime {
    #[tracing::instrument(skip(self, contents))]
    pub(crate) fn write_atomic_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        tmp.write_all(contents).context("Failed to write to temp file")?;
        tmp.as_file().sync_all().context("Failed to flush temp file")?;
        tmp.persist(path).with_context(|| format!("Failed to replace {:?}", path))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context("Failed to read file to string")
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn lock_exclusive_impl(&self, path: &Path) -> Result<FileLock> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open lock file {:?}", path))?;
        FileExt::lock_exclusive(&file).with_context(|| format!("Failed to lock {:?}", path))?;
        Ok(FileLock::held(file))
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn create_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context("Failed to create directory")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }
}
