//! Runtime abstraction for system operations.
//!
//! Everything that touches the process environment or the filesystem goes
//! through [`Runtime`], so configuration loading and the journal store can be
//! exercised against a `MockRuntime` in tests.
//!
//! # Structure
//!
//! - `env` - Environment variables and platform directories
//! - `fs` - File system operations (read, atomic write, lock, directory)

mod env;
mod fs;

use anyhow::Result;
use std::env as std_env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on a file, released when dropped.
pub struct FileLock {
    _file: Option<File>,
}

impl FileLock {
    pub(crate) fn held(file: File) -> Self {
        Self { _file: Some(file) }
    }

    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self { _file: None }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    /// Replaces `path` through a uniquely named sibling temp file.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Blocks until an exclusive lock on `path` is held, creating it if needed.
    fn lock_exclusive(&self, path: &Path) -> Result<FileLock>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;

    // Directories
    /// Per-user data directory (e.g. `~/.local/share` on Linux).
    fn data_dir(&self) -> Option<PathBuf>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_atomic_impl(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn lock_exclusive(&self, path: &Path) -> Result<FileLock> {
        self.lock_exclusive_impl(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir_impl()
    }
}
