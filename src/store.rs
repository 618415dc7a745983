//! File-backed append-only store: a JSON array of records.
//!
//! Writes go through a sibling temp file followed by a rename, so a crash
//! mid-write never leaves a truncated store. An in-process mutex
//! serializes read-modify-write cycles; cross-process locking is out of
//! scope for the single-user model.

use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("store holds invalid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub struct JsonStore<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> JsonStore<T> {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or empty file reads as an empty store.
    pub fn load(&self) -> Result<Vec<T>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Appends one record: load, push, rewrite atomically.
    pub fn append(&self, record: T) -> Result<(), StoreError> {
        self.stage(record)?.commit()
    }

    /// Serializes the store with `record` appended into a temp file without
    /// touching the live file. [`StagedWrite::commit`] renames it into
    /// place; dropping the stage leaves the store unchanged. Callers doing
    /// multi-store commits stage everything first, then commit.
    ///
    /// The stage holds the store's writer lock until it is committed or
    /// discarded, so the whole read-modify-write cycle is serialized and
    /// the temp file cannot be raced by another writer.
    pub fn stage(&self, record: T) -> Result<StagedWrite<'_>, StoreError> {
        let guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut records = self.load()?;
        records.push(record);
        let text = serde_json::to_string_pretty(&records)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        Ok(StagedWrite {
            tmp,
            target: self.path.clone(),
            _guard: guard,
        })
    }
}

/// A fully serialized append waiting to be renamed over the live file.
/// Keeps the store's writer lock for its whole lifetime.
#[must_use = "a staged write does nothing until committed"]
pub struct StagedWrite<'a> {
    tmp: PathBuf,
    target: PathBuf,
    _guard: MutexGuard<'a, ()>,
}

impl StagedWrite<'_> {
    pub fn commit(self) -> Result<(), StoreError> {
        fs::rename(&self.tmp, &self.target)?;
        Ok(())
    }

    pub fn discard(self) {
        let _ = fs::remove_file(&self.tmp);
    }
}
