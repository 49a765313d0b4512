// Persistence slots: string-keyed storage for the serialized task list

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key-value port the store persists through
///
/// A slot holds whole values; every write replaces the previous value.
pub trait Slot {
    /// Read the value under `key`, `None` if nothing was ever written
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory slot
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    entries: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-populated with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut slot = Self::new();
        slot.entries.insert(key.to_string(), value.to_string());
        slot
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Slot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Slot backed by one JSON file per key in a data directory
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    /// Open or create a file slot in `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create data directory")?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the value for `key`
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Slot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let mut file = File::open(&path).context("Failed to open slot file")?;
        file.lock_shared().context("Failed to acquire shared lock")?;

        let mut content = String::new();
        file.read_to_string(&mut content).context("Failed to read slot file")?;

        debug!(file = ?path, bytes = content.len(), "Read slot");
        Ok(Some(content))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        // Truncate only once the lock is held
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .context("Failed to open slot file for writing")?;

        file.lock_exclusive().context("Failed to acquire file lock")?;
        file.set_len(0)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;

        debug!(file = ?path, bytes = value.len(), "Wrote slot");
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Slot key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Slot key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid slot key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}
