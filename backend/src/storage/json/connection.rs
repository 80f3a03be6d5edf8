use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// JsonConnection manages the data directory and hands out one lock per
/// collection file. Cloning is cheap; clones share the lock registry, which
/// is what serializes concurrent writers to the same collection.
#[derive(Clone)]
pub struct JsonConnection {
    base_directory: PathBuf,
    collection_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl JsonConnection {
    /// Create a new JSON connection with a base directory
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_directory: base_path,
            collection_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Get the file path backing a collection
    pub fn collection_path(&self, collection_name: &str) -> PathBuf {
        self.base_directory.join(format!("{}.json", collection_name))
    }

    /// Get the mutex guarding a collection, creating it on first use
    pub fn collection_lock(&self, collection_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.collection_locks.lock().unwrap();
        locks
            .entry(collection_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Get the base directory path
    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }
}
