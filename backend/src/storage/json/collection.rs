use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{debug, warn};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::connection::JsonConnection;

/// One keyed record collection persisted as a JSON array in a single file.
///
/// Records are JSON objects carrying an `id` the store assigns on create,
/// plus `created_at`/`updated_at` stamps. Every operation takes the
/// collection's mutex across its whole load-mutate-save cycle, so two
/// writers to the same collection cannot overwrite each other's changes.
/// Writes replace the whole file (temp file + rename); the last writer wins
/// across separate collections.
#[derive(Clone)]
pub struct JsonCollection {
    name: String,
    id_prefix: String,
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonCollection {
    pub fn new(connection: &JsonConnection, name: &str, id_prefix: &str) -> Self {
        Self {
            name: name.to_string(),
            id_prefix: id_prefix.to_string(),
            path: connection.collection_path(name),
            lock: connection.collection_lock(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load every record. A missing file is not an error: the collection is
    /// created empty on first access.
    pub fn load(&self) -> Result<Vec<Value>> {
        let _guard = self.lock.lock().unwrap();
        self.read_records()
    }

    /// Replace the whole collection
    pub fn save(&self, records: &[Value]) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        self.write_records(records)
    }

    /// Append a new record built from the given fields. The store assigns
    /// the id and the creation/update timestamps, persists, and returns the
    /// record as stored.
    pub fn create(&self, fields: Value) -> Result<Value> {
        let mut record = match fields {
            Value::Object(map) => map,
            other => {
                return Err(anyhow!(
                    "Records in collection '{}' must be JSON objects, got {}",
                    self.name,
                    other
                ))
            }
        };

        let id = shared::new_record_id(&self.id_prefix);
        let now = Utc::now().to_rfc3339();
        record.insert("id".to_string(), Value::String(id.clone()));
        record.insert("created_at".to_string(), Value::String(now.clone()));
        record.insert("updated_at".to_string(), Value::String(now));
        let record = Value::Object(record);

        let _guard = self.lock.lock().unwrap();
        let mut records = self.read_records()?;
        records.push(record.clone());
        self.write_records(&records)?;

        debug!("Created record {} in collection '{}'", id, self.name);
        Ok(record)
    }

    /// Shallow-merge the patch into the record with the given id, stamp
    /// `updated_at`, persist, and return the merged record. Returns None
    /// when the id does not resolve.
    pub fn update(&self, id: &str, patch: Value) -> Result<Option<Value>> {
        let patch = match patch {
            Value::Object(map) => map,
            other => {
                return Err(anyhow!(
                    "Patches for collection '{}' must be JSON objects, got {}",
                    self.name,
                    other
                ))
            }
        };

        let _guard = self.lock.lock().unwrap();
        let mut records = self.read_records()?;

        let Some(record) = records.iter_mut().find(|r| record_id_is(r, id)) else {
            warn!(
                "Attempted to update a non-existent record {} in collection '{}'",
                id, self.name
            );
            return Ok(None);
        };

        let Some(fields) = record.as_object_mut() else {
            return Err(anyhow!(
                "Collection '{}' contains a non-object record",
                self.name
            ));
        };

        for (key, value) in patch {
            // The id is server-assigned and never patched over
            if key == "id" {
                continue;
            }
            fields.insert(key, value);
        }
        fields.insert(
            "updated_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let updated = record.clone();
        self.write_records(&records)?;

        debug!("Updated record {} in collection '{}'", id, self.name);
        Ok(Some(updated))
    }

    /// Delete the record with the given id. Returns whether anything was
    /// removed; an unknown id is not an error.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().unwrap();
        let mut records = self.read_records()?;

        let before = records.len();
        records.retain(|r| !record_id_is(r, id));
        if records.len() == before {
            warn!(
                "Attempted to delete a non-existent record {} in collection '{}'",
                id, self.name
            );
            return Ok(false);
        }

        self.write_records(&records)?;
        debug!("Deleted record {} from collection '{}'", id, self.name);
        Ok(true)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().unwrap();
        let records = self.read_records()?;
        Ok(records.into_iter().find(|r| record_id_is(r, id)))
    }

    /// Linear scan over the whole collection; fine at this data size
    pub fn find_where<F>(&self, predicate: F) -> Result<Vec<Value>>
    where
        F: Fn(&Value) -> bool,
    {
        let _guard = self.lock.lock().unwrap();
        let records = self.read_records()?;
        Ok(records.into_iter().filter(|r| predicate(r)).collect())
    }

    fn read_records(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            debug!(
                "Collection file {} does not exist yet, creating empty collection",
                self.path.display()
            );
            self.write_records(&[])?;
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let records: Vec<Value> = serde_json::from_str(&content)?;
        Ok(records)
    }

    fn write_records(&self, records: &[Value]) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;

        // Atomic write using temp file
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

fn record_id_is(record: &Value, id: &str) -> bool {
    record.get("id").and_then(Value::as_str) == Some(id)
}
