use anyhow::Result;
use serde_json::Value;
use shared::RealizedSession;

use super::{decode_records, JsonCollection, JsonConnection};
use crate::storage::traits::{
    RealizedSessionDraft, RealizedSessionPatch, RealizedSessionStorage,
};

/// JSON-file occurrence repository backed by the `realized_sessions`
/// collection. Template and per-student listings come back most recent
/// date first, which is the order every consumer wants.
#[derive(Clone)]
pub struct RealizedSessionRepository {
    collection: JsonCollection,
}

impl RealizedSessionRepository {
    pub fn new(connection: &JsonConnection) -> Self {
        Self {
            collection: JsonCollection::new(connection, "realized_sessions", "realized_session"),
        }
    }
}

/// Does the raw record's attendance roster include the student?
fn roster_includes(record: &Value, student_id: &str) -> bool {
    record
        .get("attendance")
        .and_then(Value::as_array)
        .map(|roster| {
            roster
                .iter()
                .any(|entry| entry.get("student_id").and_then(Value::as_str) == Some(student_id))
        })
        .unwrap_or(false)
}

impl RealizedSessionStorage for RealizedSessionRepository {
    fn create_realized_session(&self, draft: RealizedSessionDraft) -> Result<RealizedSession> {
        let record = self.collection.create(serde_json::to_value(&draft)?)?;
        Ok(serde_json::from_value(record)?)
    }

    fn get_realized_session(&self, realized_session_id: &str) -> Result<Option<RealizedSession>> {
        let record = self.collection.find_by_id(realized_session_id)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn list_realized_sessions(&self) -> Result<Vec<RealizedSession>> {
        decode_records(self.collection.load()?)
    }

    fn list_for_template(&self, fixed_session_id: &str) -> Result<Vec<RealizedSession>> {
        let records = self.collection.find_where(|r| {
            r.get("fixed_session_id").and_then(Value::as_str) == Some(fixed_session_id)
        })?;
        let mut occurrences: Vec<RealizedSession> = decode_records(records)?;
        occurrences.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(occurrences)
    }

    fn list_for_student(&self, student_id: &str) -> Result<Vec<RealizedSession>> {
        let records = self
            .collection
            .find_where(|r| roster_includes(r, student_id))?;
        let mut occurrences: Vec<RealizedSession> = decode_records(records)?;
        occurrences.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(occurrences)
    }

    fn update_realized_session(
        &self,
        realized_session_id: &str,
        patch: RealizedSessionPatch,
    ) -> Result<Option<RealizedSession>> {
        let record = self
            .collection
            .update(realized_session_id, serde_json::to_value(&patch)?)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn delete_realized_session(&self, realized_session_id: &str) -> Result<bool> {
        self.collection.remove(realized_session_id)
    }
}
