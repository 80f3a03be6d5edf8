use anyhow::Result;
use serde_json::Value;
use shared::Session;

use super::{decode_records, JsonCollection, JsonConnection};
use crate::storage::traits::{SessionDraft, SessionPatch, SessionStorage};

/// JSON-file one-off session repository backed by the `sessions` collection
#[derive(Clone)]
pub struct SessionRepository {
    collection: JsonCollection,
}

impl SessionRepository {
    pub fn new(connection: &JsonConnection) -> Self {
        Self {
            collection: JsonCollection::new(connection, "sessions", "session"),
        }
    }
}

impl SessionStorage for SessionRepository {
    fn create_session(&self, draft: SessionDraft) -> Result<Session> {
        let record = self.collection.create(serde_json::to_value(&draft)?)?;
        Ok(serde_json::from_value(record)?)
    }

    fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let record = self.collection.find_by_id(session_id)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn list_sessions(&self) -> Result<Vec<Session>> {
        decode_records(self.collection.load()?)
    }

    fn list_sessions_for_student(&self, student_id: &str) -> Result<Vec<Session>> {
        let records = self
            .collection
            .find_where(|r| r.get("student_id").and_then(Value::as_str) == Some(student_id))?;
        let mut sessions: Vec<Session> = decode_records(records)?;
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(sessions)
    }

    fn update_session(&self, session_id: &str, patch: SessionPatch) -> Result<Option<Session>> {
        let record = self
            .collection
            .update(session_id, serde_json::to_value(&patch)?)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn delete_session(&self, session_id: &str) -> Result<bool> {
        self.collection.remove(session_id)
    }
}
