use anyhow::Result;
use shared::FixedSession;

use super::{decode_records, JsonCollection, JsonConnection};
use crate::storage::traits::{FixedSessionDraft, FixedSessionPatch, FixedSessionStorage};

/// JSON-file recurring template repository backed by the `fixed_sessions`
/// collection
#[derive(Clone)]
pub struct FixedSessionRepository {
    collection: JsonCollection,
}

impl FixedSessionRepository {
    pub fn new(connection: &JsonConnection) -> Self {
        Self {
            collection: JsonCollection::new(connection, "fixed_sessions", "fixed_session"),
        }
    }
}

impl FixedSessionStorage for FixedSessionRepository {
    fn create_fixed_session(&self, draft: FixedSessionDraft) -> Result<FixedSession> {
        let record = self.collection.create(serde_json::to_value(&draft)?)?;
        Ok(serde_json::from_value(record)?)
    }

    fn get_fixed_session(&self, fixed_session_id: &str) -> Result<Option<FixedSession>> {
        let record = self.collection.find_by_id(fixed_session_id)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn list_fixed_sessions(&self) -> Result<Vec<FixedSession>> {
        decode_records(self.collection.load()?)
    }

    fn update_fixed_session(
        &self,
        fixed_session_id: &str,
        patch: FixedSessionPatch,
    ) -> Result<Option<FixedSession>> {
        let record = self
            .collection
            .update(fixed_session_id, serde_json::to_value(&patch)?)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn delete_fixed_session(&self, fixed_session_id: &str) -> Result<bool> {
        self.collection.remove(fixed_session_id)
    }
}
