use anyhow::Result;
use shared::Group;

use super::{decode_records, JsonCollection, JsonConnection};
use crate::storage::traits::{GroupDraft, GroupPatch, GroupStorage};

/// JSON-file group repository backed by the `groups` collection
#[derive(Clone)]
pub struct GroupRepository {
    collection: JsonCollection,
}

impl GroupRepository {
    pub fn new(connection: &JsonConnection) -> Self {
        Self {
            collection: JsonCollection::new(connection, "groups", "group"),
        }
    }
}

impl GroupStorage for GroupRepository {
    fn create_group(&self, draft: GroupDraft) -> Result<Group> {
        let record = self.collection.create(serde_json::to_value(&draft)?)?;
        Ok(serde_json::from_value(record)?)
    }

    fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        let record = self.collection.find_by_id(group_id)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        decode_records(self.collection.load()?)
    }

    fn update_group(&self, group_id: &str, patch: GroupPatch) -> Result<Option<Group>> {
        let record = self
            .collection
            .update(group_id, serde_json::to_value(&patch)?)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn delete_group(&self, group_id: &str) -> Result<bool> {
        self.collection.remove(group_id)
    }
}
