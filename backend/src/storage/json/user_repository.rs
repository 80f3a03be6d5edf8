use anyhow::Result;
use serde_json::Value;

use super::{JsonCollection, JsonConnection};
use crate::storage::traits::{StoredUser, UserDraft, UserStorage};

/// JSON-file user account repository backed by the `users` collection.
/// Email uniqueness is enforced by the auth service, not here.
#[derive(Clone)]
pub struct UserRepository {
    collection: JsonCollection,
}

impl UserRepository {
    pub fn new(connection: &JsonConnection) -> Self {
        Self {
            collection: JsonCollection::new(connection, "users", "user"),
        }
    }
}

impl UserStorage for UserRepository {
    fn create_user(&self, draft: UserDraft) -> Result<StoredUser> {
        let record = self.collection.create(serde_json::to_value(&draft)?)?;
        Ok(serde_json::from_value(record)?)
    }

    fn get_user(&self, user_id: &str) -> Result<Option<StoredUser>> {
        let record = self.collection.find_by_id(user_id)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<StoredUser>> {
        let matches = self
            .collection
            .find_where(|r| r.get("email").and_then(Value::as_str) == Some(email))?;
        matches
            .into_iter()
            .next()
            .map(|r| Ok(serde_json::from_value(r)?))
            .transpose()
    }
}
