use anyhow::Result;
use serde_json::Value;
use shared::Student;

use super::{decode_records, JsonCollection, JsonConnection};
use crate::storage::traits::{StudentDraft, StudentPatch, StudentStorage};

/// JSON-file student repository backed by the `students` collection
#[derive(Clone)]
pub struct StudentRepository {
    collection: JsonCollection,
}

impl StudentRepository {
    pub fn new(connection: &JsonConnection) -> Self {
        Self {
            collection: JsonCollection::new(connection, "students", "student"),
        }
    }
}

impl StudentStorage for StudentRepository {
    fn create_student(&self, draft: StudentDraft) -> Result<Student> {
        let record = self.collection.create(serde_json::to_value(&draft)?)?;
        Ok(serde_json::from_value(record)?)
    }

    fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        let record = self.collection.find_by_id(student_id)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn list_students(&self) -> Result<Vec<Student>> {
        decode_records(self.collection.load()?)
    }

    fn list_students_for_parent(&self, parent_id: &str) -> Result<Vec<Student>> {
        let records = self
            .collection
            .find_where(|r| r.get("parent_id").and_then(Value::as_str) == Some(parent_id))?;
        decode_records(records)
    }

    fn update_student(&self, student_id: &str, patch: StudentPatch) -> Result<Option<Student>> {
        let record = self
            .collection
            .update(student_id, serde_json::to_value(&patch)?)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn delete_student(&self, student_id: &str) -> Result<bool> {
        self.collection.remove(student_id)
    }
}
