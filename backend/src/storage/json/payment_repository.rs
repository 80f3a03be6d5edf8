use anyhow::Result;
use serde_json::Value;
use shared::Payment;

use super::{decode_records, JsonCollection, JsonConnection};
use crate::storage::traits::{PaymentDraft, PaymentPatch, PaymentStorage};

/// JSON-file payment repository backed by the `payments` collection
#[derive(Clone)]
pub struct PaymentRepository {
    collection: JsonCollection,
}

impl PaymentRepository {
    pub fn new(connection: &JsonConnection) -> Self {
        Self {
            collection: JsonCollection::new(connection, "payments", "payment"),
        }
    }
}

impl PaymentStorage for PaymentRepository {
    fn create_payment(&self, draft: PaymentDraft) -> Result<Payment> {
        let record = self.collection.create(serde_json::to_value(&draft)?)?;
        Ok(serde_json::from_value(record)?)
    }

    fn get_payment(&self, payment_id: &str) -> Result<Option<Payment>> {
        let record = self.collection.find_by_id(payment_id)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn list_payments(&self) -> Result<Vec<Payment>> {
        decode_records(self.collection.load()?)
    }

    fn list_payments_for_student(&self, student_id: &str) -> Result<Vec<Payment>> {
        let records = self
            .collection
            .find_where(|r| r.get("student_id").and_then(Value::as_str) == Some(student_id))?;
        let mut payments: Vec<Payment> = decode_records(records)?;
        payments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(payments)
    }

    fn update_payment(&self, payment_id: &str, patch: PaymentPatch) -> Result<Option<Payment>> {
        let record = self
            .collection
            .update(payment_id, serde_json::to_value(&patch)?)?;
        record.map(|r| Ok(serde_json::from_value(r)?)).transpose()
    }

    fn delete_payment(&self, payment_id: &str) -> Result<bool> {
        self.collection.remove(payment_id)
    }
}
