//! # JSON File Storage
//!
//! Flat-file persistence: one JSON array per collection under the data
//! directory. [`JsonCollection`] implements the generic record-store
//! contract (load-or-create, atomic whole-file replace, server-assigned ids
//! and timestamps, shallow-merge updates); the per-entity repositories wrap
//! it with typed conversions and implement the storage traits.

pub mod collection;
pub mod connection;
pub mod fixed_session_repository;
pub mod group_repository;
pub mod payment_repository;
pub mod realized_session_repository;
pub mod session_repository;
pub mod student_repository;
pub mod user_repository;

pub use collection::JsonCollection;
pub use connection::JsonConnection;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::storage::traits::Connection;

/// Decode a batch of raw records into their typed form
pub(crate) fn decode_records<T: DeserializeOwned>(records: Vec<Value>) -> Result<Vec<T>> {
    records
        .into_iter()
        .map(|record| Ok(serde_json::from_value(record)?))
        .collect()
}

impl Connection for JsonConnection {
    type UserRepository = user_repository::UserRepository;
    type StudentRepository = student_repository::StudentRepository;
    type GroupRepository = group_repository::GroupRepository;
    type SessionRepository = session_repository::SessionRepository;
    type FixedSessionRepository = fixed_session_repository::FixedSessionRepository;
    type RealizedSessionRepository = realized_session_repository::RealizedSessionRepository;
    type PaymentRepository = payment_repository::PaymentRepository;

    fn create_user_repository(&self) -> Self::UserRepository {
        user_repository::UserRepository::new(self)
    }

    fn create_student_repository(&self) -> Self::StudentRepository {
        student_repository::StudentRepository::new(self)
    }

    fn create_group_repository(&self) -> Self::GroupRepository {
        group_repository::GroupRepository::new(self)
    }

    fn create_session_repository(&self) -> Self::SessionRepository {
        session_repository::SessionRepository::new(self)
    }

    fn create_fixed_session_repository(&self) -> Self::FixedSessionRepository {
        fixed_session_repository::FixedSessionRepository::new(self)
    }

    fn create_realized_session_repository(&self) -> Self::RealizedSessionRepository {
        realized_session_repository::RealizedSessionRepository::new(self)
    }

    fn create_payment_repository(&self) -> Self::PaymentRepository {
        payment_repository::PaymentRepository::new(self)
    }
}
