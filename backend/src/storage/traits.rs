//! # Storage Traits
//!
//! Abstraction over the persistence backend. Each entity type gets its own
//! storage trait and is handed to the domain layer as an injected repository,
//! so services never reach for a shared ambient store.
//!
//! Create operations take a draft (the caller-supplied fields); the store
//! assigns the record id and timestamps. Update operations take a patch whose
//! `None` fields are left untouched in the stored record.

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    AttendanceEntry, DayOfWeek, FixedSession, FixedSessionType, Group, Payment, PaymentMethod,
    PaymentStatus, RealizedSession, Role, Session, SessionStatus, SessionType, Student, User,
};

/// A user record as persisted, including the password hash.
/// Only the storage and auth layers ever see this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

impl StoredUser {
    /// Strip the password hash for anything leaving the backend
    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDraft {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub parent_id: Option<String>,
    pub hourly_rate: Decimal,
    pub level: Option<String>,
    pub active: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StudentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupDraft {
    pub name: String,
    pub description: Option<String>,
    pub student_ids: Vec<String>,
    pub hourly_rate: Decimal,
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionDraft {
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub student_id: Option<String>,
    pub class_id: Option<String>,
    pub date: String,
    pub duration_minutes: u32,
    pub price: Decimal,
    pub status: SessionStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixedSessionDraft {
    #[serde(rename = "type")]
    pub session_type: FixedSessionType,
    pub student_id: Option<String>,
    pub class_id: Option<String>,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub duration_minutes: u32,
    pub price: Decimal,
    pub notes: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FixedSessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RealizedSessionDraft {
    pub fixed_session_id: String,
    pub date: String,
    pub duration_minutes: u32,
    pub price: Decimal,
    pub notes: Option<String>,
    pub attendance: Vec<AttendanceEntry>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RealizedSessionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Replaces the whole roster when given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Vec<AttendanceEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentDraft {
    pub student_id: String,
    pub amount: Decimal,
    pub date: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub session_ids: Vec<String>,
    pub paid_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PaymentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_ids: Option<Vec<String>>,
    /// Outer None leaves the stored date alone; Some(None) clears it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Trait defining the interface for user account storage operations
pub trait UserStorage: Send + Sync {
    /// Store a new user; the store assigns id and timestamps
    fn create_user(&self, draft: UserDraft) -> Result<StoredUser>;

    /// Retrieve a specific user by ID
    fn get_user(&self, user_id: &str) -> Result<Option<StoredUser>>;

    /// Look a user up by email (emails are unique)
    fn find_user_by_email(&self, email: &str) -> Result<Option<StoredUser>>;
}

/// Trait defining the interface for student storage operations
pub trait StudentStorage: Send + Sync {
    /// Store a new student; the store assigns id and timestamps
    fn create_student(&self, draft: StudentDraft) -> Result<Student>;

    /// Retrieve a specific student by ID
    fn get_student(&self, student_id: &str) -> Result<Option<Student>>;

    /// List all students in collection order
    fn list_students(&self) -> Result<Vec<Student>>;

    /// List students linked to a parent account
    fn list_students_for_parent(&self, parent_id: &str) -> Result<Vec<Student>>;

    /// Shallow-merge a patch into an existing student.
    /// Returns None when the id does not resolve.
    fn update_student(&self, student_id: &str, patch: StudentPatch) -> Result<Option<Student>>;

    /// Delete a student by ID; returns whether anything was removed
    fn delete_student(&self, student_id: &str) -> Result<bool>;
}

/// Trait defining the interface for group storage operations
pub trait GroupStorage: Send + Sync {
    fn create_group(&self, draft: GroupDraft) -> Result<Group>;

    fn get_group(&self, group_id: &str) -> Result<Option<Group>>;

    fn list_groups(&self) -> Result<Vec<Group>>;

    fn update_group(&self, group_id: &str, patch: GroupPatch) -> Result<Option<Group>>;

    fn delete_group(&self, group_id: &str) -> Result<bool>;
}

/// Trait defining the interface for one-off session storage operations
pub trait SessionStorage: Send + Sync {
    fn create_session(&self, draft: SessionDraft) -> Result<Session>;

    fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    fn list_sessions(&self) -> Result<Vec<Session>>;

    /// List individual sessions held for one student
    fn list_sessions_for_student(&self, student_id: &str) -> Result<Vec<Session>>;

    fn update_session(&self, session_id: &str, patch: SessionPatch) -> Result<Option<Session>>;

    fn delete_session(&self, session_id: &str) -> Result<bool>;
}

/// Trait defining the interface for recurring template storage operations
pub trait FixedSessionStorage: Send + Sync {
    fn create_fixed_session(&self, draft: FixedSessionDraft) -> Result<FixedSession>;

    fn get_fixed_session(&self, fixed_session_id: &str) -> Result<Option<FixedSession>>;

    fn list_fixed_sessions(&self) -> Result<Vec<FixedSession>>;

    fn update_fixed_session(
        &self,
        fixed_session_id: &str,
        patch: FixedSessionPatch,
    ) -> Result<Option<FixedSession>>;

    fn delete_fixed_session(&self, fixed_session_id: &str) -> Result<bool>;
}

/// Trait defining the interface for realized occurrence storage operations
pub trait RealizedSessionStorage: Send + Sync {
    fn create_realized_session(&self, draft: RealizedSessionDraft) -> Result<RealizedSession>;

    fn get_realized_session(&self, realized_session_id: &str) -> Result<Option<RealizedSession>>;

    fn list_realized_sessions(&self) -> Result<Vec<RealizedSession>>;

    /// List occurrences of one template, most recent date first
    fn list_for_template(&self, fixed_session_id: &str) -> Result<Vec<RealizedSession>>;

    /// List occurrences whose roster includes the student, most recent date first
    fn list_for_student(&self, student_id: &str) -> Result<Vec<RealizedSession>>;

    fn update_realized_session(
        &self,
        realized_session_id: &str,
        patch: RealizedSessionPatch,
    ) -> Result<Option<RealizedSession>>;

    fn delete_realized_session(&self, realized_session_id: &str) -> Result<bool>;
}

/// Trait defining the interface for payment storage operations
pub trait PaymentStorage: Send + Sync {
    fn create_payment(&self, draft: PaymentDraft) -> Result<Payment>;

    fn get_payment(&self, payment_id: &str) -> Result<Option<Payment>>;

    fn list_payments(&self) -> Result<Vec<Payment>>;

    fn list_payments_for_student(&self, student_id: &str) -> Result<Vec<Payment>>;

    fn update_payment(&self, payment_id: &str, patch: PaymentPatch) -> Result<Option<Payment>>;

    fn delete_payment(&self, payment_id: &str) -> Result<bool>;
}

/// Trait defining the interface for storage connections
///
/// Abstracts the backing store and provides factory methods for creating
/// repositories, so the wiring layer can assemble services against any
/// backend without knowing implementation details.
pub trait Connection: Send + Sync + Clone {
    type UserRepository: UserStorage + Clone;
    type StudentRepository: StudentStorage + Clone;
    type GroupRepository: GroupStorage + Clone;
    type SessionRepository: SessionStorage + Clone;
    type FixedSessionRepository: FixedSessionStorage + Clone;
    type RealizedSessionRepository: RealizedSessionStorage + Clone;
    type PaymentRepository: PaymentStorage + Clone;

    fn create_user_repository(&self) -> Self::UserRepository;
    fn create_student_repository(&self) -> Self::StudentRepository;
    fn create_group_repository(&self) -> Self::GroupRepository;
    fn create_session_repository(&self) -> Self::SessionRepository;
    fn create_fixed_session_repository(&self) -> Self::FixedSessionRepository;
    fn create_realized_session_repository(&self) -> Self::RealizedSessionRepository;
    fn create_payment_repository(&self) -> Self::PaymentRepository;
}
