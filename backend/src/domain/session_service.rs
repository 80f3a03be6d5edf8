use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use std::sync::Arc;

use shared::{
    CreateSessionRequest, Session, SessionStatus, SessionType, UpdateSessionRequest,
};

use crate::domain::auth::Principal;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::require_teacher;
use crate::storage::traits::{
    Connection, GroupStorage, SessionDraft, SessionPatch, SessionStorage, StudentStorage,
};

/// Service for one-off sessions: a dated lesson held for exactly one
/// student or one class.
#[derive(Clone)]
pub struct SessionService<C: Connection> {
    session_repository: C::SessionRepository,
    student_repository: C::StudentRepository,
    group_repository: C::GroupRepository,
}

impl<C: Connection> SessionService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            session_repository: connection.create_session_repository(),
            student_repository: connection.create_student_repository(),
            group_repository: connection.create_group_repository(),
        }
    }

    pub fn create_session(
        &self,
        principal: &Principal,
        request: CreateSessionRequest,
    ) -> DomainResult<Session> {
        require_teacher(principal)?;
        info!(
            "Creating {:?} session on {} for student={:?} class={:?}",
            request.session_type, request.date, request.student_id, request.class_id
        );

        parse_date(&request.date)?;
        if request.duration_minutes == 0 {
            return Err(DomainError::validation("Duration must be greater than zero"));
        }
        if request.price < Decimal::ZERO {
            return Err(DomainError::validation("Price must be zero or greater"));
        }

        // Exactly one participant reference, matching the declared type
        match request.session_type {
            SessionType::Individual => {
                let Some(ref student_id) = request.student_id else {
                    return Err(DomainError::validation(
                        "An individual session requires a student_id",
                    ));
                };
                if request.class_id.is_some() {
                    return Err(DomainError::validation(
                        "An individual session cannot carry a class_id",
                    ));
                }
                if self.student_repository.get_student(student_id)?.is_none() {
                    return Err(DomainError::not_found(format!(
                        "Student not found: {}",
                        student_id
                    )));
                }
            }
            SessionType::Class => {
                let Some(ref class_id) = request.class_id else {
                    return Err(DomainError::validation(
                        "A class session requires a class_id",
                    ));
                };
                if request.student_id.is_some() {
                    return Err(DomainError::validation(
                        "A class session cannot carry a student_id",
                    ));
                }
                if self.group_repository.get_group(class_id)?.is_none() {
                    return Err(DomainError::not_found(format!(
                        "Group not found: {}",
                        class_id
                    )));
                }
            }
        }

        let session = self.session_repository.create_session(SessionDraft {
            session_type: request.session_type,
            student_id: request.student_id,
            class_id: request.class_id,
            date: request.date,
            duration_minutes: request.duration_minutes,
            price: request.price,
            // The teacher usually logs sessions after they happen
            status: request.status.unwrap_or(SessionStatus::Completed),
            notes: request.notes,
        })?;

        info!("Created session: {}", session.id);
        Ok(session)
    }

    pub fn get_session(&self, principal: &Principal, session_id: &str) -> DomainResult<Session> {
        let session = self
            .session_repository
            .get_session(session_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Session not found: {}", session_id))
            })?;

        if !principal.is_teacher() && !self.touches_linked_student(&session, principal)? {
            return Err(DomainError::authorization(
                "You can only view your children's sessions",
            ));
        }

        Ok(session)
    }

    pub fn list_sessions(&self, principal: &Principal) -> DomainResult<Vec<Session>> {
        let sessions = self.session_repository.list_sessions()?;
        if principal.is_teacher() {
            return Ok(sessions);
        }

        let mut visible = Vec::new();
        for session in sessions {
            if self.touches_linked_student(&session, principal)? {
                visible.push(session);
            }
        }
        Ok(visible)
    }

    /// Individual sessions held for one student, most recent first
    pub fn list_sessions_for_student(
        &self,
        principal: &Principal,
        student_id: &str,
    ) -> DomainResult<Vec<Session>> {
        self.check_student_scope(principal, student_id)?;
        Ok(self.session_repository.list_sessions_for_student(student_id)?)
    }

    pub fn update_session(
        &self,
        principal: &Principal,
        session_id: &str,
        request: UpdateSessionRequest,
    ) -> DomainResult<Session> {
        require_teacher(principal)?;
        info!("Updating session: {}", session_id);

        if let Some(ref date) = request.date {
            parse_date(date)?;
        }
        if let Some(0) = request.duration_minutes {
            return Err(DomainError::validation("Duration must be greater than zero"));
        }
        if let Some(price) = request.price {
            if price < Decimal::ZERO {
                return Err(DomainError::validation("Price must be zero or greater"));
            }
        }

        let patch = SessionPatch {
            date: request.date,
            duration_minutes: request.duration_minutes,
            price: request.price,
            status: request.status,
            notes: request.notes,
        };

        self.session_repository
            .update_session(session_id, patch)?
            .ok_or_else(|| DomainError::not_found(format!("Session not found: {}", session_id)))
    }

    pub fn delete_session(&self, principal: &Principal, session_id: &str) -> DomainResult<()> {
        require_teacher(principal)?;
        info!("Deleting session: {}", session_id);

        if !self.session_repository.delete_session(session_id)? {
            return Err(DomainError::not_found(format!(
                "Session not found: {}",
                session_id
            )));
        }
        Ok(())
    }

    /// Is the session about one of the caller's linked children? For class
    /// sessions that means current group membership.
    fn touches_linked_student(
        &self,
        session: &Session,
        principal: &Principal,
    ) -> DomainResult<bool> {
        let linked = self
            .student_repository
            .list_students_for_parent(&principal.user_id)?;

        match session.session_type {
            SessionType::Individual => Ok(session
                .student_id
                .as_ref()
                .is_some_and(|id| linked.iter().any(|s| &s.id == id))),
            SessionType::Class => {
                let Some(ref class_id) = session.class_id else {
                    return Ok(false);
                };
                let Some(group) = self.group_repository.get_group(class_id)? else {
                    return Ok(false);
                };
                Ok(linked.iter().any(|s| group.student_ids.contains(&s.id)))
            }
        }
    }

    fn check_student_scope(&self, principal: &Principal, student_id: &str) -> DomainResult<()> {
        if principal.is_teacher() {
            return Ok(());
        }
        let student = self
            .student_repository
            .get_student(student_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Student not found: {}", student_id))
            })?;
        if student.parent_id.as_deref() != Some(&principal.user_id) {
            return Err(DomainError::authorization(
                "You can only view your children's sessions",
            ));
        }
        Ok(())
    }
}

fn parse_date(date: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("Invalid date: {}", date)))
}
