//! # Domain Layer
//!
//! Business logic for the tutoring tracker. Each service owns the
//! repositories it needs and enforces its entity's invariants and the
//! caller's role-based visibility; the REST layer above only translates
//! requests and errors.

pub mod auth;
pub mod errors;
pub mod group_service;
pub mod payment_service;
pub mod reconciliation_service;
pub mod scheduling_service;
pub mod session_service;
pub mod student_service;

pub use auth::{AuthError, AuthService, Principal};
pub use errors::{DomainError, DomainResult};
pub use group_service::GroupService;
pub use payment_service::PaymentService;
pub use reconciliation_service::ReconciliationService;
pub use scheduling_service::SchedulingService;
pub use session_service::SessionService;
pub use student_service::StudentService;

/// Writes are teacher-only across the whole domain
pub(crate) fn require_teacher(principal: &Principal) -> DomainResult<()> {
    if !principal.is_teacher() {
        return Err(DomainError::authorization(
            "Only the teacher can perform this action",
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use shared::Role;

    use super::Principal;

    pub fn teacher() -> Principal {
        Principal {
            user_id: "user::1::teacher".to_string(),
            role: Role::Teacher,
        }
    }

    pub fn parent(user_id: &str) -> Principal {
        Principal {
            user_id: user_id.to_string(),
            role: Role::Parent,
        }
    }
}
