use log::{info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use shared::{CreateStudentRequest, Student, UpdateStudentRequest};

use crate::domain::auth::Principal;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::require_teacher;
use crate::storage::traits::{Connection, StudentDraft, StudentPatch, StudentStorage};

/// Service for managing students. Students are the root entities of the
/// tracker; everything else references them by id.
#[derive(Clone)]
pub struct StudentService<C: Connection> {
    student_repository: C::StudentRepository,
}

impl<C: Connection> StudentService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        let student_repository = connection.create_student_repository();
        Self { student_repository }
    }

    /// List students visible to the caller: all of them for the teacher,
    /// only linked children for a parent.
    pub fn list_students(&self, principal: &Principal) -> DomainResult<Vec<Student>> {
        if principal.is_teacher() {
            Ok(self.student_repository.list_students()?)
        } else {
            Ok(self
                .student_repository
                .list_students_for_parent(&principal.user_id)?)
        }
    }

    pub fn get_student(&self, principal: &Principal, student_id: &str) -> DomainResult<Student> {
        let student = self
            .student_repository
            .get_student(student_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Student not found: {}", student_id))
            })?;

        if !principal.is_teacher() && student.parent_id.as_deref() != Some(&principal.user_id) {
            warn!(
                "Parent {} denied access to student {}",
                principal.user_id, student_id
            );
            return Err(DomainError::authorization(
                "You can only view your own children",
            ));
        }

        Ok(student)
    }

    pub fn create_student(
        &self,
        principal: &Principal,
        request: CreateStudentRequest,
    ) -> DomainResult<Student> {
        require_teacher(principal)?;
        info!(
            "Creating student: {} {}",
            request.first_name, request.last_name
        );

        let first_name = request.first_name.trim().to_string();
        let last_name = request.last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(DomainError::validation(
                "First and last name are required",
            ));
        }
        validate_rate(request.hourly_rate)?;

        let student = self.student_repository.create_student(StudentDraft {
            first_name,
            last_name,
            email: request.email,
            phone: request.phone,
            parent_id: request.parent_id,
            hourly_rate: request.hourly_rate,
            level: request.level,
            active: true,
            notes: request.notes,
        })?;

        info!(
            "Created student: {} with ID: {}",
            student.full_name(),
            student.id
        );
        Ok(student)
    }

    pub fn update_student(
        &self,
        principal: &Principal,
        student_id: &str,
        request: UpdateStudentRequest,
    ) -> DomainResult<Student> {
        require_teacher(principal)?;
        info!("Updating student: {}", student_id);

        if let Some(ref first_name) = request.first_name {
            if first_name.trim().is_empty() {
                return Err(DomainError::validation("First name cannot be empty"));
            }
        }
        if let Some(ref last_name) = request.last_name {
            if last_name.trim().is_empty() {
                return Err(DomainError::validation("Last name cannot be empty"));
            }
        }
        if let Some(rate) = request.hourly_rate {
            validate_rate(rate)?;
        }

        let patch = StudentPatch {
            first_name: request.first_name.map(|s| s.trim().to_string()),
            last_name: request.last_name.map(|s| s.trim().to_string()),
            email: request.email,
            phone: request.phone,
            parent_id: request.parent_id,
            hourly_rate: request.hourly_rate,
            level: request.level,
            active: request.active,
            notes: request.notes,
        };

        self.student_repository
            .update_student(student_id, patch)?
            .ok_or_else(|| DomainError::not_found(format!("Student not found: {}", student_id)))
    }

    /// Delete a student. References held by sessions, groups, and payments
    /// are left dangling on purpose; there is no cascade.
    pub fn delete_student(&self, principal: &Principal, student_id: &str) -> DomainResult<()> {
        require_teacher(principal)?;
        info!("Deleting student: {}", student_id);

        if !self.student_repository.delete_student(student_id)? {
            return Err(DomainError::not_found(format!(
                "Student not found: {}",
                student_id
            )));
        }
        Ok(())
    }
}

fn validate_rate(rate: Decimal) -> DomainResult<()> {
    if rate < Decimal::ZERO {
        return Err(DomainError::validation("Rate must be zero or greater"));
    }
    Ok(())
}
