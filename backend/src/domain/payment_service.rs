use chrono::{NaiveDate, Utc};
use log::info;
use rust_decimal::Decimal;
use std::sync::Arc;

use shared::{
    CreatePaymentRequest, MarkPaidRequest, Payment, PaymentMethod, PaymentStatus,
    UpdatePaymentRequest,
};

use crate::domain::auth::Principal;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::require_teacher;
use crate::storage::traits::{
    Connection, PaymentDraft, PaymentPatch, PaymentStorage, StudentStorage,
};

/// Service for payments received from students' families.
///
/// The `paid_date` field is coupled to status: it is set exactly when a
/// payment becomes completed and cleared on any transition away from
/// completed. Every mutation path here maintains that invariant.
#[derive(Clone)]
pub struct PaymentService<C: Connection> {
    payment_repository: C::PaymentRepository,
    student_repository: C::StudentRepository,
}

impl<C: Connection> PaymentService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            payment_repository: connection.create_payment_repository(),
            student_repository: connection.create_student_repository(),
        }
    }

    pub fn create_payment(
        &self,
        principal: &Principal,
        request: CreatePaymentRequest,
    ) -> DomainResult<Payment> {
        require_teacher(principal)?;
        info!(
            "Creating payment of {} for student {}",
            request.amount, request.student_id
        );

        if request.amount < Decimal::ZERO {
            return Err(DomainError::validation("Amount must be zero or greater"));
        }
        if self
            .student_repository
            .get_student(&request.student_id)?
            .is_none()
        {
            return Err(DomainError::not_found(format!(
                "Student not found: {}",
                request.student_id
            )));
        }

        let date = match request.date {
            Some(date) => {
                parse_date(&date)?;
                date
            }
            None => Utc::now().date_naive().to_string(),
        };
        let status = request.status.unwrap_or(PaymentStatus::Pending);
        let paid_date = status
            .is_completed()
            .then(|| Utc::now().to_rfc3339());

        let payment = self.payment_repository.create_payment(PaymentDraft {
            student_id: request.student_id,
            amount: request.amount,
            date,
            method: request.method.unwrap_or(PaymentMethod::Cash),
            status,
            session_ids: request.session_ids,
            paid_date,
            notes: request.notes,
        })?;

        info!("Created payment: {}", payment.id);
        Ok(payment)
    }

    pub fn get_payment(&self, principal: &Principal, payment_id: &str) -> DomainResult<Payment> {
        let payment = self
            .payment_repository
            .get_payment(payment_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Payment not found: {}", payment_id))
            })?;
        self.check_student_scope(principal, &payment.student_id)?;
        Ok(payment)
    }

    pub fn list_payments(&self, principal: &Principal) -> DomainResult<Vec<Payment>> {
        if principal.is_teacher() {
            return Ok(self.payment_repository.list_payments()?);
        }

        let linked = self
            .student_repository
            .list_students_for_parent(&principal.user_id)?;
        let payments = self.payment_repository.list_payments()?;
        Ok(payments
            .into_iter()
            .filter(|p| linked.iter().any(|s| s.id == p.student_id))
            .collect())
    }

    pub fn list_payments_for_student(
        &self,
        principal: &Principal,
        student_id: &str,
    ) -> DomainResult<Vec<Payment>> {
        self.check_student_scope(principal, student_id)?;
        Ok(self.payment_repository.list_payments_for_student(student_id)?)
    }

    pub fn update_payment(
        &self,
        principal: &Principal,
        payment_id: &str,
        request: UpdatePaymentRequest,
    ) -> DomainResult<Payment> {
        require_teacher(principal)?;
        info!("Updating payment: {}", payment_id);

        if let Some(amount) = request.amount {
            if amount < Decimal::ZERO {
                return Err(DomainError::validation("Amount must be zero or greater"));
            }
        }
        if let Some(ref date) = request.date {
            parse_date(date)?;
        }

        let existing = self
            .payment_repository
            .get_payment(payment_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Payment not found: {}", payment_id))
            })?;

        // Keep paid_date coupled to the status transition
        let paid_date = match request.status {
            Some(PaymentStatus::Completed) => match existing.paid_date {
                Some(_) => None, // already completed, keep the original stamp
                None => Some(Some(Utc::now().to_rfc3339())),
            },
            Some(_) => Some(None),
            None => None,
        };

        let patch = PaymentPatch {
            amount: request.amount,
            date: request.date,
            method: request.method,
            status: request.status,
            session_ids: request.session_ids,
            paid_date,
            notes: request.notes,
        };

        self.payment_repository
            .update_payment(payment_id, patch)?
            .ok_or_else(|| DomainError::not_found(format!("Payment not found: {}", payment_id)))
    }

    /// Mark a payment as completed, stamping `paid_date`. Already-completed
    /// payments keep their original stamp, so the operation is idempotent.
    pub fn mark_paid(
        &self,
        principal: &Principal,
        payment_id: &str,
        request: MarkPaidRequest,
    ) -> DomainResult<Payment> {
        require_teacher(principal)?;
        info!("Marking payment as paid: {}", payment_id);

        let existing = self
            .payment_repository
            .get_payment(payment_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Payment not found: {}", payment_id))
            })?;

        let paid_date = match existing.paid_date {
            Some(_) if existing.status.is_completed() => None,
            _ => Some(Some(Utc::now().to_rfc3339())),
        };

        let patch = PaymentPatch {
            status: Some(PaymentStatus::Completed),
            method: request.method,
            paid_date,
            ..Default::default()
        };

        self.payment_repository
            .update_payment(payment_id, patch)?
            .ok_or_else(|| DomainError::not_found(format!("Payment not found: {}", payment_id)))
    }

    pub fn delete_payment(&self, principal: &Principal, payment_id: &str) -> DomainResult<()> {
        require_teacher(principal)?;
        info!("Deleting payment: {}", payment_id);

        if !self.payment_repository.delete_payment(payment_id)? {
            return Err(DomainError::not_found(format!(
                "Payment not found: {}",
                payment_id
            )));
        }
        Ok(())
    }

    fn check_student_scope(&self, principal: &Principal, student_id: &str) -> DomainResult<()> {
        if principal.is_teacher() {
            return Ok(());
        }
        let student = self.student_repository.get_student(student_id)?;
        // A dangling student reference is invisible to parents
        let owned = student
            .map(|s| s.parent_id.as_deref() == Some(&principal.user_id))
            .unwrap_or(false);
        if !owned {
            return Err(DomainError::authorization(
                "You can only view your children's payments",
            ));
        }
        Ok(())
    }
}

fn parse_date(date: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("Invalid date: {}", date)))
}
