use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use shared::{
    AttendanceStats, BalanceStatus, Payment, PaymentSummary, SessionStatus, SessionType, Student,
    StudentAttendanceEntry, StudentAttendanceResponse,
};

use crate::domain::auth::Principal;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::require_teacher;
use crate::storage::traits::{
    Connection, GroupStorage, PaymentStorage, RealizedSessionStorage, SessionStorage,
    StudentStorage,
};

/// Derived per-student views: payment balances and attendance statistics.
///
/// Everything here is a pure computation over the persisted session and
/// payment records, recomputed on every read. There is no stored running
/// balance to drift out of sync.
#[derive(Clone)]
pub struct ReconciliationService<C: Connection> {
    student_repository: C::StudentRepository,
    group_repository: C::GroupRepository,
    session_repository: C::SessionRepository,
    realized_session_repository: C::RealizedSessionRepository,
    payment_repository: C::PaymentRepository,
}

impl<C: Connection> ReconciliationService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            student_repository: connection.create_student_repository(),
            group_repository: connection.create_group_repository(),
            session_repository: connection.create_session_repository(),
            realized_session_repository: connection.create_realized_session_repository(),
            payment_repository: connection.create_payment_repository(),
        }
    }

    /// Balance view for one student: total owed across one-off and realized
    /// sessions, minus completed payments. A negative remaining amount is a
    /// credit and still reads as up to date.
    pub fn payment_summary(
        &self,
        principal: &Principal,
        student_id: &str,
    ) -> DomainResult<PaymentSummary> {
        let student = self.resolve_scoped_student(principal, student_id)?;
        let payments = self.payment_repository.list_payments_for_student(student_id)?;
        self.summarize(&student, &payments)
    }

    /// Balance views for every student, teacher only
    pub fn all_payment_summaries(
        &self,
        principal: &Principal,
    ) -> DomainResult<Vec<PaymentSummary>> {
        require_teacher(principal)?;

        let students = self.student_repository.list_students()?;
        let mut summaries = Vec::with_capacity(students.len());
        for student in students {
            let payments = self
                .payment_repository
                .list_payments_for_student(&student.id)?;
            summaries.push(self.summarize(&student, &payments)?);
        }
        Ok(summaries)
    }

    /// Attendance history and counters for one student over their realized
    /// sessions, most recent first.
    pub fn attendance(
        &self,
        principal: &Principal,
        student_id: &str,
    ) -> DomainResult<StudentAttendanceResponse> {
        self.resolve_scoped_student(principal, student_id)?;

        let occurrences = self.realized_session_repository.list_for_student(student_id)?;
        let entries: Vec<StudentAttendanceEntry> = occurrences
            .iter()
            .filter_map(|occurrence| {
                occurrence
                    .attendance_for(student_id)
                    .map(|entry| StudentAttendanceEntry {
                        realized_session_id: occurrence.id.clone(),
                        fixed_session_id: occurrence.fixed_session_id.clone(),
                        date: occurrence.date.clone(),
                        present: entry.present,
                        notes: entry.notes.clone(),
                    })
            })
            .collect();

        let total = entries.len() as u32;
        let present = entries.iter().filter(|e| e.present).count() as u32;
        let rate = if total == 0 {
            0.0
        } else {
            round2(f64::from(present) / f64::from(total) * 100.0)
        };

        Ok(StudentAttendanceResponse {
            entries,
            stats: AttendanceStats {
                total_sessions: total,
                present_sessions: present,
                absent_sessions: total - present,
                attendance_rate: rate,
            },
        })
    }

    fn summarize(&self, student: &Student, payments: &[Payment]) -> DomainResult<PaymentSummary> {
        // (session id, price) for everything this student owes
        let owed = self.owed_sessions(&student.id)?;

        let total_owed: Decimal = owed.iter().map(|(_, price)| *price).sum();
        let completed: Vec<&Payment> = payments
            .iter()
            .filter(|p| p.status.is_completed())
            .collect();
        let total_paid: Decimal = completed.iter().map(|p| p.amount).sum();
        let remaining = total_owed - total_paid;

        let unpaid_session_ids: Vec<String> = owed
            .iter()
            .filter(|(id, _)| !completed.iter().any(|p| p.session_ids.contains(id)))
            .map(|(id, _)| id.clone())
            .collect();

        let last_payment_date = completed.iter().map(|p| p.date.clone()).max();

        let status = if remaining > Decimal::ZERO {
            BalanceStatus::Pending
        } else {
            BalanceStatus::UpToDate
        };

        debug!(
            "Summary for {}: owed={} paid={} remaining={}",
            student.id, total_owed, total_paid, remaining
        );

        Ok(PaymentSummary {
            student_id: student.id.clone(),
            student_name: student.full_name(),
            total_owed,
            total_paid,
            remaining,
            unpaid_session_ids,
            last_payment_date,
            status,
        })
    }

    /// Every session attributable to the student, with its price.
    ///
    /// One-off individual sessions match on the student reference; one-off
    /// class sessions are attributed through current group membership;
    /// realized sessions through their roster snapshot. Cancelled one-off
    /// sessions are not owed. A roster entry counts whether or not the
    /// student was present; missed lessons still bill.
    fn owed_sessions(&self, student_id: &str) -> DomainResult<Vec<(String, Decimal)>> {
        let mut owed = Vec::new();

        for session in self.session_repository.list_sessions()? {
            if session.status == SessionStatus::Cancelled {
                continue;
            }
            let attributable = match session.session_type {
                SessionType::Individual => {
                    session.student_id.as_deref() == Some(student_id)
                }
                SessionType::Class => match session.class_id {
                    Some(ref class_id) => self
                        .group_repository
                        .get_group(class_id)?
                        .is_some_and(|g| g.student_ids.iter().any(|id| id == student_id)),
                    None => false,
                },
            };
            if attributable {
                owed.push((session.id, session.price));
            }
        }

        for occurrence in self
            .realized_session_repository
            .list_for_student(student_id)?
        {
            owed.push((occurrence.id, occurrence.price));
        }

        Ok(owed)
    }

    fn resolve_scoped_student(
        &self,
        principal: &Principal,
        student_id: &str,
    ) -> DomainResult<Student> {
        let student = self
            .student_repository
            .get_student(student_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Student not found: {}", student_id))
            })?;
        if !principal.is_teacher() && student.parent_id.as_deref() != Some(&principal.user_id) {
            return Err(DomainError::authorization(
                "You can only view your own children",
            ));
        }
        Ok(student)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment_service::PaymentService;
    use crate::domain::scheduling_service::SchedulingService;
    use crate::domain::session_service::SessionService;
    use crate::domain::student_service::StudentService;
    use crate::domain::test_support::{parent, teacher};
    use crate::storage::JsonConnection;
    use shared::{
        AttendanceOverride, CreateFixedSessionRequest, CreatePaymentRequest,
        CreateSessionRequest, CreateStudentRequest, DayOfWeek, FixedSessionType,
        LogOccurrenceRequest, MarkPaidRequest, PaymentStatus,
    };
    use tempfile::TempDir;

    struct Fixture {
        reconciliation: ReconciliationService<JsonConnection>,
        students: StudentService<JsonConnection>,
        sessions: SessionService<JsonConnection>,
        scheduling: SchedulingService<JsonConnection>,
        payments: PaymentService<JsonConnection>,
        _temp_dir: TempDir,
    }

    fn setup() -> Fixture {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let connection = Arc::new(
            JsonConnection::new(temp_dir.path()).expect("Failed to create connection"),
        );
        Fixture {
            reconciliation: ReconciliationService::new(connection.clone()),
            students: StudentService::new(connection.clone()),
            sessions: SessionService::new(connection.clone()),
            scheduling: SchedulingService::new(connection.clone()),
            payments: PaymentService::new(connection),
            _temp_dir: temp_dir,
        }
    }

    fn make_student(fixture: &Fixture, parent_id: Option<&str>) -> String {
        fixture
            .students
            .create_student(
                &teacher(),
                CreateStudentRequest {
                    first_name: "Ada".to_string(),
                    last_name: "Lovelace".to_string(),
                    email: None,
                    phone: None,
                    parent_id: parent_id.map(String::from),
                    hourly_rate: Decimal::new(25, 0),
                    level: None,
                    notes: None,
                },
            )
            .expect("Failed to create student")
            .id
    }

    fn make_session(fixture: &Fixture, student_id: &str, date: &str, price: i64) -> String {
        fixture
            .sessions
            .create_session(
                &teacher(),
                CreateSessionRequest {
                    session_type: SessionType::Individual,
                    student_id: Some(student_id.to_string()),
                    class_id: None,
                    date: date.to_string(),
                    duration_minutes: 60,
                    price: Decimal::new(price, 0),
                    status: None,
                    notes: None,
                },
            )
            .expect("Failed to create session")
            .id
    }

    fn make_completed_payment(
        fixture: &Fixture,
        student_id: &str,
        amount: i64,
        date: &str,
        session_ids: Vec<String>,
    ) {
        let payment = fixture
            .payments
            .create_payment(
                &teacher(),
                CreatePaymentRequest {
                    student_id: student_id.to_string(),
                    amount: Decimal::new(amount, 0),
                    date: Some(date.to_string()),
                    method: None,
                    status: None,
                    session_ids,
                    notes: None,
                },
            )
            .expect("Failed to create payment");
        fixture
            .payments
            .mark_paid(&teacher(), &payment.id, MarkPaidRequest::default())
            .expect("Failed to mark paid");
    }

    #[test]
    fn test_summary_subtracts_completed_payments_and_tracks_unpaid_ids() {
        let fixture = setup();
        let s1 = make_student(&fixture, None);

        let first = make_session(&fixture, &s1, "2024-09-02", 2500);
        let second = make_session(&fixture, &s1, "2024-09-09", 2500);
        let third = make_session(&fixture, &s1, "2024-09-16", 3000);
        make_completed_payment(&fixture, &s1, 2500, "2024-09-10", vec![first]);

        let summary = fixture
            .reconciliation
            .payment_summary(&teacher(), &s1)
            .expect("Failed to summarize");

        assert_eq!(summary.total_owed, Decimal::new(8000, 0));
        assert_eq!(summary.total_paid, Decimal::new(2500, 0));
        assert_eq!(summary.remaining, Decimal::new(5500, 0));
        assert_eq!(summary.unpaid_session_ids, vec![second, third]);
        assert_eq!(summary.status, BalanceStatus::Pending);
        assert_eq!(summary.last_payment_date.as_deref(), Some("2024-09-10"));
    }

    #[test]
    fn test_pending_payments_do_not_count() {
        let fixture = setup();
        let s1 = make_student(&fixture, None);
        make_session(&fixture, &s1, "2024-09-02", 2500);

        // Created pending, never marked paid
        fixture
            .payments
            .create_payment(
                &teacher(),
                CreatePaymentRequest {
                    student_id: s1.clone(),
                    amount: Decimal::new(2500, 0),
                    date: Some("2024-09-10".to_string()),
                    method: None,
                    status: Some(PaymentStatus::Pending),
                    session_ids: Vec::new(),
                    notes: None,
                },
            )
            .expect("Failed to create payment");

        let summary = fixture
            .reconciliation
            .payment_summary(&teacher(), &s1)
            .expect("Failed to summarize");

        assert_eq!(summary.total_paid, Decimal::ZERO);
        assert_eq!(summary.remaining, Decimal::new(2500, 0));
        assert!(summary.last_payment_date.is_none());
    }

    #[test]
    fn test_overpayment_goes_negative_and_reads_up_to_date() {
        let fixture = setup();
        let s1 = make_student(&fixture, None);
        make_session(&fixture, &s1, "2024-09-02", 2500);
        make_completed_payment(&fixture, &s1, 4000, "2024-09-10", Vec::new());

        let summary = fixture
            .reconciliation
            .payment_summary(&teacher(), &s1)
            .expect("Failed to summarize");

        assert_eq!(summary.remaining, Decimal::new(-1500, 0));
        assert_eq!(summary.status, BalanceStatus::UpToDate);
    }

    #[test]
    fn test_cancelled_sessions_are_not_owed() {
        let fixture = setup();
        let s1 = make_student(&fixture, None);

        let session_id = make_session(&fixture, &s1, "2024-09-02", 2500);
        fixture
            .sessions
            .update_session(
                &teacher(),
                &session_id,
                shared::UpdateSessionRequest {
                    status: Some(SessionStatus::Cancelled),
                    ..Default::default()
                },
            )
            .expect("Failed to cancel");

        let summary = fixture
            .reconciliation
            .payment_summary(&teacher(), &s1)
            .expect("Failed to summarize");

        assert_eq!(summary.total_owed, Decimal::ZERO);
        assert_eq!(summary.status, BalanceStatus::UpToDate);
        assert!(summary.unpaid_session_ids.is_empty());
    }

    #[test]
    fn test_realized_sessions_count_toward_the_balance() {
        let fixture = setup();
        let s1 = make_student(&fixture, None);

        let template = fixture
            .scheduling
            .create_template(
                &teacher(),
                CreateFixedSessionRequest {
                    session_type: FixedSessionType::Individual,
                    student_id: Some(s1.clone()),
                    class_id: None,
                    day_of_week: DayOfWeek::Monday,
                    start_time: "14:00".to_string(),
                    duration_minutes: 60,
                    price: Decimal::new(2500, 0),
                    notes: None,
                },
            )
            .expect("Failed to create template");
        fixture
            .scheduling
            .log_occurrence(
                &teacher(),
                &template.id,
                LogOccurrenceRequest {
                    date: "2024-09-02".to_string(),
                    notes: None,
                    attendance_overrides: Vec::new(),
                },
            )
            .expect("Failed to log occurrence");
        make_session(&fixture, &s1, "2024-09-03", 3000);

        let summary = fixture
            .reconciliation
            .payment_summary(&teacher(), &s1)
            .expect("Failed to summarize");

        assert_eq!(summary.total_owed, Decimal::new(5500, 0));
        assert_eq!(summary.unpaid_session_ids.len(), 2);
    }

    #[test]
    fn test_attendance_stats_round_to_two_decimals() {
        let fixture = setup();
        let s1 = make_student(&fixture, None);

        let template = fixture
            .scheduling
            .create_template(
                &teacher(),
                CreateFixedSessionRequest {
                    session_type: FixedSessionType::Individual,
                    student_id: Some(s1.clone()),
                    class_id: None,
                    day_of_week: DayOfWeek::Monday,
                    start_time: "14:00".to_string(),
                    duration_minutes: 60,
                    price: Decimal::new(2500, 0),
                    notes: None,
                },
            )
            .expect("Failed to create template");

        for (date, present) in [
            ("2024-09-02", true),
            ("2024-09-09", true),
            ("2024-09-16", false),
        ] {
            let overrides = if present {
                Vec::new()
            } else {
                vec![AttendanceOverride {
                    student_id: s1.clone(),
                    present: false,
                    notes: None,
                }]
            };
            fixture
                .scheduling
                .log_occurrence(
                    &teacher(),
                    &template.id,
                    LogOccurrenceRequest {
                        date: date.to_string(),
                        notes: None,
                        attendance_overrides: overrides,
                    },
                )
                .expect("Failed to log occurrence");
        }

        let response = fixture
            .reconciliation
            .attendance(&teacher(), &s1)
            .expect("Failed to compute attendance");

        assert_eq!(response.stats.total_sessions, 3);
        assert_eq!(response.stats.present_sessions, 2);
        assert_eq!(response.stats.absent_sessions, 1);
        assert_eq!(response.stats.attendance_rate, 66.67);

        // History comes back most recent first
        let dates: Vec<&str> = response.entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-09-16", "2024-09-09", "2024-09-02"]);
    }

    #[test]
    fn test_attendance_of_student_with_no_sessions() {
        let fixture = setup();
        let s1 = make_student(&fixture, None);

        let response = fixture
            .reconciliation
            .attendance(&teacher(), &s1)
            .expect("Failed to compute attendance");

        assert_eq!(response.stats.total_sessions, 0);
        assert_eq!(response.stats.attendance_rate, 0.0);
        assert!(response.entries.is_empty());
    }

    #[test]
    fn test_parent_scope_and_teacher_only_rollup() {
        let fixture = setup();
        let mine = make_student(&fixture, Some("user::1::p1"));
        make_student(&fixture, None);

        let summary = fixture
            .reconciliation
            .payment_summary(&parent("user::1::p1"), &mine)
            .expect("Parent should see their own child");
        assert_eq!(summary.student_id, mine);

        let result = fixture
            .reconciliation
            .payment_summary(&parent("user::1::p2"), &mine);
        assert!(matches!(result, Err(DomainError::Authorization(_))));

        let result = fixture
            .reconciliation
            .all_payment_summaries(&parent("user::1::p1"));
        assert!(matches!(result, Err(DomainError::Authorization(_))));

        let all = fixture
            .reconciliation
            .all_payment_summaries(&teacher())
            .expect("Failed to list summaries");
        assert_eq!(all.len(), 2);
    }
}
