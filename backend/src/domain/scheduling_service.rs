use chrono::{NaiveDate, NaiveTime};
use log::{info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use shared::{
    AttendanceEntry, CreateFixedSessionRequest, FixedSession, FixedSessionType,
    LogOccurrenceRequest, RealizedSession, Student, UpdateFixedSessionRequest,
};

use crate::domain::auth::Principal;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::require_teacher;
use crate::storage::traits::{
    Connection, FixedSessionDraft, FixedSessionPatch, FixedSessionStorage, GroupStorage,
    RealizedSessionDraft, RealizedSessionPatch, RealizedSessionStorage, StudentStorage,
};

/// The recurring-session engine.
///
/// A [`FixedSession`] is a weekly slot, not a calendar event; nothing here
/// generates occurrences in the background. The teacher logs each occurrence
/// explicitly, at which point the participant roster is snapshotted from the
/// template: an individual template contributes its one student, a group
/// template contributes the group's membership as of that moment. Later
/// membership changes never rewrite past occurrences.
///
/// Two occurrences of one template on the same date are allowed; make-up
/// and split lessons produce exactly that shape.
#[derive(Clone)]
pub struct SchedulingService<C: Connection> {
    fixed_session_repository: C::FixedSessionRepository,
    realized_session_repository: C::RealizedSessionRepository,
    student_repository: C::StudentRepository,
    group_repository: C::GroupRepository,
}

impl<C: Connection> SchedulingService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            fixed_session_repository: connection.create_fixed_session_repository(),
            realized_session_repository: connection.create_realized_session_repository(),
            student_repository: connection.create_student_repository(),
            group_repository: connection.create_group_repository(),
        }
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    pub fn create_template(
        &self,
        principal: &Principal,
        request: CreateFixedSessionRequest,
    ) -> DomainResult<FixedSession> {
        require_teacher(principal)?;
        info!(
            "Creating {:?} template: {:?} {} for student={:?} class={:?}",
            request.session_type,
            request.day_of_week,
            request.start_time,
            request.student_id,
            request.class_id
        );

        parse_start_time(&request.start_time)?;
        if request.duration_minutes == 0 {
            return Err(DomainError::validation("Duration must be greater than zero"));
        }
        if request.price < Decimal::ZERO {
            return Err(DomainError::validation("Price must be zero or greater"));
        }

        // Exactly one participant reference, matching the declared type
        match request.session_type {
            FixedSessionType::Individual => {
                let Some(ref student_id) = request.student_id else {
                    return Err(DomainError::validation(
                        "An individual template requires a student_id",
                    ));
                };
                if request.class_id.is_some() {
                    return Err(DomainError::validation(
                        "An individual template cannot carry a class_id",
                    ));
                }
                if self.student_repository.get_student(student_id)?.is_none() {
                    return Err(DomainError::not_found(format!(
                        "Student not found: {}",
                        student_id
                    )));
                }
            }
            FixedSessionType::Group => {
                let Some(ref class_id) = request.class_id else {
                    return Err(DomainError::validation(
                        "A group template requires a class_id",
                    ));
                };
                if request.student_id.is_some() {
                    return Err(DomainError::validation(
                        "A group template cannot carry a student_id",
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

        let template = self
            .fixed_session_repository
            .create_fixed_session(FixedSessionDraft {
                session_type: request.session_type,
                student_id: request.student_id,
                class_id: request.class_id,
                day_of_week: request.day_of_week,
                start_time: request.start_time,
                duration_minutes: request.duration_minutes,
                price: request.price,
                notes: request.notes,
                active: true,
            })?;

        info!("Created template: {}", template.id);
        Ok(template)
    }

    pub fn get_template(
        &self,
        principal: &Principal,
        template_id: &str,
    ) -> DomainResult<FixedSession> {
        let template = self
            .fixed_session_repository
            .get_fixed_session(template_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Template not found: {}", template_id))
            })?;

        if !principal.is_teacher() && !self.template_touches_linked_student(&template, principal)? {
            return Err(DomainError::authorization(
                "You can only view your children's recurring sessions",
            ));
        }

        Ok(template)
    }

    pub fn list_templates(&self, principal: &Principal) -> DomainResult<Vec<FixedSession>> {
        let templates = self.fixed_session_repository.list_fixed_sessions()?;
        if principal.is_teacher() {
            return Ok(templates);
        }

        let mut visible = Vec::new();
        for template in templates {
            if self.template_touches_linked_student(&template, principal)? {
                visible.push(template);
            }
        }
        Ok(visible)
    }

    /// Update template fields. Deactivating a template stops new occurrences
    /// while leaving every already-logged occurrence untouched.
    pub fn update_template(
        &self,
        principal: &Principal,
        template_id: &str,
        request: UpdateFixedSessionRequest,
    ) -> DomainResult<FixedSession> {
        require_teacher(principal)?;
        info!("Updating template: {}", template_id);

        if let Some(ref start_time) = request.start_time {
            parse_start_time(start_time)?;
        }
        if let Some(0) = request.duration_minutes {
            return Err(DomainError::validation("Duration must be greater than zero"));
        }
        if let Some(price) = request.price {
            if price < Decimal::ZERO {
                return Err(DomainError::validation("Price must be zero or greater"));
            }
        }

        let patch = FixedSessionPatch {
            day_of_week: request.day_of_week,
            start_time: request.start_time,
            duration_minutes: request.duration_minutes,
            price: request.price,
            notes: request.notes,
            active: request.active,
        };

        self.fixed_session_repository
            .update_fixed_session(template_id, patch)?
            .ok_or_else(|| DomainError::not_found(format!("Template not found: {}", template_id)))
    }

    /// Delete a template. Its occurrences remain queryable; they are
    /// independent records of lessons that happened.
    pub fn delete_template(&self, principal: &Principal, template_id: &str) -> DomainResult<()> {
        require_teacher(principal)?;
        info!("Deleting template: {}", template_id);

        if !self
            .fixed_session_repository
            .delete_fixed_session(template_id)?
        {
            return Err(DomainError::not_found(format!(
                "Template not found: {}",
                template_id
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Occurrences
    // ------------------------------------------------------------------

    /// Log one dated occurrence of a template. The roster is snapshotted
    /// from the template at call time; every participant defaults to
    /// present unless an override says otherwise.
    pub fn log_occurrence(
        &self,
        principal: &Principal,
        template_id: &str,
        request: LogOccurrenceRequest,
    ) -> DomainResult<RealizedSession> {
        require_teacher(principal)?;
        info!("Logging occurrence of {} on {}", template_id, request.date);

        let template = self
            .fixed_session_repository
            .get_fixed_session(template_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!("Template not found: {}", template_id))
            })?;
        if !template.active {
            return Err(DomainError::validation(
                "Cannot log an occurrence of an inactive template",
            ));
        }
        parse_date(&request.date)?;

        let roster = self.snapshot_roster(&template)?;
        if roster.is_empty() {
            return Err(DomainError::validation(
                "The template has no resolvable participants",
            ));
        }

        let mut attendance: Vec<AttendanceEntry> = roster
            .into_iter()
            .map(|student| AttendanceEntry {
                student_id: student.id,
                first_name: student.first_name,
                last_name: student.last_name,
                present: true,
                notes: None,
            })
            .collect();

        for override_entry in &request.attendance_overrides {
            let entry = attendance
                .iter_mut()
                .find(|a| a.student_id == override_entry.student_id)
                .ok_or_else(|| {
                    DomainError::not_found(format!(
                        "Student {} is not on this occurrence's roster",
                        override_entry.student_id
                    ))
                })?;
            entry.present = override_entry.present;
            entry.notes = override_entry.notes.clone();
        }

        let occurrence = self
            .realized_session_repository
            .create_realized_session(RealizedSessionDraft {
                fixed_session_id: template.id,
                date: request.date,
                duration_minutes: template.duration_minutes,
                price: template.price,
                notes: request.notes,
                attendance,
            })?;

        info!(
            "Logged occurrence {} with {} participants",
            occurrence.id,
            occurrence.attendance.len()
        );
        Ok(occurrence)
    }

    /// Occurrences of one template, most recent date first
    pub fn list_occurrences(
        &self,
        principal: &Principal,
        template_id: &str,
    ) -> DomainResult<Vec<RealizedSession>> {
        if self
            .fixed_session_repository
            .get_fixed_session(template_id)?
            .is_none()
        {
            return Err(DomainError::not_found(format!(
                "Template not found: {}",
                template_id
            )));
        }

        let occurrences = self.realized_session_repository.list_for_template(template_id)?;
        if principal.is_teacher() {
            return Ok(occurrences);
        }

        let linked = self
            .student_repository
            .list_students_for_parent(&principal.user_id)?;
        Ok(occurrences
            .into_iter()
            .filter(|o| roster_intersects(o, &linked))
            .collect())
    }

    pub fn get_realized_session(
        &self,
        principal: &Principal,
        realized_session_id: &str,
    ) -> DomainResult<RealizedSession> {
        let occurrence = self
            .realized_session_repository
            .get_realized_session(realized_session_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "Realized session not found: {}",
                    realized_session_id
                ))
            })?;

        if !principal.is_teacher() {
            let linked = self
                .student_repository
                .list_students_for_parent(&principal.user_id)?;
            if !roster_intersects(&occurrence, &linked) {
                return Err(DomainError::authorization(
                    "You can only view your children's sessions",
                ));
            }
        }

        Ok(occurrence)
    }

    pub fn list_realized_sessions(
        &self,
        principal: &Principal,
    ) -> DomainResult<Vec<RealizedSession>> {
        let occurrences = self.realized_session_repository.list_realized_sessions()?;
        if principal.is_teacher() {
            return Ok(occurrences);
        }

        let linked = self
            .student_repository
            .list_students_for_parent(&principal.user_id)?;
        Ok(occurrences
            .into_iter()
            .filter(|o| roster_intersects(o, &linked))
            .collect())
    }

    /// Set one participant's presence on an existing occurrence. Setting the
    /// value it already has is a no-op write, so the call is idempotent. A
    /// student who is not on the roster is an explicit error, not a silent
    /// no-op.
    pub fn set_attendance(
        &self,
        principal: &Principal,
        realized_session_id: &str,
        student_id: &str,
        present: bool,
    ) -> DomainResult<RealizedSession> {
        require_teacher(principal)?;
        info!(
            "Setting attendance on {}: {} -> {}",
            realized_session_id, student_id, present
        );

        let occurrence = self
            .realized_session_repository
            .get_realized_session(realized_session_id)?
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "Realized session not found: {}",
                    realized_session_id
                ))
            })?;

        let mut attendance = occurrence.attendance.clone();
        let entry = attendance
            .iter_mut()
            .find(|a| a.student_id == student_id)
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "Student {} is not on this occurrence's roster",
                    student_id
                ))
            })?;

        if entry.present == present {
            return Ok(occurrence);
        }
        entry.present = present;

        self.realized_session_repository
            .update_realized_session(
                realized_session_id,
                RealizedSessionPatch {
                    attendance: Some(attendance),
                    ..Default::default()
                },
            )?
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "Realized session not found: {}",
                    realized_session_id
                ))
            })
    }

    pub fn delete_realized_session(
        &self,
        principal: &Principal,
        realized_session_id: &str,
    ) -> DomainResult<()> {
        require_teacher(principal)?;
        info!("Deleting realized session: {}", realized_session_id);

        if !self
            .realized_session_repository
            .delete_realized_session(realized_session_id)?
        {
            return Err(DomainError::not_found(format!(
                "Realized session not found: {}",
                realized_session_id
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Resolve the template's current participants. Group members whose
    /// student record has since been deleted cannot be snapshotted and are
    /// skipped with a warning.
    fn snapshot_roster(&self, template: &FixedSession) -> DomainResult<Vec<Student>> {
        match template.session_type {
            FixedSessionType::Individual => {
                let student_id = template.student_id.as_ref().ok_or_else(|| {
                    DomainError::validation("Individual template has no student reference")
                })?;
                let student = self
                    .student_repository
                    .get_student(student_id)?
                    .ok_or_else(|| {
                        DomainError::not_found(format!("Student not found: {}", student_id))
                    })?;
                Ok(vec![student])
            }
            FixedSessionType::Group => {
                let class_id = template.class_id.as_ref().ok_or_else(|| {
                    DomainError::validation("Group template has no class reference")
                })?;
                let group = self.group_repository.get_group(class_id)?.ok_or_else(|| {
                    DomainError::not_found(format!("Group not found: {}", class_id))
                })?;

                let mut roster = Vec::new();
                for member_id in &group.student_ids {
                    match self.student_repository.get_student(member_id)? {
                        Some(student) => roster.push(student),
                        None => warn!(
                            "Group {} member {} no longer resolves, skipping in roster",
                            group.id, member_id
                        ),
                    }
                }
                Ok(roster)
            }
        }
    }

    fn template_touches_linked_student(
        &self,
        template: &FixedSession,
        principal: &Principal,
    ) -> DomainResult<bool> {
        let linked = self
            .student_repository
            .list_students_for_parent(&principal.user_id)?;

        match template.session_type {
            FixedSessionType::Individual => Ok(template
                .student_id
                .as_ref()
                .is_some_and(|id| linked.iter().any(|s| &s.id == id))),
            FixedSessionType::Group => {
                let Some(ref class_id) = template.class_id else {
                    return Ok(false);
                };
                let Some(group) = self.group_repository.get_group(class_id)? else {
                    return Ok(false);
                };
                Ok(linked.iter().any(|s| group.student_ids.contains(&s.id)))
            }
        }
    }
}

fn roster_intersects(occurrence: &RealizedSession, students: &[Student]) -> bool {
    occurrence
        .attendance
        .iter()
        .any(|entry| students.iter().any(|s| s.id == entry.student_id))
}

fn parse_start_time(start_time: &str) -> DomainResult<NaiveTime> {
    NaiveTime::parse_from_str(start_time, "%H:%M")
        .map_err(|_| DomainError::validation(format!("Invalid start time: {}", start_time)))
}

fn parse_date(date: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("Invalid date: {}", date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::group_service::GroupService;
    use crate::domain::student_service::StudentService;
    use crate::domain::test_support::{parent, teacher};
    use crate::storage::JsonConnection;
    use shared::{
        AttendanceOverride, CreateGroupRequest, CreateStudentRequest, DayOfWeek, UpdateGroupRequest,
    };
    use tempfile::TempDir;

    struct Fixture {
        scheduling: SchedulingService<JsonConnection>,
        students: StudentService<JsonConnection>,
        groups: GroupService<JsonConnection>,
        _temp_dir: TempDir,
    }

    fn setup() -> Fixture {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let connection = Arc::new(
            JsonConnection::new(temp_dir.path()).expect("Failed to create connection"),
        );
        Fixture {
            scheduling: SchedulingService::new(connection.clone()),
            students: StudentService::new(connection.clone()),
            groups: GroupService::new(connection),
            _temp_dir: temp_dir,
        }
    }

    fn make_student(fixture: &Fixture, first: &str, parent_id: Option<&str>) -> String {
        fixture
            .students
            .create_student(
                &teacher(),
                CreateStudentRequest {
                    first_name: first.to_string(),
                    last_name: "Test".to_string(),
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

    fn make_group(fixture: &Fixture, member_ids: Vec<String>) -> String {
        fixture
            .groups
            .create_group(
                &teacher(),
                CreateGroupRequest {
                    name: "G1".to_string(),
                    description: None,
                    student_ids: member_ids,
                    hourly_rate: None,
                },
            )
            .expect("Failed to create group")
            .group
            .id
    }

    fn individual_template_request(student_id: &str) -> CreateFixedSessionRequest {
        CreateFixedSessionRequest {
            session_type: FixedSessionType::Individual,
            student_id: Some(student_id.to_string()),
            class_id: None,
            day_of_week: DayOfWeek::Monday,
            start_time: "14:00".to_string(),
            duration_minutes: 60,
            price: Decimal::new(2500, 0),
            notes: None,
        }
    }

    fn group_template_request(class_id: &str) -> CreateFixedSessionRequest {
        CreateFixedSessionRequest {
            session_type: FixedSessionType::Group,
            student_id: None,
            class_id: Some(class_id.to_string()),
            day_of_week: DayOfWeek::Wednesday,
            start_time: "17:30".to_string(),
            duration_minutes: 90,
            price: Decimal::new(2000, 0),
            notes: None,
        }
    }

    fn log_request(date: &str) -> LogOccurrenceRequest {
        LogOccurrenceRequest {
            date: date.to_string(),
            notes: None,
            attendance_overrides: Vec::new(),
        }
    }

    #[test]
    fn test_create_template_validates_start_time() {
        let fixture = setup();
        let s1 = make_student(&fixture, "Ada", None);

        let mut request = individual_template_request(&s1);
        request.start_time = "25:99".to_string();

        let result = fixture.scheduling.create_template(&teacher(), request);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_create_template_rejects_unknown_participant() {
        let fixture = setup();

        let result = fixture
            .scheduling
            .create_template(&teacher(), individual_template_request("student::0::ghost"));
        assert!(matches!(result, Err(DomainError::NotFound(_))));

        let result = fixture
            .scheduling
            .create_template(&teacher(), group_template_request("group::0::ghost"));
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_log_occurrence_of_individual_template_defaults_present() {
        let fixture = setup();
        let s1 = make_student(&fixture, "Ada", None);
        let template = fixture
            .scheduling
            .create_template(&teacher(), individual_template_request(&s1))
            .expect("Failed to create template");

        let occurrence = fixture
            .scheduling
            .log_occurrence(&teacher(), &template.id, log_request("2024-09-02"))
            .expect("Failed to log occurrence");

        assert_eq!(occurrence.fixed_session_id, template.id);
        assert_eq!(occurrence.duration_minutes, 60);
        assert_eq!(occurrence.price, Decimal::new(2500, 0));
        assert_eq!(occurrence.attendance.len(), 1);
        assert_eq!(occurrence.attendance[0].student_id, s1);
        assert!(occurrence.attendance[0].present);
    }

    #[test]
    fn test_log_occurrence_applies_overrides() {
        let fixture = setup();
        let s1 = make_student(&fixture, "Ada", None);
        let s2 = make_student(&fixture, "Grace", None);
        let group = make_group(&fixture, vec![s1.clone(), s2.clone()]);
        let template = fixture
            .scheduling
            .create_template(&teacher(), group_template_request(&group))
            .expect("Failed to create template");

        let occurrence = fixture
            .scheduling
            .log_occurrence(
                &teacher(),
                &template.id,
                LogOccurrenceRequest {
                    date: "2024-09-04".to_string(),
                    notes: None,
                    attendance_overrides: vec![AttendanceOverride {
                        student_id: s2.clone(),
                        present: false,
                        notes: Some("sick".to_string()),
                    }],
                },
            )
            .expect("Failed to log occurrence");

        let ada = occurrence.attendance_for(&s1).expect("s1 missing");
        assert!(ada.present);
        let grace = occurrence.attendance_for(&s2).expect("s2 missing");
        assert!(!grace.present);
        assert_eq!(grace.notes.as_deref(), Some("sick"));
    }

    #[test]
    fn test_log_occurrence_rejects_override_for_non_roster_student() {
        let fixture = setup();
        let s1 = make_student(&fixture, "Ada", None);
        let template = fixture
            .scheduling
            .create_template(&teacher(), individual_template_request(&s1))
            .expect("Failed to create template");

        let result = fixture.scheduling.log_occurrence(
            &teacher(),
            &template.id,
            LogOccurrenceRequest {
                date: "2024-09-02".to_string(),
                notes: None,
                attendance_overrides: vec![AttendanceOverride {
                    student_id: "student::0::ghost".to_string(),
                    present: false,
                    notes: None,
                }],
            },
        );
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_inactive_template_rejects_new_occurrences_but_keeps_old_ones() {
        let fixture = setup();
        let s1 = make_student(&fixture, "Ada", None);
        let template = fixture
            .scheduling
            .create_template(&teacher(), individual_template_request(&s1))
            .expect("Failed to create template");

        fixture
            .scheduling
            .log_occurrence(&teacher(), &template.id, log_request("2024-09-02"))
            .expect("Failed to log occurrence");

        fixture
            .scheduling
            .update_template(
                &teacher(),
                &template.id,
                UpdateFixedSessionRequest {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .expect("Failed to deactivate");

        let result = fixture
            .scheduling
            .log_occurrence(&teacher(), &template.id, log_request("2024-09-09"));
        assert!(matches!(result, Err(DomainError::Validation(_))));

        let occurrences = fixture
            .scheduling
            .list_occurrences(&teacher(), &template.id)
            .expect("Failed to list");
        assert_eq!(occurrences.len(), 1);
    }

    #[test]
    fn test_roster_is_a_snapshot_of_group_membership() {
        let fixture = setup();
        let s1 = make_student(&fixture, "Ada", None);
        let s2 = make_student(&fixture, "Grace", None);
        let s3 = make_student(&fixture, "Alan", None);
        let group = make_group(&fixture, vec![s1.clone(), s2.clone()]);
        let template = fixture
            .scheduling
            .create_template(&teacher(), group_template_request(&group))
            .expect("Failed to create template");

        let before = fixture
            .scheduling
            .log_occurrence(&teacher(), &template.id, log_request("2024-09-04"))
            .expect("Failed to log occurrence");

        // Swap s2 out for s3, then log again
        fixture
            .groups
            .update_group(
                &teacher(),
                &group,
                UpdateGroupRequest {
                    student_ids: Some(vec![s1.clone(), s3.clone()]),
                    ..Default::default()
                },
            )
            .expect("Failed to update group");

        let after = fixture
            .scheduling
            .log_occurrence(&teacher(), &template.id, log_request("2024-09-11"))
            .expect("Failed to log occurrence");

        // The earlier occurrence still carries the old membership
        assert!(before.attendance_for(&s2).is_some());
        assert!(before.attendance_for(&s3).is_none());
        assert!(after.attendance_for(&s2).is_none());
        assert!(after.attendance_for(&s3).is_some());

        let reloaded = fixture
            .scheduling
            .get_realized_session(&teacher(), &before.id)
            .expect("Failed to reload");
        assert_eq!(reloaded.attendance, before.attendance);
    }

    #[test]
    fn test_set_attendance_is_idempotent() {
        let fixture = setup();
        let s1 = make_student(&fixture, "Ada", None);
        let template = fixture
            .scheduling
            .create_template(&teacher(), individual_template_request(&s1))
            .expect("Failed to create template");
        let occurrence = fixture
            .scheduling
            .log_occurrence(&teacher(), &template.id, log_request("2024-09-02"))
            .expect("Failed to log occurrence");

        let first = fixture
            .scheduling
            .set_attendance(&teacher(), &occurrence.id, &s1, false)
            .expect("Failed to set attendance");
        assert!(!first.attendance_for(&s1).expect("s1 missing").present);

        let second = fixture
            .scheduling
            .set_attendance(&teacher(), &occurrence.id, &s1, false)
            .expect("Failed to set attendance twice");
        assert_eq!(second.attendance, first.attendance);
        assert_eq!(second.attendance.len(), 1);
    }

    #[test]
    fn test_set_attendance_for_non_roster_student_is_not_found() {
        let fixture = setup();
        let s1 = make_student(&fixture, "Ada", None);
        let s2 = make_student(&fixture, "Grace", None);
        let template = fixture
            .scheduling
            .create_template(&teacher(), individual_template_request(&s1))
            .expect("Failed to create template");
        let occurrence = fixture
            .scheduling
            .log_occurrence(&teacher(), &template.id, log_request("2024-09-02"))
            .expect("Failed to log occurrence");

        let result = fixture
            .scheduling
            .set_attendance(&teacher(), &occurrence.id, &s2, false);
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[test]
    fn test_list_occurrences_sorted_date_descending() {
        let fixture = setup();
        let s1 = make_student(&fixture, "Ada", None);
        let template = fixture
            .scheduling
            .create_template(&teacher(), individual_template_request(&s1))
            .expect("Failed to create template");

        for date in ["2024-09-02", "2024-09-16", "2024-09-09"] {
            fixture
                .scheduling
                .log_occurrence(&teacher(), &template.id, log_request(date))
                .expect("Failed to log occurrence");
        }

        let occurrences = fixture
            .scheduling
            .list_occurrences(&teacher(), &template.id)
            .expect("Failed to list");
        let dates: Vec<&str> = occurrences.iter().map(|o| o.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-09-16", "2024-09-09", "2024-09-02"]);
    }

    #[test]
    fn test_parent_sees_only_occurrences_with_their_children() {
        let fixture = setup();
        let mine = make_student(&fixture, "Ada", Some("user::1::p1"));
        let other = make_student(&fixture, "Grace", None);

        let my_template = fixture
            .scheduling
            .create_template(&teacher(), individual_template_request(&mine))
            .expect("Failed to create template");
        let other_template = fixture
            .scheduling
            .create_template(&teacher(), individual_template_request(&other))
            .expect("Failed to create template");

        fixture
            .scheduling
            .log_occurrence(&teacher(), &my_template.id, log_request("2024-09-02"))
            .expect("Failed to log occurrence");
        fixture
            .scheduling
            .log_occurrence(&teacher(), &other_template.id, log_request("2024-09-02"))
            .expect("Failed to log occurrence");

        let caller = parent("user::1::p1");
        let visible = fixture
            .scheduling
            .list_realized_sessions(&caller)
            .expect("Failed to list");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].attendance[0].student_id, mine);

        let templates = fixture
            .scheduling
            .list_templates(&caller)
            .expect("Failed to list");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, my_template.id);
    }
}
