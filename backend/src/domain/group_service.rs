use log::{info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use shared::{CreateGroupRequest, Group, GroupResponse, UpdateGroupRequest};

use crate::domain::auth::Principal;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::require_teacher;
use crate::storage::traits::{Connection, GroupDraft, GroupPatch, GroupStorage, StudentStorage};

/// Rate used when a group is created without one
const DEFAULT_GROUP_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Minimum distinct, resolvable members a group must have
const MIN_GROUP_SIZE: usize = 2;

/// Service for managing groups (classes) of students.
///
/// Membership validation is explicit rather than silent: requested ids that
/// do not resolve to a student are reported back as `rejected_student_ids`,
/// and the at-least-two rule applies to the ids that survived validation.
#[derive(Clone)]
pub struct GroupService<C: Connection> {
    group_repository: C::GroupRepository,
    student_repository: C::StudentRepository,
}

impl<C: Connection> GroupService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            group_repository: connection.create_group_repository(),
            student_repository: connection.create_student_repository(),
        }
    }

    /// Split requested member ids into (resolvable, rejected), de-duplicating
    /// while preserving request order.
    fn validate_members(
        &self,
        student_ids: &[String],
    ) -> DomainResult<(Vec<String>, Vec<String>)> {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for id in student_ids {
            if accepted.contains(id) || rejected.contains(id) {
                continue;
            }
            if self.student_repository.get_student(id)?.is_some() {
                accepted.push(id.clone());
            } else {
                rejected.push(id.clone());
            }
        }
        Ok((accepted, rejected))
    }

    pub fn create_group(
        &self,
        principal: &Principal,
        request: CreateGroupRequest,
    ) -> DomainResult<GroupResponse> {
        require_teacher(principal)?;
        info!(
            "Creating group: {} with {} requested members",
            request.name,
            request.student_ids.len()
        );

        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Group name is required"));
        }
        let hourly_rate = request.hourly_rate.unwrap_or(DEFAULT_GROUP_RATE);
        if hourly_rate < Decimal::ZERO {
            return Err(DomainError::validation("Rate must be zero or greater"));
        }

        let (accepted, rejected) = self.validate_members(&request.student_ids)?;
        if !rejected.is_empty() {
            warn!(
                "Group '{}' create request carried {} unresolvable student ids",
                name,
                rejected.len()
            );
        }
        if accepted.len() < MIN_GROUP_SIZE {
            return Err(DomainError::validation(format!(
                "A group requires at least {} existing students ({} valid of {} requested)",
                MIN_GROUP_SIZE,
                accepted.len(),
                request.student_ids.len()
            )));
        }

        let group = self.group_repository.create_group(GroupDraft {
            name,
            description: request.description,
            student_ids: accepted,
            hourly_rate,
            active: true,
        })?;

        info!("Created group: {} with ID: {}", group.name, group.id);
        Ok(GroupResponse {
            group,
            rejected_student_ids: rejected,
        })
    }

    pub fn get_group(&self, principal: &Principal, group_id: &str) -> DomainResult<Group> {
        let group = self.group_repository.get_group(group_id)?.ok_or_else(|| {
            DomainError::not_found(format!("Group not found: {}", group_id))
        })?;

        if !principal.is_teacher() && !self.includes_linked_student(&group, principal)? {
            return Err(DomainError::authorization(
                "You can only view groups your children belong to",
            ));
        }

        Ok(group)
    }

    /// List groups visible to the caller: all for the teacher, only groups
    /// containing one of their children for a parent.
    pub fn list_groups(&self, principal: &Principal) -> DomainResult<Vec<Group>> {
        let groups = self.group_repository.list_groups()?;
        if principal.is_teacher() {
            return Ok(groups);
        }

        let mut visible = Vec::new();
        for group in groups {
            if self.includes_linked_student(&group, principal)? {
                visible.push(group);
            }
        }
        Ok(visible)
    }

    pub fn update_group(
        &self,
        principal: &Principal,
        group_id: &str,
        request: UpdateGroupRequest,
    ) -> DomainResult<GroupResponse> {
        require_teacher(principal)?;
        info!("Updating group: {}", group_id);

        if let Some(ref name) = request.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("Group name cannot be empty"));
            }
        }
        if let Some(rate) = request.hourly_rate {
            if rate < Decimal::ZERO {
                return Err(DomainError::validation("Rate must be zero or greater"));
            }
        }

        // Replacing the membership re-runs the same validation as create
        let mut rejected = Vec::new();
        let student_ids = match request.student_ids {
            Some(ref requested) => {
                let (accepted, dropped) = self.validate_members(requested)?;
                if accepted.len() < MIN_GROUP_SIZE {
                    return Err(DomainError::validation(format!(
                        "A group requires at least {} existing students ({} valid of {} requested)",
                        MIN_GROUP_SIZE,
                        accepted.len(),
                        requested.len()
                    )));
                }
                rejected = dropped;
                Some(accepted)
            }
            None => None,
        };

        let patch = GroupPatch {
            name: request.name.map(|s| s.trim().to_string()),
            description: request.description,
            student_ids,
            hourly_rate: request.hourly_rate,
            active: request.active,
        };

        let group = self
            .group_repository
            .update_group(group_id, patch)?
            .ok_or_else(|| DomainError::not_found(format!("Group not found: {}", group_id)))?;

        Ok(GroupResponse {
            group,
            rejected_student_ids: rejected,
        })
    }

    /// Delete a group. Its students are untouched; they are referenced,
    /// never owned.
    pub fn delete_group(&self, principal: &Principal, group_id: &str) -> DomainResult<()> {
        require_teacher(principal)?;
        info!("Deleting group: {}", group_id);

        if !self.group_repository.delete_group(group_id)? {
            return Err(DomainError::not_found(format!(
                "Group not found: {}",
                group_id
            )));
        }
        Ok(())
    }

    fn includes_linked_student(
        &self,
        group: &Group,
        principal: &Principal,
    ) -> DomainResult<bool> {
        let linked = self
            .student_repository
            .list_students_for_parent(&principal.user_id)?;
        Ok(linked.iter().any(|s| group.student_ids.contains(&s.id)))
    }
}
