use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    AccessRevocation, Actor, CardReturn, ChecklistId, ChecklistSeed, ClearanceChecklist,
    DepartmentClearance, DepartmentSignOff, EquipmentIntake, EquipmentItem, EquipmentReturn,
    ExitInterview, ExitInterviewRequest, Initiator, ResignationReview, ResignationSubmission,
    RevocationRequest, Role, Settlement, SettlementRequest, StatusUpdate, TerminationId,
    TerminationIntake, TerminationRequest, TerminationStatus,
};
use super::repository::{
    CaseView, ChecklistView, NoticeError, NoticePublisher, OffboardingNotice,
    OffboardingRepository, RepositoryError,
};
use super::transitions::{check_transition, TransitionRefused};

static TERMINATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CHECKLIST_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static EQUIPMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_termination_id() -> TerminationId {
    let id = TERMINATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TerminationId(format!("term-{id:06}"))
}

fn next_checklist_id() -> ChecklistId {
    let id = CHECKLIST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ChecklistId(format!("chk-{id:06}"))
}

fn next_equipment_id() -> String {
    let id = EQUIPMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("eq-{id:06}")
}

/// Service composing the transition table, permission checks, progress
/// derivation, and repository access for offboarding cases.
pub struct OffboardingService<R, N> {
    repository: Arc<R>,
    notices: Arc<N>,
}

impl<R, N> OffboardingService<R, N>
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    pub fn new(repository: Arc<R>, notices: Arc<N>) -> Self {
        Self {
            repository,
            notices,
        }
    }

    /// Record an employee resignation as a pending case.
    pub fn submit_resignation(
        &self,
        actor: &Actor,
        submission: ResignationSubmission,
    ) -> Result<TerminationRequest, CaseServiceError> {
        if submission.employee_id.trim().is_empty() {
            return Err(CaseServiceError::Validation(
                "employee_id is required".to_string(),
            ));
        }
        if submission.reason.trim().is_empty() {
            return Err(CaseServiceError::Validation("reason is required".to_string()));
        }

        let request = TerminationRequest {
            id: next_termination_id(),
            employee_id: submission.employee_id,
            initiator: Initiator::Employee,
            status: TerminationStatus::Pending,
            reason: submission.reason,
            termination_date: submission.termination_date,
            employee_comment: submission.employee_comment,
            hr_comment: None,
            created_at: Utc::now(),
            version: 1,
        };
        tracing::info!(case = %request.id.0, actor = %actor.user_id, "resignation submitted");
        Ok(self.repository.insert_termination(request)?)
    }

    /// Open an employer-initiated termination review. HR or manager only.
    pub fn open_review(
        &self,
        actor: &Actor,
        intake: TerminationIntake,
    ) -> Result<TerminationRequest, CaseServiceError> {
        require_any_role(actor, &[Role::Hr, Role::Manager])?;
        if intake.employee_id.trim().is_empty() {
            return Err(CaseServiceError::Validation(
                "employee_id is required".to_string(),
            ));
        }
        if intake.reason.trim().is_empty() {
            return Err(CaseServiceError::Validation("reason is required".to_string()));
        }

        let initiator = if actor.has_role(Role::Hr) {
            Initiator::Hr
        } else {
            Initiator::Manager
        };
        let request = TerminationRequest {
            id: next_termination_id(),
            employee_id: intake.employee_id,
            initiator,
            status: TerminationStatus::Pending,
            reason: intake.reason,
            termination_date: intake.termination_date,
            employee_comment: None,
            hr_comment: None,
            created_at: Utc::now(),
            version: 1,
        };
        tracing::info!(case = %request.id.0, actor = %actor.user_id, "termination review opened");
        Ok(self.repository.insert_termination(request)?)
    }

    /// Apply an HR status update, honoring the transition table and the
    /// optimistic-concurrency token.
    pub fn update_status(
        &self,
        actor: &Actor,
        id: &TerminationId,
        update: StatusUpdate,
    ) -> Result<TerminationRequest, CaseServiceError> {
        require_any_role(actor, &[Role::Hr])?;
        let mut request = self
            .repository
            .fetch_termination(id)?
            .ok_or(RepositoryError::NotFound)?;
        check_version(update.expected_version, request.version)?;
        check_transition(request.status, update.status)?;

        let read_version = request.version;
        request.status = update.status;
        if let Some(comment) = update.hr_comment {
            request.hr_comment = Some(comment);
        }
        if update.status == TerminationStatus::Approved {
            request.termination_date = update
                .termination_date
                .or(request.termination_date)
                .or_else(|| Some(Utc::now().date_naive()));
        }
        request.version += 1;
        self.repository
            .update_termination(request.clone(), read_version)
            .map_err(stale_to_conflict)?;

        match request.status {
            TerminationStatus::Approved => {
                self.publish_case_notice("termination_approved", &request)?
            }
            TerminationStatus::Rejected => {
                self.publish_case_notice("termination_rejected", &request)?
            }
            _ => {}
        }
        tracing::info!(case = %request.id.0, status = %request.status, "case status updated");
        Ok(request)
    }

    /// Decide a pending resignation. Approval stamps the termination date;
    /// rejection never does.
    pub fn review_resignation(
        &self,
        actor: &Actor,
        id: &TerminationId,
        review: ResignationReview,
    ) -> Result<TerminationRequest, CaseServiceError> {
        require_any_role(actor, &[Role::Hr])?;
        let request = self
            .repository
            .fetch_termination(id)?
            .ok_or(RepositoryError::NotFound)?;
        if request.initiator != Initiator::Employee {
            return Err(CaseServiceError::Validation(
                "case is not a resignation".to_string(),
            ));
        }
        if request.status != TerminationStatus::Pending {
            return Err(TransitionRefused {
                from: request.status,
                to: if review.approve {
                    TerminationStatus::Approved
                } else {
                    TerminationStatus::Rejected
                },
            }
            .into());
        }

        let status = if review.approve {
            TerminationStatus::Approved
        } else {
            TerminationStatus::Rejected
        };
        self.update_status(
            actor,
            id,
            StatusUpdate {
                status,
                hr_comment: review.hr_comment,
                termination_date: review.termination_date,
                expected_version: review.expected_version,
            },
        )
    }

    /// Create the clearance checklist for an approved termination. Exactly one
    /// checklist may exist per case.
    pub fn create_checklist(
        &self,
        actor: &Actor,
        termination_id: &TerminationId,
        seed: ChecklistSeed,
    ) -> Result<ChecklistView, CaseServiceError> {
        require_any_role(actor, &[Role::Hr])?;
        let request = self
            .repository
            .fetch_termination(termination_id)?
            .ok_or(RepositoryError::NotFound)?;
        if request.status != TerminationStatus::Approved {
            return Err(CaseServiceError::CaseNotApproved {
                status: request.status,
            });
        }
        if self
            .repository
            .checklist_for_termination(termination_id)?
            .is_some()
        {
            return Err(CaseServiceError::ChecklistExists);
        }
        if seed.departments.is_empty() {
            return Err(CaseServiceError::Validation(
                "at least one department is required".to_string(),
            ));
        }

        let checklist = ClearanceChecklist {
            id: next_checklist_id(),
            termination_id: termination_id.clone(),
            departments: seed
                .departments
                .into_iter()
                .map(DepartmentClearance::pending)
                .collect(),
            equipment: Vec::new(),
            card_returned: false,
            version: 1,
        };
        let stored = self
            .repository
            .insert_checklist(checklist)
            .map_err(|err| match err {
                RepositoryError::Conflict => CaseServiceError::ChecklistExists,
                other => CaseServiceError::Repository(other),
            })?;
        tracing::info!(case = %termination_id.0, checklist = %stored.id.0, "clearance checklist created");
        Ok(stored.into())
    }

    /// Record a department's clearance decision.
    pub fn sign_off_department(
        &self,
        actor: &Actor,
        checklist_id: &ChecklistId,
        department: &str,
        sign_off: DepartmentSignOff,
    ) -> Result<ChecklistView, CaseServiceError> {
        require_any_role(actor, &[Role::Hr, Role::Manager])?;
        self.mutate_checklist(checklist_id, sign_off.expected_version, |checklist| {
            let entry = checklist
                .department_mut(department)
                .ok_or_else(|| CaseServiceError::UnknownDepartment(department.to_string()))?;
            entry.decision = sign_off.decision;
            entry.updated_by = Some(actor.user_id.clone());
            entry.updated_at = Some(Utc::now());
            Ok(())
        })
    }

    /// Add a piece of equipment to the return list.
    pub fn add_equipment(
        &self,
        actor: &Actor,
        checklist_id: &ChecklistId,
        intake: EquipmentIntake,
    ) -> Result<ChecklistView, CaseServiceError> {
        require_any_role(actor, &[Role::Hr])?;
        if intake.name.trim().is_empty() {
            return Err(CaseServiceError::Validation(
                "equipment name is required".to_string(),
            ));
        }
        self.mutate_checklist(checklist_id, intake.expected_version, |checklist| {
            checklist.equipment.push(EquipmentItem {
                equipment_id: next_equipment_id(),
                name: intake.name.clone(),
                returned: false,
                condition: intake.condition.clone(),
            });
            Ok(())
        })
    }

    /// Set the returned flag (and optionally the condition) on an equipment item.
    pub fn set_equipment_returned(
        &self,
        actor: &Actor,
        checklist_id: &ChecklistId,
        equipment_id: &str,
        update: EquipmentReturn,
    ) -> Result<ChecklistView, CaseServiceError> {
        require_any_role(actor, &[Role::Hr])?;
        self.mutate_checklist(checklist_id, update.expected_version, |checklist| {
            let item = checklist
                .equipment_mut(equipment_id)
                .ok_or_else(|| CaseServiceError::UnknownEquipment(equipment_id.to_string()))?;
            item.returned = update.returned;
            if let Some(condition) = update.condition.clone() {
                item.condition = Some(condition);
            }
            Ok(())
        })
    }

    /// Set the access-card returned flag.
    pub fn set_card_returned(
        &self,
        actor: &Actor,
        checklist_id: &ChecklistId,
        update: CardReturn,
    ) -> Result<ChecklistView, CaseServiceError> {
        require_any_role(actor, &[Role::Hr])?;
        self.mutate_checklist(checklist_id, update.expected_version, |checklist| {
            checklist.card_returned = update.returned;
            Ok(())
        })
    }

    /// Request revocation of the employee's system access, immediately or on a
    /// scheduled date.
    pub fn schedule_access_revocation(
        &self,
        actor: &Actor,
        termination_id: &TerminationId,
        request: RevocationRequest,
    ) -> Result<AccessRevocation, CaseServiceError> {
        require_any_role(actor, &[Role::Hr])?;
        self.require_approved(termination_id)?;
        let revocation = AccessRevocation {
            termination_id: termination_id.clone(),
            mode: request.mode,
            requested_by: actor.user_id.clone(),
            requested_at: Utc::now(),
        };
        self.repository.record_access_revocation(revocation.clone())?;
        tracing::info!(case = %termination_id.0, "access revocation recorded");
        Ok(revocation)
    }

    /// Record final settlement processing and notify the payroll hand-off.
    pub fn process_settlement(
        &self,
        actor: &Actor,
        termination_id: &TerminationId,
        request: SettlementRequest,
    ) -> Result<Settlement, CaseServiceError> {
        require_any_role(actor, &[Role::Hr, Role::Payroll])?;
        self.require_approved(termination_id)?;
        let settlement = Settlement {
            termination_id: termination_id.clone(),
            amount: request.amount,
            processed_by: actor.user_id.clone(),
            processed_at: Utc::now(),
        };
        self.repository.record_settlement(settlement.clone())?;

        let mut details = BTreeMap::new();
        details.insert("amount".to_string(), format!("{:.2}", settlement.amount));
        self.notices.publish(OffboardingNotice {
            template: "settlement_processed".to_string(),
            termination_id: termination_id.clone(),
            details,
        })?;
        Ok(settlement)
    }

    /// Book the exit interview. Persisted server-side, one per termination.
    pub fn schedule_exit_interview(
        &self,
        actor: &Actor,
        termination_id: &TerminationId,
        request: ExitInterviewRequest,
    ) -> Result<ExitInterview, CaseServiceError> {
        require_any_role(actor, &[Role::Hr])?;
        self.require_approved(termination_id)?;
        if request.interviewer.trim().is_empty() {
            return Err(CaseServiceError::Validation(
                "interviewer is required".to_string(),
            ));
        }
        let interview = ExitInterview {
            termination_id: termination_id.clone(),
            scheduled_for: request.scheduled_for,
            interviewer: request.interviewer,
            notes: request.notes,
            created_at: Utc::now(),
        };
        Ok(self.repository.insert_exit_interview(interview)?)
    }

    /// Fetch a case with the calling actor's permitted actions and progress.
    pub fn get_case(
        &self,
        actor: &Actor,
        id: &TerminationId,
    ) -> Result<CaseView, CaseServiceError> {
        let request = self
            .repository
            .fetch_termination(id)?
            .ok_or(RepositoryError::NotFound)?;
        let checklist = self.repository.checklist_for_termination(id)?;
        Ok(CaseView::for_actor(&request, checklist.as_ref(), actor))
    }

    /// List all cases from the calling actor's point of view.
    pub fn list_cases(&self, actor: &Actor) -> Result<Vec<CaseView>, CaseServiceError> {
        let mut views = Vec::new();
        for request in self.repository.list_terminations()? {
            let checklist = self.repository.checklist_for_termination(&request.id)?;
            views.push(CaseView::for_actor(&request, checklist.as_ref(), actor));
        }
        Ok(views)
    }

    /// Fetch the checklist attached to a termination, with progress.
    pub fn get_checklist(
        &self,
        termination_id: &TerminationId,
    ) -> Result<ChecklistView, CaseServiceError> {
        let checklist = self
            .repository
            .checklist_for_termination(termination_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(checklist.into())
    }

    /// Fetch the exit interview booked for a termination.
    pub fn get_exit_interview(
        &self,
        termination_id: &TerminationId,
    ) -> Result<ExitInterview, CaseServiceError> {
        let interview = self
            .repository
            .exit_interview_for_termination(termination_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(interview)
    }

    fn mutate_checklist<F>(
        &self,
        checklist_id: &ChecklistId,
        expected_version: Option<u64>,
        apply: F,
    ) -> Result<ChecklistView, CaseServiceError>
    where
        F: FnOnce(&mut ClearanceChecklist) -> Result<(), CaseServiceError>,
    {
        let mut checklist = self
            .repository
            .fetch_checklist(checklist_id)?
            .ok_or(RepositoryError::NotFound)?;
        check_version(expected_version, checklist.version)?;
        let read_version = checklist.version;
        apply(&mut checklist)?;
        checklist.version += 1;
        self.repository
            .update_checklist(checklist.clone(), read_version)
            .map_err(stale_to_conflict)?;
        Ok(checklist.into())
    }

    fn require_approved(&self, termination_id: &TerminationId) -> Result<(), CaseServiceError> {
        let request = self
            .repository
            .fetch_termination(termination_id)?
            .ok_or(RepositoryError::NotFound)?;
        if request.status != TerminationStatus::Approved {
            return Err(CaseServiceError::CaseNotApproved {
                status: request.status,
            });
        }
        Ok(())
    }

    fn publish_case_notice(
        &self,
        template: &str,
        request: &TerminationRequest,
    ) -> Result<(), CaseServiceError> {
        let mut details = BTreeMap::new();
        details.insert("employee_id".to_string(), request.employee_id.clone());
        if let Some(date) = request.termination_date {
            details.insert("termination_date".to_string(), date.to_string());
        }
        self.notices.publish(OffboardingNotice {
            template: template.to_string(),
            termination_id: request.id.clone(),
            details,
        })?;
        Ok(())
    }
}

fn require_any_role(actor: &Actor, roles: &[Role]) -> Result<(), CaseServiceError> {
    if actor.has_any_role(roles) {
        Ok(())
    } else {
        let required = roles
            .iter()
            .map(|role| role.label())
            .collect::<Vec<_>>()
            .join(" or ");
        Err(CaseServiceError::Forbidden { required })
    }
}

fn check_version(expected: Option<u64>, current: u64) -> Result<(), CaseServiceError> {
    match expected {
        Some(expected) if expected != current => {
            Err(CaseServiceError::VersionConflict { expected, current })
        }
        _ => Ok(()),
    }
}

/// A writer that read the record before another writer landed loses the
/// compare-and-set inside the repository; surface that as a version conflict
/// rather than a storage failure.
fn stale_to_conflict(err: RepositoryError) -> CaseServiceError {
    match err {
        RepositoryError::Stale { expected, current } => {
            CaseServiceError::VersionConflict { expected, current }
        }
        other => CaseServiceError::Repository(other),
    }
}

/// Error raised by the offboarding service.
#[derive(Debug, thiserror::Error)]
pub enum CaseServiceError {
    #[error("action requires the {required} role")]
    Forbidden { required: String },
    #[error(transparent)]
    Transition(#[from] TransitionRefused),
    #[error("expected version {expected} but record is at {current}")]
    VersionConflict { expected: u64, current: u64 },
    #[error("action requires an approved termination (case is {status})")]
    CaseNotApproved { status: TerminationStatus },
    #[error("a clearance checklist already exists for this termination")]
    ChecklistExists,
    #[error("department '{0}' is not on the checklist")]
    UnknownDepartment(String),
    #[error("equipment '{0}' is not on the checklist")]
    UnknownEquipment(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notice(#[from] NoticeError),
}
