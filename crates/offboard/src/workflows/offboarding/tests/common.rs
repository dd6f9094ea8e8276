use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::workflows::offboarding::domain::{
    AccessRevocation, Actor, ChecklistId, ClearanceChecklist, ExitInterview, ResignationReview,
    ResignationSubmission, Role, Settlement, TerminationId, TerminationRequest,
};
use crate::workflows::offboarding::repository::{
    NoticeError, NoticePublisher, OffboardingNotice, OffboardingRepository, RepositoryError,
};
use crate::workflows::offboarding::service::OffboardingService;

#[derive(Default)]
pub(super) struct MemoryRepository {
    terminations: Mutex<HashMap<TerminationId, TerminationRequest>>,
    checklists: Mutex<HashMap<ChecklistId, ClearanceChecklist>>,
    revocations: Mutex<Vec<AccessRevocation>>,
    settlements: Mutex<Vec<Settlement>>,
    interviews: Mutex<HashMap<TerminationId, ExitInterview>>,
}

impl MemoryRepository {
    pub(super) fn settlements(&self) -> Vec<Settlement> {
        self.settlements.lock().expect("lock").clone()
    }

    pub(super) fn revocations(&self) -> Vec<AccessRevocation> {
        self.revocations.lock().expect("lock").clone()
    }
}

impl OffboardingRepository for MemoryRepository {
    fn insert_termination(
        &self,
        request: TerminationRequest,
    ) -> Result<TerminationRequest, RepositoryError> {
        let mut guard = self.terminations.lock().expect("lock");
        if guard.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn update_termination(
        &self,
        request: TerminationRequest,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.terminations.lock().expect("lock");
        let stored = guard.get(&request.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::Stale {
                expected: expected_version,
                current: stored.version,
            });
        }
        guard.insert(request.id.clone(), request);
        Ok(())
    }

    fn fetch_termination(
        &self,
        id: &TerminationId,
    ) -> Result<Option<TerminationRequest>, RepositoryError> {
        Ok(self.terminations.lock().expect("lock").get(id).cloned())
    }

    fn list_terminations(&self) -> Result<Vec<TerminationRequest>, RepositoryError> {
        let mut records: Vec<TerminationRequest> = self
            .terminations
            .lock()
            .expect("lock")
            .values()
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(records)
    }

    fn insert_checklist(
        &self,
        checklist: ClearanceChecklist,
    ) -> Result<ClearanceChecklist, RepositoryError> {
        let mut guard = self.checklists.lock().expect("lock");
        if guard.contains_key(&checklist.id)
            || guard
                .values()
                .any(|existing| existing.termination_id == checklist.termination_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(checklist.id.clone(), checklist.clone());
        Ok(checklist)
    }

    fn update_checklist(
        &self,
        checklist: ClearanceChecklist,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.checklists.lock().expect("lock");
        let stored = guard.get(&checklist.id).ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::Stale {
                expected: expected_version,
                current: stored.version,
            });
        }
        guard.insert(checklist.id.clone(), checklist);
        Ok(())
    }

    fn fetch_checklist(
        &self,
        id: &ChecklistId,
    ) -> Result<Option<ClearanceChecklist>, RepositoryError> {
        Ok(self.checklists.lock().expect("lock").get(id).cloned())
    }

    fn checklist_for_termination(
        &self,
        termination_id: &TerminationId,
    ) -> Result<Option<ClearanceChecklist>, RepositoryError> {
        Ok(self
            .checklists
            .lock()
            .expect("lock")
            .values()
            .find(|checklist| &checklist.termination_id == termination_id)
            .cloned())
    }

    fn record_access_revocation(
        &self,
        revocation: AccessRevocation,
    ) -> Result<(), RepositoryError> {
        self.revocations.lock().expect("lock").push(revocation);
        Ok(())
    }

    fn record_settlement(&self, settlement: Settlement) -> Result<(), RepositoryError> {
        self.settlements.lock().expect("lock").push(settlement);
        Ok(())
    }

    fn insert_exit_interview(
        &self,
        interview: ExitInterview,
    ) -> Result<ExitInterview, RepositoryError> {
        let mut guard = self.interviews.lock().expect("lock");
        if guard.contains_key(&interview.termination_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(interview.termination_id.clone(), interview.clone());
        Ok(interview)
    }

    fn exit_interview_for_termination(
        &self,
        termination_id: &TerminationId,
    ) -> Result<Option<ExitInterview>, RepositoryError> {
        Ok(self
            .interviews
            .lock()
            .expect("lock")
            .get(termination_id)
            .cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotices {
    events: Mutex<Vec<OffboardingNotice>>,
}

impl MemoryNotices {
    pub(super) fn events(&self) -> Vec<OffboardingNotice> {
        self.events.lock().expect("lock").clone()
    }
}

impl NoticePublisher for MemoryNotices {
    fn publish(&self, notice: OffboardingNotice) -> Result<(), NoticeError> {
        self.events.lock().expect("lock").push(notice);
        Ok(())
    }
}

pub(super) fn hr_actor() -> Actor {
    Actor::new("hr-1", [Role::Hr])
}

pub(super) fn manager_actor() -> Actor {
    Actor::new("mgr-1", [Role::Manager])
}

pub(super) fn employee_actor() -> Actor {
    Actor::new("emp-17", [Role::Employee])
}

pub(super) fn payroll_actor() -> Actor {
    Actor::new("pay-1", [Role::Payroll])
}

pub(super) fn resignation() -> ResignationSubmission {
    ResignationSubmission {
        employee_id: "emp-17".to_string(),
        reason: "relocating out of state".to_string(),
        employee_comment: Some("last day flexible".to_string()),
        termination_date: None,
    }
}

pub(super) fn build_service() -> (
    Arc<OffboardingService<MemoryRepository, MemoryNotices>>,
    Arc<MemoryRepository>,
    Arc<MemoryNotices>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notices = Arc::new(MemoryNotices::default());
    let service = Arc::new(OffboardingService::new(repository.clone(), notices.clone()));
    (service, repository, notices)
}

/// Submit a resignation and approve it so follow-up operations have an
/// approved case to act on.
pub(super) fn approved_case(
    service: &OffboardingService<MemoryRepository, MemoryNotices>,
) -> TerminationId {
    let request = service
        .submit_resignation(&employee_actor(), resignation())
        .expect("resignation stored");
    let reviewed = service
        .review_resignation(
            &hr_actor(),
            &request.id,
            ResignationReview {
                approve: true,
                termination_date: None,
                hr_comment: None,
                expected_version: None,
            },
        )
        .expect("resignation approved");
    reviewed.id
}
