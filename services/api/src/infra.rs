use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use offboard::workflows::offboarding::{
    AccessRevocation, ChecklistId, ClearanceChecklist, ExitInterview, NoticeError,
    NoticePublisher, OffboardingNotice, OffboardingRepository, RepositoryError, Settlement,
    TerminationId, TerminationRequest,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory case store. Stands in for a database until one is wired up; the
/// mutex keeps concurrent handler calls consistent.
#[derive(Default)]
pub(crate) struct InMemoryOffboardingRepository {
    terminations: Mutex<HashMap<TerminationId, TerminationRequest>>,
    checklists: Mutex<HashMap<ChecklistId, ClearanceChecklist>>,
    revocations: Mutex<Vec<AccessRevocation>>,
    settlements: Mutex<Vec<Settlement>>,
    interviews: Mutex<HashMap<TerminationId, ExitInterview>>,
}

impl OffboardingRepository for InMemoryOffboardingRepository {
    fn insert_termination(
        &self,
        request: TerminationRequest,
    ) -> Result<TerminationRequest, RepositoryError> {
        let mut guard = self.terminations.lock().expect("repository mutex poisoned");
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
        let mut guard = self.terminations.lock().expect("repository mutex poisoned");
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
        let guard = self.terminations.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_terminations(&self) -> Result<Vec<TerminationRequest>, RepositoryError> {
        let guard = self.terminations.lock().expect("repository mutex poisoned");
        let mut records: Vec<TerminationRequest> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    fn insert_checklist(
        &self,
        checklist: ClearanceChecklist,
    ) -> Result<ClearanceChecklist, RepositoryError> {
        let mut guard = self.checklists.lock().expect("repository mutex poisoned");
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
        let mut guard = self.checklists.lock().expect("repository mutex poisoned");
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
        let guard = self.checklists.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn checklist_for_termination(
        &self,
        termination_id: &TerminationId,
    ) -> Result<Option<ClearanceChecklist>, RepositoryError> {
        let guard = self.checklists.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|checklist| &checklist.termination_id == termination_id)
            .cloned())
    }

    fn record_access_revocation(
        &self,
        revocation: AccessRevocation,
    ) -> Result<(), RepositoryError> {
        self.revocations
            .lock()
            .expect("repository mutex poisoned")
            .push(revocation);
        Ok(())
    }

    fn record_settlement(&self, settlement: Settlement) -> Result<(), RepositoryError> {
        self.settlements
            .lock()
            .expect("repository mutex poisoned")
            .push(settlement);
        Ok(())
    }

    fn insert_exit_interview(
        &self,
        interview: ExitInterview,
    ) -> Result<ExitInterview, RepositoryError> {
        let mut guard = self.interviews.lock().expect("repository mutex poisoned");
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
        let guard = self.interviews.lock().expect("repository mutex poisoned");
        Ok(guard.get(termination_id).cloned())
    }
}

/// Notice sink that keeps events in memory; a real deployment would swap in a
/// mail or message-bus adapter.
#[derive(Default)]
pub(crate) struct InMemoryNoticePublisher {
    events: Mutex<Vec<OffboardingNotice>>,
}

impl NoticePublisher for InMemoryNoticePublisher {
    fn publish(&self, notice: OffboardingNotice) -> Result<(), NoticeError> {
        tracing::info!(template = %notice.template, case = %notice.termination_id.0, "offboarding notice");
        self.events
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
