use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{
    AccessRevocation, Actor, CaseAction, ChecklistId, ClearanceChecklist, DepartmentClearance,
    EquipmentItem, ExitInterview, Initiator, Settlement, TerminationId, TerminationRequest,
};
use super::progress::{calculate_progress, ProgressBreakdown};
use super::transitions::permitted_actions;

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Updates are compare-and-set: the caller passes the version it read, and
/// the implementation must refuse the write under the same lock that
/// performs it when the stored version has moved on. `insert_checklist`
/// likewise enforces one checklist per termination inside its lock, so two
/// racing creators cannot both land.
pub trait OffboardingRepository: Send + Sync {
    fn insert_termination(
        &self,
        request: TerminationRequest,
    ) -> Result<TerminationRequest, RepositoryError>;
    fn update_termination(
        &self,
        request: TerminationRequest,
        expected_version: u64,
    ) -> Result<(), RepositoryError>;
    fn fetch_termination(
        &self,
        id: &TerminationId,
    ) -> Result<Option<TerminationRequest>, RepositoryError>;
    fn list_terminations(&self) -> Result<Vec<TerminationRequest>, RepositoryError>;

    fn insert_checklist(
        &self,
        checklist: ClearanceChecklist,
    ) -> Result<ClearanceChecklist, RepositoryError>;
    fn update_checklist(
        &self,
        checklist: ClearanceChecklist,
        expected_version: u64,
    ) -> Result<(), RepositoryError>;
    fn fetch_checklist(
        &self,
        id: &ChecklistId,
    ) -> Result<Option<ClearanceChecklist>, RepositoryError>;
    fn checklist_for_termination(
        &self,
        termination_id: &TerminationId,
    ) -> Result<Option<ClearanceChecklist>, RepositoryError>;

    fn record_access_revocation(&self, revocation: AccessRevocation)
        -> Result<(), RepositoryError>;
    fn record_settlement(&self, settlement: Settlement) -> Result<(), RepositoryError>;
    fn insert_exit_interview(
        &self,
        interview: ExitInterview,
    ) -> Result<ExitInterview, RepositoryError>;
    fn exit_interview_for_termination(
        &self,
        termination_id: &TerminationId,
    ) -> Result<Option<ExitInterview>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stale version: expected {expected}, record is at {current}")]
    Stale { expected: u64, current: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hooks (payroll hand-off, e-mail adapters).
pub trait NoticePublisher: Send + Sync {
    fn publish(&self, notice: OffboardingNotice) -> Result<(), NoticeError>;
}

/// Notice payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffboardingNotice {
    pub template: String,
    pub termination_id: TerminationId,
    pub details: BTreeMap<String, String>,
}

/// Notice dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}

/// Case representation exposed over the API: the stored fields plus the
/// actions legal for the calling actor and, once clearance tracking exists,
/// the completion breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct CaseView {
    pub id: TerminationId,
    pub employee_id: String,
    pub initiator: Initiator,
    pub status: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
    pub permitted_actions: Vec<CaseAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressBreakdown>,
}

impl CaseView {
    pub fn for_actor(
        request: &TerminationRequest,
        checklist: Option<&ClearanceChecklist>,
        actor: &Actor,
    ) -> Self {
        Self {
            id: request.id.clone(),
            employee_id: request.employee_id.clone(),
            initiator: request.initiator,
            status: request.status.label(),
            reason: request.reason.clone(),
            termination_date: request.termination_date,
            employee_comment: request.employee_comment.clone(),
            hr_comment: request.hr_comment.clone(),
            created_at: request.created_at,
            version: request.version,
            permitted_actions: permitted_actions(actor, request, checklist),
            progress: checklist.map(calculate_progress),
        }
    }
}

/// Checklist representation exposed over the API, always carrying the
/// derived completion breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistView {
    pub id: ChecklistId,
    pub termination_id: TerminationId,
    pub departments: Vec<DepartmentClearance>,
    pub equipment: Vec<EquipmentItem>,
    pub card_returned: bool,
    pub version: u64,
    pub progress: ProgressBreakdown,
}

impl From<ClearanceChecklist> for ChecklistView {
    fn from(checklist: ClearanceChecklist) -> Self {
        let progress = calculate_progress(&checklist);
        Self {
            id: checklist.id,
            termination_id: checklist.termination_id,
            departments: checklist.departments,
            equipment: checklist.equipment,
            card_returned: checklist.card_returned,
            version: checklist.version,
            progress,
        }
    }
}
