//! Offboarding case workflow: termination/resignation lifecycle, clearance
//! checklist tracking, and the follow-up operations (access revocation,
//! settlement hand-off, exit interview) that hang off an approved case.
//!
//! Permission checks and the checklist-creation invariant live here, on the
//! server, and are exercised through the service facade and HTTP router.

pub mod domain;
pub mod progress;
pub mod repository;
pub mod router;
pub mod service;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use domain::{
    AccessRevocation, Actor, CardReturn, CaseAction, ChecklistId, ChecklistSeed,
    ClearanceChecklist, ClearanceDecision, DepartmentClearance, DepartmentSignOff,
    EquipmentIntake, EquipmentItem, EquipmentReturn, ExitInterview, ExitInterviewRequest,
    Initiator, ResignationReview, ResignationSubmission, RevocationMode, RevocationRequest, Role,
    Settlement, SettlementRequest, StatusUpdate, TerminationId, TerminationIntake,
    TerminationRequest, TerminationStatus, UnknownRole,
};
pub use progress::{calculate_progress, ProgressBreakdown};
pub use repository::{
    CaseView, ChecklistView, NoticeError, NoticePublisher, OffboardingNotice,
    OffboardingRepository, RepositoryError,
};
pub use router::offboarding_router;
pub use service::{CaseServiceError, OffboardingService};
pub use transitions::{check_transition, permitted_actions, transition_allowed, TransitionRefused};
