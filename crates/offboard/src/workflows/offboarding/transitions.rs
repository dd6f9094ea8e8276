use super::domain::{
    Actor, CaseAction, ClearanceChecklist, Role, TerminationRequest, TerminationStatus,
};

/// Raised when a status change falls outside the one-way transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move a {from} case to {to}")]
pub struct TransitionRefused {
    pub from: TerminationStatus,
    pub to: TerminationStatus,
}

/// One-way transition table. `pending -> approved` exists for the resignation
/// review path; there is no route out of a terminal status.
pub fn transition_allowed(from: TerminationStatus, to: TerminationStatus) -> bool {
    use TerminationStatus::*;
    matches!(
        (from, to),
        (Pending, UnderReview)
            | (Pending, Approved)
            | (Pending, Rejected)
            | (UnderReview, Approved)
            | (UnderReview, Rejected)
    )
}

pub fn check_transition(
    from: TerminationStatus,
    to: TerminationStatus,
) -> Result<(), TransitionRefused> {
    if transition_allowed(from, to) {
        Ok(())
    } else {
        Err(TransitionRefused { from, to })
    }
}

/// Derive the actions this actor may take on the case right now. Status
/// actions belong to HR; department sign-offs also to managers; settlement
/// also to payroll.
pub fn permitted_actions(
    actor: &Actor,
    request: &TerminationRequest,
    checklist: Option<&ClearanceChecklist>,
) -> Vec<CaseAction> {
    let mut actions = Vec::new();
    let is_hr = actor.has_role(Role::Hr);

    if is_hr {
        match request.status {
            TerminationStatus::Pending => {
                actions.push(CaseAction::MoveToReview);
                actions.push(CaseAction::Approve);
                actions.push(CaseAction::Reject);
            }
            TerminationStatus::UnderReview => {
                actions.push(CaseAction::Approve);
                actions.push(CaseAction::Reject);
            }
            TerminationStatus::Approved | TerminationStatus::Rejected => {}
        }
    }

    if request.status == TerminationStatus::Approved {
        if is_hr {
            if checklist.is_none() {
                actions.push(CaseAction::CreateChecklist);
            }
            actions.push(CaseAction::ScheduleAccessRevocation);
            actions.push(CaseAction::ScheduleExitInterview);
        }
        if is_hr || actor.has_role(Role::Payroll) {
            actions.push(CaseAction::ProcessSettlement);
        }
    }

    if checklist.is_some() {
        if is_hr || actor.has_role(Role::Manager) {
            actions.push(CaseAction::SignOffDepartment);
        }
        if is_hr {
            actions.push(CaseAction::AddEquipment);
            actions.push(CaseAction::MarkEquipmentReturned);
            actions.push(CaseAction::MarkCardReturned);
        }
    }

    actions
}
