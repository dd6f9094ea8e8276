use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for termination cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerminationId(pub String);

/// Identifier wrapper for clearance checklists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChecklistId(pub String);

/// Who opened the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initiator {
    Employee,
    Hr,
    Manager,
}

/// Lifecycle status of a termination case. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl TerminationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TerminationStatus::Pending => "pending",
            TerminationStatus::UnderReview => "under_review",
            TerminationStatus::Approved => "approved",
            TerminationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            TerminationStatus::Approved | TerminationStatus::Rejected
        )
    }
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A termination or resignation case. `version` is an optimistic-concurrency
/// token bumped on every mutation; stale writers are refused instead of
/// silently overwriting each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationRequest {
    pub id: TerminationId,
    pub employee_id: String,
    pub initiator: Initiator,
    pub status: TerminationStatus,
    pub reason: String,
    pub termination_date: Option<NaiveDate>,
    pub employee_comment: Option<String>,
    pub hr_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub version: u64,
}

/// Decision state for a single department sign-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceDecision {
    Pending,
    Approved,
    Rejected,
}

impl ClearanceDecision {
    pub const fn label(self) -> &'static str {
        match self {
            ClearanceDecision::Pending => "pending",
            ClearanceDecision::Approved => "approved",
            ClearanceDecision::Rejected => "rejected",
        }
    }
}

/// One department's clearance entry on a checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentClearance {
    pub department: String,
    pub decision: ClearanceDecision,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DepartmentClearance {
    pub fn pending(department: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            decision: ClearanceDecision::Pending,
            updated_by: None,
            updated_at: None,
        }
    }
}

/// A tracked piece of company equipment awaiting return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub equipment_id: String,
    pub name: String,
    pub returned: bool,
    pub condition: Option<String>,
}

/// Clearance checklist attached to an approved termination: ordered department
/// sign-offs, an equipment list, and the access-card flag. One per termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceChecklist {
    pub id: ChecklistId,
    pub termination_id: TerminationId,
    pub departments: Vec<DepartmentClearance>,
    pub equipment: Vec<EquipmentItem>,
    pub card_returned: bool,
    pub version: u64,
}

impl ClearanceChecklist {
    pub fn department_mut(&mut self, name: &str) -> Option<&mut DepartmentClearance> {
        self.departments
            .iter_mut()
            .find(|entry| entry.department.eq_ignore_ascii_case(name))
    }

    pub fn equipment_mut(&mut self, equipment_id: &str) -> Option<&mut EquipmentItem> {
        self.equipment
            .iter_mut()
            .find(|item| item.equipment_id == equipment_id)
    }
}

/// Roles recognized by the permission checks. Checks run server-side; the
/// client never decides what it may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Manager,
    Hr,
    Payroll,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::Hr => "hr",
            Role::Payroll => "payroll",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "manager" => Ok(Role::Manager),
            "hr" => Ok(Role::Hr),
            "payroll" => Ok(Role::Payroll),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

/// Capability object identifying the caller. Injected explicitly into every
/// service method so permission logic stays independently testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub roles: BTreeSet<Role>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            user_id: user_id.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.roles.contains(role))
    }
}

/// Actions a caller may take on a case right now. Derived per request, never
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseAction {
    MoveToReview,
    Approve,
    Reject,
    CreateChecklist,
    SignOffDepartment,
    AddEquipment,
    MarkEquipmentReturned,
    MarkCardReturned,
    ScheduleAccessRevocation,
    ProcessSettlement,
    ScheduleExitInterview,
}

/// When employee system access should be cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationMode {
    Immediate,
    Scheduled { on: NaiveDate },
}

/// Recorded request to revoke an exiting employee's system access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRevocation {
    pub termination_id: TerminationId,
    pub mode: RevocationMode,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
}

/// Final settlement record for an approved termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub termination_id: TerminationId,
    pub amount: f64,
    pub processed_by: String,
    pub processed_at: DateTime<Utc>,
}

/// Exit interview booking. Persisted server-side, one per termination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitInterview {
    pub termination_id: TerminationId,
    pub scheduled_for: NaiveDate,
    pub interviewer: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Employee-submitted resignation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResignationSubmission {
    pub employee_id: String,
    pub reason: String,
    #[serde(default)]
    pub employee_comment: Option<String>,
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
}

/// HR- or manager-initiated termination review payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationIntake {
    pub employee_id: String,
    pub reason: String,
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
}

/// HR status-update payload. `expected_version`, when supplied, must match the
/// stored record or the update is refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: TerminationStatus,
    #[serde(default)]
    pub hr_comment: Option<String>,
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// HR decision on a pending resignation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResignationReview {
    pub approve: bool,
    #[serde(default)]
    pub termination_date: Option<NaiveDate>,
    #[serde(default)]
    pub hr_comment: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Departments to seed onto a new clearance checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistSeed {
    pub departments: Vec<String>,
}

/// Department sign-off payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSignOff {
    pub decision: ClearanceDecision,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// New equipment entry for a checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentIntake {
    pub name: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Equipment return flag update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentReturn {
    pub returned: bool,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Access-card return flag update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardReturn {
    pub returned: bool,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// Access revocation request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevocationRequest {
    pub mode: RevocationMode,
}

/// Settlement processing payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub amount: f64,
}

/// Exit interview booking payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitInterviewRequest {
    pub scheduled_for: NaiveDate,
    pub interviewer: String,
    #[serde(default)]
    pub notes: Option<String>,
}
