use serde::Serialize;

use super::domain::{ClearanceChecklist, ClearanceDecision};

const DEPARTMENT_WEIGHT: f64 = 0.5;
const EQUIPMENT_WEIGHT: f64 = 0.3;
const CARD_WEIGHT: f64 = 0.2;

/// Weighted completion figure for a clearance checklist, with the per-track
/// components exposed so callers can render the breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressBreakdown {
    pub departments: f64,
    pub equipment: f64,
    pub card: f64,
    pub overall: u8,
}

/// Compute the 0-100 completion figure. An empty equipment list counts as
/// fully returned while an empty department list counts as not started; this
/// asymmetry is inherited behavior and kept on purpose.
pub fn calculate_progress(checklist: &ClearanceChecklist) -> ProgressBreakdown {
    let total_departments = checklist.departments.len();
    let approved_departments = checklist
        .departments
        .iter()
        .filter(|entry| entry.decision == ClearanceDecision::Approved)
        .count();
    let departments = if total_departments == 0 {
        0.0
    } else {
        approved_departments as f64 / total_departments as f64 * 100.0
    };

    let total_equipment = checklist.equipment.len();
    let returned_equipment = checklist.equipment.iter().filter(|item| item.returned).count();
    let equipment = if total_equipment == 0 {
        100.0
    } else {
        returned_equipment as f64 / total_equipment as f64 * 100.0
    };

    let card = if checklist.card_returned { 100.0 } else { 0.0 };

    let overall = (departments * DEPARTMENT_WEIGHT
        + equipment * EQUIPMENT_WEIGHT
        + card * CARD_WEIGHT)
        .round() as u8;

    ProgressBreakdown {
        departments,
        equipment,
        card,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::offboarding::domain::{
        ChecklistId, DepartmentClearance, EquipmentItem, TerminationId,
    };
    use chrono::Utc;

    fn checklist(
        departments: &[(&str, ClearanceDecision)],
        equipment: &[bool],
        card_returned: bool,
    ) -> ClearanceChecklist {
        ClearanceChecklist {
            id: ChecklistId("chk-000001".to_string()),
            termination_id: TerminationId("term-000001".to_string()),
            departments: departments
                .iter()
                .map(|(name, decision)| DepartmentClearance {
                    department: name.to_string(),
                    decision: *decision,
                    updated_by: Some("hr-1".to_string()),
                    updated_at: Some(Utc::now()),
                })
                .collect(),
            equipment: equipment
                .iter()
                .enumerate()
                .map(|(index, returned)| EquipmentItem {
                    equipment_id: format!("eq-{index:03}"),
                    name: format!("asset {index}"),
                    returned: *returned,
                    condition: None,
                })
                .collect(),
            card_returned,
            version: 1,
        }
    }

    #[test]
    fn empty_checklist_scores_thirty() {
        let progress = calculate_progress(&checklist(&[], &[], false));
        assert_eq!(progress.departments, 0.0);
        assert_eq!(progress.equipment, 100.0);
        assert_eq!(progress.card, 0.0);
        assert_eq!(progress.overall, 30);
    }

    #[test]
    fn complete_checklist_scores_one_hundred() {
        let progress = calculate_progress(&checklist(
            &[
                ("IT", ClearanceDecision::Approved),
                ("Finance", ClearanceDecision::Approved),
            ],
            &[true, true, true],
            true,
        ));
        assert_eq!(progress.overall, 100);
    }

    #[test]
    fn mixed_checklist_matches_weighted_rounding() {
        // 2 departments (1 approved), 4 equipment items (2 returned), card back:
        // 50*0.5 + 50*0.3 + 100*0.2 = 60.
        let progress = calculate_progress(&checklist(
            &[
                ("IT", ClearanceDecision::Approved),
                ("Finance", ClearanceDecision::Pending),
            ],
            &[true, true, false, false],
            true,
        ));
        assert_eq!(progress.departments, 50.0);
        assert_eq!(progress.equipment, 50.0);
        assert_eq!(progress.card, 100.0);
        assert_eq!(progress.overall, 60);
    }

    #[test]
    fn rejected_departments_do_not_count_as_approved() {
        let progress = calculate_progress(&checklist(
            &[
                ("IT", ClearanceDecision::Rejected),
                ("Finance", ClearanceDecision::Approved),
            ],
            &[],
            false,
        ));
        assert_eq!(progress.departments, 50.0);
    }

    #[test]
    fn overall_stays_within_bounds_and_never_regresses() {
        let mut last = 0;
        for returned in 0..=4usize {
            let equipment: Vec<bool> = (0..4).map(|index| index < returned).collect();
            let progress = calculate_progress(&checklist(
                &[("IT", ClearanceDecision::Approved)],
                &equipment,
                false,
            ));
            assert!(progress.overall <= 100);
            assert!(progress.overall >= last, "progress regressed");
            last = progress.overall;
        }
    }

    #[test]
    fn fractional_components_round_to_nearest() {
        // 1/3 departments approved, no equipment, no card:
        // 33.33*0.5 + 100*0.3 + 0 = 46.67 -> 47.
        let progress = calculate_progress(&checklist(
            &[
                ("IT", ClearanceDecision::Approved),
                ("Finance", ClearanceDecision::Pending),
                ("Facilities", ClearanceDecision::Pending),
            ],
            &[],
            false,
        ));
        assert_eq!(progress.overall, 47);
    }
}
