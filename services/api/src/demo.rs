use crate::infra::{parse_date, InMemoryNoticePublisher, InMemoryOffboardingRepository};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::sync::Arc;

use offboard::error::AppError;
use offboard::workflows::offboarding::{
    Actor, CardReturn, ChecklistSeed, ClearanceDecision, DepartmentSignOff, EquipmentIntake,
    EquipmentReturn, ExitInterviewRequest, OffboardingService, ResignationReview,
    ResignationSubmission, Role, SettlementRequest,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Employee identifier for the sample case
    #[arg(long, default_value = "emp-1042")]
    pub(crate) employee_id: String,
    /// Termination date stamped on approval (YYYY-MM-DD, defaults to today + 14 days)
    #[arg(long, value_parser = parse_date)]
    pub(crate) termination_date: Option<NaiveDate>,
    /// Departments seeded onto the clearance checklist
    #[arg(long = "department", default_values_t = default_departments())]
    pub(crate) departments: Vec<String>,
    /// Final settlement amount
    #[arg(long, default_value_t = 4810.50)]
    pub(crate) settlement_amount: f64,
}

fn default_departments() -> Vec<String> {
    vec![
        "IT".to_string(),
        "Finance".to_string(),
        "Facilities".to_string(),
    ]
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        employee_id,
        termination_date,
        departments,
        settlement_amount,
    } = args;

    let termination_date =
        termination_date.unwrap_or_else(|| Local::now().date_naive() + chrono::Duration::days(14));

    let repository = Arc::new(InMemoryOffboardingRepository::default());
    let notices = Arc::new(InMemoryNoticePublisher::default());
    let service = OffboardingService::new(repository, notices);

    let employee = Actor::new(employee_id.clone(), [Role::Employee]);
    let hr = Actor::new("hr-demo", [Role::Hr]);
    let payroll = Actor::new("payroll-demo", [Role::Payroll]);

    println!("Offboarding case walkthrough");
    println!("============================");

    let case = service.submit_resignation(
        &employee,
        ResignationSubmission {
            employee_id,
            reason: "accepted an external offer".to_string(),
            employee_comment: Some("happy to help with handover".to_string()),
            termination_date: None,
        },
    )?;
    println!("[1] resignation submitted: {} ({})", case.id.0, case.status);

    let approved = service.review_resignation(
        &hr,
        &case.id,
        ResignationReview {
            approve: true,
            termination_date: Some(termination_date),
            hr_comment: Some("notice period honored".to_string()),
            expected_version: Some(case.version),
        },
    )?;
    println!(
        "[2] resignation approved, last day {}",
        approved
            .termination_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "unset".to_string())
    );

    let checklist = service.create_checklist(
        &hr,
        &case.id,
        ChecklistSeed {
            departments: departments.clone(),
        },
    )?;
    println!(
        "[3] clearance checklist {} opened with {} departments, progress {}%",
        checklist.id.0,
        checklist.departments.len(),
        checklist.progress.overall
    );

    let mut latest = service.add_equipment(
        &hr,
        &checklist.id,
        EquipmentIntake {
            name: "laptop".to_string(),
            condition: None,
            expected_version: None,
        },
    )?;
    println!(
        "    laptop added to the return list, progress {}%",
        latest.progress.overall
    );
    for department in &departments {
        latest = service.sign_off_department(
            &hr,
            &checklist.id,
            department,
            DepartmentSignOff {
                decision: ClearanceDecision::Approved,
                expected_version: None,
            },
        )?;
        println!(
            "    {} signed off, progress {}%",
            department, latest.progress.overall
        );
    }

    let equipment_id = latest.equipment[0].equipment_id.clone();
    latest = service.set_equipment_returned(
        &hr,
        &checklist.id,
        &equipment_id,
        EquipmentReturn {
            returned: true,
            condition: Some("good".to_string()),
            expected_version: None,
        },
    )?;
    println!("[4] laptop returned, progress {}%", latest.progress.overall);

    latest = service.set_card_returned(
        &hr,
        &checklist.id,
        CardReturn {
            returned: true,
            expected_version: None,
        },
    )?;
    println!(
        "[5] access card returned, progress {}%",
        latest.progress.overall
    );

    service.schedule_exit_interview(
        &hr,
        &case.id,
        ExitInterviewRequest {
            scheduled_for: termination_date,
            interviewer: "hr-demo".to_string(),
            notes: Some("standard questionnaire".to_string()),
        },
    )?;
    let settlement = service.process_settlement(
        &payroll,
        &case.id,
        SettlementRequest {
            amount: settlement_amount,
        },
    )?;
    println!(
        "[6] exit interview booked for {}, settlement of {:.2} processed",
        termination_date, settlement.amount
    );

    let view = service.get_case(&hr, &case.id)?;
    println!(
        "final state: {} at {}% clearance",
        view.status,
        view.progress.map(|progress| progress.overall).unwrap_or(0)
    );

    Ok(())
}
