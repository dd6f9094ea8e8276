use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::{
    Actor, CardReturn, ChecklistId, ChecklistSeed, DepartmentSignOff, EquipmentIntake,
    EquipmentReturn, ExitInterviewRequest, ResignationReview, ResignationSubmission,
    RevocationRequest, Role, SettlementRequest, StatusUpdate, TerminationId, TerminationIntake,
};
use super::repository::{NoticePublisher, OffboardingRepository, RepositoryError};
use super::service::{CaseServiceError, OffboardingService};

/// Router builder exposing the offboarding case endpoints.
pub fn offboarding_router<R, N>(service: Arc<OffboardingService<R, N>>) -> Router
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/offboarding/resignations",
            post(submit_resignation_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/resignations/:id/review",
            post(review_resignation_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/terminations",
            get(list_cases_handler::<R, N>).post(open_review_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/terminations/:id",
            get(get_case_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/terminations/:id/status",
            post(update_status_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/terminations/:id/checklist",
            get(get_checklist_handler::<R, N>).post(create_checklist_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/terminations/:id/access-revocation",
            post(access_revocation_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/terminations/:id/settlement",
            post(settlement_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/terminations/:id/exit-interview",
            get(get_exit_interview_handler::<R, N>).post(exit_interview_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/checklists/:id/departments/:department",
            post(sign_off_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/checklists/:id/equipment",
            post(add_equipment_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/checklists/:id/equipment/:equipment_id/return",
            post(equipment_return_handler::<R, N>),
        )
        .route(
            "/api/v1/offboarding/checklists/:id/card",
            post(card_return_handler::<R, N>),
        )
        .with_state(service)
}

/// Resolve the calling actor from the `x-actor-id` / `x-actor-roles` headers.
/// Stands in for a real authentication layer; the roles still gate every
/// mutating operation server-side.
fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let user_id = headers
        .get("x-actor-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| unauthorized("missing x-actor-id header"))?
        .to_string();

    let mut roles = Vec::new();
    if let Some(raw) = headers.get("x-actor-roles").and_then(|value| value.to_str().ok()) {
        for token in raw.split(',').filter(|token| !token.trim().is_empty()) {
            let role: Role = token
                .parse()
                .map_err(|err| unauthorized(&format!("{err}")))?;
            roles.push(role);
        }
    }

    Ok(Actor::new(user_id, roles))
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": message })),
    )
        .into_response()
}

fn error_response(error: CaseServiceError) -> Response {
    let status = match &error {
        CaseServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        CaseServiceError::Transition(_)
        | CaseServiceError::VersionConflict { .. }
        | CaseServiceError::CaseNotApproved { .. }
        | CaseServiceError::ChecklistExists
        | CaseServiceError::Repository(RepositoryError::Conflict)
        | CaseServiceError::Repository(RepositoryError::Stale { .. }) => StatusCode::CONFLICT,
        CaseServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CaseServiceError::UnknownDepartment(_)
        | CaseServiceError::UnknownEquipment(_)
        | CaseServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        CaseServiceError::Repository(RepositoryError::Unavailable(_))
        | CaseServiceError::Notice(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

macro_rules! try_actor {
    ($headers:expr) => {
        match actor_from_headers(&$headers) {
            Ok(actor) => actor,
            Err(response) => return response,
        }
    };
}

async fn submit_resignation_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Json(submission): Json<ResignationSubmission>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.submit_resignation(&actor, submission) {
        Ok(request) => (StatusCode::ACCEPTED, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn open_review_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Json(intake): Json<TerminationIntake>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.open_review(&actor, intake) {
        Ok(request) => (StatusCode::ACCEPTED, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn list_cases_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.list_cases(&actor) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_case_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.get_case(&actor, &TerminationId(id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn update_status_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.update_status(&actor, &TerminationId(id), update) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn review_resignation_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(review): Json<ResignationReview>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.review_resignation(&actor, &TerminationId(id), review) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn create_checklist_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(seed): Json<ChecklistSeed>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.create_checklist(&actor, &TerminationId(id), seed) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_checklist_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let _actor = try_actor!(headers);
    match service.get_checklist(&TerminationId(id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn sign_off_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path((id, department)): Path<(String, String)>,
    Json(sign_off): Json<DepartmentSignOff>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.sign_off_department(&actor, &ChecklistId(id), &department, sign_off) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn add_equipment_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(intake): Json<EquipmentIntake>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.add_equipment(&actor, &ChecklistId(id), intake) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn equipment_return_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path((id, equipment_id)): Path<(String, String)>,
    Json(update): Json<EquipmentReturn>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.set_equipment_returned(&actor, &ChecklistId(id), &equipment_id, update) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn card_return_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(update): Json<CardReturn>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.set_card_returned(&actor, &ChecklistId(id), update) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn access_revocation_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<RevocationRequest>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.schedule_access_revocation(&actor, &TerminationId(id), request) {
        Ok(revocation) => (StatusCode::ACCEPTED, Json(revocation)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn settlement_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<SettlementRequest>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.process_settlement(&actor, &TerminationId(id), request) {
        Ok(settlement) => (StatusCode::ACCEPTED, Json(settlement)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn exit_interview_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<ExitInterviewRequest>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let actor = try_actor!(headers);
    match service.schedule_exit_interview(&actor, &TerminationId(id), request) {
        Ok(interview) => (StatusCode::CREATED, Json(interview)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn get_exit_interview_handler<R, N>(
    State(service): State<Arc<OffboardingService<R, N>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    R: OffboardingRepository + 'static,
    N: NoticePublisher + 'static,
{
    let _actor = try_actor!(headers);
    match service.get_exit_interview(&TerminationId(id)) {
        Ok(interview) => (StatusCode::OK, Json(interview)).into_response(),
        Err(error) => error_response(error),
    }
}
