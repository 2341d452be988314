use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use registra_core::{AppError, PaginationParams};
use registra_models::ids::ExamSessionId;

use crate::modules::exams::model::{
    CreateExamSessionDto, ExamSessionDetail, PaginatedExamSessionsResponse, RosterReport,
    UpdateExamSessionDto,
};
use crate::modules::exams::roster::ExamRosterService;
use crate::modules::exams::service::ExamSessionService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Schedule a new exam session
#[utoipa::path(
    post,
    path = "/api/exam-sessions",
    summary = "Create exam session",
    request_body = CreateExamSessionDto,
    responses(
        (status = 201, description = "Session scheduled", body = ExamSessionDetail),
        (status = 400, description = "Invalid slot window"),
        (status = 404, description = "Section, room, invigilator or slot missing"),
        (status = 409, description = "Room or invigilator double-booked, or duplicate code")
    ),
    tag = "Exam Sessions"
)]
#[instrument(skip(state))]
pub async fn create_exam_session(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateExamSessionDto>,
) -> Result<(StatusCode, Json<ExamSessionDetail>), AppError> {
    let detail = ExamSessionService::create_session(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// List exam sessions
#[utoipa::path(
    get,
    path = "/api/exam-sessions",
    summary = "List exam sessions",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated sessions in schedule order", body = PaginatedExamSessionsResponse)
    ),
    tag = "Exam Sessions"
)]
#[instrument(skip(state))]
pub async fn list_exam_sessions(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedExamSessionsResponse>, AppError> {
    let page = ExamSessionService::list_sessions(&state.db, pagination).await?;
    Ok(Json(page))
}

/// Get one exam session
#[utoipa::path(
    get,
    path = "/api/exam-sessions/{id}",
    summary = "Get exam session",
    params(
        ("id" = Uuid, Path, description = "Exam session ID")
    ),
    responses(
        (status = 200, description = "Session with display fields", body = ExamSessionDetail),
        (status = 404, description = "Session not found")
    ),
    tag = "Exam Sessions"
)]
#[instrument(skip(state))]
pub async fn get_exam_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExamSessionDetail>, AppError> {
    let detail = ExamSessionService::get_session(&state.db, ExamSessionId::from(id)).await?;
    Ok(Json(detail))
}

/// Edit an exam session
#[utoipa::path(
    put,
    path = "/api/exam-sessions/{id}",
    summary = "Update exam session",
    params(
        ("id" = Uuid, Path, description = "Exam session ID")
    ),
    request_body = UpdateExamSessionDto,
    responses(
        (status = 200, description = "Session updated", body = ExamSessionDetail),
        (status = 400, description = "Invalid slot window"),
        (status = 404, description = "Session or slot missing"),
        (status = 409, description = "Conflict with another session or capacity below filled seats")
    ),
    tag = "Exam Sessions"
)]
#[instrument(skip(state))]
pub async fn update_exam_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateExamSessionDto>,
) -> Result<Json<ExamSessionDetail>, AppError> {
    let detail =
        ExamSessionService::update_session(&state.db, ExamSessionId::from(id), dto).await?;
    Ok(Json(detail))
}

/// Fill the session's free seats with eligible students
#[utoipa::path(
    post,
    path = "/api/exam-sessions/{id}/roster",
    summary = "Allocate exam roster",
    params(
        ("id" = Uuid, Path, description = "Exam session ID")
    ),
    responses(
        (status = 200, description = "Roster pass committed", body = RosterReport),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session full or no eligible students remain")
    ),
    tag = "Exam Sessions"
)]
#[instrument(skip(state))]
pub async fn allocate_exam_roster(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RosterReport>, AppError> {
    let report = ExamRosterService::allocate_roster(&state.db, ExamSessionId::from(id)).await?;
    Ok(Json(report))
}
