use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use uuid::Uuid;

use registra_core::AppError;
use registra_models::ids::SectionId;

use crate::modules::grades::model::{ProcessScoreReport, UpsertProcessScoresDto};
use crate::modules::grades::service::GradeService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Bulk-upsert process scores for a section
#[utoipa::path(
    put,
    path = "/api/sections/{section_id}/process-scores",
    summary = "Upsert process scores",
    params(
        ("section_id" = Uuid, Path, description = "Section ID")
    ),
    request_body = UpsertProcessScoresDto,
    responses(
        (status = 200, description = "Scores applied; rejected students listed", body = ProcessScoreReport),
        (status = 400, description = "Empty batch or score out of range"),
        (status = 404, description = "Section not found")
    ),
    tag = "Grades"
)]
#[instrument(skip(state, dto))]
pub async fn upsert_process_scores(
    State(state): State<AppState>,
    Path(section_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpsertProcessScoresDto>,
) -> Result<Json<ProcessScoreReport>, AppError> {
    let report =
        GradeService::upsert_process_scores(&state.db, SectionId::from(section_id), dto).await?;
    Ok(Json(report))
}
