use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use uuid::Uuid;

use registra_core::AppError;
use registra_models::ids::TermId;

use crate::modules::allocation::model::{
    AllocateCourseDto, AllocateManyDto, AllocateTermDto, AllocationReport, BatchAllocationReport,
    ForceAllocateDto, ForcedAllocation,
};
use crate::modules::allocation::service::AllocationService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Allocate students to one course's sections in a term
#[utoipa::path(
    post,
    path = "/api/allocations/courses",
    summary = "Allocate one course",
    request_body = AllocateCourseDto,
    responses(
        (status = 200, description = "Allocation committed", body = AllocationReport),
        (status = 404, description = "Course, sections or credit policy missing"),
        (status = 409, description = "Policy disabled, quota infeasible or too few eligible students")
    ),
    tag = "Allocation"
)]
#[instrument(skip(state))]
pub async fn allocate_course(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<AllocateCourseDto>,
) -> Result<Json<AllocationReport>, AppError> {
    let report = AllocationService::allocate_course_in_term(&state.db, dto).await?;
    Ok(Json(report))
}

/// Allocate students to several courses in a term
#[utoipa::path(
    post,
    path = "/api/allocations/batch",
    summary = "Allocate several courses",
    request_body = AllocateManyDto,
    responses(
        (status = 200, description = "Batch finished; per-course successes and failures inside", body = BatchAllocationReport),
        (status = 404, description = "Credit policy missing"),
        (status = 409, description = "Credit policy disabled")
    ),
    tag = "Allocation"
)]
#[instrument(skip(state))]
pub async fn allocate_batch(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<AllocateManyDto>,
) -> Result<Json<BatchAllocationReport>, AppError> {
    let report = AllocationService::allocate_many_courses(&state.db, dto).await?;
    Ok(Json(report))
}

/// Allocate students to every course offered in a term
#[utoipa::path(
    post,
    path = "/api/allocations/terms/{term_id}",
    summary = "Allocate whole term",
    params(
        ("term_id" = Uuid, Path, description = "Term ID")
    ),
    request_body = AllocateTermDto,
    responses(
        (status = 200, description = "Batch finished; per-course successes and failures inside", body = BatchAllocationReport),
        (status = 404, description = "Credit policy missing"),
        (status = 409, description = "Credit policy disabled")
    ),
    tag = "Allocation"
)]
#[instrument(skip(state))]
pub async fn allocate_term(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AllocateTermDto>,
) -> Result<Json<BatchAllocationReport>, AppError> {
    let report =
        AllocationService::allocate_all_courses(&state.db, TermId::from(term_id), dto).await?;
    Ok(Json(report))
}

/// Force one student into a section
#[utoipa::path(
    post,
    path = "/api/allocations/force",
    summary = "Force-allocate a student",
    request_body = ForceAllocateDto,
    responses(
        (status = 200, description = "Registration inserted", body = ForcedAllocation),
        (status = 404, description = "Student, section or credit policy missing"),
        (status = 409, description = "Guard check failed (full section, duplicate, credits, prerequisites)")
    ),
    tag = "Allocation"
)]
#[instrument(skip(state))]
pub async fn force_allocate(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForceAllocateDto>,
) -> Result<Json<ForcedAllocation>, AppError> {
    let outcome = AllocationService::force_allocate(&state.db, dto).await?;
    Ok(Json(outcome))
}
