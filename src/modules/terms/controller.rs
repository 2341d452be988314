use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use uuid::Uuid;

use registra_core::AppError;
use registra_models::ids::TermId;

use crate::modules::terms::model::{CreditPolicy, UpsertCreditPolicyDto};
use crate::modules::terms::service::TermPolicyService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Get a term's credit policy
#[utoipa::path(
    get,
    path = "/api/terms/{term_id}/credit-policy",
    summary = "Get credit policy",
    params(
        ("term_id" = Uuid, Path, description = "Term ID")
    ),
    responses(
        (status = 200, description = "Credit policy for the term", body = CreditPolicy),
        (status = 404, description = "No policy configured for the term")
    ),
    tag = "Terms"
)]
#[instrument(skip(state))]
pub async fn get_credit_policy(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
) -> Result<Json<CreditPolicy>, AppError> {
    let policy = TermPolicyService::get_policy(&state.db, TermId::from(term_id)).await?;
    Ok(Json(policy))
}

/// Create or replace a term's credit policy
#[utoipa::path(
    put,
    path = "/api/terms/{term_id}/credit-policy",
    summary = "Upsert credit policy",
    params(
        ("term_id" = Uuid, Path, description = "Term ID")
    ),
    request_body = UpsertCreditPolicyDto,
    responses(
        (status = 200, description = "Policy created or replaced", body = CreditPolicy),
        (status = 400, description = "Inverted credit range"),
        (status = 404, description = "Term not found")
    ),
    tag = "Terms"
)]
#[instrument(skip(state))]
pub async fn upsert_credit_policy(
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpsertCreditPolicyDto>,
) -> Result<Json<CreditPolicy>, AppError> {
    let policy = TermPolicyService::upsert_policy(&state.db, TermId::from(term_id), dto).await?;
    Ok(Json(policy))
}
