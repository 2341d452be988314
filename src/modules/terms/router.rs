use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_credit_policy, upsert_credit_policy};

/// Initialize the terms router
/// Routes: GET /{term_id}/credit-policy, PUT /{term_id}/credit-policy
pub fn init_terms_router() -> Router<AppState> {
    Router::new().route(
        "/{term_id}/credit-policy",
        get(get_credit_policy).put(upsert_credit_policy),
    )
}
