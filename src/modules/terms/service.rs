use sqlx::PgPool;
use tracing::instrument;

use registra_core::AppError;
use registra_models::ids::TermId;

use crate::modules::terms::model::{CreditPolicy, UpsertCreditPolicyDto};

pub struct TermPolicyService;

impl TermPolicyService {
    /// Fetch the term's credit policy for an allocation run.
    ///
    /// Allocation refuses to run without an active policy, so a missing
    /// row is a 404 and a disabled one is a 409.
    pub async fn resolve_policy<'e, E>(db: E, term_id: TermId) -> Result<CreditPolicy, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let policy = sqlx::query_as::<_, CreditPolicy>(
            r#"SELECT id, term_id, min_credits, max_credits, is_active, created_at, updated_at
               FROM term_credit_policies WHERE term_id = $1"#,
        )
        .bind(term_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::not_found(
                "POLICY_NOT_FOUND",
                anyhow::anyhow!("No credit policy configured for term {term_id}"),
            )
        })?;

        if !policy.is_active {
            return Err(AppError::conflict(
                "POLICY_DISABLED",
                anyhow::anyhow!("Credit policy for term {term_id} is disabled"),
            ));
        }

        Ok(policy)
    }

    /// Fetch the term's credit policy, active or not.
    #[instrument(skip(db))]
    pub async fn get_policy(db: &PgPool, term_id: TermId) -> Result<CreditPolicy, AppError> {
        sqlx::query_as::<_, CreditPolicy>(
            r#"SELECT id, term_id, min_credits, max_credits, is_active, created_at, updated_at
               FROM term_credit_policies WHERE term_id = $1"#,
        )
        .bind(term_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::not_found(
                "POLICY_NOT_FOUND",
                anyhow::anyhow!("No credit policy configured for term {term_id}"),
            )
        })
    }

    /// Create or replace the term's credit policy.
    #[instrument(skip(db))]
    pub async fn upsert_policy(
        db: &PgPool,
        term_id: TermId,
        dto: UpsertCreditPolicyDto,
    ) -> Result<CreditPolicy, AppError> {
        if dto.max_credits < dto.min_credits {
            return Err(AppError::bad_request(
                "INVALID_CREDIT_RANGE",
                anyhow::anyhow!(
                    "max_credits ({}) must be at least min_credits ({})",
                    dto.max_credits,
                    dto.min_credits
                ),
            ));
        }

        let term_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM terms WHERE id = $1)")
                .bind(term_id)
                .fetch_one(db)
                .await?;
        if !term_exists {
            return Err(AppError::not_found(
                "TERM_NOT_FOUND",
                anyhow::anyhow!("Term {term_id} not found"),
            ));
        }

        let policy = sqlx::query_as::<_, CreditPolicy>(
            r#"INSERT INTO term_credit_policies (term_id, min_credits, max_credits, is_active)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (term_id) DO UPDATE
               SET min_credits = EXCLUDED.min_credits,
                   max_credits = EXCLUDED.max_credits,
                   is_active = EXCLUDED.is_active,
                   updated_at = NOW()
               RETURNING id, term_id, min_credits, max_credits, is_active, created_at, updated_at"#,
        )
        .bind(term_id)
        .bind(dto.min_credits)
        .bind(dto.max_credits)
        .bind(dto.is_active.unwrap_or(true))
        .fetch_one(db)
        .await?;

        Ok(policy)
    }
}
