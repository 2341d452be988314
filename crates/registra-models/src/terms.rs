//! Term and credit-policy domain models.
//!
//! A term is a registration period (semester + academic year). Each
//! term owns at most one credit policy defining the minimum and
//! maximum credit load a student may carry in that term.

use crate::ids::{CreditPolicyId, TermId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Term entity representing a registration period.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Term {
    /// Unique identifier for the term
    pub id: TermId,
    /// Term code (e.g. "2024-2")
    pub code: String,
    /// Academic year the term belongs to (e.g. "2024-2025")
    pub academic_year: String,
    /// Order of the term within the academic year (1, 2, 3)
    pub sequence: i32,
    /// Timestamp when the term was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the term was last updated
    pub updated_at: DateTime<Utc>,
}

/// Credit-load policy for one term.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CreditPolicy {
    /// Unique identifier for the policy row
    pub id: CreditPolicyId,
    /// Term this policy applies to (one policy per term)
    pub term_id: TermId,
    /// Minimum credit load a student should carry
    pub min_credits: i32,
    /// Maximum credit load a student may carry
    pub max_credits: i32,
    /// Whether the policy is in force; disabled policies block allocation
    pub is_active: bool,
    /// Timestamp when the policy was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the policy was last updated
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating or replacing a term's credit policy.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpsertCreditPolicyDto {
    /// Minimum credit load (0 or more)
    #[validate(range(min = 0))]
    pub min_credits: i32,
    /// Maximum credit load (must be >= min_credits)
    #[validate(range(min = 1))]
    pub max_credits: i32,
    /// Whether the policy is in force (default: true)
    pub is_active: Option<bool>,
}
