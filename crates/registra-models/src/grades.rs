//! DTOs for bulk process-score entry.

use crate::ids::{SectionId, StudentId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// One student's process score within a bulk upsert.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProcessScoreItem {
    /// Student the score belongs to
    pub student_id: StudentId,
    /// Process score on the 0-10 scale
    #[validate(range(min = 0.0, max = 10.0))]
    pub score: f64,
}

/// Bulk process-score upsert for one section.
///
/// Duplicate student ids are collapsed, last value winning.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpsertProcessScoresDto {
    /// Scores to record
    #[validate(length(min = 1), nested)]
    pub items: Vec<ProcessScoreItem>,
}

/// Outcome of a bulk process-score upsert.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProcessScoreReport {
    /// Section the scores were entered for
    pub section_id: SectionId,
    /// Items applied (student registered in the section)
    pub accepted: i64,
    /// Students rejected because they are not registered in the section
    pub rejected: Vec<StudentId>,
    /// Rows reported affected by the upsert
    pub affected_rows: i64,
}
