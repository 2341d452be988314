use std::collections::{BTreeMap, HashSet};

use serde_json::json;
use sqlx::PgPool;
use tracing::instrument;

use registra_core::AppError;
use registra_models::ids::{SectionId, StudentId};

use crate::modules::grades::model::{ProcessScoreReport, UpsertProcessScoresDto};

pub struct GradeService;

impl GradeService {
    /// Bulk-upsert process scores for a section.
    ///
    /// Duplicate student ids collapse to the last value. Items for
    /// students not holding a live registration in the section are
    /// rejected, never fatal; everything accepted lands in one
    /// statement so the whole batch commits or rolls back together.
    #[instrument(skip(db, dto))]
    pub async fn upsert_process_scores(
        db: &PgPool,
        section_id: SectionId,
        dto: UpsertProcessScoresDto,
    ) -> Result<ProcessScoreReport, AppError> {
        if dto.items.is_empty() {
            return Err(AppError::bad_request(
                "ITEMS_EMPTY",
                anyhow::anyhow!("At least one score item is required"),
            ));
        }

        // last value wins; BTreeMap keeps students in ascending-id order
        let mut scores: BTreeMap<StudentId, f64> = BTreeMap::new();
        for item in &dto.items {
            if !(0.0..=10.0).contains(&item.score) {
                return Err(AppError::bad_request(
                    "SCORE_OUT_OF_RANGE",
                    anyhow::anyhow!(
                        "Score {} for student {} is outside the 0-10 scale",
                        item.score,
                        item.student_id
                    ),
                )
                .with_details(json!({ "student_id": item.student_id, "score": item.score })));
            }
            scores.insert(item.student_id, item.score);
        }

        let mut tx = db.begin().await?;

        sqlx::query_scalar::<_, SectionId>("SELECT id FROM sections WHERE id = $1 FOR UPDATE")
            .bind(section_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "SECTION_NOT_FOUND",
                    anyhow::anyhow!("Section {section_id} not found"),
                )
            })?;

        let student_ids: Vec<StudentId> = scores.keys().copied().collect();
        let registered: HashSet<StudentId> = sqlx::query_scalar::<_, StudentId>(
            r#"SELECT student_id FROM registrations
               WHERE section_id = $1 AND student_id = ANY($2) AND status <> 'withdrawn'"#,
        )
        .bind(section_id)
        .bind(&student_ids)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let mut accepted_ids = Vec::new();
        let mut accepted_scores = Vec::new();
        let mut rejected = Vec::new();
        for (student_id, score) in &scores {
            if registered.contains(student_id) {
                accepted_ids.push(*student_id);
                accepted_scores.push(*score);
            } else {
                rejected.push(*student_id);
            }
        }

        let affected_rows = if accepted_ids.is_empty() {
            0
        } else {
            sqlx::query(
                r#"INSERT INTO academic_results (student_id, section_id, process_score)
                   SELECT t.student_id, $1, t.score
                   FROM UNNEST($2::uuid[], $3::double precision[]) AS t(student_id, score)
                   ON CONFLICT (student_id, section_id) DO UPDATE
                   SET process_score = EXCLUDED.process_score,
                       updated_at = NOW()"#,
            )
            .bind(section_id)
            .bind(&accepted_ids)
            .bind(&accepted_scores)
            .execute(&mut *tx)
            .await?
            .rows_affected() as i64
        };

        tx.commit().await?;

        Ok(ProcessScoreReport {
            section_id,
            accepted: accepted_ids.len() as i64,
            rejected,
            affected_rows,
        })
    }
}
