use serde_json::json;
use sqlx::PgPool;
use tracing::instrument;

use registra_core::AppError;
use registra_models::EXAM_PROCESS_SCORE_MIN;
use registra_models::ids::{ExamSessionId, SectionId, StudentId};

use crate::modules::exams::model::RosterReport;

pub struct ExamRosterService;

impl ExamRosterService {
    /// Fill the session's remaining seats with eligible students from
    /// its section.
    ///
    /// Eligible means registered in the section with a process score of
    /// at least [`EXAM_PROCESS_SCORE_MIN`] and not already seated.
    /// Students are seated in ascending id order; the pass is
    /// incremental, so re-running after a capacity bump only adds the
    /// newly eligible.
    #[instrument(skip(db))]
    pub async fn allocate_roster(
        db: &PgPool,
        session_id: ExamSessionId,
    ) -> Result<RosterReport, AppError> {
        let mut tx = db.begin().await?;

        let (code, section_id, capacity, filled_before) =
            sqlx::query_as::<_, (String, SectionId, i32, i32)>(
                r#"SELECT code, section_id, capacity, filled
                   FROM exam_sessions
                   WHERE id = $1
                   FOR UPDATE"#,
            )
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "SESSION_NOT_FOUND",
                    anyhow::anyhow!("Exam session {session_id} not found"),
                )
            })?;

        let seats_left = i64::from(capacity - filled_before);
        if seats_left <= 0 {
            return Err(AppError::conflict(
                "CAPACITY_FULL",
                anyhow::anyhow!("Exam session {code} has no free seats"),
            )
            .with_details(json!({ "capacity": capacity, "filled": filled_before })));
        }

        let eligible = sqlx::query_scalar::<_, StudentId>(
            r#"SELECT ar.student_id
               FROM academic_results ar
               WHERE ar.section_id = $1
                 AND ar.process_score >= $2
                 AND NOT EXISTS (
                     SELECT 1
                     FROM exam_allocations ea
                     WHERE ea.exam_session_id = $3
                       AND ea.student_id = ar.student_id
                 )
               ORDER BY ar.student_id ASC
               LIMIT $4"#,
        )
        .bind(section_id)
        .bind(EXAM_PROCESS_SCORE_MIN)
        .bind(session_id)
        .bind(seats_left)
        .fetch_all(&mut *tx)
        .await?;

        if eligible.is_empty() {
            return Err(AppError::conflict(
                "NO_ELIGIBLE_STUDENTS",
                anyhow::anyhow!("No eligible, unseated students remain for session {code}"),
            ));
        }

        let inserted = sqlx::query(
            r#"INSERT INTO exam_allocations (exam_session_id, student_id)
               SELECT $1, t.student_id
               FROM UNNEST($2::uuid[]) AS t(student_id)"#,
        )
        .bind(session_id)
        .bind(&eligible)
        .execute(&mut *tx)
        .await?
        .rows_affected() as i64;

        let filled_after = filled_before + inserted as i32;
        sqlx::query("UPDATE exam_sessions SET filled = $1, updated_at = NOW() WHERE id = $2")
            .bind(filled_after)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(RosterReport {
            exam_session_id: session_id,
            code,
            capacity,
            filled_before,
            filled_after,
            inserted,
            student_ids: eligible,
            seats_left: i64::from(capacity - filled_after),
        })
    }
}
