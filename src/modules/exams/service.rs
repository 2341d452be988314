use sqlx::PgPool;
use tracing::instrument;

use registra_core::{AppError, PaginationMeta, PaginationParams};
use registra_models::ids::ExamSessionId;

use crate::modules::exams::conflict;
use crate::modules::exams::model::{
    CreateExamSessionDto, ExamSession, ExamSessionDetail, PaginatedExamSessionsResponse,
    UpdateExamSessionDto,
};

/// Joined projection shared by every detail-returning query. The end
/// boundary time comes from the last occupied slot (`end_slot - 1`).
const DETAIL_SELECT: &str = r#"
    SELECT es.id, es.code, es.section_id, s.code AS section_code,
           c.code AS course_code, c.name AS course_name,
           es.room_id, r.code AS room_code,
           es.exam_day, es.start_slot, es.end_slot,
           fs.start_time AS start_time, ls.end_time AS end_time,
           es.invigilator_id, i.full_name AS invigilator_name,
           es.capacity, es.filled, es.note, es.created_at, es.updated_at
    FROM exam_sessions es
    JOIN sections s ON s.id = es.section_id
    JOIN courses c ON c.id = s.course_id
    JOIN rooms r ON r.id = es.room_id
    JOIN invigilators i ON i.id = es.invigilator_id
    JOIN time_slots fs ON fs.id = es.start_slot
    JOIN time_slots ls ON ls.id = es.end_slot - 1
"#;

pub struct ExamSessionService;

impl ExamSessionService {
    /// Schedule a new exam session.
    #[instrument(skip(db))]
    pub async fn create_session(
        db: &PgPool,
        dto: CreateExamSessionDto,
    ) -> Result<ExamSessionDetail, AppError> {
        let mut tx = db.begin().await?;

        let section_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM sections WHERE id = $1)")
                .bind(dto.section_id)
                .fetch_one(&mut *tx)
                .await?;
        if !section_exists {
            return Err(AppError::not_found(
                "SECTION_NOT_FOUND",
                anyhow::anyhow!("Section {} not found", dto.section_id),
            ));
        }

        let room_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM rooms WHERE id = $1)")
                .bind(dto.room_id)
                .fetch_one(&mut *tx)
                .await?;
        if !room_exists {
            return Err(AppError::not_found(
                "ROOM_NOT_FOUND",
                anyhow::anyhow!("Room {} not found", dto.room_id),
            ));
        }

        let invigilator_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM invigilators WHERE id = $1)",
        )
        .bind(dto.invigilator_id)
        .fetch_one(&mut *tx)
        .await?;
        if !invigilator_exists {
            return Err(AppError::not_found(
                "INVIGILATOR_NOT_FOUND",
                anyhow::anyhow!("Invigilator {} not found", dto.invigilator_id),
            ));
        }

        conflict::resolve_window(&mut *tx, dto.start_slot, dto.end_slot).await?;
        conflict::check_conflicts(
            &mut *tx,
            dto.exam_day,
            dto.start_slot,
            dto.end_slot,
            dto.room_id,
            dto.invigilator_id,
            None,
        )
        .await?;

        let session_id = sqlx::query_scalar::<_, ExamSessionId>(
            r#"INSERT INTO exam_sessions
                   (code, section_id, room_id, exam_day, start_slot, end_slot,
                    invigilator_id, capacity, note)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING id"#,
        )
        .bind(&dto.code)
        .bind(dto.section_id)
        .bind(dto.room_id)
        .bind(dto.exam_day)
        .bind(dto.start_slot)
        .bind(dto.end_slot)
        .bind(dto.invigilator_id)
        .bind(dto.capacity)
        .bind(&dto.note)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| Self::map_write_conflict(err, &dto.code))?;

        let detail = Self::fetch_detail(&mut *tx, session_id).await?;
        tx.commit().await?;

        Ok(detail)
    }

    /// Edit an exam session, re-validating the window and conflicts
    /// with the session's own id excluded.
    #[instrument(skip(db))]
    pub async fn update_session(
        db: &PgPool,
        session_id: ExamSessionId,
        dto: UpdateExamSessionDto,
    ) -> Result<ExamSessionDetail, AppError> {
        let mut tx = db.begin().await?;

        let existing = sqlx::query_as::<_, ExamSession>(
            r#"SELECT id, code, section_id, room_id, exam_day, start_slot, end_slot,
                      invigilator_id, capacity, filled, note, created_at, updated_at
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

        let room_id = dto.room_id.unwrap_or(existing.room_id);
        let exam_day = dto.exam_day.unwrap_or(existing.exam_day);
        let start_slot = dto.start_slot.unwrap_or(existing.start_slot);
        let end_slot = dto.end_slot.unwrap_or(existing.end_slot);
        let invigilator_id = dto.invigilator_id.unwrap_or(existing.invigilator_id);
        let capacity = dto.capacity.unwrap_or(existing.capacity);
        // an explicit `"note": null` clears; an absent field keeps
        let note = match dto.note {
            Some(value) => value,
            None => existing.note.clone(),
        };

        if capacity < existing.filled {
            return Err(AppError::conflict(
                "CAPACITY_BELOW_FILLED",
                anyhow::anyhow!(
                    "Capacity {} is below the {} seats already filled",
                    capacity,
                    existing.filled
                ),
            ));
        }

        conflict::resolve_window(&mut *tx, start_slot, end_slot).await?;
        conflict::check_conflicts(
            &mut *tx,
            exam_day,
            start_slot,
            end_slot,
            room_id,
            invigilator_id,
            Some(session_id),
        )
        .await?;

        sqlx::query(
            r#"UPDATE exam_sessions
               SET room_id = $1, exam_day = $2, start_slot = $3, end_slot = $4,
                   invigilator_id = $5, capacity = $6, note = $7, updated_at = NOW()
               WHERE id = $8"#,
        )
        .bind(room_id)
        .bind(exam_day)
        .bind(start_slot)
        .bind(end_slot)
        .bind(invigilator_id)
        .bind(capacity)
        .bind(&note)
        .bind(session_id)
        .execute(&mut *tx)
        .await
        .map_err(|err| Self::map_write_conflict(err, &existing.code))?;

        let detail = Self::fetch_detail(&mut *tx, session_id).await?;
        tx.commit().await?;

        Ok(detail)
    }

    /// Get one exam session with display fields.
    #[instrument(skip(db))]
    pub async fn get_session(
        db: &PgPool,
        session_id: ExamSessionId,
    ) -> Result<ExamSessionDetail, AppError> {
        let sql = format!("{DETAIL_SELECT} WHERE es.id = $1");
        sqlx::query_as::<_, ExamSessionDetail>(&sql)
            .bind(session_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "SESSION_NOT_FOUND",
                    anyhow::anyhow!("Exam session {session_id} not found"),
                )
            })
    }

    /// List exam sessions in schedule order, paginated.
    #[instrument(skip(db))]
    pub async fn list_sessions(
        db: &PgPool,
        pagination: PaginationParams,
    ) -> Result<PaginatedExamSessionsResponse, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exam_sessions")
            .fetch_one(db)
            .await?;

        let sql = format!(
            "{DETAIL_SELECT} ORDER BY es.exam_day ASC, es.start_slot ASC, es.id ASC LIMIT $1 OFFSET $2"
        );
        let data = sqlx::query_as::<_, ExamSessionDetail>(&sql)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedExamSessionsResponse {
            data,
            meta: PaginationMeta::new(total, &pagination),
        })
    }

    /// A write can still trip the schema's overlap constraints when a
    /// concurrent writer passed the same pre-check; surface those with
    /// the codes the pre-check uses.
    fn map_write_conflict(err: sqlx::Error, code: &str) -> AppError {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.constraint() {
                Some("exam_room_no_overlap") => {
                    return AppError::conflict(
                        "ROOM_CONFLICT",
                        anyhow::anyhow!("Room is already booked in an overlapping window"),
                    );
                }
                Some("exam_invigilator_no_overlap") => {
                    return AppError::conflict(
                        "INVIGILATOR_CONFLICT",
                        anyhow::anyhow!(
                            "Invigilator is already assigned in an overlapping window"
                        ),
                    );
                }
                _ if db_err.is_unique_violation() => {
                    return AppError::conflict(
                        "DUPLICATE_SESSION_CODE",
                        anyhow::anyhow!("An exam session with code {code} already exists"),
                    );
                }
                _ => {}
            }
        }
        AppError::from(err)
    }

    async fn fetch_detail(
        tx: &mut sqlx::PgConnection,
        session_id: ExamSessionId,
    ) -> Result<ExamSessionDetail, AppError> {
        let sql = format!("{DETAIL_SELECT} WHERE es.id = $1");
        let detail = sqlx::query_as::<_, ExamSessionDetail>(&sql)
            .bind(session_id)
            .fetch_one(tx)
            .await?;
        Ok(detail)
    }
}
