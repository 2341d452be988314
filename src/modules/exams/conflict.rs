//! Slot-window validation and double-booking checks.

use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgConnection;

use registra_core::AppError;
use registra_models::TimeSlot;
use registra_models::ids::{ExamSessionId, InvigilatorId, RoomId};

/// Wall-clock boundaries of a validated slot window.
#[derive(Debug, Clone)]
pub struct SlotWindow {
    pub first: TimeSlot,
    pub last: TimeSlot,
}

/// Validate a half-open slot window `[start_slot, end_slot)` against
/// the catalog.
///
/// The window must be non-empty and every occupied slot must exist, so
/// `start_slot` and `end_slot - 1` are both looked up. `end_slot` one
/// past the last catalog entry is valid.
pub async fn resolve_window(
    conn: &mut PgConnection,
    start_slot: i32,
    end_slot: i32,
) -> Result<SlotWindow, AppError> {
    if start_slot >= end_slot {
        return Err(AppError::bad_request(
            "INVALID_SLOT_RANGE",
            anyhow::anyhow!("end_slot ({end_slot}) must be greater than start_slot ({start_slot})"),
        ));
    }

    let slots = sqlx::query_as::<_, TimeSlot>(
        "SELECT id, code, start_time, end_time FROM time_slots WHERE id = $1 OR id = $2",
    )
    .bind(start_slot)
    .bind(end_slot - 1)
    .fetch_all(conn)
    .await?;

    let first = slots.iter().find(|s| s.id == start_slot).cloned();
    let last = slots.iter().find(|s| s.id == end_slot - 1).cloned();

    match (first, last) {
        (Some(first), Some(last)) => Ok(SlotWindow { first, last }),
        _ => Err(AppError::not_found(
            "SLOT_NOT_FOUND",
            anyhow::anyhow!("Slot window [{start_slot}, {end_slot}) leaves the slot catalog"),
        )),
    }
}

async fn overlapping_session(
    conn: &mut PgConnection,
    column: &str,
    exam_day: NaiveDate,
    resource: uuid::Uuid,
    start_slot: i32,
    end_slot: i32,
    exclude: Option<ExamSessionId>,
) -> Result<Option<(ExamSessionId, String)>, AppError> {
    // column is one of two fixed names, never caller input
    let sql = format!(
        r#"SELECT id, code
           FROM exam_sessions
           WHERE exam_day = $1
             AND {column} = $2
             AND start_slot < $3
             AND end_slot > $4
             AND ($5::uuid IS NULL OR id <> $5)
           ORDER BY id ASC
           LIMIT 1"#
    );

    let hit = sqlx::query_as::<_, (ExamSessionId, String)>(&sql)
        .bind(exam_day)
        .bind(resource)
        .bind(end_slot)
        .bind(start_slot)
        .bind(exclude)
        .fetch_optional(conn)
        .await?;

    Ok(hit)
}

/// Reject the booking when the room or the invigilator is already
/// taken by a session whose slot window overlaps this one on the same
/// day. Ranges are half-open, so `[2, 4)` and `[4, 6)` coexist.
pub async fn check_conflicts(
    conn: &mut PgConnection,
    exam_day: NaiveDate,
    start_slot: i32,
    end_slot: i32,
    room_id: RoomId,
    invigilator_id: InvigilatorId,
    exclude: Option<ExamSessionId>,
) -> Result<(), AppError> {
    if let Some((session_id, code)) = overlapping_session(
        conn,
        "room_id",
        exam_day,
        room_id.into(),
        start_slot,
        end_slot,
        exclude,
    )
    .await?
    {
        return Err(AppError::conflict(
            "ROOM_CONFLICT",
            anyhow::anyhow!("Room is already booked by session {code} in an overlapping window"),
        )
        .with_details(json!({ "conflicting_session_id": session_id })));
    }

    if let Some((session_id, code)) = overlapping_session(
        conn,
        "invigilator_id",
        exam_day,
        invigilator_id.into(),
        start_slot,
        end_slot,
        exclude,
    )
    .await?
    {
        return Err(AppError::conflict(
            "INVIGILATOR_CONFLICT",
            anyhow::anyhow!(
                "Invigilator is already assigned to session {code} in an overlapping window"
            ),
        )
        .with_details(json!({ "conflicting_session_id": session_id })));
    }

    Ok(())
}
