//! Seed helpers shared by the service test modules.
//!
//! Ids are pinned with `Uuid::from_u128` where the caller cares about
//! ordering, since allocation walks candidates and sections in
//! ascending id order.

use sqlx::PgPool;

use registra_models::ids::{
    CourseId, InvigilatorId, RoomId, SectionId, StudentId, TermId,
};
use registra_models::{PrerequisiteKind, RegistrationStatus};

pub async fn seed_term(pool: &PgPool, code: &str) -> TermId {
    sqlx::query_scalar::<_, TermId>(
        "INSERT INTO terms (code, academic_year, sequence) VALUES ($1, '2025-2026', 1) RETURNING id",
    )
    .bind(code)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_policy(pool: &PgPool, term_id: TermId, min_credits: i32, max_credits: i32) {
    sqlx::query(
        "INSERT INTO term_credit_policies (term_id, min_credits, max_credits) VALUES ($1, $2, $3)",
    )
    .bind(term_id)
    .bind(min_credits)
    .bind(max_credits)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_student(pool: &PgPool, id: StudentId, code: &str, is_active: bool) {
    sqlx::query(
        "INSERT INTO students (id, code, full_name, is_active) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(code)
    .bind(format!("Student {code}"))
    .bind(is_active)
    .execute(pool)
    .await
    .unwrap();
}

/// Seed `count` active students with ids 1..=count, returned in
/// ascending-id order.
pub async fn seed_students(pool: &PgPool, count: u32) -> Vec<StudentId> {
    let mut ids = Vec::with_capacity(count as usize);
    for n in 1..=count {
        let id = StudentId::from_u128(n as u128);
        seed_student(pool, id, &format!("ST{n:03}"), true).await;
        ids.push(id);
    }
    ids
}

pub async fn seed_course(pool: &PgPool, code: &str, credits: i32) -> CourseId {
    sqlx::query_scalar::<_, CourseId>(
        "INSERT INTO courses (code, name, credits) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(code)
    .bind(format!("Course {code}"))
    .bind(credits)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_section(
    pool: &PgPool,
    id: SectionId,
    code: &str,
    course_id: CourseId,
    term_id: TermId,
    capacity: i32,
) -> SectionId {
    sqlx::query(
        "INSERT INTO sections (id, code, course_id, term_id, capacity) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(code)
    .bind(course_id)
    .bind(term_id)
    .bind(capacity)
    .execute(pool)
    .await
    .unwrap();
    id
}

/// Register a student into a section and bump its occupancy, the way a
/// committed allocation would have.
pub async fn seed_registration(pool: &PgPool, student_id: StudentId, section_id: SectionId) {
    sqlx::query(
        "INSERT INTO registrations (student_id, section_id, status) VALUES ($1, $2, $3)",
    )
    .bind(student_id)
    .bind(section_id)
    .bind(RegistrationStatus::Active)
    .execute(pool)
    .await
    .unwrap();
    sqlx::query("UPDATE sections SET occupied = occupied + 1 WHERE id = $1")
        .bind(section_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Insert a withdrawn registration. The seat was given back, so the
/// section's occupancy is left alone.
pub async fn seed_withdrawn_registration(
    pool: &PgPool,
    student_id: StudentId,
    section_id: SectionId,
) {
    sqlx::query(
        "INSERT INTO registrations (student_id, section_id, status) VALUES ($1, $2, $3)",
    )
    .bind(student_id)
    .bind(section_id)
    .bind(RegistrationStatus::Withdrawn)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_result(
    pool: &PgPool,
    student_id: StudentId,
    section_id: SectionId,
    classification_rank: Option<i16>,
    process_score: Option<f64>,
) {
    sqlx::query(
        r#"INSERT INTO academic_results (student_id, section_id, classification_rank, process_score, total_score)
           VALUES ($1, $2, $3, $4, $4)"#,
    )
    .bind(student_id)
    .bind(section_id)
    .bind(classification_rank)
    .bind(process_score)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_prerequisite(
    pool: &PgPool,
    course_id: CourseId,
    prerequisite_course_id: CourseId,
    kind: PrerequisiteKind,
    min_score: Option<f64>,
    min_credits: Option<i32>,
) {
    sqlx::query(
        r#"INSERT INTO course_prerequisites (course_id, prerequisite_course_id, kind, min_score, min_credits)
           VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(course_id)
    .bind(prerequisite_course_id)
    .bind(kind)
    .bind(min_score)
    .bind(min_credits)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_room(pool: &PgPool, code: &str) -> RoomId {
    sqlx::query_scalar::<_, RoomId>("INSERT INTO rooms (code) VALUES ($1) RETURNING id")
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_invigilator(pool: &PgPool, code: &str) -> InvigilatorId {
    sqlx::query_scalar::<_, InvigilatorId>(
        "INSERT INTO invigilators (code, full_name) VALUES ($1, $2) RETURNING id",
    )
    .bind(code)
    .bind(format!("Invigilator {code}"))
    .fetch_one(pool)
    .await
    .unwrap()
}
