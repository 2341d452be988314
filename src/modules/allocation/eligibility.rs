//! Prerequisite eligibility pipeline.
//!
//! Rules are applied as successive set intersections over the ordered
//! candidate list; candidate order is never disturbed, only narrowed.

use std::collections::HashSet;

use sqlx::PgConnection;

use registra_core::AppError;
use registra_models::ids::{CourseId, StudentId, TermId};
use registra_models::{PASSING_RANK_MAX, PrerequisiteKind, PrerequisiteRule};

/// Candidates that have passed the given course, optionally requiring a
/// minimum total score on the passing attempt.
async fn passed_course(
    conn: &mut PgConnection,
    course_id: CourseId,
    candidates: &[StudentId],
    min_score: Option<f64>,
) -> Result<HashSet<StudentId>, AppError> {
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }

    let rows = sqlx::query_scalar::<_, StudentId>(
        r#"SELECT DISTINCT ar.student_id
           FROM academic_results ar
           JOIN sections s ON s.id = ar.section_id
           WHERE s.course_id = $1
             AND ar.classification_rank <= $2
             AND ($3::double precision IS NULL OR ar.total_score >= $3)
             AND ar.student_id = ANY($4)"#,
    )
    .bind(course_id)
    .bind(PASSING_RANK_MAX)
    .bind(min_score)
    .bind(candidates)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Candidates currently registered for the given course in the term.
/// Used by concurrent prerequisites, which accept in-flight enrollment;
/// a withdrawn registration is not in flight.
async fn registered_in_term(
    conn: &mut PgConnection,
    course_id: CourseId,
    term_id: TermId,
    candidates: &[StudentId],
) -> Result<HashSet<StudentId>, AppError> {
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }

    let rows = sqlx::query_scalar::<_, StudentId>(
        r#"SELECT DISTINCT r.student_id
           FROM registrations r
           JOIN sections s ON s.id = r.section_id
           WHERE s.course_id = $1
             AND s.term_id = $2
             AND r.status <> 'withdrawn'
             AND r.student_id = ANY($3)"#,
    )
    .bind(course_id)
    .bind(term_id)
    .bind(candidates)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Candidates whose passed credits (distinct passed courses) total at
/// least `min_credits`.
async fn meeting_min_credits(
    conn: &mut PgConnection,
    min_credits: i32,
    candidates: &[StudentId],
) -> Result<HashSet<StudentId>, AppError> {
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }

    let rows = sqlx::query_scalar::<_, StudentId>(
        r#"SELECT t.student_id
           FROM (SELECT DISTINCT ar.student_id, s.course_id
                 FROM academic_results ar
                 JOIN sections s ON s.id = ar.section_id
                 WHERE ar.classification_rank <= $1
                   AND ar.student_id = ANY($2)) t
           JOIN courses c ON c.id = t.course_id
           GROUP BY t.student_id
           HAVING SUM(c.credits) >= $3"#,
    )
    .bind(PASSING_RANK_MAX)
    .bind(candidates)
    .bind(min_credits as i64)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Narrow `candidates` to the students satisfying every prerequisite
/// rule of the course, preserving candidate order.
pub async fn filter_eligible(
    conn: &mut PgConnection,
    course_id: CourseId,
    term_id: TermId,
    candidates: Vec<StudentId>,
) -> Result<Vec<StudentId>, AppError> {
    let rules = sqlx::query_as::<_, PrerequisiteRule>(
        r#"SELECT id, course_id, prerequisite_course_id, kind, min_score, min_credits
           FROM course_prerequisites
           WHERE course_id = $1
           ORDER BY created_at ASC, id ASC"#,
    )
    .bind(course_id)
    .fetch_all(&mut *conn)
    .await?;

    if rules.is_empty() {
        return Ok(candidates);
    }

    let mut current = candidates;

    for rule in &rules {
        if current.is_empty() {
            break;
        }

        let mut satisfied = match rule.kind {
            PrerequisiteKind::Pass => {
                passed_course(conn, rule.prerequisite_course_id, &current, rule.min_score).await?
            }
            PrerequisiteKind::Concurrent => {
                let mut passed =
                    passed_course(conn, rule.prerequisite_course_id, &current, rule.min_score)
                        .await?;
                let registered =
                    registered_in_term(conn, rule.prerequisite_course_id, term_id, &current)
                        .await?;
                passed.extend(registered);
                passed
            }
        };

        if let Some(min_credits) = rule.min_credits {
            let with_credits = meeting_min_credits(conn, min_credits, &current).await?;
            satisfied.retain(|id| with_credits.contains(id));
        }

        current.retain(|id| satisfied.contains(id));
    }

    Ok(current)
}

/// Whether a single student satisfies every prerequisite rule of the
/// course. Forced allocation uses this before inserting a registration.
pub async fn check_student(
    conn: &mut PgConnection,
    course_id: CourseId,
    term_id: TermId,
    student_id: StudentId,
) -> Result<bool, AppError> {
    let remaining = filter_eligible(conn, course_id, term_id, vec![student_id]).await?;
    Ok(!remaining.is_empty())
}
