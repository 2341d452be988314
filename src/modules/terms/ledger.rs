use std::collections::HashMap;

use registra_core::AppError;
use registra_models::ids::{StudentId, TermId};

/// In-memory view of how many credits each student has already
/// committed to in a term.
///
/// Loaded once per allocation run and mutated as registrations are
/// inserted, so later courses in a batch see the credits earlier
/// courses granted. Owned by the run; never shared across requests.
#[derive(Debug, Default)]
pub struct CreditLedger {
    committed: HashMap<StudentId, i32>,
}

impl CreditLedger {
    /// Load committed credits for every student registered in the term.
    ///
    /// Withdrawn registrations hold no credits. A course counts once
    /// per student even when a student somehow holds registrations in
    /// multiple sections of it.
    pub async fn load<'e, E>(db: E, term_id: TermId) -> Result<Self, AppError>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, (StudentId, i64)>(
            r#"SELECT r.student_id, COALESCE(SUM(c.credits), 0)
               FROM (SELECT DISTINCT r.student_id, s.course_id
                     FROM registrations r
                     JOIN sections s ON s.id = r.section_id
                     WHERE s.term_id = $1 AND r.status <> 'withdrawn') r
               JOIN courses c ON c.id = r.course_id
               GROUP BY r.student_id"#,
        )
        .bind(term_id)
        .fetch_all(db)
        .await?;

        let committed = rows
            .into_iter()
            .map(|(student_id, credits)| (student_id, credits as i32))
            .collect();

        Ok(Self { committed })
    }

    /// Credits the student has committed so far, as this ledger sees it.
    pub fn committed(&self, student_id: StudentId) -> i32 {
        self.committed.get(&student_id).copied().unwrap_or(0)
    }

    /// Record newly granted credits for a student.
    pub fn record(&mut self, student_id: StudentId, credits: i32) {
        *self.committed.entry(student_id).or_insert(0) += credits;
    }
}

/// Committed credits for a single student in a term, read straight from
/// the database. Used by forced allocation, which runs outside a batch.
pub async fn committed_credits<'e, E>(
    db: E,
    term_id: TermId,
    student_id: StudentId,
) -> Result<i32, AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    let total = sqlx::query_scalar::<_, i64>(
        r#"SELECT COALESCE(SUM(c.credits), 0)
           FROM (SELECT DISTINCT s.course_id
                 FROM registrations r
                 JOIN sections s ON s.id = r.section_id
                 WHERE s.term_id = $1
                   AND r.student_id = $2
                   AND r.status <> 'withdrawn') r
           JOIN courses c ON c.id = r.course_id"#,
    )
    .bind(term_id)
    .bind(student_id)
    .fetch_one(db)
    .await?;

    Ok(total as i32)
}
