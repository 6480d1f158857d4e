use anyhow::Context;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::import::{self, EvaluationRow};
use crate::models::{EvaluationComments, EvaluationRecord, FlatScores, RawFlatScores};
use crate::scoring;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("6f1c2b9e-5d3a-4c8e-9a41-2f7b8d0e3c15")?,
            "Mina Park",
            "mina.park@dojang.example",
            "blue",
        ),
        (
            Uuid::parse_str("a84e0d37-1b6f-4e29-8c53-9d2f6a7b1e08")?,
            "Joon Kim",
            "joon.kim@dojang.example",
            "green",
        ),
        (
            Uuid::parse_str("3c9b7a12-e4d8-46f0-b5a1-8e0c2d4f6a93")?,
            "Sora Lee",
            "sora.lee@dojang.example",
            "blue",
        ),
    ];

    for (id, name, email, belt) in students {
        upsert_student(pool, id, name, email, belt).await?;
    }

    let evaluations = vec![
        (
            "seed-001",
            "mina.park@dojang.example",
            [8, 9, 7, 8, 6, 7, 8, 7, 8, 6],
            "Sharp kicks, work on stamina",
            NaiveDate::from_ymd_opt(2026, 3, 14).context("invalid date")?,
        ),
        (
            "seed-002",
            "joon.kim@dojang.example",
            [10, 10, 9, 10, 9, 10, 9, 10, 10, 9],
            "Ready for the next belt",
            NaiveDate::from_ymd_opt(2026, 3, 14).context("invalid date")?,
        ),
        (
            "seed-003",
            "sora.lee@dojang.example",
            [6, 7, 5, 6, 7, 6, 4, 5, 6, 3],
            "Needs another try at breaking",
            NaiveDate::from_ymd_opt(2026, 3, 15).context("invalid date")?,
        ),
    ];

    for (source_key, email, leaves, comment, evaluated_on) in evaluations {
        let student_id: Uuid =
            sqlx::query("SELECT id FROM dojang_evaluation.students WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get("id");

        let scores = flat_from_leaves(leaves);
        let mut comments = EvaluationComments::default();
        comments.set_overall(comment);
        insert_evaluation(pool, student_id, evaluated_on, &scores, &comments, source_key).await?;
    }

    tracing::info!("seeded sample students and evaluations");
    Ok(())
}

async fn upsert_student(
    pool: &PgPool,
    id: Uuid,
    full_name: &str,
    email: &str,
    belt: &str,
) -> anyhow::Result<Uuid> {
    let student_id: Uuid = sqlx::query(
        r#"
        INSERT INTO dojang_evaluation.students (id, full_name, email, belt)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name, belt = EXCLUDED.belt
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(email)
    .bind(belt)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert student {email}"))?
    .get("id");

    Ok(student_id)
}

/// Stores one evaluation in the flat layout. Returns `false` when the
/// source key was already imported.
async fn insert_evaluation(
    pool: &PgPool,
    student_id: Uuid,
    evaluated_on: NaiveDate,
    scores: &FlatScores,
    comments: &EvaluationComments,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO dojang_evaluation.evaluations
        (id, student_id, evaluated_on,
         homework_combined_score, attendance_diligence_score,
         character_gratitude_notes_score, character_leadership_score,
         physical_squats_score, physical_jumping_jacks_score,
         technical_poomsae_score, technical_sparring_score,
         technical_kicks_score, technical_breaking_score,
         comments, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(evaluated_on)
    .bind(i16::from(scores.homework_combined_score))
    .bind(i16::from(scores.attendance_diligence_score))
    .bind(i16::from(scores.character_gratitude_notes_score))
    .bind(i16::from(scores.character_leadership_score))
    .bind(i16::from(scores.physical_squats_score))
    .bind(i16::from(scores.physical_jumping_jacks_score))
    .bind(i16::from(scores.technical_poomsae_score))
    .bind(i16::from(scores.technical_sparring_score))
    .bind(i16::from(scores.technical_kicks_score))
    .bind(i16::from(scores.technical_breaking_score))
    .bind(Json(comments))
    .bind(source_key)
    .execute(pool)
    .await
    .with_context(|| format!("failed to insert evaluation {source_key}"))?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_evaluations(
    pool: &PgPool,
    since_date: NaiveDate,
    belt: Option<&str>,
    email: Option<&str>,
) -> anyhow::Result<Vec<EvaluationRecord>> {
    let mut query = String::from(
        "SELECT st.id AS student_id, st.full_name, st.email, st.belt, \
         e.evaluated_on, e.comments, \
         e.homework_combined_score, e.attendance_diligence_score, \
         e.character_gratitude_notes_score, e.character_leadership_score, \
         e.physical_squats_score, e.physical_jumping_jacks_score, \
         e.technical_poomsae_score, e.technical_sparring_score, \
         e.technical_kicks_score, e.technical_breaking_score \
         FROM dojang_evaluation.evaluations e \
         JOIN dojang_evaluation.students st ON st.id = e.student_id \
         WHERE e.evaluated_on >= $1",
    );

    if belt.is_some() {
        query.push_str(" AND st.belt = $2");
    } else if email.is_some() {
        query.push_str(" AND st.email = $2");
    }
    query.push_str(" ORDER BY e.evaluated_on, st.full_name");

    let mut rows = sqlx::query(&query).bind(since_date);

    if let Some(value) = belt {
        rows = rows.bind(value);
    } else if let Some(value) = email {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut evaluations = Vec::with_capacity(records.len());

    for row in records {
        let flat = flat_from_row(&row)?;
        let Json(comments): Json<EvaluationComments> = row.try_get("comments")?;
        evaluations.push(EvaluationRecord {
            student_id: row.get("student_id"),
            student_name: row.get("full_name"),
            student_email: row.get("email"),
            belt: row.get("belt"),
            evaluated_on: row.get("evaluated_on"),
            scores: scoring::unflatten_scores(&flat),
            comments,
        });
    }

    tracing::debug!(count = evaluations.len(), %since_date, "fetched evaluations");
    Ok(evaluations)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let rows = import::read_evaluations(csv_path)?;
    let (rows, incomplete) = import::split_incomplete(rows);
    for row in &incomplete {
        tracing::warn!(
            email = %row.email,
            evaluated_on = %row.evaluated_on,
            "skipping evaluation with unrated scores"
        );
    }

    let mut inserted = 0usize;

    for row in rows {
        if import_row(pool, &row).await? {
            inserted += 1;
        } else {
            tracing::debug!(email = %row.email, "evaluation already imported, skipping");
        }
    }

    tracing::info!(inserted, path = %csv_path.display(), "imported evaluations");
    Ok(inserted)
}

async fn import_row(pool: &PgPool, row: &EvaluationRow) -> anyhow::Result<bool> {
    let student_id =
        upsert_student(pool, Uuid::new_v4(), &row.full_name, &row.email, &row.belt).await?;

    let source_key = row
        .source_key
        .clone()
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

    insert_evaluation(
        pool,
        student_id,
        row.evaluated_on,
        &row.scores,
        &row.comments,
        &source_key,
    )
    .await
}

/// Reads the ten score columns back through the same range checks applied
/// to imported sheets.
fn flat_from_row(row: &PgRow) -> anyhow::Result<FlatScores> {
    let leaf = |column: &str| -> anyhow::Result<Option<i64>> {
        let value: Option<i16> = row.try_get(column)?;
        Ok(value.map(i64::from))
    };

    let raw = RawFlatScores {
        homework_combined_score: leaf("homework_combined_score")?,
        attendance_diligence_score: leaf("attendance_diligence_score")?,
        character_gratitude_notes_score: leaf("character_gratitude_notes_score")?,
        character_leadership_score: leaf("character_leadership_score")?,
        physical_squats_score: leaf("physical_squats_score")?,
        physical_jumping_jacks_score: leaf("physical_jumping_jacks_score")?,
        technical_poomsae_score: leaf("technical_poomsae_score")?,
        technical_sparring_score: leaf("technical_sparring_score")?,
        technical_kicks_score: leaf("technical_kicks_score")?,
        technical_breaking_score: leaf("technical_breaking_score")?,
    };

    Ok(FlatScores::try_from(raw)?)
}

fn flat_from_leaves(leaves: [u8; 10]) -> FlatScores {
    FlatScores {
        homework_combined_score: leaves[0],
        attendance_diligence_score: leaves[1],
        character_gratitude_notes_score: leaves[2],
        character_leadership_score: leaves[3],
        physical_squats_score: leaves[4],
        physical_jumping_jacks_score: leaves[5],
        technical_poomsae_score: leaves[6],
        technical_sparring_score: leaves[7],
        technical_kicks_score: leaves[8],
        technical_breaking_score: leaves[9],
    }
}
