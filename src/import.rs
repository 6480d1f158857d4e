//! Evaluation sheets exported as CSV, one student per row.
//!
//! Headers use the flat wire names for the ten scores, for example
//! `homeworkCombinedScore`. An empty score cell is treated as missing.
//! Per-leaf note columns (`technicalPoomsaeComment` and so on) are optional.

use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{
    EvaluationComments, EvaluationScores, EvaluationStatus, FlatScores, RawFlatScores,
    ScoreCalculation,
};
use crate::scoring;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    full_name: String,
    email: String,
    belt: String,
    evaluated_on: NaiveDate,
    homework_combined_score: Option<i64>,
    attendance_diligence_score: Option<i64>,
    character_gratitude_notes_score: Option<i64>,
    character_leadership_score: Option<i64>,
    physical_squats_score: Option<i64>,
    physical_jumping_jacks_score: Option<i64>,
    technical_poomsae_score: Option<i64>,
    technical_sparring_score: Option<i64>,
    technical_kicks_score: Option<i64>,
    technical_breaking_score: Option<i64>,
    overall_comment: Option<String>,
    source_key: Option<String>,
    #[serde(default)]
    homework_combined_comment: Option<String>,
    #[serde(default)]
    attendance_diligence_comment: Option<String>,
    #[serde(default)]
    character_gratitude_notes_comment: Option<String>,
    #[serde(default)]
    character_leadership_comment: Option<String>,
    #[serde(default)]
    physical_squats_comment: Option<String>,
    #[serde(default)]
    physical_jumping_jacks_comment: Option<String>,
    #[serde(default)]
    technical_poomsae_comment: Option<String>,
    #[serde(default)]
    technical_sparring_comment: Option<String>,
    #[serde(default)]
    technical_kicks_comment: Option<String>,
    #[serde(default)]
    technical_breaking_comment: Option<String>,
}

impl CsvRow {
    fn raw_scores(&self) -> RawFlatScores {
        RawFlatScores {
            homework_combined_score: self.homework_combined_score,
            attendance_diligence_score: self.attendance_diligence_score,
            character_gratitude_notes_score: self.character_gratitude_notes_score,
            character_leadership_score: self.character_leadership_score,
            physical_squats_score: self.physical_squats_score,
            physical_jumping_jacks_score: self.physical_jumping_jacks_score,
            technical_poomsae_score: self.technical_poomsae_score,
            technical_sparring_score: self.technical_sparring_score,
            technical_kicks_score: self.technical_kicks_score,
            technical_breaking_score: self.technical_breaking_score,
        }
    }

    fn comments(&mut self) -> EvaluationComments {
        let mut comments = EvaluationComments::default();
        comments.homework.combined = non_blank(self.homework_combined_comment.take());
        comments.attendance.diligence = non_blank(self.attendance_diligence_comment.take());
        comments.character.gratitude_notes =
            non_blank(self.character_gratitude_notes_comment.take());
        comments.character.leadership = non_blank(self.character_leadership_comment.take());
        comments.physical.squats = non_blank(self.physical_squats_comment.take());
        comments.physical.jumping_jacks = non_blank(self.physical_jumping_jacks_comment.take());
        comments.technical.poomsae = non_blank(self.technical_poomsae_comment.take());
        comments.technical.sparring = non_blank(self.technical_sparring_comment.take());
        comments.technical.kicks = non_blank(self.technical_kicks_comment.take());
        comments.technical.breaking = non_blank(self.technical_breaking_comment.take());
        if let Some(overall) = non_blank(self.overall_comment.take()) {
            comments.set_overall(&overall);
        }
        comments
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// A validated sheet row.
#[derive(Debug, Clone)]
pub struct EvaluationRow {
    pub full_name: String,
    pub email: String,
    pub belt: String,
    pub evaluated_on: NaiveDate,
    pub scores: FlatScores,
    pub comments: EvaluationComments,
    pub source_key: Option<String>,
}

impl EvaluationRow {
    pub fn nested_scores(&self) -> EvaluationScores {
        scoring::unflatten_scores(&self.scores)
    }

    /// Only rows with every leaf rated may be saved.
    pub fn is_complete(&self) -> bool {
        scoring::are_all_scores_entered(&self.nested_scores())
    }
}

/// Splits rows into those ready to save and those still missing ratings.
pub fn split_incomplete(rows: Vec<EvaluationRow>) -> (Vec<EvaluationRow>, Vec<EvaluationRow>) {
    rows.into_iter().partition(EvaluationRow::is_complete)
}

/// Reads and validates every row. Fails on the first bad row, naming its
/// line and field.
pub fn read_evaluations(csv_path: &Path) -> anyhow::Result<Vec<EvaluationRow>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // header is line 1
        let line = index + 2;
        let mut row = result.with_context(|| format!("line {line}: malformed row"))?;
        let scores = FlatScores::try_from(row.raw_scores())
            .with_context(|| format!("line {line}: invalid scores for {}", row.email))?;

        let comments = row.comments();
        rows.push(EvaluationRow {
            full_name: row.full_name,
            email: row.email,
            belt: row.belt,
            evaluated_on: row.evaluated_on,
            scores,
            comments,
            source_key: non_blank(row.source_key),
        });
    }

    tracing::debug!(rows = rows.len(), path = %csv_path.display(), "read evaluation sheet");
    Ok(rows)
}

/// Scoring output for one sheet row, as printed by `grade --format json`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedRow {
    pub full_name: String,
    pub email: String,
    pub belt: String,
    pub evaluated_on: NaiveDate,
    pub status: EvaluationStatus,
    pub scores: FlatScores,
    pub comments: EvaluationComments,
    pub evaluation: ScoreCalculation,
}

pub fn grade_rows(rows: &[EvaluationRow]) -> Vec<GradedRow> {
    rows.iter()
        .map(|row| {
            let nested = row.nested_scores();
            GradedRow {
                full_name: row.full_name.clone(),
                email: row.email.clone(),
                belt: row.belt.clone(),
                evaluated_on: row.evaluated_on,
                status: scoring::evaluation_status(&nested),
                scores: row.scores,
                comments: row.comments.clone(),
                evaluation: scoring::calculate_evaluation(&nested),
            }
        })
        .collect()
}
