//! Validation errors for score data entering from outside the engine.
//!
//! The scoring functions themselves are total and never fail. Anything read
//! from CSV, JSON or the database is checked here first.

use thiserror::Error;

/// Errors raised when external score data cannot be turned into
/// [`EvaluationScores`](crate::models::EvaluationScores).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// A leaf was negative or above the maximum rating.
    #[error("score for {field} out of range: {value} (expected 0..=10)")]
    InvalidScoreRange { field: &'static str, value: i64 },

    /// A leaf was absent. Not the same thing as an unrated (0) leaf.
    #[error("missing score for {field}")]
    IncompleteScoreData { field: &'static str },
}

impl ScoreError {
    /// Name of the flat field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ScoreError::InvalidScoreRange { field, .. } => field,
            ScoreError::IncompleteScoreData { field } => field,
        }
    }
}
