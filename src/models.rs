use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScoreError;

/// Highest rating a single leaf can take. 0 means "not yet rated".
pub const MAX_LEAF_SCORE: u8 = 10;

/// Character cap for [`EvaluationComments::overall`].
pub const OVERALL_COMMENT_MAX_CHARS: usize = 50;

pub const FLAT_FIELDS: [&str; 10] = [
    "homeworkCombinedScore",
    "attendanceDiligenceScore",
    "characterGratitudeNotesScore",
    "characterLeadershipScore",
    "physicalSquatsScore",
    "physicalJumpingJacksScore",
    "technicalPoomsaeScore",
    "technicalSparringScore",
    "technicalKicksScore",
    "technicalBreakingScore",
];

/// Dotted category.field names, same order as [`FLAT_FIELDS`].
pub const LEAF_NAMES: [&str; 10] = [
    "homework.combined",
    "attendance.diligence",
    "character.gratitudeNotes",
    "character.leadership",
    "physical.squats",
    "physical.jumpingJacks",
    "technical.poomsae",
    "technical.sparring",
    "technical.kicks",
    "technical.breaking",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkScores {
    pub combined: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceScores {
    pub diligence: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterScores {
    pub gratitude_notes: u8,
    pub leadership: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalScores {
    pub squats: u8,
    pub jumping_jacks: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalScores {
    pub poomsae: u8,
    pub sparring: u8,
    pub kicks: u8,
    pub breaking: u8,
}

/// Ratings for one student, all leaves in `0..=10`.
///
/// Deserializing requires every key and range-checks every leaf; an absent
/// leaf is never read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UncheckedScores")]
pub struct EvaluationScores {
    pub homework: HomeworkScores,
    pub attendance: AttendanceScores,
    pub character: CharacterScores,
    pub physical: PhysicalScores,
    pub technical: TechnicalScores,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UncheckedScores {
    homework: HomeworkScores,
    attendance: AttendanceScores,
    character: CharacterScores,
    physical: PhysicalScores,
    technical: TechnicalScores,
}

impl TryFrom<UncheckedScores> for EvaluationScores {
    type Error = ScoreError;

    fn try_from(raw: UncheckedScores) -> Result<Self, Self::Error> {
        let scores = EvaluationScores {
            homework: raw.homework,
            attendance: raw.attendance,
            character: raw.character,
            physical: raw.physical,
            technical: raw.technical,
        };
        scores.validate()?;
        Ok(scores)
    }
}

impl EvaluationScores {
    /// Leaves in [`FLAT_FIELDS`] order.
    pub fn leaves(&self) -> [u8; 10] {
        [
            self.homework.combined,
            self.attendance.diligence,
            self.character.gratitude_notes,
            self.character.leadership,
            self.physical.squats,
            self.physical.jumping_jacks,
            self.technical.poomsae,
            self.technical.sparring,
            self.technical.kicks,
            self.technical.breaking,
        ]
    }

    pub fn validate(&self) -> Result<(), ScoreError> {
        for (field, value) in FLAT_FIELDS.into_iter().zip(self.leaves()) {
            if value > MAX_LEAF_SCORE {
                return Err(ScoreError::InvalidScoreRange {
                    field,
                    value: i64::from(value),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HomeworkComments {
    pub combined: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttendanceComments {
    pub diligence: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CharacterComments {
    pub gratitude_notes: Option<String>,
    pub leadership: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicalComments {
    pub squats: Option<String>,
    pub jumping_jacks: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TechnicalComments {
    pub poomsae: Option<String>,
    pub sparring: Option<String>,
    pub kicks: Option<String>,
    pub breaking: Option<String>,
}

/// Free-text notes mirroring [`EvaluationScores`], plus a short overall
/// remark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationComments {
    pub homework: HomeworkComments,
    pub attendance: AttendanceComments,
    pub character: CharacterComments,
    pub physical: PhysicalComments,
    pub technical: TechnicalComments,
    #[serde(deserialize_with = "deserialize_overall")]
    overall: String,
}

impl EvaluationComments {
    pub fn overall(&self) -> &str {
        &self.overall
    }

    /// Stores the overall remark, cut to [`OVERALL_COMMENT_MAX_CHARS`].
    pub fn set_overall(&mut self, text: &str) {
        self.overall = truncate_overall(text);
    }

    /// Leaf notes that were actually written, keyed by [`LEAF_NAMES`].
    pub fn leaf_notes(&self) -> Vec<(&'static str, &str)> {
        let leaves = [
            &self.homework.combined,
            &self.attendance.diligence,
            &self.character.gratitude_notes,
            &self.character.leadership,
            &self.physical.squats,
            &self.physical.jumping_jacks,
            &self.technical.poomsae,
            &self.technical.sparring,
            &self.technical.kicks,
            &self.technical.breaking,
        ];
        LEAF_NAMES
            .into_iter()
            .zip(leaves)
            .filter_map(|(name, note)| {
                note.as_deref()
                    .map(str::trim)
                    .filter(|note| !note.is_empty())
                    .map(|note| (name, note))
            })
            .collect()
    }
}

fn truncate_overall(text: &str) -> String {
    text.chars().take(OVERALL_COMMENT_MAX_CHARS).collect()
}

fn deserialize_overall<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(truncate_overall(&raw))
}

/// The flat one-level record the persistence API expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatScores {
    pub homework_combined_score: u8,
    pub attendance_diligence_score: u8,
    pub character_gratitude_notes_score: u8,
    pub character_leadership_score: u8,
    pub physical_squats_score: u8,
    pub physical_jumping_jacks_score: u8,
    pub technical_poomsae_score: u8,
    pub technical_sparring_score: u8,
    pub technical_kicks_score: u8,
    pub technical_breaking_score: u8,
}

/// Flat record as it arrives from outside: any key may be missing and any
/// value may be out of range.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFlatScores {
    pub homework_combined_score: Option<i64>,
    pub attendance_diligence_score: Option<i64>,
    pub character_gratitude_notes_score: Option<i64>,
    pub character_leadership_score: Option<i64>,
    pub physical_squats_score: Option<i64>,
    pub physical_jumping_jacks_score: Option<i64>,
    pub technical_poomsae_score: Option<i64>,
    pub technical_sparring_score: Option<i64>,
    pub technical_kicks_score: Option<i64>,
    pub technical_breaking_score: Option<i64>,
}

impl TryFrom<RawFlatScores> for FlatScores {
    type Error = ScoreError;

    fn try_from(raw: RawFlatScores) -> Result<Self, Self::Error> {
        Ok(FlatScores {
            homework_combined_score: checked_leaf(FLAT_FIELDS[0], raw.homework_combined_score)?,
            attendance_diligence_score: checked_leaf(
                FLAT_FIELDS[1],
                raw.attendance_diligence_score,
            )?,
            character_gratitude_notes_score: checked_leaf(
                FLAT_FIELDS[2],
                raw.character_gratitude_notes_score,
            )?,
            character_leadership_score: checked_leaf(
                FLAT_FIELDS[3],
                raw.character_leadership_score,
            )?,
            physical_squats_score: checked_leaf(FLAT_FIELDS[4], raw.physical_squats_score)?,
            physical_jumping_jacks_score: checked_leaf(
                FLAT_FIELDS[5],
                raw.physical_jumping_jacks_score,
            )?,
            technical_poomsae_score: checked_leaf(FLAT_FIELDS[6], raw.technical_poomsae_score)?,
            technical_sparring_score: checked_leaf(
                FLAT_FIELDS[7],
                raw.technical_sparring_score,
            )?,
            technical_kicks_score: checked_leaf(FLAT_FIELDS[8], raw.technical_kicks_score)?,
            technical_breaking_score: checked_leaf(
                FLAT_FIELDS[9],
                raw.technical_breaking_score,
            )?,
        })
    }
}

pub fn checked_leaf(field: &'static str, value: Option<i64>) -> Result<u8, ScoreError> {
    let value = value.ok_or(ScoreError::IncompleteScoreData { field })?;
    if !(0..=i64::from(MAX_LEAF_SCORE)).contains(&value) {
        return Err(ScoreError::InvalidScoreRange { field, value });
    }
    Ok(value as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Homework,
    Attendance,
    Character,
    Physical,
    Technical,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Homework,
        Category::Attendance,
        Category::Character,
        Category::Physical,
        Category::Technical,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Homework => "homework",
            Category::Attendance => "attendance",
            Category::Character => "character",
            Category::Physical => "physical",
            Category::Technical => "technical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Homework => "숙제",
            Category::Attendance => "출석",
            Category::Character => "인성",
            Category::Physical => "체력",
            Category::Technical => "기술",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Letter outcome of an evaluation, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl Grade {
    pub const ALL: [Grade; 8] = [
        Grade::APlus,
        Grade::A,
        Grade::BPlus,
        Grade::B,
        Grade::CPlus,
        Grade::C,
        Grade::D,
        Grade::F,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    NotStarted,
    InProgress,
    Complete,
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvaluationStatus::NotStarted => "not started",
            EvaluationStatus::InProgress => "in progress",
            EvaluationStatus::Complete => "complete",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryAverages {
    pub homework: f64,
    pub attendance: f64,
    pub character: f64,
    pub physical: f64,
    pub technical: f64,
}

impl CategoryAverages {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Homework => self.homework,
            Category::Attendance => self.attendance,
            Category::Character => self.character,
            Category::Physical => self.physical,
            Category::Technical => self.technical,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarData {
    #[serde(rename = "품새")]
    pub poomsae: f64,
    #[serde(rename = "겨루기")]
    pub sparring: f64,
    #[serde(rename = "체력")]
    pub fitness: f64,
    #[serde(rename = "발차기")]
    pub kicks: f64,
    #[serde(rename = "기타")]
    pub other: f64,
}

impl RadarData {
    pub fn axes(&self) -> [(&'static str, f64); 5] {
        [
            ("품새", self.poomsae),
            ("겨루기", self.sparring),
            ("체력", self.fitness),
            ("발차기", self.kicks),
            ("기타", self.other),
        ]
    }
}

/// Everything derived from one set of scores. Recomputed on demand, never
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCalculation {
    pub total_score: u32,
    pub grade: Grade,
    pub passed: bool,
    pub category_averages: CategoryAverages,
    pub radar_data: RadarData,
    pub strongest_category: Category,
    pub weakest_category: Category,
}

#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub belt: String,
    pub evaluated_on: NaiveDate,
    pub scores: EvaluationScores,
    pub comments: EvaluationComments,
}

#[derive(Debug, Clone)]
pub struct GradeSummary {
    pub grade: Grade,
    pub count: usize,
    pub avg_total: f64,
}
