//! Belt-promotion scoring.
//!
//! Pure functions over [`EvaluationScores`]. None of them validate their
//! input; callers check external data with [`EvaluationScores::validate`] or
//! [`FlatScores::try_from`] first.

use crate::models::{
    AttendanceScores, Category, CategoryAverages, CharacterScores, EvaluationScores,
    EvaluationStatus, FlatScores, Grade, HomeworkScores, PhysicalScores, RadarData,
    ScoreCalculation, TechnicalScores,
};

/// Minimum total to pass. Also the lower bound of the C+ grade.
pub const PASS_THRESHOLD: u32 = 70;

/// Checked top-down; the first bound the total reaches wins.
const GRADE_THRESHOLDS: [(u32, Grade); 7] = [
    (90, Grade::APlus),
    (85, Grade::A),
    (80, Grade::BPlus),
    (75, Grade::B),
    (PASS_THRESHOLD, Grade::CPlus),
    (65, Grade::C),
    (60, Grade::D),
];

pub fn default_scores() -> EvaluationScores {
    EvaluationScores::default()
}

pub fn calculate_total_score(scores: &EvaluationScores) -> u32 {
    scores.leaves().iter().map(|&value| u32::from(value)).sum()
}

pub fn calculate_grade(total_score: u32) -> Grade {
    GRADE_THRESHOLDS
        .iter()
        .find(|(min, _)| total_score >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

pub fn passed(total_score: u32) -> bool {
    total_score >= PASS_THRESHOLD
}

pub fn calculate_category_averages(scores: &EvaluationScores) -> CategoryAverages {
    CategoryAverages {
        homework: f64::from(scores.homework.combined),
        attendance: f64::from(scores.attendance.diligence),
        character: mean(&[scores.character.gratitude_notes, scores.character.leadership]),
        physical: mean(&[scores.physical.squats, scores.physical.jumping_jacks]),
        technical: mean(&[
            scores.technical.poomsae,
            scores.technical.sparring,
            scores.technical.kicks,
            scores.technical.breaking,
        ]),
    }
}

pub fn calculate_radar_data(scores: &EvaluationScores) -> RadarData {
    let averages = calculate_category_averages(scores);
    RadarData {
        poomsae: f64::from(scores.technical.poomsae),
        sparring: f64::from(scores.technical.sparring),
        fitness: averages.physical,
        kicks: f64::from(scores.technical.kicks),
        other: (averages.homework + averages.attendance + averages.character) / 3.0,
    }
}

/// Ties go to the earlier category in [`Category::ALL`].
pub fn strongest_category(averages: &CategoryAverages) -> Category {
    pick_category(averages, |candidate, best| candidate > best)
}

pub fn weakest_category(averages: &CategoryAverages) -> Category {
    pick_category(averages, |candidate, best| candidate < best)
}

fn pick_category(averages: &CategoryAverages, better: impl Fn(f64, f64) -> bool) -> Category {
    let mut picked = Category::ALL[0];
    for category in Category::ALL.into_iter().skip(1) {
        if better(averages.get(category), averages.get(picked)) {
            picked = category;
        }
    }
    picked
}

/// Full result for one set of scores. This is what reports and the save
/// gate consume.
pub fn calculate_evaluation(scores: &EvaluationScores) -> ScoreCalculation {
    let total_score = calculate_total_score(scores);
    let category_averages = calculate_category_averages(scores);

    ScoreCalculation {
        total_score,
        grade: calculate_grade(total_score),
        passed: passed(total_score),
        category_averages,
        radar_data: calculate_radar_data(scores),
        strongest_category: strongest_category(&category_averages),
        weakest_category: weakest_category(&category_averages),
    }
}

pub fn are_all_scores_entered(scores: &EvaluationScores) -> bool {
    scores.leaves().iter().all(|&value| value > 0)
}

pub fn has_any_score_changed(scores: &EvaluationScores) -> bool {
    scores.leaves().iter().any(|&value| value > 0)
}

pub fn evaluation_status(scores: &EvaluationScores) -> EvaluationStatus {
    if are_all_scores_entered(scores) {
        EvaluationStatus::Complete
    } else if has_any_score_changed(scores) {
        EvaluationStatus::InProgress
    } else {
        EvaluationStatus::NotStarted
    }
}

pub fn flatten_scores(scores: &EvaluationScores) -> FlatScores {
    FlatScores {
        homework_combined_score: scores.homework.combined,
        attendance_diligence_score: scores.attendance.diligence,
        character_gratitude_notes_score: scores.character.gratitude_notes,
        character_leadership_score: scores.character.leadership,
        physical_squats_score: scores.physical.squats,
        physical_jumping_jacks_score: scores.physical.jumping_jacks,
        technical_poomsae_score: scores.technical.poomsae,
        technical_sparring_score: scores.technical.sparring,
        technical_kicks_score: scores.technical.kicks,
        technical_breaking_score: scores.technical.breaking,
    }
}

pub fn unflatten_scores(flat: &FlatScores) -> EvaluationScores {
    EvaluationScores {
        homework: HomeworkScores {
            combined: flat.homework_combined_score,
        },
        attendance: AttendanceScores {
            diligence: flat.attendance_diligence_score,
        },
        character: CharacterScores {
            gratitude_notes: flat.character_gratitude_notes_score,
            leadership: flat.character_leadership_score,
        },
        physical: PhysicalScores {
            squats: flat.physical_squats_score,
            jumping_jacks: flat.physical_jumping_jacks_score,
        },
        technical: TechnicalScores {
            poomsae: flat.technical_poomsae_score,
            sparring: flat.technical_sparring_score,
            kicks: flat.technical_kicks_score,
            breaking: flat.technical_breaking_score,
        },
    }
}

pub fn score_color(score: u8) -> &'static str {
    match score {
        9.. => "#2e7d32",
        7..=8 => "#66bb6a",
        5..=6 => "#ffa726",
        1..=4 => "#ef5350",
        0 => "#bdbdbd",
    }
}

pub fn grade_color(grade: Grade) -> &'static str {
    match grade {
        Grade::APlus | Grade::A => "#2e7d32",
        Grade::BPlus | Grade::B => "#1976d2",
        Grade::CPlus | Grade::C => "#f9a825",
        Grade::D => "#ef6c00",
        Grade::F => "#c62828",
    }
}

fn mean(values: &[u8]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: u32 = values.iter().map(|&value| u32::from(value)).sum();
    f64::from(sum) / values.len() as f64
}
