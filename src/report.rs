use std::fmt::Write;

use chrono::{Duration, NaiveDate, Utc};

use crate::models::{Category, EvaluationRecord, EvaluationStatus, Grade, GradeSummary};
use crate::scoring;

pub fn cutoff_date(since_days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(since_days.max(1))
}

fn is_complete(evaluation: &EvaluationRecord) -> bool {
    scoring::are_all_scores_entered(&evaluation.scores)
}

/// Grade counts over completed evaluations only.
pub fn summarize_by_grade(evaluations: &[EvaluationRecord]) -> Vec<GradeSummary> {
    let mut map: std::collections::HashMap<Grade, (usize, u32)> =
        std::collections::HashMap::new();

    for evaluation in evaluations.iter().filter(|evaluation| is_complete(evaluation)) {
        let total = scoring::calculate_total_score(&evaluation.scores);
        let entry = map
            .entry(scoring::calculate_grade(total))
            .or_insert((0, 0));
        entry.0 += 1;
        entry.1 += total;
    }

    let mut summaries: Vec<GradeSummary> = map
        .into_iter()
        .map(|(grade, (count, total))| GradeSummary {
            grade,
            count,
            avg_total: if count == 0 {
                0.0
            } else {
                f64::from(total) / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| a.grade.cmp(&b.grade));
    summaries
}

pub fn pass_rate(evaluations: &[EvaluationRecord]) -> f64 {
    let complete: Vec<_> = evaluations
        .iter()
        .filter(|evaluation| is_complete(evaluation))
        .collect();
    if complete.is_empty() {
        return 0.0;
    }
    let passed = complete
        .iter()
        .filter(|evaluation| {
            scoring::passed(scoring::calculate_total_score(&evaluation.scores))
        })
        .count();
    passed as f64 / complete.len() as f64
}

pub fn build_report(
    scope: Option<&str>,
    cutoff: NaiveDate,
    evaluations: &[EvaluationRecord],
) -> String {
    let summaries = summarize_by_grade(evaluations);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all students");

    let _ = writeln!(output, "# Belt Promotion Evaluation Report");
    let _ = writeln!(
        output,
        "Generated for {} (evaluations since {})",
        scope_label, cutoff
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Distribution");

    if summaries.is_empty() {
        let _ = writeln!(output, "No completed evaluations in this window.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} students (avg total {:.1})",
                summary.grade, summary.count, summary.avg_total
            );
        }
        let _ = writeln!(
            output,
            "- Pass rate: {:.0}%",
            pass_rate(evaluations) * 100.0
        );
    }

    let mut ranked = evaluations.to_vec();
    ranked.sort_by_key(|evaluation| {
        std::cmp::Reverse(scoring::calculate_total_score(&evaluation.scores))
    });

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students");

    if ranked.is_empty() {
        let _ = writeln!(output, "No students evaluated in this window.");
    }

    for evaluation in ranked.iter() {
        let result = scoring::calculate_evaluation(&evaluation.scores);
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "### {} ({}, {} belt) on {}",
            evaluation.student_name,
            evaluation.student_email,
            evaluation.belt,
            evaluation.evaluated_on
        );
        let _ = writeln!(
            output,
            "- Total {} / 100, grade {} ({})",
            result.total_score,
            result.grade,
            if result.passed { "pass" } else { "fail" }
        );

        let averages = Category::ALL
            .iter()
            .map(|category| {
                format!(
                    "{} {:.2}",
                    category.label(),
                    result.category_averages.get(*category)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(output, "- Category averages: {averages}");

        let radar = result
            .radar_data
            .axes()
            .iter()
            .map(|(axis, value)| format!("{axis} {value:.1}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(output, "- Radar: {radar}");
        let _ = writeln!(
            output,
            "- Strongest: {}, weakest: {}",
            result.strongest_category.label(),
            result.weakest_category.label()
        );

        let overall = evaluation.comments.overall();
        if !overall.is_empty() {
            let _ = writeln!(output, "- Comment: {overall}");
        }
        for (leaf, note) in evaluation.comments.leaf_notes() {
            let _ = writeln!(output, "  - {leaf}: {note}");
        }
    }

    let incomplete: Vec<_> = evaluations
        .iter()
        .filter_map(|evaluation| {
            let status = scoring::evaluation_status(&evaluation.scores);
            (status != EvaluationStatus::Complete).then_some((evaluation, status))
        })
        .collect();

    if !incomplete.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Incomplete Evaluations");
        for (evaluation, status) in incomplete {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                evaluation.student_name, evaluation.evaluated_on, status
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EvaluationComments, EvaluationScores};
    use uuid::Uuid;

    fn record(name: &str, scores: EvaluationScores) -> EvaluationRecord {
        let mut comments = EvaluationComments::default();
        comments.set_overall("focused and steady");
        EvaluationRecord {
            student_id: Uuid::new_v4(),
            student_name: name.to_string(),
            student_email: format!("{}@example.com", name.to_lowercase()),
            belt: "blue".to_string(),
            evaluated_on: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            scores,
            comments,
        }
    }

    fn uniform(value: u8) -> EvaluationScores {
        let mut scores = EvaluationScores::default();
        scores.homework.combined = value;
        scores.attendance.diligence = value;
        scores.character.gratitude_notes = value;
        scores.character.leadership = value;
        scores.physical.squats = value;
        scores.physical.jumping_jacks = value;
        scores.technical.poomsae = value;
        scores.technical.sparring = value;
        scores.technical.kicks = value;
        scores.technical.breaking = value;
        scores
    }

    #[test]
    fn cutoff_date_respects_since_days() {
        let cutoff = cutoff_date(14);
        let expected = Utc::now().date_naive() - Duration::days(14);
        assert_eq!(cutoff, expected);
        assert_eq!(cutoff_date(0), Utc::now().date_naive() - Duration::days(1));
    }

    #[test]
    fn grades_are_grouped_best_first() {
        let evaluations = vec![
            record("Mina", uniform(5)),
            record("Joon", uniform(10)),
            record("Sora", uniform(9)),
            record("Hana", uniform(4)),
        ];

        let summaries = summarize_by_grade(&evaluations);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].grade, Grade::APlus);
        assert_eq!(summaries[0].count, 2);
        assert!((summaries[0].avg_total - 95.0).abs() < 0.001);
        assert_eq!(summaries[1].grade, Grade::F);
        assert_eq!(summaries[1].count, 2);
    }

    #[test]
    fn pass_rate_counts_totals_at_threshold() {
        let evaluations = vec![record("Mina", uniform(7)), record("Joon", uniform(6))];
        assert!((pass_rate(&evaluations) - 0.5).abs() < 0.001);
        assert_eq!(pass_rate(&[]), 0.0);
    }

    #[test]
    fn report_lists_students_by_total() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let evaluations = vec![record("Mina", uniform(5)), record("Joon", uniform(10))];
        let report = build_report(Some("blue"), cutoff, &evaluations);

        assert!(report.starts_with("# Belt Promotion Evaluation Report"));
        assert!(report.contains("Generated for blue (evaluations since 2026-03-01)"));
        assert!(report.contains("- Pass rate: 50%"));
        assert!(report.contains("- Total 100 / 100, grade A+ (pass)"));
        assert!(report.contains("- Total 50 / 100, grade F (fail)"));
        assert!(report.contains("품새 10.0"));
        let joon = report.find("### Joon").unwrap();
        let mina = report.find("### Mina").unwrap();
        assert!(joon < mina);
        assert!(!report.contains("## Incomplete Evaluations"));
    }

    #[test]
    fn report_flags_unfinished_forms() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut partial = uniform(8);
        partial.technical.breaking = 0;
        let evaluations = vec![
            record("Mina", partial),
            record("Joon", EvaluationScores::default()),
        ];
        let report = build_report(None, cutoff, &evaluations);

        assert!(report.contains("Generated for all students"));
        assert!(report.contains("## Incomplete Evaluations"));
        assert!(report.contains("- Mina (2026-03-14): in progress"));
        assert!(report.contains("- Joon (2026-03-14): not started"));
    }

    #[test]
    fn unfinished_forms_stay_out_of_grades_and_pass_rate() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut partial = uniform(9);
        partial.attendance.diligence = 0;
        let evaluations = vec![
            record("Joon", uniform(10)),
            record("Mina", EvaluationScores::default()),
            record("Sora", partial),
        ];

        let summaries = summarize_by_grade(&evaluations);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].grade, Grade::APlus);
        assert_eq!(summaries[0].count, 1);
        assert_eq!(pass_rate(&evaluations), 1.0);

        let report = build_report(None, cutoff, &evaluations);
        assert!(!report.contains("- F:"));
        assert!(report.contains("- Pass rate: 100%"));
        assert!(report.contains("- Mina (2026-03-14): not started"));
        assert!(report.contains("- Sora (2026-03-14): in progress"));
    }

    #[test]
    fn only_unfinished_forms_leave_distribution_empty() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let evaluations = vec![record("Mina", EvaluationScores::default())];
        assert_eq!(pass_rate(&evaluations), 0.0);
        let report = build_report(None, cutoff, &evaluations);
        assert!(report.contains("No completed evaluations in this window."));
        assert!(!report.contains("Pass rate"));
    }

    #[test]
    fn leaf_notes_are_listed_under_the_student() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut mina = record("Mina", uniform(8));
        mina.comments.technical.poomsae = Some("crisp stances".to_string());
        mina.comments.character.leadership = Some("helps white belts".to_string());

        let report = build_report(None, cutoff, &[mina]);
        assert!(report.contains("- Comment: focused and steady"));
        let leadership = report.find("  - character.leadership: helps white belts").unwrap();
        let poomsae = report.find("  - technical.poomsae: crisp stances").unwrap();
        assert!(leadership < poomsae);
    }

    #[test]
    fn empty_window_reports_nothing() {
        let cutoff = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let report = build_report(None, cutoff, &[]);
        assert!(report.contains("No completed evaluations in this window."));
        assert!(report.contains("No students evaluated in this window."));
    }
}
