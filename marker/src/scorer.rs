//! # Scorer Module
//!
//! This module turns per-question effective scores into a single weighted grade.
//! The primary function, [`compute_grade`], weights each answer's 0-100 effective
//! score by the question's mark allocation.

use crate::types::{GradeSummary, GradedAnswer, LetterGrade};

/// Round to one decimal place.
#[inline]
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Computes the weighted grade for a set of graded answers.
///
/// `scored = Σ effective/100 × max_marks` is rounded to one decimal, while the
/// percentage is computed from the unrounded value and rounded to the nearest
/// integer. The letter grade is derived from the percentage.
///
/// # Arguments
///
/// * `answers` - Every gradable unit of the submission.
///
/// # Returns
///
/// A [`GradeSummary`]. An empty slice, or one whose mark allocations sum to zero,
/// yields `0.0 / 0 / 0% / F`.
///
/// # Example
///
/// ```
/// use marker::scorer::compute_grade;
/// use marker::types::{AiSuggestion, GradedAnswer};
/// use util::assignment::QuestionKey;
///
/// let answers = vec![GradedAnswer {
///     key: QuestionKey::question("q1"),
///     max_marks: 20,
///     text: String::new(),
///     ai: Some(AiSuggestion { score: 90.0, feedback: String::new() }),
///     lecturer: None,
/// }];
///
/// let grade = compute_grade(&answers);
/// assert_eq!(grade.scored, 18.0);
/// assert_eq!(grade.percentage, 90);
/// ```
pub fn compute_grade(answers: &[GradedAnswer]) -> GradeSummary {
    let mut scored = 0.0;
    let mut total: u32 = 0;

    for answer in answers {
        scored += answer.effective_score() / 100.0 * f64::from(answer.max_marks);
        total += answer.max_marks;
    }

    let percentage = if total == 0 {
        0
    } else {
        (scored / f64::from(total) * 100.0).round() as u32
    };

    GradeSummary {
        scored: round1(scored),
        total,
        percentage,
        letter: LetterGrade::from_percentage(percentage),
    }
}
