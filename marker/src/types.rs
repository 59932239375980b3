//! # Grading Types
//!
//! Value types shared by the scorer and the grading session: the AI suggestion and
//! lecturer override attached to each answer, the graded answer itself, and the
//! [`GradeSummary`] produced by aggregation.

use serde::{Deserialize, Serialize};
use std::fmt;
use util::assignment::QuestionKey;

/// An AI-suggested score (0-100) and the feedback that came with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestion {
    pub score: f64,
    pub feedback: String,
}

/// Lecturer-entered feedback and score. Once set, always wins over the AI suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LecturerOverride {
    pub score: f64,
    pub feedback: String,
}

/// One gradable unit of a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub key: QuestionKey,
    pub max_marks: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ai: Option<AiSuggestion>,
    #[serde(default)]
    pub lecturer: Option<LecturerOverride>,
}

impl GradedAnswer {
    /// `lecturer.score ?? ai.score`, or 0 when neither exists.
    pub fn effective_score(&self) -> f64 {
        self.lecturer
            .as_ref()
            .map(|o| o.score)
            .or_else(|| self.ai.as_ref().map(|a| a.score))
            .unwrap_or(0.0)
    }

    /// Feedback shown to the student: the lecturer's when present, else the AI's.
    pub fn displayed_feedback(&self) -> Option<&str> {
        self.lecturer
            .as_ref()
            .map(|o| o.feedback.as_str())
            .or_else(|| self.ai.as_ref().map(|a| a.feedback.as_str()))
    }

    pub fn is_overridden(&self) -> bool {
        self.lecturer.is_some()
    }
}

/// Letter grade bands, inclusive on the lower edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => LetterGrade::APlus,
            80..=89 => LetterGrade::A,
            70..=79 => LetterGrade::B,
            60..=69 => LetterGrade::C,
            50..=59 => LetterGrade::D,
            _ => LetterGrade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate grade for a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeSummary {
    /// Marks earned, rounded to one decimal.
    pub scored: f64,
    /// Sum of the mark allocations.
    pub total: u32,
    /// `round(100 * scored / total)` using the unrounded score.
    pub percentage: u32,
    pub letter: LetterGrade,
}
