//! Assignment structure shared by submission and grading code.
//!
//! A question is either atomic (carries its own marks) or decomposed into
//! lettered sub-questions (each carrying marks). The two are mutually
//! exclusive: a decomposed question's own `marks` is informational and never
//! counted towards the total.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Addresses one gradable unit: a whole atomic question or one sub-question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionKey {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_question_id: Option<String>,
}

impl QuestionKey {
    pub fn question(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            sub_question_id: None,
        }
    }

    pub fn sub(question_id: impl Into<String>, sub_question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            sub_question_id: Some(sub_question_id.into()),
        }
    }

    /// Parses the `"q2-q2a"` / `"q1"` form produced by `Display`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('-') {
            Some((q, sub)) if !sub.is_empty() => Self::sub(q, sub),
            _ => Self::question(raw),
        }
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_question_id {
            Some(sub) => write!(f, "{}-{}", self.question_id, sub),
            None => f.write_str(&self.question_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubQuestion {
    pub id: String,
    pub letter: String,
    pub text: String,
    pub marks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: String,
    pub number: u32,
    pub text: String,
    pub marks: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_questions: Vec<SubQuestion>,
}

impl Question {
    pub fn is_decomposed(&self) -> bool {
        !self.sub_questions.is_empty()
    }

    /// Marks this question contributes to the assignment total.
    pub fn effective_marks(&self) -> u32 {
        if self.is_decomposed() {
            self.sub_questions.iter().map(|s| s.marks).sum()
        } else {
            self.marks
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub title: String,
    pub course_id: String,
    pub questions: Vec<Question>,
}

/// One gradable unit of an assignment and its mark allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradableUnit {
    pub key: QuestionKey,
    pub max_marks: u32,
}

impl Assignment {
    pub fn total_marks(&self) -> u32 {
        self.questions.iter().map(Question::effective_marks).sum()
    }

    /// Every question key in display order, expanding decomposed questions
    /// into their sub-questions.
    pub fn gradable_units(&self) -> Vec<GradableUnit> {
        let mut units = Vec::new();
        for q in &self.questions {
            if q.is_decomposed() {
                for s in &q.sub_questions {
                    units.push(GradableUnit {
                        key: QuestionKey::sub(&q.id, &s.id),
                        max_marks: s.marks,
                    });
                }
            } else {
                units.push(GradableUnit {
                    key: QuestionKey::question(&q.id),
                    max_marks: q.marks,
                });
            }
        }
        units
    }

    pub fn max_marks_for(&self, key: &QuestionKey) -> Option<u32> {
        let q = self.questions.iter().find(|q| q.id == key.question_id)?;
        match (&key.sub_question_id, q.is_decomposed()) {
            (None, false) => Some(q.marks),
            (Some(sub), true) => q.sub_questions.iter().find(|s| &s.id == sub).map(|s| s.marks),
            _ => None,
        }
    }
}
