use serde::Deserialize;
use std::fs;
use std::path::Path;
use util::assignment::{Assignment, QuestionKey};

use crate::error::GradingError;

const MAX_JSON_SIZE: u64 = 2 * 1024 * 1024; // 2MB

/// One answer line of a grading sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct SheetAnswer {
    pub key: QuestionKey,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ai_score: Option<f64>,
    #[serde(default)]
    pub ai_feedback: Option<String>,
    #[serde(default)]
    pub lecturer_score: Option<f64>,
    #[serde(default)]
    pub lecturer_feedback: Option<String>,
}

/// A submission ready for grading: the assignment structure plus the student's
/// answers and whatever AI / lecturer scores are already known.
#[derive(Debug, Clone, Deserialize)]
pub struct GradingSheet {
    pub submission_id: String,
    pub student_id: String,
    pub assignment: Assignment,
    #[serde(default)]
    pub answers: Vec<SheetAnswer>,
}

fn check_file(path: &Path) -> Result<(), GradingError> {
    if !path.exists() {
        return Err(GradingError::Io(format!("File not found: {}", path.display())));
    }

    if !path.is_file() {
        return Err(GradingError::Io(format!("Not a file: {}", path.display())));
    }

    let metadata = fs::metadata(path)
        .map_err(|_| GradingError::Io(format!("File unreadable: {}", path.display())))?;
    if metadata.len() > MAX_JSON_SIZE {
        return Err(GradingError::Io(format!(
            "File too large: {} ({} bytes)",
            path.display(),
            metadata.len()
        )));
    }

    Ok(())
}

pub fn load_sheet(path: &Path) -> Result<GradingSheet, GradingError> {
    check_file(path)?;
    let raw = fs::read_to_string(path)
        .map_err(|e| GradingError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw).map_err(|e| GradingError::InvalidSheet(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_sheet_with_sub_questions() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{
                "submission_id": "s1",
                "student_id": "u123",
                "assignment": {{
                    "id": "a1", "title": "SQL", "course_id": "c1",
                    "questions": [
                        {{ "id": "q4", "number": 4, "text": "Queries", "marks": 25,
                           "sub_questions": [
                               {{ "id": "q4a", "letter": "a", "text": "recent", "marks": 8 }}
                           ] }}
                    ]
                }},
                "answers": [
                    {{ "key": {{ "question_id": "q4", "sub_question_id": "q4a" }},
                       "text": "SELECT 1", "ai_score": 95 }}
                ]
            }}"#
        )
        .unwrap();

        let sheet = load_sheet(f.path()).unwrap();
        assert_eq!(sheet.answers.len(), 1);
        assert_eq!(sheet.answers[0].key, QuestionKey::sub("q4", "q4a"));
        assert_eq!(sheet.answers[0].ai_score, Some(95.0));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_sheet(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, GradingError::Io(_)));
    }

    #[test]
    fn garbage_is_invalid_sheet() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        assert!(matches!(
            load_sheet(f.path()).unwrap_err(),
            GradingError::InvalidSheet(_)
        ));
    }
}
