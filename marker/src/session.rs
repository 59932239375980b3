//! # Grading Session
//!
//! A [`GradingSession`] is one lecturer's pass over one submission. It owns the graded
//! answers and enforces the session lifecycle:
//!
//! - a lecturer override always wins over the AI suggestion and is never cleared,
//! - AI feedback can only be regenerated for keys without an override, and at most
//!   one regeneration per key runs at a time,
//! - drafts can be saved any number of times,
//! - submitting is terminal: the grade is stored as final, the student is notified,
//!   and every further mutation is rejected.
//!
//! The session is shared by reference (`&self` everywhere) so independent async tasks
//! may drive it. Internal state sits behind a mutex that is never held across an await.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use util::assignment::QuestionKey;
use util::events::{AppEvent, EventBus};

use crate::error::GradingError;
use crate::file_loader::GradingSheet;
use crate::scorer::compute_grade;
use crate::traits::feedback::{FeedbackGenerator, FeedbackRequest};
use crate::traits::notifier::{GradeRecord, GradeStatus, GradeStore, StudentNotifier};
use crate::types::{AiSuggestion, GradeSummary, GradedAnswer, LecturerOverride};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Grading,
    Submitting,
    Submitted,
}

struct Inner {
    answers: Vec<GradedAnswer>,
    in_flight: HashSet<QuestionKey>,
    phase: Phase,
    last_saved: Option<DateTime<Utc>>,
}

pub struct GradingSession {
    submission_id: String,
    student_id: String,
    inner: Mutex<Inner>,
    events: Option<EventBus>,
}

/// Removes the key from the in-flight set when a regeneration ends, however it ends.
struct InFlight<'a> {
    session: &'a GradingSession,
    key: QuestionKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.lock().in_flight.remove(&self.key);
    }
}

fn check_score(score: f64) -> Result<(), GradingError> {
    if (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(GradingError::ScoreOutOfRange(score))
    }
}

impl GradingSession {
    pub fn new(
        submission_id: impl Into<String>,
        student_id: impl Into<String>,
        answers: Vec<GradedAnswer>,
    ) -> Self {
        Self {
            submission_id: submission_id.into(),
            student_id: student_id.into(),
            inner: Mutex::new(Inner {
                answers,
                in_flight: HashSet::new(),
                phase: Phase::Grading,
                last_saved: None,
            }),
            events: None,
        }
    }

    /// Builds a session from a grading sheet.
    ///
    /// Every gradable unit of the assignment gets an entry, in assignment order. Units
    /// the student left blank get an empty answer with no AI suggestion.
    ///
    /// # Errors
    /// - [`GradingError::UnknownQuestion`] if an answer addresses a key that is not a
    ///   gradable unit of the assignment.
    /// - [`GradingError::ScoreOutOfRange`] if any recorded score is outside 0..=100.
    pub fn from_sheet(sheet: GradingSheet) -> Result<Self, GradingError> {
        let mut by_key = HashMap::new();
        for a in sheet.answers {
            if sheet.assignment.max_marks_for(&a.key).is_none() {
                return Err(GradingError::UnknownQuestion(a.key.to_string()));
            }
            for s in [a.ai_score, a.lecturer_score].into_iter().flatten() {
                check_score(s)?;
            }
            by_key.insert(a.key.clone(), a);
        }

        let answers = sheet
            .assignment
            .gradable_units()
            .into_iter()
            .map(|unit| {
                let sheet_answer = by_key.remove(&unit.key);
                let (text, ai, lecturer) = match sheet_answer {
                    Some(a) => (
                        a.text,
                        a.ai_score.map(|score| AiSuggestion {
                            score,
                            feedback: a.ai_feedback.unwrap_or_default(),
                        }),
                        a.lecturer_score.map(|score| LecturerOverride {
                            score,
                            feedback: a.lecturer_feedback.unwrap_or_default(),
                        }),
                    ),
                    None => (String::new(), None, None),
                };
                GradedAnswer {
                    key: unit.key,
                    max_marks: unit.max_marks,
                    text,
                    ai,
                    lecturer,
                }
            })
            .collect();

        Ok(Self::new(sheet.submission_id, sheet.student_id, answers))
    }

    /// Publishes `GradeSubmitted` on `events` when the grade is submitted.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.lock().last_saved
    }

    pub fn answers(&self) -> Vec<GradedAnswer> {
        self.lock().answers.clone()
    }

    pub fn answer(&self, key: &QuestionKey) -> Option<GradedAnswer> {
        self.lock().answers.iter().find(|a| &a.key == key).cloned()
    }

    pub fn summary(&self) -> GradeSummary {
        compute_grade(&self.lock().answers)
    }

    pub fn is_regenerating(&self, key: &QuestionKey) -> bool {
        self.lock().in_flight.contains(key)
    }

    fn ensure_editable(inner: &Inner) -> Result<(), GradingError> {
        match inner.phase {
            Phase::Grading => Ok(()),
            Phase::Submitting | Phase::Submitted => Err(GradingError::AlreadySubmitted),
        }
    }

    /// Sets the lecturer feedback and score for `key`.
    ///
    /// Overrides can be replaced by later overrides but never removed.
    pub fn override_score(
        &self,
        key: &QuestionKey,
        feedback: impl Into<String>,
        score: f64,
    ) -> Result<(), GradingError> {
        check_score(score)?;
        let mut inner = self.lock();
        Self::ensure_editable(&inner)?;
        let answer = inner
            .answers
            .iter_mut()
            .find(|a| &a.key == key)
            .ok_or_else(|| GradingError::UnknownQuestion(key.to_string()))?;

        answer.lecturer = Some(LecturerOverride {
            score,
            feedback: feedback.into(),
        });
        tracing::debug!(submission_id = %self.submission_id, question_key = %key, score, "lecturer override set");
        Ok(())
    }

    /// Replaces the AI suggestion for `key` with a freshly generated one.
    ///
    /// # Errors
    /// - [`GradingError::OverrideExists`] if the key has a lecturer override, either
    ///   before the call or by the time the generator answers.
    /// - [`GradingError::RegenerationInFlight`] if another regeneration for the key has
    ///   not finished.
    /// - Whatever the generator returns; the previous suggestion is kept in that case.
    pub async fn regenerate_ai_feedback(
        &self,
        key: &QuestionKey,
        generator: &dyn FeedbackGenerator,
    ) -> Result<AiSuggestion, GradingError> {
        let request = {
            let mut inner = self.lock();
            Self::ensure_editable(&inner)?;
            let answer = inner
                .answers
                .iter()
                .find(|a| &a.key == key)
                .ok_or_else(|| GradingError::UnknownQuestion(key.to_string()))?;
            if answer.is_overridden() {
                return Err(GradingError::OverrideExists(key.to_string()));
            }
            let request = FeedbackRequest {
                submission_id: self.submission_id.clone(),
                key: key.clone(),
                answer_text: answer.text.clone(),
                max_marks: answer.max_marks,
                previous_score: answer.ai.as_ref().map(|s| s.score),
            };
            if !inner.in_flight.insert(key.clone()) {
                return Err(GradingError::RegenerationInFlight(key.to_string()));
            }
            request
        };
        let _guard = InFlight {
            session: self,
            key: key.clone(),
        };

        let suggestion = match generator.regenerate(&request).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(submission_id = %self.submission_id, question_key = %key, error = %e, "AI feedback regeneration failed");
                return Err(e);
            }
        };
        check_score(suggestion.score)?;

        {
            let mut inner = self.lock();
            Self::ensure_editable(&inner)?;
            let answer = inner
                .answers
                .iter_mut()
                .find(|a| &a.key == key)
                .ok_or_else(|| GradingError::UnknownQuestion(key.to_string()))?;
            if answer.is_overridden() {
                return Err(GradingError::OverrideExists(key.to_string()));
            }
            answer.ai = Some(suggestion.clone());
        }
        Ok(suggestion)
    }

    fn record(&self, status: GradeStatus) -> GradeRecord {
        let inner = self.lock();
        GradeRecord {
            submission_id: self.submission_id.clone(),
            student_id: self.student_id.clone(),
            status,
            summary: compute_grade(&inner.answers),
            answers: inner.answers.clone(),
        }
    }

    /// Stores the current state as a draft and returns the save time.
    pub async fn save_draft(&self, store: &dyn GradeStore) -> Result<DateTime<Utc>, GradingError> {
        Self::ensure_editable(&self.lock())?;
        let record = self.record(GradeStatus::Draft);
        store.save_grade(&record).await?;

        let now = Utc::now();
        self.lock().last_saved = Some(now);
        tracing::info!(submission_id = %self.submission_id, percentage = record.summary.percentage, "grade saved as draft");
        Ok(now)
    }

    /// Stores the grade as final and notifies the student.
    ///
    /// Mutations are refused from the moment submission starts. If the store rejects
    /// the grade the session returns to `Grading`. Once stored, the session is
    /// `Submitted` for good; a failed notification is logged but does not undo it.
    pub async fn submit(
        &self,
        store: &dyn GradeStore,
        notifier: &dyn StudentNotifier,
    ) -> Result<GradeSummary, GradingError> {
        {
            let mut inner = self.lock();
            Self::ensure_editable(&inner)?;
            inner.phase = Phase::Submitting;
        }
        let record = self.record(GradeStatus::Final);

        if let Err(e) = store.save_grade(&record).await {
            self.lock().phase = Phase::Grading;
            tracing::error!(submission_id = %self.submission_id, error = %e, "failed to submit grade");
            return Err(e);
        }
        {
            let mut inner = self.lock();
            inner.phase = Phase::Submitted;
            inner.last_saved = Some(Utc::now());
        }

        if let Err(e) = notifier.notify_grade_released(&record).await {
            tracing::warn!(submission_id = %self.submission_id, student_id = %self.student_id, error = %e, "grade submitted but student notification failed");
        }

        if let Some(events) = &self.events {
            events.publish(AppEvent::GradeSubmitted {
                submission_id: self.submission_id.clone(),
                percentage: record.summary.percentage,
                letter: record.summary.letter.to_string(),
            });
        }

        tracing::info!(
            submission_id = %self.submission_id,
            scored = record.summary.scored,
            total = record.summary.total,
            letter = %record.summary.letter,
            "grade submitted"
        );
        Ok(record.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::template_feedback::TemplateFeedback;
    use crate::file_loader::SheetAnswer;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::Notify;
    use util::assignment::{Assignment, Question};

    fn answer(id: &str, max_marks: u32, ai_score: f64) -> GradedAnswer {
        GradedAnswer {
            key: QuestionKey::question(id),
            max_marks,
            text: "Normalization reduces redundancy.".into(),
            ai: Some(AiSuggestion {
                score: ai_score,
                feedback: "Good explanation.".into(),
            }),
            lecturer: None,
        }
    }

    fn single() -> GradingSession {
        GradingSession::new("sub-1", "stu-1", vec![answer("q1", 20, 90.0)])
    }

    #[derive(Default)]
    struct Recorder {
        saved: Mutex<Vec<GradeStatus>>,
        notified: Mutex<u32>,
        fail_store: bool,
        fail_notify: bool,
    }

    #[async_trait]
    impl GradeStore for Recorder {
        async fn save_grade(&self, record: &GradeRecord) -> Result<(), GradingError> {
            if self.fail_store {
                return Err(GradingError::Collaborator("backend down".into()));
            }
            self.saved.lock().unwrap().push(record.status);
            Ok(())
        }
    }

    #[async_trait]
    impl StudentNotifier for Recorder {
        async fn notify_grade_released(&self, _record: &GradeRecord) -> Result<(), GradingError> {
            if self.fail_notify {
                return Err(GradingError::Collaborator("smtp down".into()));
            }
            *self.notified.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct Blocking {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl FeedbackGenerator for Blocking {
        async fn regenerate(&self, _r: &FeedbackRequest) -> Result<AiSuggestion, GradingError> {
            self.release.notified().await;
            Ok(AiSuggestion {
                score: 75.0,
                feedback: "fresh".into(),
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl FeedbackGenerator for Failing {
        async fn regenerate(&self, _r: &FeedbackRequest) -> Result<AiSuggestion, GradingError> {
            Err(GradingError::Collaborator("model unavailable".into()))
        }
    }

    /// 90 on a 20 mark question is 18.0; overriding to 70 gives 14.0.
    #[test]
    fn override_replaces_ai_score_in_total() {
        let s = single();
        let g = s.summary();
        assert_eq!((g.scored, g.percentage), (18.0, 90));

        s.override_score(&QuestionKey::question("q1"), "Missing 3NF example.", 70.0)
            .unwrap();
        let g = s.summary();
        assert_eq!((g.scored, g.percentage), (14.0, 70));
        assert_eq!(
            s.answer(&QuestionKey::question("q1")).unwrap().displayed_feedback(),
            Some("Missing 3NF example.")
        );
    }

    #[tokio::test]
    async fn regeneration_is_rejected_after_override() {
        let s = single();
        let key = QuestionKey::question("q1");
        s.override_score(&key, "ok", 50.0).unwrap();

        let err = s.regenerate_ai_feedback(&key, &TemplateFeedback).await.unwrap_err();
        assert!(matches!(err, GradingError::OverrideExists(_)));
        assert_eq!(s.answer(&key).unwrap().effective_score(), 50.0);
    }

    #[test]
    fn override_validates_score_and_key() {
        let s = single();
        assert!(matches!(
            s.override_score(&QuestionKey::question("q1"), "x", 101.0),
            Err(GradingError::ScoreOutOfRange(_))
        ));
        assert!(matches!(
            s.override_score(&QuestionKey::question("q9"), "x", 10.0),
            Err(GradingError::UnknownQuestion(_))
        ));
    }

    #[tokio::test]
    async fn regeneration_replaces_suggestion() {
        let s = single();
        let key = QuestionKey::question("q1");
        let fresh = s.regenerate_ai_feedback(&key, &TemplateFeedback).await.unwrap();
        assert_eq!(fresh.score, 90.0);
        assert!(s.answer(&key).unwrap().ai.unwrap().feedback.starts_with("Regenerated"));
        assert!(!s.is_regenerating(&key));
    }

    #[tokio::test]
    async fn concurrent_regeneration_for_same_key_is_rejected() {
        let s = Arc::new(single());
        let key = QuestionKey::question("q1");
        let release = Arc::new(Notify::new());
        let generator = Arc::new(Blocking {
            release: release.clone(),
        });

        let first = {
            let s = s.clone();
            let key = key.clone();
            let generator = generator.clone();
            tokio::spawn(async move { s.regenerate_ai_feedback(&key, generator.as_ref()).await })
        };
        while !s.is_regenerating(&key) {
            tokio::task::yield_now().await;
        }

        let second = s.regenerate_ai_feedback(&key, generator.as_ref()).await;
        assert!(matches!(second, Err(GradingError::RegenerationInFlight(_))));

        release.notify_one();
        let fresh = first.await.unwrap().unwrap();
        assert_eq!(fresh.score, 75.0);
        assert!(!s.is_regenerating(&key));
        assert_eq!(s.answer(&key).unwrap().effective_score(), 75.0);
    }

    #[tokio::test]
    async fn failed_regeneration_keeps_previous_suggestion() {
        let s = single();
        let key = QuestionKey::question("q1");
        assert!(s.regenerate_ai_feedback(&key, &Failing).await.is_err());

        let a = s.answer(&key).unwrap();
        assert_eq!(a.ai.unwrap().feedback, "Good explanation.");
        assert!(!s.is_regenerating(&key));
    }

    #[tokio::test]
    async fn submit_is_terminal_and_notifies_once() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let s = single().with_events(bus);
        let rec = Recorder::default();

        s.save_draft(&rec).await.unwrap();
        let summary = s.submit(&rec, &rec).await.unwrap();
        assert_eq!(summary.percentage, 90);
        assert_eq!(s.phase(), Phase::Submitted);
        assert_eq!(*rec.saved.lock().unwrap(), vec![GradeStatus::Draft, GradeStatus::Final]);
        assert_eq!(*rec.notified.lock().unwrap(), 1);

        assert!(matches!(
            s.override_score(&QuestionKey::question("q1"), "late", 10.0),
            Err(GradingError::AlreadySubmitted)
        ));
        assert!(matches!(s.submit(&rec, &rec).await, Err(GradingError::AlreadySubmitted)));
        assert!(matches!(s.save_draft(&rec).await, Err(GradingError::AlreadySubmitted)));
        assert_eq!(*rec.notified.lock().unwrap(), 1);

        assert_eq!(
            rx.recv().await.unwrap(),
            AppEvent::GradeSubmitted {
                submission_id: "sub-1".into(),
                percentage: 90,
                letter: "A+".into(),
            }
        );
    }

    #[tokio::test]
    async fn store_failure_leaves_session_editable() {
        let s = single();
        let rec = Recorder {
            fail_store: true,
            ..Default::default()
        };
        assert!(s.submit(&rec, &rec).await.is_err());
        assert_eq!(s.phase(), Phase::Grading);
        assert_eq!(*rec.notified.lock().unwrap(), 0);
        s.override_score(&QuestionKey::question("q1"), "fine", 60.0).unwrap();
    }

    #[tokio::test]
    async fn notification_failure_does_not_undo_submission() {
        let s = single();
        let rec = Recorder {
            fail_notify: true,
            ..Default::default()
        };
        assert!(s.submit(&rec, &rec).await.is_ok());
        assert_eq!(s.phase(), Phase::Submitted);
    }

    fn sheet(answers: Vec<SheetAnswer>) -> GradingSheet {
        GradingSheet {
            submission_id: "sub-2".into(),
            student_id: "stu-2".into(),
            assignment: Assignment {
                id: "a1".into(),
                title: "Keys".into(),
                course_id: "c1".into(),
                questions: vec![
                    Question {
                        id: "q1".into(),
                        number: 1,
                        text: "Primary keys".into(),
                        marks: 10,
                        sub_questions: vec![],
                    },
                    Question {
                        id: "q2".into(),
                        number: 2,
                        text: "Foreign keys".into(),
                        marks: 10,
                        sub_questions: vec![],
                    },
                ],
            },
            answers,
        }
    }

    fn sheet_answer(id: &str, ai_score: Option<f64>) -> SheetAnswer {
        SheetAnswer {
            key: QuestionKey::question(id),
            text: "answer".into(),
            ai_score,
            ai_feedback: None,
            lecturer_score: None,
            lecturer_feedback: None,
        }
    }

    #[test]
    fn from_sheet_fills_blank_units() {
        let s = GradingSession::from_sheet(sheet(vec![sheet_answer("q1", Some(100.0))])).unwrap();
        let answers = s.answers();
        assert_eq!(answers.len(), 2);
        assert!(answers[1].ai.is_none());
        let g = s.summary();
        assert_eq!((g.scored, g.total, g.percentage), (10.0, 20, 50));
    }

    #[test]
    fn from_sheet_rejects_unknown_keys() {
        let err = GradingSession::from_sheet(sheet(vec![sheet_answer("q7", Some(1.0))]));
        assert!(matches!(err, Err(GradingError::UnknownQuestion(k)) if k == "q7"));
    }
}
