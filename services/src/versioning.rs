//! Append-only version history of a student submission.
//!
//! Every save produces a new immutable [`Version`] numbered one past the last.
//! At most one version is `submitted`; earlier versions are drafts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use util::assignment::QuestionKey;
use util::events::{AppEvent, EventBus};

use crate::analysis::AnswerAnalysis;
use crate::error::{ServiceError, ServiceResult};
use crate::traits::VersionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionAnswer {
    pub key: QuestionKey,
    pub text: String,
    pub word_count: usize,
    #[serde(default)]
    pub analysis: Option<AnswerAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub number: u32,
    pub created_at: DateTime<Utc>,
    pub word_count: usize,
    pub plagiarism_score: u32,
    pub ai_score: u32,
    pub ai_feedback: String,
    pub answers: Vec<VersionAnswer>,
    pub status: VersionStatus,
}

impl Version {
    pub fn answer(&self, key: &QuestionKey) -> Option<&VersionAnswer> {
        self.answers.iter().find(|a| &a.key == key)
    }

    fn has_content(&self) -> bool {
        self.answers.iter().any(|a| a.word_count > 0)
    }
}

/// Whitespace-separated words, ignoring empty runs.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn mean_rounded(values: &[f64]) -> u32 {
    if values.is_empty() {
        return 0;
    }
    (values.iter().sum::<f64>() / values.len() as f64).round() as u32
}

/// Builds version `number` from the current answer texts and the analyses known so far.
///
/// Scores are the rounded means over analysed answers only; with none analysed they are 0.
/// The feedback summary is the most recently produced analysis feedback.
pub fn create_version(
    number: u32,
    answers: &[(QuestionKey, String)],
    analyses: &HashMap<QuestionKey, AnswerAnalysis>,
    now: DateTime<Utc>,
) -> Version {
    let answers: Vec<VersionAnswer> = answers
        .iter()
        .map(|(key, text)| VersionAnswer {
            key: key.clone(),
            text: text.clone(),
            word_count: word_count(text),
            analysis: analyses.get(key).cloned(),
        })
        .collect();

    let analysed: Vec<&AnswerAnalysis> = answers.iter().filter_map(|a| a.analysis.as_ref()).collect();
    let plagiarism: Vec<f64> = analysed.iter().map(|a| a.plagiarism_score).collect();
    let ai: Vec<f64> = analysed.iter().map(|a| a.ai_score).collect();
    let ai_feedback = analysed
        .iter()
        .max_by_key(|a| a.analyzed_at)
        .map(|a| a.ai_feedback.clone())
        .unwrap_or_default();

    Version {
        number,
        created_at: now,
        word_count: answers.iter().map(|a| a.word_count).sum(),
        plagiarism_score: mean_rounded(&plagiarism),
        ai_score: mean_rounded(&ai),
        ai_feedback,
        answers,
        status: VersionStatus::Draft,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDelta {
    pub key: QuestionKey,
    pub word_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDiff {
    pub from: u32,
    pub to: u32,
    pub word_count_delta: i64,
    pub plagiarism_delta: i64,
    pub ai_score_delta: i64,
    /// One entry per question key present in either version; a missing answer counts as 0 words.
    pub answers: Vec<AnswerDelta>,
}

/// `to − from` for every metric. Swapping the arguments negates every delta.
pub fn diff(from: &Version, to: &Version) -> VersionDiff {
    let mut words: BTreeMap<&QuestionKey, (i64, i64)> = BTreeMap::new();
    for a in &from.answers {
        words.entry(&a.key).or_default().0 = a.word_count as i64;
    }
    for a in &to.answers {
        words.entry(&a.key).or_default().1 = a.word_count as i64;
    }

    VersionDiff {
        from: from.number,
        to: to.number,
        word_count_delta: to.word_count as i64 - from.word_count as i64,
        plagiarism_delta: i64::from(to.plagiarism_score) - i64::from(from.plagiarism_score),
        ai_score_delta: i64::from(to.ai_score) - i64::from(from.ai_score),
        answers: words
            .into_iter()
            .map(|(key, (before, after))| AnswerDelta {
                key: key.clone(),
                word_delta: after - before,
            })
            .collect(),
    }
}

/// Diff of two versions in history order: always later − earlier.
pub fn compare(a: &Version, b: &Version) -> VersionDiff {
    if a.number <= b.number { diff(a, b) } else { diff(b, a) }
}

pub struct SubmissionHistory {
    submission_id: String,
    versions: Vec<Version>,
    events: Option<EventBus>,
}

impl SubmissionHistory {
    pub fn new(submission_id: impl Into<String>) -> Self {
        Self {
            submission_id: submission_id.into(),
            versions: Vec::new(),
            events: None,
        }
    }

    /// Restores a history fetched from the backend. Versions are sorted by number.
    /// Duplicate numbers and more than one submitted version are rejected.
    pub fn from_versions(submission_id: impl Into<String>, mut versions: Vec<Version>) -> ServiceResult<Self> {
        versions.sort_by_key(|v| v.number);
        if versions.first().is_some_and(|v| v.number == 0)
            || versions.windows(2).any(|w| w[0].number == w[1].number)
        {
            return Err(ServiceError::Validation("version numbers must be unique and start at 1".into()));
        }
        if versions.iter().filter(|v| v.status == VersionStatus::Submitted).count() > 1 {
            return Err(ServiceError::Validation("at most one version can be submitted".into()));
        }
        Ok(Self {
            submission_id: submission_id.into(),
            versions,
            events: None,
        })
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn get(&self, number: u32) -> Option<&Version> {
        self.versions.iter().find(|v| v.number == number)
    }

    pub fn latest(&self) -> Option<&Version> {
        self.versions.last()
    }

    pub fn next_number(&self) -> u32 {
        self.latest().map_or(1, |v| v.number + 1)
    }

    /// The highest submitted version, else the highest version overall.
    pub fn current(&self) -> Option<&Version> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.status == VersionStatus::Submitted)
            .or_else(|| self.latest())
    }

    /// Creates the next version and appends it once the store has accepted it, so a
    /// failed save leaves no gap in the numbering.
    pub async fn save_version(
        &mut self,
        store: &dyn VersionStore,
        answers: &[(QuestionKey, String)],
        analyses: &HashMap<QuestionKey, AnswerAnalysis>,
    ) -> ServiceResult<&Version> {
        let version = create_version(self.next_number(), answers, analyses, Utc::now());
        store
            .save_version(&self.submission_id, &version)
            .await
            .inspect_err(|e| tracing::error!(submission_id = %self.submission_id, error = %e, "failed to save version"))?;

        let number = version.number;
        self.versions.push(version);
        if let Some(events) = &self.events {
            events.publish(AppEvent::VersionSaved {
                submission_id: self.submission_id.clone(),
                version: number,
            });
        }
        tracing::info!(submission_id = %self.submission_id, version = number, "version saved");
        Ok(&self.versions[self.versions.len() - 1])
    }

    /// Submits the newest version. Any earlier submitted version reverts to draft.
    pub async fn submit(&mut self, store: &dyn VersionStore) -> ServiceResult<u32> {
        let latest = self
            .latest()
            .ok_or_else(|| ServiceError::Validation("Nothing to submit: save a version first".into()))?;
        if !latest.has_content() {
            return Err(ServiceError::Validation(
                "Please answer at least one question before submitting".into(),
            ));
        }
        let number = latest.number;

        store
            .submit_version(&self.submission_id, number)
            .await
            .inspect_err(|e| tracing::error!(submission_id = %self.submission_id, error = %e, "failed to submit version"))?;

        for v in &mut self.versions {
            v.status = if v.number == number {
                VersionStatus::Submitted
            } else {
                VersionStatus::Draft
            };
        }
        tracing::info!(submission_id = %self.submission_id, version = number, "version submitted");
        Ok(number)
    }
}
