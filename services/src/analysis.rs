//! Debounced per-answer analysis.
//!
//! Each edit to an answer cancels the analysis pending for that answer and schedules a
//! new one after a fixed delay, so only the last edit inside the window is scored.
//! Results are kept per question key. A failed analysis leaves the previous result in
//! place and marks the key as failed until [`AnalysisScheduler::retry`] succeeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use util::assignment::QuestionKey;
use util::config;

use crate::error::{ServiceError, ServiceResult};
use crate::traits::AnswerAnalyzer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAnalysis {
    pub plagiarism_score: f64,
    pub ai_score: f64,
    pub ai_feedback: String,
    pub analyzed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    /// Waiting for the debounce window to close.
    Pending,
    Running,
    Done,
    /// The text is below the minimum length; nothing was sent.
    TooShort,
    /// The last attempt failed. Any earlier result is still available.
    Failed { error: String },
}

#[derive(Default)]
struct Shared {
    texts: HashMap<QuestionKey, String>,
    pending: HashMap<QuestionKey, JoinHandle<()>>,
    generation: HashMap<QuestionKey, u64>,
    states: HashMap<QuestionKey, AnalysisState>,
    results: HashMap<QuestionKey, AnswerAnalysis>,
}

pub struct AnalysisScheduler {
    analyzer: Arc<dyn AnswerAnalyzer>,
    delay: Duration,
    min_chars: usize,
    shared: Arc<Mutex<Shared>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AnalysisScheduler {
    pub fn new(analyzer: Arc<dyn AnswerAnalyzer>, delay: Duration, min_chars: usize) -> Self {
        Self {
            analyzer,
            delay,
            min_chars,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Uses `ANALYSIS_DEBOUNCE_MS` and `MIN_ANALYSIS_CHARS` from the global config.
    pub fn from_config(analyzer: Arc<dyn AnswerAnalyzer>) -> Self {
        Self::new(
            analyzer,
            Duration::from_millis(config::analysis_debounce_ms()),
            config::min_analysis_chars(),
        )
    }

    /// Records the new text for `key` and (re)starts its debounce window.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_text_changed(&self, key: QuestionKey, text: impl Into<String>) {
        let text = text.into();
        let mut shared = lock(&self.shared);
        if let Some(handle) = shared.pending.remove(&key) {
            handle.abort();
        }
        let generation = {
            let g = shared.generation.entry(key.clone()).or_insert(0);
            *g += 1;
            *g
        };
        shared.texts.insert(key.clone(), text.clone());

        if text.trim().chars().count() < self.min_chars {
            shared.states.insert(key, AnalysisState::TooShort);
            return;
        }

        shared.states.insert(key.clone(), AnalysisState::Pending);
        let handle = self.spawn(key.clone(), text, generation, self.delay);
        shared.pending.insert(key, handle);
    }

    /// Re-runs analysis for `key` immediately with its latest text.
    pub fn retry(&self, key: &QuestionKey) -> ServiceResult<()> {
        let mut shared = lock(&self.shared);
        let text = shared
            .texts
            .get(key)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("no text for {key}")))?;
        if text.trim().chars().count() < self.min_chars {
            return Err(ServiceError::Refused(format!(
                "answers shorter than {} characters are not analysed",
                self.min_chars
            )));
        }
        if let Some(handle) = shared.pending.remove(key) {
            handle.abort();
        }
        let generation = {
            let g = shared.generation.entry(key.clone()).or_insert(0);
            *g += 1;
            *g
        };
        shared.states.insert(key.clone(), AnalysisState::Pending);
        let handle = self.spawn(key.clone(), text, generation, Duration::ZERO);
        shared.pending.insert(key.clone(), handle);
        Ok(())
    }

    fn spawn(&self, key: QuestionKey, text: String, generation: u64, delay: Duration) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let analyzer = Arc::clone(&self.analyzer);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            {
                let mut s = lock(&shared);
                if s.generation.get(&key) != Some(&generation) {
                    return;
                }
                s.states.insert(key.clone(), AnalysisState::Running);
            }

            let result = analyzer.analyze(&key, &text).await;

            let mut s = lock(&shared);
            if s.generation.get(&key) != Some(&generation) {
                return;
            }
            s.pending.remove(&key);
            match result {
                Ok(analysis) => {
                    s.results.insert(key.clone(), analysis);
                    s.states.insert(key, AnalysisState::Done);
                }
                Err(e) => {
                    tracing::warn!(question_key = %key, error = %e, "answer analysis failed");
                    s.states.insert(key, AnalysisState::Failed { error: e.to_string() });
                }
            }
        })
    }

    pub fn state(&self, key: &QuestionKey) -> Option<AnalysisState> {
        lock(&self.shared).states.get(key).cloned()
    }

    pub fn result(&self, key: &QuestionKey) -> Option<AnswerAnalysis> {
        lock(&self.shared).results.get(key).cloned()
    }

    /// Every result known right now, for saving a version.
    pub fn snapshot(&self) -> HashMap<QuestionKey, AnswerAnalysis> {
        lock(&self.shared).results.clone()
    }

    /// Latest text per key, in key order.
    pub fn texts(&self) -> Vec<(QuestionKey, String)> {
        let mut texts: Vec<_> = lock(&self.shared)
            .texts
            .iter()
            .map(|(k, t)| (k.clone(), t.clone()))
            .collect();
        texts.sort_by(|a, b| a.0.cmp(&b.0));
        texts
    }

    pub fn has_pending(&self) -> bool {
        !lock(&self.shared).pending.is_empty()
    }
}

impl Drop for AnalysisScheduler {
    fn drop(&mut self) {
        for (_, handle) in lock(&self.shared).pending.drain() {
            handle.abort();
        }
    }
}
