//! Lecturer review queue for submissions flagged by the plagiarism checker.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Reverse;
use std::str::FromStr;

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewStatus {
    PendingReview,
    Reviewed,
    FalsePositive,
    Confirmed,
}

impl FromStr for ReviewStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending-review" => Ok(ReviewStatus::PendingReview),
            "reviewed" => Ok(ReviewStatus::Reviewed),
            "false-positive" => Ok(ReviewStatus::FalsePositive),
            "confirmed" => Ok(ReviewStatus::Confirmed),
            other => Err(ServiceError::Validation(format!("unknown review status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// critical ≥ 40, high 30–39, medium 20–29, otherwise low.
    pub fn of(score: u32) -> Self {
        match score {
            40.. => Severity::Critical,
            30..=39 => Severity::High,
            20..=29 => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.fZ"];

fn parse_when(raw: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw.trim(), f).ok())
}

fn de_when<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(d)?;
    parse_when(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{raw}'")))
}

fn de_when_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
    match Option::<String>::deserialize(d)? {
        None => Ok(None),
        Some(raw) => parse_when(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{raw}'"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: String,
    pub name: String,
    pub student_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub module: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSource {
    pub source: String,
    pub percentage: u32,
    #[serde(rename = "type", default)]
    pub match_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedSubmission {
    pub id: String,
    pub student: StudentRef,
    pub assignment: AssignmentRef,
    #[serde(deserialize_with = "de_when")]
    pub submitted_at: NaiveDateTime,
    pub plagiarism_score: u32,
    #[serde(default)]
    pub previous_score: Option<u32>,
    pub status: ReviewStatus,
    #[serde(default)]
    pub sources_checked: u32,
    #[serde(default)]
    pub matches_found: u32,
    #[serde(default)]
    pub top_matches: Vec<MatchedSource>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default, deserialize_with = "de_when_opt")]
    pub reviewed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl FlaggedSubmission {
    pub fn severity(&self) -> Severity {
        Severity::of(self.plagiarism_score)
    }

    /// Change against the previous check, if there was one.
    pub fn trend(&self) -> Option<i64> {
        self.previous_score
            .map(|prev| i64::from(self.plagiarism_score) - i64::from(prev))
    }

    /// Matched sources, highest percentage first.
    pub fn ranked_matches(&self) -> Vec<&MatchedSource> {
        let mut matches: Vec<_> = self.top_matches.iter().collect();
        matches.sort_by_key(|m| Reverse(m.percentage));
        matches
    }

    fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.student.name.to_lowercase().contains(needle)
            || self.student.student_id.to_lowercase().contains(needle)
            || self.assignment.title.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Score,
    Date,
    Matches,
}

impl FromStr for SortBy {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score" => Ok(SortBy::Score),
            "date" => Ok(SortBy::Date),
            "matches" => Ok(SortBy::Matches),
            other => Err(ServiceError::Validation(format!("unknown sort '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReviewQuery {
    pub search: String,
    pub status: Option<ReviewStatus>,
    pub severity: Option<Severity>,
    pub sort_by: SortBy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: usize,
    pub pending_review: usize,
    pub confirmed: usize,
    pub false_positive: usize,
    pub reviewed: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
}

/// Outcome a lecturer can record for a pending case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    Confirmed,
    FalsePositive,
    Reviewed,
}

impl From<ReviewOutcome> for ReviewStatus {
    fn from(o: ReviewOutcome) -> Self {
        match o {
            ReviewOutcome::Confirmed => ReviewStatus::Confirmed,
            ReviewOutcome::FalsePositive => ReviewStatus::FalsePositive,
            ReviewOutcome::Reviewed => ReviewStatus::Reviewed,
        }
    }
}

pub struct ReviewQueue {
    cases: Vec<FlaggedSubmission>,
}

impl ReviewQueue {
    pub fn new(cases: Vec<FlaggedSubmission>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[FlaggedSubmission] {
        &self.cases
    }

    pub fn get(&self, id: &str) -> Option<&FlaggedSubmission> {
        self.cases.iter().find(|c| c.id == id)
    }

    /// Cases matching `query`, sorted descending by the chosen key. The sort is stable.
    pub fn query(&self, query: &ReviewQuery) -> Vec<&FlaggedSubmission> {
        let needle = query.search.trim().to_lowercase();
        let mut hits: Vec<_> = self
            .cases
            .iter()
            .filter(|c| c.matches_search(&needle))
            .filter(|c| query.status.is_none_or(|s| c.status == s))
            .filter(|c| query.severity.is_none_or(|s| c.severity() == s))
            .collect();

        match query.sort_by {
            SortBy::Score => hits.sort_by_key(|c| Reverse(c.plagiarism_score)),
            SortBy::Date => hits.sort_by_key(|c| Reverse(c.submitted_at)),
            SortBy::Matches => hits.sort_by_key(|c| Reverse(c.matches_found)),
        }
        hits
    }

    pub fn stats(&self) -> ReviewStats {
        let mut stats = ReviewStats {
            total: self.cases.len(),
            ..Default::default()
        };
        for c in &self.cases {
            match c.status {
                ReviewStatus::PendingReview => stats.pending_review += 1,
                ReviewStatus::Confirmed => stats.confirmed += 1,
                ReviewStatus::FalsePositive => stats.false_positive += 1,
                ReviewStatus::Reviewed => stats.reviewed += 1,
            }
            match c.severity() {
                Severity::Critical => stats.critical += 1,
                Severity::High => stats.high += 1,
                Severity::Medium => stats.medium += 1,
                Severity::Low => {}
            }
        }
        stats
    }

    /// Records a review. Only pending cases can be reviewed.
    pub fn review(
        &mut self,
        id: &str,
        outcome: ReviewOutcome,
        reviewer: &str,
        notes: Option<String>,
        now: NaiveDateTime,
    ) -> ServiceResult<&FlaggedSubmission> {
        let case = self
            .cases
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("flagged submission {id}")))?;
        if case.status != ReviewStatus::PendingReview {
            return Err(ServiceError::Refused(format!("submission {id} has already been reviewed")));
        }

        case.status = outcome.into();
        case.reviewed_by = Some(reviewer.to_string());
        case.reviewed_at = Some(now);
        if notes.is_some() {
            case.notes = notes;
        }
        tracing::info!(case_id = id, reviewer, status = ?case.status, "plagiarism case reviewed");
        Ok(case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, name: &str, score: u32, matches: u32, when: &str, status: ReviewStatus) -> FlaggedSubmission {
        FlaggedSubmission {
            id: id.into(),
            student: StudentRef {
                id: format!("stu-{id}"),
                name: name.into(),
                student_id: format!("STU00{id}"),
            },
            assignment: AssignmentRef {
                id: "a1".into(),
                title: "Database Design and Normalization".into(),
                module: "CS3001".into(),
            },
            submitted_at: parse_when(when).unwrap(),
            plagiarism_score: score,
            previous_score: None,
            status,
            sources_checked: 1000,
            matches_found: matches,
            top_matches: vec![],
            reviewed_by: None,
            reviewed_at: None,
            notes: None,
        }
    }

    fn queue() -> ReviewQueue {
        ReviewQueue::new(vec![
            case("1", "David Brown", 28, 7, "2025-01-08 19:20", ReviewStatus::PendingReview),
            case("2", "Emma Wilson", 45, 12, "2025-01-05 10:00", ReviewStatus::Confirmed),
            case("3", "Liam Chen", 32, 3, "2025-01-09 08:00", ReviewStatus::PendingReview),
            case("4", "Ava Patel", 12, 9, "2025-01-02 12:00", ReviewStatus::FalsePositive),
        ])
    }

    #[test]
    fn severity_bands() {
        assert_eq!(Severity::of(40), Severity::Critical);
        assert_eq!(Severity::of(39), Severity::High);
        assert_eq!(Severity::of(30), Severity::High);
        assert_eq!(Severity::of(29), Severity::Medium);
        assert_eq!(Severity::of(20), Severity::Medium);
        assert_eq!(Severity::of(19), Severity::Low);
    }

    #[test]
    fn sorting_and_filtering() {
        let q = queue();
        let ids = |v: Vec<&FlaggedSubmission>| v.iter().map(|c| c.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(q.query(&ReviewQuery::default())), ["2", "3", "1", "4"]);
        let by_date = ReviewQuery {
            sort_by: SortBy::Date,
            ..Default::default()
        };
        assert_eq!(ids(q.query(&by_date)), ["3", "1", "2", "4"]);
        let by_matches = ReviewQuery {
            sort_by: SortBy::Matches,
            ..Default::default()
        };
        assert_eq!(ids(q.query(&by_matches)), ["2", "4", "1", "3"]);

        let pending_high = ReviewQuery {
            status: Some(ReviewStatus::PendingReview),
            severity: Some(Severity::High),
            ..Default::default()
        };
        assert_eq!(ids(q.query(&pending_high)), ["3"]);

        let search = ReviewQuery {
            search: "stu004".into(),
            ..Default::default()
        };
        assert_eq!(ids(q.query(&search)), ["4"]);
    }

    #[test]
    fn stats_count_status_and_severity() {
        let s = queue().stats();
        assert_eq!(s.total, 4);
        assert_eq!(s.pending_review, 2);
        assert_eq!(s.confirmed, 1);
        assert_eq!(s.false_positive, 1);
        assert_eq!((s.critical, s.high, s.medium), (1, 1, 1));
    }

    #[test]
    fn review_only_from_pending() {
        let mut q = queue();
        let now = parse_when("2025-01-10 09:00").unwrap();

        let reviewed = q
            .review("1", ReviewOutcome::FalsePositive, "Dr. Smith", Some("Common phrasing".into()), now)
            .unwrap();
        assert_eq!(reviewed.status, ReviewStatus::FalsePositive);
        assert_eq!(reviewed.reviewed_by.as_deref(), Some("Dr. Smith"));
        assert_eq!(reviewed.reviewed_at, Some(now));

        assert!(matches!(
            q.review("1", ReviewOutcome::Confirmed, "Dr. Smith", None, now),
            Err(ServiceError::Refused(_))
        ));
        assert!(matches!(
            q.review("x", ReviewOutcome::Confirmed, "Dr. Smith", None, now),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn decodes_and_ranks_matches() {
        let raw = r#"{
            "id": "s1",
            "student": { "id": "stu1", "name": "David Brown", "studentId": "STU004" },
            "assignment": { "id": "a1", "title": "Normalization", "module": "CS3001" },
            "submittedAt": "2025-01-08 19:20",
            "plagiarismScore": 28,
            "previousScore": 15,
            "status": "pending-review",
            "sourcesChecked": 1350,
            "matchesFound": 7,
            "topMatches": [
                { "source": "Course notes", "percentage": 8, "type": "Academic" },
                { "source": "Wikipedia", "percentage": 12, "type": "Web", "url": "https://en.wikipedia.org" }
            ]
        }"#;
        let c: FlaggedSubmission = serde_json::from_str(raw).unwrap();
        assert_eq!(c.trend(), Some(13));
        assert_eq!(c.ranked_matches()[0].source, "Wikipedia");
        assert_eq!(c.severity(), Severity::Medium);
    }
}
