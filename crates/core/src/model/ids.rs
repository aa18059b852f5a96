use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a Course
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(u64);

impl CourseId {
    /// Creates a new `CourseId`
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a learner (the signed-in cleaner or admin)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LearnerId(u64);

impl LearnerId {
    /// Creates a new `LearnerId`
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a job posting
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(u64);

impl JobId {
    /// Creates a new `JobId`
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a job application
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(u64);

impl ApplicationId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Position of a question inside a course: `(section index, question index)`.
///
/// Renders as `"<section>_<question>"`, the key format of the persisted
/// answer map.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionKey {
    pub section: usize,
    pub question: usize,
}

impl QuestionKey {
    #[must_use]
    pub fn new(section: usize, question: usize) -> Self {
        Self { section, question }
    }
}

impl fmt::Debug for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourseId({})", self.0)
    }
}

impl fmt::Debug for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LearnerId({})", self.0)
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl fmt::Debug for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApplicationId({})", self.0)
    }
}

impl fmt::Debug for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionKey({}_{})", self.section, self.question)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.section, self.question)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for CourseId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(CourseId::new)
            .map_err(|_| ParseIdError { kind: "CourseId" })
    }
}

impl FromStr for LearnerId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(LearnerId::new)
            .map_err(|_| ParseIdError { kind: "LearnerId" })
    }
}

impl FromStr for JobId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(JobId::new)
            .map_err(|_| ParseIdError { kind: "JobId" })
    }
}

impl FromStr for ApplicationId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ApplicationId::new)
            .map_err(|_| ParseIdError {
                kind: "ApplicationId",
            })
    }
}

impl FromStr for QuestionKey {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdError {
            kind: "QuestionKey",
        };
        let (section, question) = s.split_once('_').ok_or_else(err)?;
        Ok(QuestionKey {
            section: section.parse().map_err(|_| err())?,
            question: question.parse().map_err(|_| err())?,
        })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_id_display() {
        let id = CourseId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn course_id_from_str_invalid() {
        assert!("not-a-number".parse::<CourseId>().is_err());
    }

    #[test]
    fn learner_id_from_str_trims() {
        let id: LearnerId = " 7 ".parse().unwrap();
        assert_eq!(id, LearnerId::new(7));
    }

    #[test]
    fn job_id_round_trips_through_str() {
        let id: JobId = "12".parse().unwrap();
        assert_eq!(id, JobId::new(12));
        assert_eq!(id.to_string(), "12");
        assert!("-1".parse::<ApplicationId>().is_err());
    }

    #[test]
    fn question_key_uses_underscore_form() {
        let key = QuestionKey::new(1, 3);
        assert_eq!(key.to_string(), "1_3");
        assert_eq!("1_3".parse::<QuestionKey>().unwrap(), key);
    }

    #[test]
    fn question_key_rejects_malformed() {
        assert!("13".parse::<QuestionKey>().is_err());
        assert!("a_1".parse::<QuestionKey>().is_err());
        assert!("1_".parse::<QuestionKey>().is_err());
    }

    #[test]
    fn question_keys_order_by_section_then_question() {
        let mut keys = vec![
            QuestionKey::new(1, 0),
            QuestionKey::new(0, 2),
            QuestionKey::new(0, 1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                QuestionKey::new(0, 1),
                QuestionKey::new(0, 2),
                QuestionKey::new(1, 0)
            ]
        );
    }
}
