use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, LearnerId, QuestionKey};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressRecordError {
    #[error("completed progress must have a completion time")]
    MissingCompletedAt,

    #[error("completion percentage {0} is above 100")]
    PercentageOutOfRange(u8),

    #[error("updated_at is before started_at")]
    InvalidTimeRange,
}

/// Payload written on every checkpoint.
///
/// The store merges this into the existing record for the learner/course pair,
/// or creates one when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressCheckpoint {
    pub current_section: usize,
    pub current_question: usize,
    pub answers: BTreeMap<QuestionKey, String>,
    pub completion_percentage: u8,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Persisted checkpoint of one learner's position and answers in one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    learner_id: LearnerId,
    course_id: CourseId,
    current_section: usize,
    current_question: usize,
    answers: BTreeMap<QuestionKey, String>,
    completion_percentage: u8,
    completed: bool,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// First write for a learner/course pair.
    #[must_use]
    pub fn create(
        learner_id: LearnerId,
        course_id: CourseId,
        checkpoint: &ProgressCheckpoint,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            learner_id,
            course_id,
            current_section: checkpoint.current_section,
            current_question: checkpoint.current_question,
            answers: checkpoint.answers.clone(),
            completion_percentage: checkpoint.completion_percentage.min(100),
            completed: checkpoint.completed,
            started_at: now,
            updated_at: now,
            completed_at: checkpoint.completed_at,
        }
    }

    /// Merge a later checkpoint into this record. `started_at` is kept.
    pub fn merge(&mut self, checkpoint: &ProgressCheckpoint, now: DateTime<Utc>) {
        self.current_section = checkpoint.current_section;
        self.current_question = checkpoint.current_question;
        self.answers.clone_from(&checkpoint.answers);
        self.completion_percentage = checkpoint.completion_percentage.min(100);
        self.completed = checkpoint.completed;
        self.completed_at = checkpoint.completed_at;
        self.updated_at = now;
    }

    /// Rehydrate a record from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressRecordError` if the record is completed without a
    /// completion time, the percentage exceeds 100, or timestamps are reversed.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        learner_id: LearnerId,
        course_id: CourseId,
        current_section: usize,
        current_question: usize,
        answers: BTreeMap<QuestionKey, String>,
        completion_percentage: u8,
        completed: bool,
        started_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressRecordError> {
        if completed && completed_at.is_none() {
            return Err(ProgressRecordError::MissingCompletedAt);
        }
        if completion_percentage > 100 {
            return Err(ProgressRecordError::PercentageOutOfRange(
                completion_percentage,
            ));
        }
        if updated_at < started_at {
            return Err(ProgressRecordError::InvalidTimeRange);
        }

        Ok(Self {
            learner_id,
            course_id,
            current_section,
            current_question,
            answers,
            completion_percentage,
            completed,
            started_at,
            updated_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn learner_id(&self) -> LearnerId {
        self.learner_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn current_section(&self) -> usize {
        self.current_section
    }

    #[must_use]
    pub fn current_question(&self) -> usize {
        self.current_question
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionKey, String> {
        &self.answers
    }

    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        self.completion_percentage
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn checkpoint(section: usize, completed: bool) -> ProgressCheckpoint {
        ProgressCheckpoint {
            current_section: section,
            current_question: 0,
            answers: BTreeMap::from([(QuestionKey::new(0, 0), "true".to_string())]),
            completion_percentage: 50,
            completed,
            completed_at: completed.then(fixed_now),
        }
    }

    #[test]
    fn merge_keeps_started_at_and_bumps_updated_at() {
        let start = fixed_now();
        let later = start + Duration::minutes(3);
        let mut record =
            ProgressRecord::create(LearnerId::new(1), CourseId::new(2), &checkpoint(0, false), start);
        record.merge(&checkpoint(1, false), later);

        assert_eq!(record.started_at(), start);
        assert_eq!(record.updated_at(), later);
        assert_eq!(record.current_section(), 1);
    }

    #[test]
    fn completed_without_timestamp_is_rejected() {
        let now = fixed_now();
        let err = ProgressRecord::from_persisted(
            LearnerId::new(1),
            CourseId::new(1),
            1,
            0,
            BTreeMap::new(),
            100,
            true,
            now,
            now,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgressRecordError::MissingCompletedAt);
    }

    #[test]
    fn percentage_above_hundred_is_rejected() {
        let now = fixed_now();
        let err = ProgressRecord::from_persisted(
            LearnerId::new(1),
            CourseId::new(1),
            0,
            0,
            BTreeMap::new(),
            101,
            false,
            now,
            now,
            None,
        )
        .unwrap_err();
        assert_eq!(err, ProgressRecordError::PercentageOutOfRange(101));
    }
}
