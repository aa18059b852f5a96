use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    Answer, AnswerError, Course, ProgressCheckpoint, ProgressRecord, Question, QuestionKey,
    Section,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("course already completed")]
    Completed,
    #[error("no question at {0}")]
    NoQuestion(QuestionKey),
    #[error(transparent)]
    Answer(#[from] AnswerError),
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Where the learner is in the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    InProgress(QuestionKey),
    Completed,
}

/// Result of a navigation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: QuestionKey, to: QuestionKey },
    Unchanged,
    Completed { at: DateTime<Utc> },
}

impl Transition {
    /// Whether the call changed tracker state and so warrants a checkpoint.
    #[must_use]
    pub fn is_change(&self) -> bool {
        !matches!(self, Transition::Unchanged)
    }
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Walks a learner linearly through a course's sections and questions.
///
/// The tracker is purely in-memory. Persisting it is the caller's job: build a
/// payload with [`CourseTracker::checkpoint`] after each transition and hand it
/// to the progress store.
///
/// # Examples
///
/// ```
/// # use training_core::model::{Answer, CourseDraft, CourseId};
/// # use training_core::tracker::{CourseTracker, Transition};
/// # use training_core::time::fixed_now;
/// let mut draft = CourseDraft::starter();
/// draft.title = "Intro".into();
/// draft.description = "First steps".into();
/// draft.category = "Office Cleaning".into();
/// let course = draft.validate()?.assign_id(CourseId::new(1), fixed_now(), fixed_now());
///
/// let mut tracker = CourseTracker::new(course);
/// tracker.record_answer(Answer::Bool(true))?;
/// assert_eq!(tracker.completion_percentage(), 100);
///
/// let transition = tracker.advance(fixed_now())?;
/// assert!(matches!(transition, Transition::Completed { .. }));
/// assert!(tracker.checkpoint().completed);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct CourseTracker {
    course: Course,
    section: usize,
    question: usize,
    answers: BTreeMap<QuestionKey, Answer>,
    completed_at: Option<DateTime<Utc>>,
    discarded: Vec<QuestionKey>,
}

impl CourseTracker {
    /// Fresh tracker positioned at the first question.
    #[must_use]
    pub fn new(course: Course) -> Self {
        Self {
            course,
            section: 0,
            question: 0,
            answers: BTreeMap::new(),
            completed_at: None,
            discarded: Vec::new(),
        }
    }

    /// Restore a tracker from the learner's last checkpoint, if any.
    ///
    /// Stored answers that no longer fit the course (the question was removed
    /// or its type changed) are dropped and reported by
    /// [`CourseTracker::discarded_answers`]. A stored position outside the
    /// course is clamped to the nearest valid question.
    #[must_use]
    pub fn resume(course: Course, record: Option<&ProgressRecord>) -> Self {
        let mut tracker = Self::new(course);
        let Some(record) = record else {
            return tracker;
        };

        for (key, raw) in record.answers() {
            let parsed = tracker
                .course
                .question(*key)
                .and_then(|q| Answer::parse(q, raw).ok());
            match parsed {
                Some(answer) => {
                    tracker.answers.insert(*key, answer);
                }
                None => tracker.discarded.push(*key),
            }
        }

        if record.is_completed() {
            tracker.completed_at = record.completed_at().or(Some(record.updated_at()));
            tracker.section = tracker.course.section_count();
            tracker.question = 0;
        } else {
            let (section, question) =
                tracker.clamp(record.current_section(), record.current_question());
            tracker.section = section;
            tracker.question = question;
        }
        tracker
    }

    fn clamp(&self, section: usize, question: usize) -> (usize, usize) {
        let count = self.course.section_count();
        if count == 0 {
            return (0, 0);
        }
        if section >= count {
            let last = count - 1;
            return (last, self.last_question_index(last));
        }
        (section, question.min(self.last_question_index(section)))
    }

    fn question_count(&self, section: usize) -> usize {
        self.course.section(section).map_or(0, Section::question_count)
    }

    fn last_question_index(&self, section: usize) -> usize {
        self.question_count(section).saturating_sub(1)
    }

    fn key(&self) -> QuestionKey {
        QuestionKey::new(self.section, self.question)
    }

    // ─── Navigation ────────────────────────────────────────────────────────────

    /// Move to the next question, the next section, or finish the course.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Completed` if the course is already finished.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Transition, TrackerError> {
        if self.is_completed() {
            return Err(TrackerError::Completed);
        }
        let from = self.key();

        if self.question + 1 < self.question_count(self.section) {
            self.question += 1;
        } else if self.section + 1 < self.course.section_count() {
            self.section += 1;
            self.question = 0;
        } else {
            self.completed_at = Some(now);
            self.section = self.course.section_count();
            self.question = 0;
            return Ok(Transition::Completed { at: now });
        }

        Ok(Transition::Moved {
            from,
            to: self.key(),
        })
    }

    /// Step back one question, crossing into the previous section if needed.
    ///
    /// At the very first question this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Completed` if the course is already finished.
    pub fn retreat(&mut self) -> Result<Transition, TrackerError> {
        if self.is_completed() {
            return Err(TrackerError::Completed);
        }
        let from = self.key();

        if self.question > 0 {
            self.question -= 1;
        } else if self.section > 0 {
            self.section -= 1;
            self.question = self.last_question_index(self.section);
        } else {
            return Ok(Transition::Unchanged);
        }

        Ok(Transition::Moved {
            from,
            to: self.key(),
        })
    }

    // ─── Answers ───────────────────────────────────────────────────────────────

    /// Record an answer for the current question, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Completed` after completion,
    /// `TrackerError::NoQuestion` if the position has no question, and
    /// `TrackerError::Answer` if the answer does not fit the question.
    pub fn record_answer(&mut self, answer: Answer) -> Result<(), TrackerError> {
        if self.is_completed() {
            return Err(TrackerError::Completed);
        }
        let key = self.key();
        let question = self
            .course
            .question(key)
            .ok_or(TrackerError::NoQuestion(key))?;
        answer.check(question)?;
        self.answers.insert(key, answer);
        Ok(())
    }

    /// Parse a raw UI value against the current question and record it.
    ///
    /// # Errors
    ///
    /// Same as [`CourseTracker::record_answer`].
    pub fn record_raw_answer(&mut self, raw: &str) -> Result<(), TrackerError> {
        if self.is_completed() {
            return Err(TrackerError::Completed);
        }
        let key = self.key();
        let question = self
            .course
            .question(key)
            .ok_or(TrackerError::NoQuestion(key))?;
        let answer = Answer::parse(question, raw)?;
        self.answers.insert(key, answer);
        Ok(())
    }

    /// Whole-number percent of the course's questions that have an answer.
    ///
    /// Questions skipped without an answer count against the percentage.
    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        let total = self.course.total_questions();
        if total == 0 {
            return 0;
        }
        let answered = self.answers.len();
        // round half up, matching the stored percentages
        let pct = (answered * 200 + total) / (2 * total);
        u8::try_from(pct.min(100)).unwrap_or(100)
    }

    /// Payload for the progress store reflecting the current state.
    #[must_use]
    pub fn checkpoint(&self) -> ProgressCheckpoint {
        ProgressCheckpoint {
            current_section: self.section,
            current_question: self.question,
            answers: self
                .answers
                .iter()
                .map(|(k, a)| (*k, a.as_stored().into_owned()))
                .collect(),
            completion_percentage: self.completion_percentage(),
            completed: self.is_completed(),
            completed_at: self.completed_at,
        }
    }

    // ─── Accessors ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    #[must_use]
    pub fn position(&self) -> Position {
        if self.is_completed() {
            Position::Completed
        } else {
            Position::InProgress(self.key())
        }
    }

    #[must_use]
    pub fn current_section_index(&self) -> usize {
        self.section
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.question
    }

    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        self.course.section(self.section)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.course.question(self.key())
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<&Answer> {
        self.answers.get(&self.key())
    }

    #[must_use]
    pub fn answer(&self, key: QuestionKey) -> Option<&Answer> {
        self.answers.get(&key)
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionKey, Answer> {
        &self.answers
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Keys of stored answers dropped by [`CourseTracker::resume`].
    #[must_use]
    pub fn discarded_answers(&self) -> &[QuestionKey] {
        &self.discarded
    }
}
