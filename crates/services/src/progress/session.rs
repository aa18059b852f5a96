use training_core::model::{
    Answer, Course, CourseId, LearnerId, ProgressRecord, Question, QuestionKey, Section,
};
use training_core::tracker::{CourseTracker, Position};

/// Point-in-time view of a learner's place in a course, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub section: usize,
    pub section_count: usize,
    pub question: usize,
    pub question_count: usize,
    pub answered: usize,
    pub total_questions: usize,
    pub percentage: u8,
    pub completed: bool,
}

/// One learner working through one course.
#[derive(Debug, Clone)]
pub struct CourseSession {
    learner_id: LearnerId,
    tracker: CourseTracker,
    saved: Option<ProgressRecord>,
}

impl CourseSession {
    pub(crate) fn new(
        learner_id: LearnerId,
        tracker: CourseTracker,
        saved: Option<ProgressRecord>,
    ) -> Self {
        Self {
            learner_id,
            tracker,
            saved,
        }
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut CourseTracker {
        &mut self.tracker
    }

    pub(crate) fn set_saved(&mut self, record: ProgressRecord) {
        self.saved = Some(record);
    }

    #[must_use]
    pub fn learner_id(&self) -> LearnerId {
        self.learner_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.tracker.course().id()
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        self.tracker.course()
    }

    #[must_use]
    pub fn tracker(&self) -> &CourseTracker {
        &self.tracker
    }

    /// The record returned by the last successful checkpoint, or the one the
    /// session was restored from.
    #[must_use]
    pub fn saved_record(&self) -> Option<&ProgressRecord> {
        self.saved.as_ref()
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.tracker.position()
    }

    #[must_use]
    pub fn current_section(&self) -> Option<&Section> {
        self.tracker.current_section()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.tracker.current_question()
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<&Answer> {
        self.tracker.current_answer()
    }

    #[must_use]
    pub fn answer(&self, key: QuestionKey) -> Option<&Answer> {
        self.tracker.answer(key)
    }

    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        self.tracker.completion_percentage()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.tracker.is_completed()
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            section: self.tracker.current_section_index(),
            section_count: self.course().section_count(),
            question: self.tracker.current_question_index(),
            question_count: self
                .tracker
                .current_section()
                .map_or(0, Section::question_count),
            answered: self.tracker.answered_count(),
            total_questions: self.course().total_questions(),
            percentage: self.tracker.completion_percentage(),
            completed: self.tracker.is_completed(),
        }
    }
}
