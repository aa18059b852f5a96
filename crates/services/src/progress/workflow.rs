use std::fmt;
use std::sync::Arc;

use storage::repository::{CourseRepository, ProgressRepository, StorageError};
use tracing::{debug, info, warn};
use training_core::model::{Answer, CourseId, LearnerId, ProgressRecord};
use training_core::tracker::{CourseTracker, Transition};

use super::session::{CourseSession, ProgressSnapshot};
use crate::Clock;
use crate::error::ProgressError;

/// A checkpoint write that failed after navigation already happened.
#[derive(Debug)]
pub struct CheckpointWarning {
    pub learner_id: LearnerId,
    pub course_id: CourseId,
    pub error: StorageError,
}

impl fmt::Display for CheckpointWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "progress for course {} was not saved: {}",
            self.course_id, self.error
        )
    }
}

/// What happened to the checkpoint after a navigation call.
#[derive(Debug)]
pub enum CheckpointStatus {
    Saved,
    Failed(CheckpointWarning),
    /// Nothing changed, so nothing was written.
    Skipped,
}

impl CheckpointStatus {
    #[must_use]
    pub fn warning(&self) -> Option<&CheckpointWarning> {
        match self {
            CheckpointStatus::Failed(w) => Some(w),
            _ => None,
        }
    }
}

/// Result of `advance`/`retreat`.
#[derive(Debug)]
pub struct NavigationOutcome {
    pub transition: Transition,
    pub snapshot: ProgressSnapshot,
    pub checkpoint: CheckpointStatus,
}

/// Hosts course trackers and checkpoints them to the progress store.
#[derive(Clone)]
pub struct CourseProgressService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl CourseProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            progress,
        }
    }

    /// Load the course and the learner's last checkpoint, then restore a
    /// session from them.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CourseNotFound` for an unknown course and
    /// `ProgressError::Storage` if either load fails.
    pub async fn start(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<CourseSession, ProgressError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(ProgressError::CourseNotFound(course_id))?;
        let record = self.progress.get_progress(learner_id, course_id).await?;

        let tracker = CourseTracker::resume(course, record.as_ref());
        if !tracker.discarded_answers().is_empty() {
            let keys: Vec<String> = tracker
                .discarded_answers()
                .iter()
                .map(ToString::to_string)
                .collect();
            warn!(
                learner_id = %learner_id,
                course_id = %course_id,
                keys = ?keys,
                "dropped stored answers that no longer fit the course"
            );
        }
        debug!(
            learner_id = %learner_id,
            course_id = %course_id,
            resumed = record.is_some(),
            "course session started"
        );
        Ok(CourseSession::new(learner_id, tracker, record))
    }

    /// Record a typed answer for the current question. Nothing is written
    /// until the next checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Tracker` if the answer does not fit the
    /// question or the course is already completed.
    pub fn record_answer(
        &self,
        session: &mut CourseSession,
        answer: Answer,
    ) -> Result<(), ProgressError> {
        session.tracker_mut().record_answer(answer)?;
        Ok(())
    }

    /// Record a raw UI value, parsed against the current question's type.
    ///
    /// # Errors
    ///
    /// Same as [`CourseProgressService::record_answer`].
    pub fn record_raw_answer(
        &self,
        session: &mut CourseSession,
        raw: &str,
    ) -> Result<(), ProgressError> {
        session.tracker_mut().record_raw_answer(raw)?;
        Ok(())
    }

    /// Move forward and checkpoint the new state.
    ///
    /// A failed checkpoint is reported in the outcome; the move is kept.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Tracker` if the course is already completed.
    pub async fn advance(
        &self,
        session: &mut CourseSession,
    ) -> Result<NavigationOutcome, ProgressError> {
        let transition = session.tracker_mut().advance(self.clock.now())?;
        if let Transition::Completed { at } = transition {
            info!(
                learner_id = %session.learner_id(),
                course_id = %session.course_id(),
                completed_at = %at,
                percentage = session.completion_percentage(),
                "course completed"
            );
        }
        let checkpoint = self.checkpoint(session).await;
        Ok(NavigationOutcome {
            transition,
            snapshot: session.snapshot(),
            checkpoint,
        })
    }

    /// Move back one question and checkpoint the new state. At the first
    /// question nothing moves and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Tracker` if the course is already completed.
    pub async fn retreat(
        &self,
        session: &mut CourseSession,
    ) -> Result<NavigationOutcome, ProgressError> {
        let transition = session.tracker_mut().retreat()?;
        let checkpoint = if transition.is_change() {
            self.checkpoint(session).await
        } else {
            CheckpointStatus::Skipped
        };
        Ok(NavigationOutcome {
            transition,
            snapshot: session.snapshot(),
            checkpoint,
        })
    }

    /// Write the current state now, e.g. to retry after a failed checkpoint.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the write fails.
    pub async fn save(&self, session: &mut CourseSession) -> Result<ProgressRecord, ProgressError> {
        let record = self.write(session).await?;
        Ok(record)
    }

    async fn checkpoint(&self, session: &mut CourseSession) -> CheckpointStatus {
        match self.write(session).await {
            Ok(_) => CheckpointStatus::Saved,
            Err(error) => {
                warn!(
                    learner_id = %session.learner_id(),
                    course_id = %session.course_id(),
                    error = %error,
                    "checkpoint failed; continuing with unsaved progress"
                );
                CheckpointStatus::Failed(CheckpointWarning {
                    learner_id: session.learner_id(),
                    course_id: session.course_id(),
                    error,
                })
            }
        }
    }

    async fn write(&self, session: &mut CourseSession) -> Result<ProgressRecord, StorageError> {
        let payload = session.tracker().checkpoint();
        let record = self
            .progress
            .upsert_progress(
                session.learner_id(),
                session.course_id(),
                &payload,
                self.clock.now(),
            )
            .await?;
        session.set_saved(record.clone());
        Ok(record)
    }
}
