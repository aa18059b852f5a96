use std::sync::Arc;

use chrono::{DateTime, Utc};
use storage::repository::{CourseRepository, ProgressRepository};
use training_core::model::{Course, CourseId, LearnerId, ProgressRecord};

use crate::error::ProgressError;

/// Title shown when a progress record points at a course that no longer exists.
pub const UNKNOWN_COURSE_TITLE: &str = "Unknown Course";

/// A progress record joined with the course it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressListItem {
    pub course_id: CourseId,
    pub title: String,
    pub category: String,
    pub description: String,
    pub image_url: Option<String>,
    /// Title of the section the learner is in, or "Section N" if the course
    /// has no such section.
    pub current_section: String,
    pub completion_percentage: u8,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressListItem {
    fn from_record(record: &ProgressRecord, course: Option<&Course>) -> Self {
        let section = record.current_section();
        let current_section = course
            .and_then(|c| c.section(section))
            .map_or_else(
                || format!("Section {}", section + 1),
                |s| s.title().to_owned(),
            );

        Self {
            course_id: record.course_id(),
            title: course.map_or_else(
                || UNKNOWN_COURSE_TITLE.to_owned(),
                |c| c.title().to_owned(),
            ),
            category: course.map(|c| c.category().to_owned()).unwrap_or_default(),
            description: course.map(|c| c.description().to_owned()).unwrap_or_default(),
            image_url: course.and_then(|c| c.image_url().map(ToOwned::to_owned)),
            current_section,
            completion_percentage: record.completion_percentage(),
            started_at: record.started_at(),
            updated_at: record.updated_at(),
            completed_at: record.completed_at(),
        }
    }
}

/// Lists a learner's courses in progress and completed.
#[derive(Clone)]
pub struct ProgressOverviewService {
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressOverviewService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { courses, progress }
    }

    /// Courses started but not finished, ordered by course id.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if a lookup fails.
    pub async fn in_progress(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<ProgressListItem>, ProgressError> {
        self.items(learner_id, false).await
    }

    /// Finished courses, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if a lookup fails.
    pub async fn completed(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<ProgressListItem>, ProgressError> {
        let mut items = self.items(learner_id, true).await?;
        items.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(items)
    }

    async fn items(
        &self,
        learner_id: LearnerId,
        completed: bool,
    ) -> Result<Vec<ProgressListItem>, ProgressError> {
        let records = self.progress.list_progress_for_learner(learner_id).await?;
        let mut items = Vec::new();
        for record in records.iter().filter(|r| r.is_completed() == completed) {
            let course = self.courses.get_course(record.course_id()).await?;
            items.push(ProgressListItem::from_record(record, course.as_ref()));
        }
        Ok(items)
    }
}
