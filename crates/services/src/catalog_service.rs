use std::sync::Arc;

use storage::repository::{CourseQuery, CourseRepository, NewCourseRecord};
use tracing::info;
use training_core::model::{Course, CourseDraft, CourseId, CourseStatus};

use crate::Clock;
use crate::error::CatalogError;
use crate::session_context::SessionUser;

/// Learner-facing browse filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl CourseFilter {
    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            search: None,
        }
    }

    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }
}

/// Course authoring for admins and browsing for learners.
#[derive(Clone)]
pub struct CatalogService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(clock: Clock, courses: Arc<dyn CourseRepository>) -> Self {
        Self { clock, courses }
    }

    /// Validate and store a new course.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Access` unless `actor` is an admin,
    /// `CatalogError::Course` if the draft is invalid, and
    /// `CatalogError::Storage` if persistence fails.
    pub async fn create_course(
        &self,
        actor: &SessionUser,
        draft: CourseDraft,
    ) -> Result<CourseId, CatalogError> {
        actor.ensure_admin()?;
        let validated = draft.validate()?;
        let now = self.clock.now();
        let id = self
            .courses
            .insert_new_course(NewCourseRecord::new(validated, now))
            .await?;
        info!(course_id = %id, actor = %actor.id, "course created");
        Ok(id)
    }

    /// Replace a course's content, keeping its id and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::CourseNotFound` for an unknown id, plus the
    /// errors of [`CatalogService::create_course`].
    pub async fn update_course(
        &self,
        actor: &SessionUser,
        id: CourseId,
        draft: CourseDraft,
    ) -> Result<Course, CatalogError> {
        actor.ensure_admin()?;
        let validated = draft.validate()?;
        let existing = self.require_course(id).await?;
        let course = validated.assign_id(id, existing.created_at(), self.clock.now());
        self.courses.upsert_course(&course).await?;
        info!(course_id = %id, actor = %actor.id, "course updated");
        Ok(course)
    }

    /// Activate or deactivate a course.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Access`, `CatalogError::CourseNotFound`, or
    /// `CatalogError::Storage`.
    pub async fn set_status(
        &self,
        actor: &SessionUser,
        id: CourseId,
        status: CourseStatus,
    ) -> Result<Course, CatalogError> {
        actor.ensure_admin()?;
        let course = self
            .require_course(id)
            .await?
            .with_status(status, self.clock.now());
        self.courses.upsert_course(&course).await?;
        info!(course_id = %id, status = status.as_str(), "course status changed");
        Ok(course)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the lookup fails.
    pub async fn get_course(&self, id: CourseId) -> Result<Option<Course>, CatalogError> {
        Ok(self.courses.get_course(id).await?)
    }

    /// Active courses matching the filter, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if the listing fails.
    pub async fn browse(&self, filter: &CourseFilter) -> Result<Vec<Course>, CatalogError> {
        let mut query = CourseQuery::active();
        if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
            query = query.with_category(category.trim());
        }
        let courses = self.courses.list_courses(&query).await?;
        Ok(match filter.search.as_deref() {
            Some(term) => courses
                .into_iter()
                .filter(|c| c.matches_search(term))
                .collect(),
            None => courses,
        })
    }

    async fn require_course(&self, id: CourseId) -> Result<Course, CatalogError> {
        self.courses
            .get_course(id)
            .await?
            .ok_or(CatalogError::CourseNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionContextError;
    use chrono::Duration;
    use storage::repository::InMemoryRepository;
    use training_core::model::{COURSE_CATEGORIES, LearnerId, Role};
    use training_core::time::{fixed_clock, fixed_now};

    fn admin() -> SessionUser {
        SessionUser::new(LearnerId::new(1), "Admin", Role::Admin)
    }

    fn draft(title: &str, category: &str) -> CourseDraft {
        let mut d = CourseDraft::starter();
        d.title = title.into();
        d.description = "Floors and surfaces".into();
        d.category = category.into();
        d
    }

    #[tokio::test]
    async fn cleaners_cannot_author_courses() {
        let service = CatalogService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let cleaner = SessionUser::new(LearnerId::new(2), "Cleaner", Role::Cleaner);

        let err = service
            .create_course(&cleaner, draft("Office", COURSE_CATEGORIES[1]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Access(SessionContextError::NotAdmin)
        ));
    }

    #[tokio::test]
    async fn update_preserves_created_at() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = CatalogService::new(fixed_clock(), repo.clone());
        let id = service
            .create_course(&admin(), draft("Office", COURSE_CATEGORIES[1]))
            .await
            .unwrap();

        let mut later = fixed_clock();
        later.advance(Duration::days(1));
        let service = CatalogService::new(later, repo);
        let updated = service
            .update_course(&admin(), id, draft("Office v2", COURSE_CATEGORIES[1]))
            .await
            .unwrap();

        assert_eq!(updated.title(), "Office v2");
        assert_eq!(updated.created_at(), fixed_now());
        assert_eq!(updated.updated_at(), fixed_now() + Duration::days(1));
    }

    #[tokio::test]
    async fn browse_hides_inactive_and_applies_search() {
        let service = CatalogService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let office = service
            .create_course(&admin(), draft("Office Floors", COURSE_CATEGORIES[1]))
            .await
            .unwrap();
        service
            .create_course(&admin(), draft("School Halls", COURSE_CATEGORIES[3]))
            .await
            .unwrap();
        let hidden = service
            .create_course(&admin(), draft("Old Office", COURSE_CATEGORIES[1]))
            .await
            .unwrap();
        service
            .set_status(&admin(), hidden, CourseStatus::Inactive)
            .await
            .unwrap();

        let all = service.browse(&CourseFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let office_only = service
            .browse(&CourseFilter::category(COURSE_CATEGORIES[1]))
            .await
            .unwrap();
        assert_eq!(office_only.len(), 1);
        assert_eq!(office_only[0].id(), office);

        let searched = service
            .browse(&CourseFilter::default().with_search("HALLS"))
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].title(), "School Halls");
    }

    #[tokio::test]
    async fn unknown_course_update_is_not_found() {
        let service = CatalogService::new(fixed_clock(), Arc::new(InMemoryRepository::new()));
        let err = service
            .set_status(&admin(), CourseId::new(42), CourseStatus::Inactive)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CourseNotFound(id) if id == CourseId::new(42)));
    }
}
