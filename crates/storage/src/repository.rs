use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use training_core::model::{
    Application, ApplicationId, ApplicationStatus, Course, CourseId, CourseStatus, Job, JobId,
    JobStatus, LearnerId, ProgressCheckpoint, ProgressRecord, Role, UserProfile, ValidatedCourse,
    ValidatedJob,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert payload for a course whose id the store assigns.
#[derive(Debug, Clone)]
pub struct NewCourseRecord {
    pub course: ValidatedCourse,
    pub created_at: DateTime<Utc>,
}

impl NewCourseRecord {
    #[must_use]
    pub fn new(course: ValidatedCourse, created_at: DateTime<Utc>) -> Self {
        Self { course, created_at }
    }
}

/// Filter for listing courses. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseQuery {
    pub category: Option<String>,
    pub status: Option<CourseStatus>,
}

impl CourseQuery {
    #[must_use]
    pub fn active() -> Self {
        Self {
            category: None,
            status: Some(CourseStatus::Active),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn matches(&self, course: &Course) -> bool {
        self.category
            .as_deref()
            .is_none_or(|c| course.category() == c)
            && self.status.is_none_or(|s| course.status() == s)
    }
}

/// Insert payload for a job posting whose id the store assigns.
#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub job: ValidatedJob,
    pub created_at: DateTime<Utc>,
}

impl NewJobRecord {
    #[must_use]
    pub fn new(job: ValidatedJob, created_at: DateTime<Utc>) -> Self {
        Self { job, created_at }
    }
}

/// Filter for listing jobs. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    pub status: Option<JobStatus>,
}

impl JobQuery {
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn matches(&self, job: &Job) -> bool {
        self.category.as_deref().is_none_or(|c| job.category() == c)
            && self.location.as_deref().is_none_or(|l| job.location() == l)
            && self.status.is_none_or(|s| job.status() == s)
    }
}

/// Insert payload for a new, pending application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplicationRecord {
    pub job_id: JobId,
    pub learner_id: LearnerId,
    pub message: String,
    pub applied_at: DateTime<Utc>,
}

/// Repository contract for the course catalog.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Insert a new course and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn insert_new_course(&self, course: NewCourseRecord) -> Result<CourseId, StorageError>;

    /// Persist or replace a course, including its sections and questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// List courses matching the query, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_courses(&self, query: &CourseQuery) -> Result<Vec<Course>, StorageError>;
}

/// Repository contract for per-learner course progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the progress record for a learner/course pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn get_progress(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Create the record with `started_at = now` if absent, otherwise merge the
    /// checkpoint into it. Either way `updated_at = now`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn upsert_progress(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        checkpoint: &ProgressCheckpoint,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError>;

    /// All progress records for a learner, ordered by course ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_progress_for_learner(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<ProgressRecord>, StorageError>;
}

/// Repository contract for job postings.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the job cannot be stored.
    async fn insert_new_job(&self, job: NewJobRecord) -> Result<JobId, StorageError>;

    /// Persist or replace a job.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the job cannot be stored.
    async fn upsert_job(&self, job: &Job) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StorageError>;

    /// Jobs matching the query, latest start date first, then by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, StorageError>;

    /// The most recently posted jobs, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn recent_jobs(&self, limit: u32) -> Result<Vec<Job>, StorageError>;
}

/// Repository contract for job applications.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Store a pending application.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the learner already applied for
    /// the job, or another `StorageError` if the write fails.
    async fn insert_application(
        &self,
        application: NewApplicationRecord,
    ) -> Result<Application, StorageError>;

    /// Replace the status, notes and `updated_at` of an application.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown id.
    async fn update_application(&self, application: &Application) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn get_application(&self, id: ApplicationId)
    -> Result<Option<Application>, StorageError>;

    /// A learner's applications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_applications_for_learner(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<Application>, StorageError>;

    /// Applications for one job, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_applications_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<Application>, StorageError>;
}

/// Repository contract for user accounts and their roles.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or replace a user. `created_at` of an existing row is kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn upsert_user(&self, user: &UserProfile) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn get_user(&self, id: LearnerId) -> Result<Option<UserProfile>, StorageError>;

    /// Users ordered by id, optionally restricted to one role.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for connection or mapping failures.
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    progress: Arc<Mutex<HashMap<(LearnerId, CourseId), ProgressRecord>>>,
    jobs: Arc<Mutex<HashMap<JobId, Job>>>,
    applications: Arc<Mutex<HashMap<ApplicationId, Application>>>,
    users: Arc<Mutex<HashMap<LearnerId, UserProfile>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn insert_new_course(&self, course: NewCourseRecord) -> Result<CourseId, StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = guard.keys().map(CourseId::value).max().unwrap_or(0) + 1;
        let id = CourseId::new(next);
        let stored = course
            .course
            .assign_id(id, course.created_at, course.created_at);
        guard.insert(id, stored);
        Ok(id)
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_courses(&self, query: &CourseQuery) -> Result<Vec<Course>, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Course> = guard.values().filter(|c| query.matches(c)).cloned().collect();
        found.sort_by_key(Course::id);
        Ok(found)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(learner_id, course_id)).cloned())
    }

    async fn upsert_progress(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        checkpoint: &ProgressCheckpoint,
        now: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = guard
            .entry((learner_id, course_id))
            .and_modify(|r| r.merge(checkpoint, now))
            .or_insert_with(|| ProgressRecord::create(learner_id, course_id, checkpoint, now));
        Ok(record.clone())
    }

    async fn list_progress_for_learner(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<ProgressRecord> = guard
            .values()
            .filter(|r| r.learner_id() == learner_id)
            .cloned()
            .collect();
        found.sort_by_key(ProgressRecord::course_id);
        Ok(found)
    }
}

fn newest_first(a: &Application, b: &Application) -> std::cmp::Ordering {
    b.applied_at()
        .cmp(&a.applied_at())
        .then_with(|| b.id().cmp(&a.id()))
}

#[async_trait]
impl JobRepository for InMemoryRepository {
    async fn insert_new_job(&self, job: NewJobRecord) -> Result<JobId, StorageError> {
        let mut guard = self
            .jobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = guard.keys().map(JobId::value).max().unwrap_or(0) + 1;
        let id = JobId::new(next);
        guard.insert(id, job.job.assign_id(id, job.created_at, job.created_at));
        Ok(id)
    }

    async fn upsert_job(&self, job: &Job) -> Result<(), StorageError> {
        let mut guard = self
            .jobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(job.id(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StorageError> {
        let guard = self
            .jobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, StorageError> {
        let guard = self
            .jobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Job> = guard.values().filter(|j| query.matches(j)).cloned().collect();
        found.sort_by(|a, b| {
            b.start_date()
                .cmp(&a.start_date())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(found)
    }

    async fn recent_jobs(&self, limit: u32) -> Result<Vec<Job>, StorageError> {
        let guard = self
            .jobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Job> = guard.values().cloned().collect();
        found.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(found)
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryRepository {
    async fn insert_application(
        &self,
        application: NewApplicationRecord,
    ) -> Result<Application, StorageError> {
        let mut guard = self
            .applications
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.values().any(|a| {
            a.job_id() == application.job_id && a.learner_id() == application.learner_id
        }) {
            return Err(StorageError::Conflict);
        }
        let next = guard.keys().map(ApplicationId::value).max().unwrap_or(0) + 1;
        let stored = Application::from_persisted(
            ApplicationId::new(next),
            application.job_id,
            application.learner_id,
            application.message,
            ApplicationStatus::Pending,
            None,
            application.applied_at,
            application.applied_at,
        );
        guard.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn update_application(&self, application: &Application) -> Result<(), StorageError> {
        let mut guard = self
            .applications
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let slot = guard
            .get_mut(&application.id())
            .ok_or(StorageError::NotFound)?;
        *slot = application.clone();
        Ok(())
    }

    async fn get_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, StorageError> {
        let guard = self
            .applications
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_applications_for_learner(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<Application>, StorageError> {
        let guard = self
            .applications
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Application> = guard
            .values()
            .filter(|a| a.learner_id() == learner_id)
            .cloned()
            .collect();
        found.sort_by(newest_first);
        Ok(found)
    }

    async fn list_applications_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<Application>, StorageError> {
        let guard = self
            .applications
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Application> = guard
            .values()
            .filter(|a| a.job_id() == job_id)
            .cloned()
            .collect();
        found.sort_by(newest_first);
        Ok(found)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn upsert_user(&self, user: &UserProfile) -> Result<(), StorageError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let stored = match guard.get(&user.id()) {
            Some(existing) => UserProfile::from_persisted(
                user.id(),
                user.display_name().to_owned(),
                user.role(),
                existing.created_at(),
                user.updated_at(),
            ),
            None => user.clone(),
        };
        guard.insert(user.id(), stored);
        Ok(())
    }

    async fn get_user(&self, id: LearnerId) -> Result<Option<UserProfile>, StorageError> {
        let guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserProfile>, StorageError> {
        let guard = self
            .users
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<UserProfile> = guard
            .values()
            .filter(|u| role.is_none_or(|r| u.role() == r))
            .cloned()
            .collect();
        found.sort_by_key(UserProfile::id);
        Ok(found)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            courses: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            jobs: Arc::new(repo.clone()),
            applications: Arc::new(repo.clone()),
            users: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeMap;
    use chrono::NaiveDate;
    use training_core::model::{CourseDraft, JobDraft, QuestionKey};
    use training_core::time::fixed_now;

    fn draft(title: &str, category: &str) -> CourseDraft {
        let mut d = CourseDraft::starter();
        d.title = title.into();
        d.description = "desc".into();
        d.category = category.into();
        d
    }

    fn checkpoint(question: usize) -> ProgressCheckpoint {
        ProgressCheckpoint {
            current_section: 0,
            current_question: question,
            answers: BTreeMap::from([(QuestionKey::new(0, 0), "true".into())]),
            completion_percentage: 100,
            completed: false,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn assigns_sequential_course_ids() {
        let repo = InMemoryRepository::new();
        let a = repo
            .insert_new_course(NewCourseRecord::new(
                draft("A", "Office Cleaning").validate().unwrap(),
                fixed_now(),
            ))
            .await
            .unwrap();
        let b = repo
            .insert_new_course(NewCourseRecord::new(
                draft("B", "School Cleaning").validate().unwrap(),
                fixed_now(),
            ))
            .await
            .unwrap();
        assert_eq!(a, CourseId::new(1));
        assert_eq!(b, CourseId::new(2));

        let office = repo
            .list_courses(&CourseQuery::default().with_category("Office Cleaning"))
            .await
            .unwrap();
        assert_eq!(office.len(), 1);
        assert_eq!(office[0].title(), "A");
    }

    #[tokio::test]
    async fn upsert_creates_then_merges() {
        let repo = InMemoryRepository::new();
        let learner = LearnerId::new(5);
        let course = CourseId::new(1);
        let start = fixed_now();
        let later = start + Duration::minutes(1);

        let created = repo
            .upsert_progress(learner, course, &checkpoint(0), start)
            .await
            .unwrap();
        assert_eq!(created.started_at(), start);

        let merged = repo
            .upsert_progress(learner, course, &checkpoint(1), later)
            .await
            .unwrap();
        assert_eq!(merged.started_at(), start);
        assert_eq!(merged.updated_at(), later);
        assert_eq!(merged.current_question(), 1);

        let all = repo.list_progress_for_learner(learner).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(
            repo.get_progress(LearnerId::new(6), course)
                .await
                .unwrap()
                .is_none()
        );
    }

    fn job(title: &str, location: &str, start_day: u32) -> ValidatedJob {
        JobDraft {
            title: title.into(),
            project: "Harbour Offices".into(),
            description: String::new(),
            location: location.into(),
            category: "Office".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 5, start_day).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 28).unwrap(),
            pay_rate: 180.0,
            hours_per_day: 6.0,
            cleaners_needed: 2,
            status: JobStatus::Open,
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn jobs_list_by_start_date_and_recent_by_creation() {
        let repo = InMemoryRepository::new();
        let t0 = fixed_now();
        let early = repo
            .insert_new_job(NewJobRecord::new(job("Early", "Perth", 1), t0))
            .await
            .unwrap();
        let late = repo
            .insert_new_job(NewJobRecord::new(
                job("Late", "Sydney", 20),
                t0 + Duration::minutes(1),
            ))
            .await
            .unwrap();

        let all = repo.list_jobs(&JobQuery::default()).await.unwrap();
        assert_eq!(all.iter().map(Job::id).collect::<Vec<_>>(), vec![late, early]);

        let perth = repo
            .list_jobs(&JobQuery::default().with_location("Perth"))
            .await
            .unwrap();
        assert_eq!(perth.len(), 1);
        assert_eq!(perth[0].id(), early);

        let recent = repo.recent_jobs(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id(), late);
    }

    #[tokio::test]
    async fn second_application_for_same_job_conflicts() {
        let repo = InMemoryRepository::new();
        let record = NewApplicationRecord {
            job_id: JobId::new(1),
            learner_id: LearnerId::new(7),
            message: "Keen".into(),
            applied_at: fixed_now(),
        };
        let first = repo.insert_application(record.clone()).await.unwrap();
        assert_eq!(first.status(), ApplicationStatus::Pending);

        let err = repo.insert_application(record).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let mine = repo
            .list_applications_for_learner(LearnerId::new(7))
            .await
            .unwrap();
        assert_eq!(mine, vec![first]);
    }

    #[tokio::test]
    async fn upsert_user_keeps_created_at_and_filters_by_role() {
        let repo = InMemoryRepository::new();
        let t0 = fixed_now();
        let user = UserProfile::new(LearnerId::new(2), "Lee", Role::Cleaner, t0).unwrap();
        repo.upsert_user(&user).await.unwrap();

        let later = t0 + Duration::days(2);
        let promoted = UserProfile::new(LearnerId::new(2), "Lee", Role::Admin, later).unwrap();
        repo.upsert_user(&promoted).await.unwrap();

        let stored = repo.get_user(LearnerId::new(2)).await.unwrap().unwrap();
        assert_eq!(stored.role(), Role::Admin);
        assert_eq!(stored.created_at(), t0);
        assert_eq!(stored.updated_at(), later);

        assert!(repo.list_users(Some(Role::Cleaner)).await.unwrap().is_empty());
        assert_eq!(repo.list_users(None).await.unwrap().len(), 1);
    }
}
