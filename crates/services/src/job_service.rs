use std::sync::Arc;

use chrono::{DateTime, Utc};
use storage::repository::{
    ApplicationRepository, JobQuery, JobRepository, NewApplicationRecord, NewJobRecord,
    StorageError,
};
use tracing::info;
use training_core::model::{
    Application, ApplicationId, ApplicationStatus, Job, JobDraft, JobId, JobStatus, LearnerId,
};

use crate::Clock;
use crate::error::JobServiceError;
use crate::session_context::SessionUser;

/// Title shown for an application whose job no longer exists.
pub const UNKNOWN_JOB_TITLE: &str = "Job Application";

/// Job board filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    pub status: Option<JobStatus>,
    pub search: Option<String>,
}

impl JobFilter {
    fn query(&self) -> JobQuery {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        JobQuery {
            category: non_blank(&self.category),
            location: non_blank(&self.location),
            status: self.status,
        }
    }
}

/// One row of a cleaner's "my applications" list.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationListItem {
    pub application_id: ApplicationId,
    pub job_id: JobId,
    pub job_title: String,
    pub job_location: Option<String>,
    pub status: ApplicationStatus,
    pub message: String,
    pub admin_notes: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl ApplicationListItem {
    fn new(application: Application, job: Option<&Job>) -> Self {
        Self {
            application_id: application.id(),
            job_id: application.job_id(),
            job_title: job.map_or_else(|| UNKNOWN_JOB_TITLE.to_owned(), |j| j.title().to_owned()),
            job_location: job.map(|j| j.location().to_owned()),
            status: application.status(),
            message: application.message().to_owned(),
            admin_notes: application.admin_notes().map(str::to_owned),
            applied_at: application.applied_at(),
        }
    }
}

/// Job postings for admins, browsing and applying for cleaners.
#[derive(Clone)]
pub struct JobService {
    clock: Clock,
    jobs: Arc<dyn JobRepository>,
    applications: Arc<dyn ApplicationRepository>,
}

impl JobService {
    #[must_use]
    pub fn new(
        clock: Clock,
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
    ) -> Self {
        Self {
            clock,
            jobs,
            applications,
        }
    }

    /// # Errors
    ///
    /// Returns `JobServiceError::Access` unless `actor` is an admin,
    /// `JobServiceError::Job` for an invalid draft, and
    /// `JobServiceError::Storage` if persistence fails.
    pub async fn create_job(
        &self,
        actor: &SessionUser,
        draft: JobDraft,
    ) -> Result<JobId, JobServiceError> {
        actor.ensure_admin()?;
        let validated = draft.validate()?;
        let id = self
            .jobs
            .insert_new_job(NewJobRecord::new(validated, self.clock.now()))
            .await?;
        info!(job_id = %id, actor = %actor.id, "job posted");
        Ok(id)
    }

    /// Replace a job's fields, keeping its id and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `JobServiceError::JobNotFound` for an unknown id, plus the
    /// errors of [`JobService::create_job`].
    pub async fn update_job(
        &self,
        actor: &SessionUser,
        id: JobId,
        draft: JobDraft,
    ) -> Result<Job, JobServiceError> {
        actor.ensure_admin()?;
        let validated = draft.validate()?;
        let existing = self.require_job(id).await?;
        let job = validated.assign_id(id, existing.created_at(), self.clock.now());
        self.jobs.upsert_job(&job).await?;
        info!(job_id = %id, status = job.status().as_str(), "job updated");
        Ok(job)
    }

    /// # Errors
    ///
    /// Returns `JobServiceError::Storage` if the lookup fails.
    pub async fn get_job(&self, id: JobId) -> Result<Option<Job>, JobServiceError> {
        Ok(self.jobs.get_job(id).await?)
    }

    /// Jobs matching the filter, latest start date first.
    ///
    /// # Errors
    ///
    /// Returns `JobServiceError::Storage` if the listing fails.
    pub async fn browse(&self, filter: &JobFilter) -> Result<Vec<Job>, JobServiceError> {
        let jobs = self.jobs.list_jobs(&filter.query()).await?;
        Ok(match filter.search.as_deref() {
            Some(term) => jobs.into_iter().filter(|j| j.matches_search(term)).collect(),
            None => jobs,
        })
    }

    /// # Errors
    ///
    /// Returns `JobServiceError::Storage` if the listing fails.
    pub async fn recent(&self, limit: u32) -> Result<Vec<Job>, JobServiceError> {
        Ok(self.jobs.recent_jobs(limit).await?)
    }

    /// Apply for an open job.
    ///
    /// # Errors
    ///
    /// Returns `JobServiceError::JobNotFound`, `JobServiceError::JobNotOpen`,
    /// `JobServiceError::AlreadyApplied`, or `JobServiceError::Storage`.
    pub async fn apply(
        &self,
        applicant: &SessionUser,
        job_id: JobId,
        message: &str,
    ) -> Result<Application, JobServiceError> {
        let job = self.require_job(job_id).await?;
        if !job.is_open() {
            return Err(JobServiceError::JobNotOpen {
                job_id,
                status: job.status(),
            });
        }
        let record = NewApplicationRecord {
            job_id,
            learner_id: applicant.id,
            message: message.trim().to_owned(),
            applied_at: self.clock.now(),
        };
        let application = match self.applications.insert_application(record).await {
            Ok(application) => application,
            Err(StorageError::Conflict) => return Err(JobServiceError::AlreadyApplied(job_id)),
            Err(e) => return Err(e.into()),
        };
        info!(
            application_id = %application.id(),
            job_id = %job_id,
            learner_id = %applicant.id,
            "applied for job"
        );
        Ok(application)
    }

    /// A learner's applications with the job title, newest first.
    ///
    /// # Errors
    ///
    /// Returns `JobServiceError::Storage` if a lookup fails.
    pub async fn my_applications(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<ApplicationListItem>, JobServiceError> {
        let applications = self
            .applications
            .list_applications_for_learner(learner_id)
            .await?;
        let mut items = Vec::with_capacity(applications.len());
        for application in applications {
            let job = self.jobs.get_job(application.job_id()).await?;
            items.push(ApplicationListItem::new(application, job.as_ref()));
        }
        Ok(items)
    }

    /// # Errors
    ///
    /// Returns `JobServiceError::Access` unless `actor` is an admin and
    /// `JobServiceError::JobNotFound` for an unknown job.
    pub async fn applications_for_job(
        &self,
        actor: &SessionUser,
        job_id: JobId,
    ) -> Result<Vec<Application>, JobServiceError> {
        actor.ensure_admin()?;
        self.require_job(job_id).await?;
        Ok(self.applications.list_applications_for_job(job_id).await?)
    }

    /// Approve or reject an application, with optional notes for the applicant.
    ///
    /// # Errors
    ///
    /// Returns `JobServiceError::Access` unless `actor` is an admin and
    /// `JobServiceError::ApplicationNotFound` for an unknown id.
    pub async fn review_application(
        &self,
        actor: &SessionUser,
        id: ApplicationId,
        status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application, JobServiceError> {
        actor.ensure_admin()?;
        let application = self
            .applications
            .get_application(id)
            .await?
            .ok_or(JobServiceError::ApplicationNotFound(id))?
            .reviewed(status, notes, self.clock.now());
        self.applications.update_application(&application).await?;
        info!(application_id = %id, status = status.as_str(), "application reviewed");
        Ok(application)
    }

    async fn require_job(&self, id: JobId) -> Result<Job, JobServiceError> {
        self.jobs
            .get_job(id)
            .await?
            .ok_or(JobServiceError::JobNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionContextError;
    use chrono::{Duration, NaiveDate};
    use storage::repository::InMemoryRepository;
    use training_core::model::{JOB_CATEGORIES, JOB_LOCATIONS, Role};
    use training_core::time::{fixed_clock, fixed_now};

    fn admin() -> SessionUser {
        SessionUser::new(LearnerId::new(1), "Admin", Role::Admin)
    }

    fn cleaner(id: u64) -> SessionUser {
        SessionUser::new(LearnerId::new(id), "Cleaner", Role::Cleaner)
    }

    fn draft(title: &str, location: &str) -> JobDraft {
        JobDraft {
            title: title.into(),
            project: "Westfield Plaza".into(),
            description: "After-hours office clean".into(),
            location: location.into(),
            category: JOB_CATEGORIES[1].into(),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
            pay_rate: 210.0,
            hours_per_day: 4.0,
            cleaners_needed: 2,
            status: JobStatus::Open,
        }
    }

    fn service() -> (JobService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        (JobService::new(fixed_clock(), repo.clone(), repo.clone()), repo)
    }

    #[tokio::test]
    async fn cleaners_cannot_post_jobs() {
        let (service, _) = service();
        let err = service
            .create_job(&cleaner(2), draft("Offices", JOB_LOCATIONS[0]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JobServiceError::Access(SessionContextError::NotAdmin)
        ));
    }

    #[tokio::test]
    async fn browse_filters_by_location_and_search() {
        let (service, _) = service();
        service
            .create_job(&admin(), draft("Offices", JOB_LOCATIONS[0]))
            .await
            .unwrap();
        service
            .create_job(&admin(), draft("Warehouse", JOB_LOCATIONS[3]))
            .await
            .unwrap();

        let sydney = service
            .browse(&JobFilter {
                location: Some(JOB_LOCATIONS[3].into()),
                ..JobFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(sydney.len(), 1);
        assert_eq!(sydney[0].title(), "Warehouse");

        let searched = service
            .browse(&JobFilter {
                search: Some("westfield".into()),
                location: Some("  ".into()),
                ..JobFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 2);
    }

    #[tokio::test]
    async fn apply_once_to_open_jobs_only() {
        let (service, _) = service();
        let open = service
            .create_job(&admin(), draft("Offices", JOB_LOCATIONS[0]))
            .await
            .unwrap();
        let mut filled = draft("Gym", JOB_LOCATIONS[0]);
        filled.status = JobStatus::Filled;
        let filled = service.create_job(&admin(), filled).await.unwrap();

        let application = service
            .apply(&cleaner(5), open, " Free weekends ")
            .await
            .unwrap();
        assert_eq!(application.status(), ApplicationStatus::Pending);
        assert_eq!(application.message(), "Free weekends");

        let again = service.apply(&cleaner(5), open, "").await.unwrap_err();
        assert!(matches!(again, JobServiceError::AlreadyApplied(id) if id == open));

        let closed = service.apply(&cleaner(5), filled, "").await.unwrap_err();
        assert!(matches!(
            closed,
            JobServiceError::JobNotOpen {
                status: JobStatus::Filled,
                ..
            }
        ));

        let missing = service
            .apply(&cleaner(5), JobId::new(99), "")
            .await
            .unwrap_err();
        assert!(matches!(missing, JobServiceError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn review_shows_up_in_my_applications() {
        let (service, _) = service();
        let job = service
            .create_job(&admin(), draft("Offices", JOB_LOCATIONS[0]))
            .await
            .unwrap();
        let application = service.apply(&cleaner(5), job, "Keen").await.unwrap();

        assert!(
            service
                .applications_for_job(&cleaner(5), job)
                .await
                .is_err()
        );
        let for_job = service.applications_for_job(&admin(), job).await.unwrap();
        assert_eq!(for_job.len(), 1);

        service
            .review_application(
                &admin(),
                application.id(),
                ApplicationStatus::Approved,
                Some("Bring ID".into()),
            )
            .await
            .unwrap();

        let mine = service.my_applications(LearnerId::new(5)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].job_title, "Offices");
        assert_eq!(mine[0].status, ApplicationStatus::Approved);
        assert_eq!(mine[0].admin_notes.as_deref(), Some("Bring ID"));
    }

    #[tokio::test]
    async fn application_for_missing_job_uses_fallback_title() {
        let (service, repo) = service();
        repo.insert_application(NewApplicationRecord {
            job_id: JobId::new(40),
            learner_id: LearnerId::new(5),
            message: String::new(),
            applied_at: fixed_now(),
        })
        .await
        .unwrap();

        let mine = service.my_applications(LearnerId::new(5)).await.unwrap();
        assert_eq!(mine[0].job_title, UNKNOWN_JOB_TITLE);
        assert_eq!(mine[0].job_location, None);
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = JobService::new(fixed_clock(), repo.clone(), repo.clone());
        let id = service
            .create_job(&admin(), draft("Offices", JOB_LOCATIONS[0]))
            .await
            .unwrap();

        let mut later = fixed_clock();
        later.advance(Duration::hours(5));
        let service = JobService::new(later, repo.clone(), repo);
        let mut edit = draft("Offices", JOB_LOCATIONS[0]);
        edit.status = JobStatus::Completed;
        let updated = service.update_job(&admin(), id, edit).await.unwrap();

        assert_eq!(updated.status(), JobStatus::Completed);
        assert_eq!(updated.created_at(), fixed_now());
        assert_eq!(updated.updated_at(), fixed_now() + Duration::hours(5));
    }
}
