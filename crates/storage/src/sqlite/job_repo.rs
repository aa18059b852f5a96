use tracing::debug;
use training_core::model::{Job, JobId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, job_id_from_i64, map_job_row};
use crate::repository::{JobQuery, JobRepository, NewJobRecord, StorageError};

const JOB_COLUMNS: &str = "id, title, project, description, location, category, start_date, \
    end_date, pay_rate, hours_per_day, cleaners_needed, status, created_at, updated_at";

#[async_trait::async_trait]
impl JobRepository for SqliteRepository {
    async fn insert_new_job(&self, job: NewJobRecord) -> Result<JobId, StorageError> {
        let draft = job.job;
        let res = sqlx::query(
            r"
            INSERT INTO jobs (
                title, project, description, location, category, start_date, end_date,
                pay_rate, hours_per_day, cleaners_needed, status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            ",
        )
        .bind(&draft.title)
        .bind(&draft.project)
        .bind(&draft.description)
        .bind(&draft.location)
        .bind(&draft.category)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.pay_rate)
        .bind(draft.hours_per_day)
        .bind(i64::from(draft.cleaners_needed))
        .bind(draft.status.as_str())
        .bind(job.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = res.last_insert_rowid();
        debug!(job_id = id, location = %draft.location, "inserted job");
        job_id_from_i64(id)
    }

    async fn upsert_job(&self, job: &Job) -> Result<(), StorageError> {
        let id = id_to_i64("job_id", job.id().value())?;
        sqlx::query(
            r"
            INSERT INTO jobs (
                id, title, project, description, location, category, start_date, end_date,
                pay_rate, hours_per_day, cleaners_needed, status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                project = excluded.project,
                description = excluded.description,
                location = excluded.location,
                category = excluded.category,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                pay_rate = excluded.pay_rate,
                hours_per_day = excluded.hours_per_day,
                cleaners_needed = excluded.cleaners_needed,
                status = excluded.status,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(id)
        .bind(job.title())
        .bind(job.project())
        .bind(job.description())
        .bind(job.location())
        .bind(job.category())
        .bind(job.start_date())
        .bind(job.end_date())
        .bind(job.pay_rate())
        .bind(job.hours_per_day())
        .bind(i64::from(job.cleaners_needed()))
        .bind(job.status().as_str())
        .bind(job.created_at())
        .bind(job.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        debug!(job_id = id, status = job.status().as_str(), "upserted job");
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StorageError> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"))
            .bind(id_to_i64("job_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_job_row).transpose()
    }

    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<Job>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {JOB_COLUMNS}
            FROM jobs
            WHERE (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR location = ?2)
              AND (?3 IS NULL OR status = ?3)
            ORDER BY start_date DESC, id ASC
            "
        ))
        .bind(query.category.as_deref())
        .bind(query.location.as_deref())
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_job_row).collect()
    }

    async fn recent_jobs(&self, limit: u32) -> Result<Vec<Job>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {JOB_COLUMNS}
            FROM jobs
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_job_row).collect()
    }
}
