use tracing::debug;
use training_core::model::{Application, ApplicationId, JobId, LearnerId};

use super::SqliteRepository;
use super::mapping::{application_id_from_i64, conn, id_to_i64, map_application_row};
use crate::repository::{ApplicationRepository, NewApplicationRecord, StorageError};

const APPLICATION_COLUMNS: &str =
    "id, job_id, learner_id, message, status, admin_notes, applied_at, updated_at";

#[async_trait::async_trait]
impl ApplicationRepository for SqliteRepository {
    async fn insert_application(
        &self,
        application: NewApplicationRecord,
    ) -> Result<Application, StorageError> {
        let job = id_to_i64("job_id", application.job_id.value())?;
        let learner = id_to_i64("learner_id", application.learner_id.value())?;

        // One application per learner and job.
        let res = sqlx::query(
            r"
            INSERT INTO job_applications (
                job_id, learner_id, message, status, admin_notes, applied_at, updated_at
            )
            VALUES (?1, ?2, ?3, 'pending', NULL, ?4, ?4)
            ON CONFLICT(job_id, learner_id) DO NOTHING
            ",
        )
        .bind(job)
        .bind(learner)
        .bind(&application.message)
        .bind(application.applied_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        let id = application_id_from_i64(res.last_insert_rowid())?;
        debug!(application_id = %id, job_id = job, learner_id = learner, "inserted application");
        self.get_application(id).await?.ok_or(StorageError::NotFound)
    }

    async fn update_application(&self, application: &Application) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE job_applications
            SET status = ?2, admin_notes = ?3, updated_at = ?4
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("application_id", application.id().value())?)
        .bind(application.status().as_str())
        .bind(application.admin_notes())
        .bind(application.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        debug!(
            application_id = %application.id(),
            status = application.status().as_str(),
            "updated application"
        );
        Ok(())
    }

    async fn get_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE id = ?1"
        ))
        .bind(id_to_i64("application_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_application_row).transpose()
    }

    async fn list_applications_for_learner(
        &self,
        learner_id: LearnerId,
    ) -> Result<Vec<Application>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {APPLICATION_COLUMNS}
            FROM job_applications
            WHERE learner_id = ?1
            ORDER BY applied_at DESC, id DESC
            "
        ))
        .bind(id_to_i64("learner_id", learner_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_application_row).collect()
    }

    async fn list_applications_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<Application>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {APPLICATION_COLUMNS}
            FROM job_applications
            WHERE job_id = ?1
            ORDER BY applied_at DESC, id DESC
            "
        ))
        .bind(id_to_i64("job_id", job_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_application_row).collect()
    }
}
