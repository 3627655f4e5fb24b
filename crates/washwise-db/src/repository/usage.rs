//! # Usage Repository
//!
//! Completed usage sessions. A row is written exactly once per session, at
//! the moment the detail pass observes the machine leaving `InUse`. Range
//! queries filter on `start_time`, half-open `[from, to)`.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use washwise_core::{NewUsageSession, UsageSession};

/// Repository for usage sessions.
#[derive(Debug, Clone)]
pub struct UsageRepository {
    pool: SqlitePool,
}

impl UsageRepository {
    /// Creates a new UsageRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UsageRepository { pool }
    }

    /// Records a completed session and returns it with its assigned id.
    pub async fn create(&self, session: &NewUsageSession) -> DbResult<UsageSession> {
        let result = sqlx::query(
            "INSERT INTO usages (machine_id, start_time, end_time) VALUES (?1, ?2, ?3)",
        )
        .bind(session.machine_id)
        .bind(session.start_time)
        .bind(session.end_time)
        .execute(&self.pool)
        .await?;

        let created = UsageSession {
            id: result.last_insert_rowid(),
            machine_id: session.machine_id,
            start_time: session.start_time,
            end_time: session.end_time,
        };

        debug!(
            machine_id = created.machine_id,
            usage_id = created.id,
            duration = created.duration(),
            "Usage session recorded"
        );

        Ok(created)
    }

    /// All sessions of a machine, most recent first.
    pub async fn list_by_machine(&self, machine_id: i64) -> DbResult<Vec<UsageSession>> {
        let sessions = sqlx::query_as::<_, UsageSession>(
            r#"
            SELECT id, machine_id, start_time, end_time
            FROM usages
            WHERE machine_id = ?1
            ORDER BY start_time DESC, id DESC
            "#,
        )
        .bind(machine_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    /// Sessions of a machine started in `[from, to)`.
    pub async fn count_by_machine_in_range(
        &self,
        machine_id: i64,
        from: i64,
        to: i64,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM usages
            WHERE machine_id = ?1 AND start_time >= ?2 AND start_time < ?3
            "#,
        )
        .bind(machine_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Sessions of any machine started in `[from, to)`.
    pub async fn count_in_range(&self, from: i64, to: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM usages WHERE start_time >= ?1 AND start_time < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Most recent session of a machine, if any.
    pub async fn latest_by_machine(&self, machine_id: i64) -> DbResult<Option<UsageSession>> {
        let session = sqlx::query_as::<_, UsageSession>(
            r#"
            SELECT id, machine_id, start_time, end_time
            FROM usages
            WHERE machine_id = ?1
            ORDER BY start_time DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(machine_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
