//! # Machine Repository
//!
//! Persistence for [`Machine`] records.
//!
//! ## Write Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert_if_absent(batch)   list pass, one transaction per type batch   │
//! │                            INSERT .. ON CONFLICT(id) DO NOTHING        │
//! │                            existing rows are never touched             │
//! │                                                                         │
//! │  update(machine)           detail pass, full-record overwrite          │
//! │                                                                         │
//! │  upsert(machine)           tooling / tests: insert or overwrite        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use washwise_core::{Machine, MachineWithUsage};

const MACHINE_COLUMNS: &str =
    "id, name, type, shop_id, code, msg, last_use_time, avg_use_time";

/// Repository for machine records.
#[derive(Debug, Clone)]
pub struct MachineRepository {
    pool: SqlitePool,
}

impl MachineRepository {
    /// Creates a new MachineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MachineRepository { pool }
    }

    /// Inserts every machine whose id is not stored yet.
    ///
    /// The whole batch runs in one transaction. Returns the number of rows
    /// actually inserted; machines already present are left untouched, so
    /// their code, timestamps and estimate survive rediscovery.
    pub async fn insert_if_absent(&self, machines: &[Machine]) -> DbResult<u64> {
        if machines.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for machine in machines {
            let result = sqlx::query(
                r#"
                INSERT INTO machines (
                    id, name, type, shop_id, code, msg, last_use_time, avg_use_time
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(machine.id)
            .bind(&machine.name)
            .bind(&machine.machine_type)
            .bind(&machine.shop_id)
            .bind(machine.code)
            .bind(&machine.msg)
            .bind(machine.last_use_time)
            .bind(machine.avg_use_time)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        debug!(
            batch = machines.len(),
            inserted = inserted,
            "Machine batch persisted"
        );

        Ok(inserted)
    }

    /// Inserts a machine or overwrites every field of an existing one.
    pub async fn upsert(&self, machine: &Machine) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO machines (
                id, name, type, shop_id, code, msg, last_use_time, avg_use_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                type = excluded.type,
                shop_id = excluded.shop_id,
                code = excluded.code,
                msg = excluded.msg,
                last_use_time = excluded.last_use_time,
                avg_use_time = excluded.avg_use_time
            "#,
        )
        .bind(machine.id)
        .bind(&machine.name)
        .bind(&machine.machine_type)
        .bind(&machine.shop_id)
        .bind(machine.code)
        .bind(&machine.msg)
        .bind(machine.last_use_time)
        .bind(machine.avg_use_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Saves the full record of an existing machine.
    ///
    /// ## Errors
    /// `DbError::NotFound` if no machine has this id.
    pub async fn update(&self, machine: &Machine) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE machines SET
                name = ?2,
                type = ?3,
                shop_id = ?4,
                code = ?5,
                msg = ?6,
                last_use_time = ?7,
                avg_use_time = ?8
            WHERE id = ?1
            "#,
        )
        .bind(machine.id)
        .bind(&machine.name)
        .bind(&machine.machine_type)
        .bind(&machine.shop_id)
        .bind(machine.code)
        .bind(&machine.msg)
        .bind(machine.last_use_time)
        .bind(machine.avg_use_time)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Machine", machine.id));
        }

        Ok(())
    }

    /// Every stored machine, ordered by id.
    pub async fn get_all(&self) -> DbResult<Vec<Machine>> {
        let sql = format!("SELECT {MACHINE_COLUMNS} FROM machines ORDER BY id");
        let machines = sqlx::query_as::<_, Machine>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(machines)
    }

    /// Looks up one machine.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Machine>> {
        let sql = format!("SELECT {MACHINE_COLUMNS} FROM machines WHERE id = ?1");
        let machine = sqlx::query_as::<_, Machine>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(machine)
    }

    /// Machines of one shop, ordered by id.
    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Machine>> {
        let sql = format!("SELECT {MACHINE_COLUMNS} FROM machines WHERE shop_id = ?1 ORDER BY id");
        let machines = sqlx::query_as::<_, Machine>(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(machines)
    }

    /// Machines of one shop with the number of sessions started in
    /// `[from, to)` (unix seconds).
    pub async fn list_by_shop_with_usage_count(
        &self,
        shop_id: &str,
        from: i64,
        to: i64,
    ) -> DbResult<Vec<MachineWithUsage>> {
        let rows = sqlx::query_as::<_, MachineWithUsage>(
            r#"
            SELECT
                m.id, m.name, m.type, m.shop_id, m.code, m.msg,
                m.last_use_time, m.avg_use_time,
                (
                    SELECT COUNT(*) FROM usages u
                    WHERE u.machine_id = m.id
                      AND u.start_time >= ?2
                      AND u.start_time < ?3
                ) AS usage_count
            FROM machines m
            WHERE m.shop_id = ?1
            ORDER BY m.id
            "#,
        )
        .bind(shop_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Number of machines stored for a shop.
    pub async fn count_by_shop(&self, shop_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM machines WHERE shop_id = ?1")
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
