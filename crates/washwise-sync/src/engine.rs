//! # Sync Engine
//!
//! The three reconciliation passes. Each pass walks its whole input
//! sequentially, logs and counts per-item failures, and never aborts early.
//!
//! ## Passes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TYPES PASS  (slowest cadence)                                         │
//! │    for shop in config order:                                           │
//! │      fetch_types(shop) ── ok ──► cache.put(shop, types)                │
//! │                        └─ err ─► warn, keep previous entry             │
//! │                                                                         │
//! │  LIST PASS                                                             │
//! │    for shop: cache.get(shop) ── none ──► warn, skip shop               │
//! │      for type: fetch_machines(shop, type, page_size, 1)                │
//! │        parse ids (reject non-positive / malformed)                     │
//! │        machines.insert_if_absent(batch)   one transaction, awaited     │
//! │                                                                         │
//! │  DETAIL PASS  (fastest cadence)                                        │
//! │    for machine in store (id order):                                    │
//! │      fetch_detail(id) ── err ──► warn, leave stored state alone        │
//! │      apply_detail(stored, fetched, now)                                │
//! │        SessionEnded ──► usages.create(session) ── err ──► skip save    │
//! │      machines.update(machine)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! If writing a finished session fails the machine is not saved either, so
//! the stored code stays `InUse` and the next detail pass closes the session
//! again.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cache::MachineTypeCache;
use crate::client::VendingApi;
use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::error::SyncError;
use washwise_core::validation::parse_machine_id;
use washwise_core::{apply_detail, Machine, Observation};
use washwise_db::Database;

/// Only the first page of each machine listing is fetched.
const FIRST_PAGE: u32 = 1;

// =============================================================================
// Reports
// =============================================================================

/// Outcome of one types pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypesSyncReport {
    /// Shops attempted.
    pub shops: usize,
    /// Shops whose cache entry was replaced.
    pub refreshed: usize,
    /// Shops whose fetch failed.
    pub failed: usize,
}

/// Outcome of one machine list pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListSyncReport {
    /// Listing entries with a usable id.
    pub discovered: usize,
    /// Machines stored for the first time.
    pub inserted: u64,
    /// Listing entries dropped for a malformed id.
    pub rejected: usize,
    /// Shops skipped because no types were cached.
    pub skipped_shops: usize,
    /// Type batches whose fetch or write failed.
    pub failed_batches: usize,
}

/// Outcome of one detail pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailSyncReport {
    /// Machines attempted.
    pub total: usize,
    /// Machines saved.
    pub updated: usize,
    /// Machines whose fetch or write failed.
    pub failed: usize,
    /// Usage sessions written.
    pub sessions_closed: usize,
}

// =============================================================================
// Reconcile Trait
// =============================================================================

/// The three passes, as seen by the scheduler.
///
/// Implementations log their own failures; the scheduler only decides when
/// to call.
#[async_trait]
pub trait Reconcile: Send + Sync + 'static {
    async fn reconcile_machine_types(&self);
    async fn reconcile_machines(&self);
    async fn reconcile_machine_details(&self);
}

// =============================================================================
// Engine
// =============================================================================

/// Reconciles the vending platform into the local store.
pub struct SyncEngine {
    api: Arc<dyn VendingApi>,
    db: Database,
    cache: MachineTypeCache,
    clock: Arc<dyn Clock>,
    shops: Vec<String>,
    page_size: u32,
}

impl SyncEngine {
    /// Creates an engine with an empty cache and the system clock.
    pub fn new(api: Arc<dyn VendingApi>, db: Database, config: &SyncConfig) -> Self {
        SyncEngine {
            api,
            db,
            cache: MachineTypeCache::new(),
            clock: Arc::new(SystemClock),
            shops: config.shop_ids(),
            page_size: config.api.machine_page_size,
        }
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Uses an existing cache handle instead of a fresh one.
    pub fn with_cache(mut self, cache: MachineTypeCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &MachineTypeCache {
        &self.cache
    }

    // =========================================================================
    // Types Pass
    // =========================================================================

    /// Refreshes the type cache for every configured shop.
    pub async fn sync_machine_types(&self) -> TypesSyncReport {
        let mut report = TypesSyncReport {
            shops: self.shops.len(),
            ..Default::default()
        };

        for shop_id in &self.shops {
            match self.api.fetch_types(shop_id).await {
                Ok(types) => {
                    debug!(shop_id = %shop_id, count = types.len(), "Machine types refreshed");
                    self.cache.put(shop_id, types).await;
                    report.refreshed += 1;
                }
                Err(e) => {
                    warn!(shop_id = %shop_id, error = %e, "Failed to fetch machine types");
                    report.failed += 1;
                }
            }
        }

        info!(
            shops = report.shops,
            refreshed = report.refreshed,
            failed = report.failed,
            "Machine types pass finished"
        );
        report
    }

    // =========================================================================
    // List Pass
    // =========================================================================

    /// Discovers machines of every cached type and stores the new ones.
    pub async fn sync_machines(&self) -> ListSyncReport {
        let mut report = ListSyncReport::default();
        let machines = self.db.machines();

        for shop_id in &self.shops {
            let Some(types) = self.cache.get(shop_id).await else {
                warn!(shop_id = %shop_id, "No machine types cached, skipping shop");
                report.skipped_shops += 1;
                continue;
            };

            for machine_type in &types {
                let items = match self
                    .api
                    .fetch_machines(shop_id, &machine_type.type_id, self.page_size, FIRST_PAGE)
                    .await
                {
                    Ok(items) => items,
                    Err(e) => {
                        warn!(
                            shop_id = %shop_id,
                            machine_type_id = %machine_type.type_id,
                            error = %e,
                            "Failed to fetch machines"
                        );
                        report.failed_batches += 1;
                        continue;
                    }
                };

                if items.len() >= self.page_size as usize {
                    warn!(
                        shop_id = %shop_id,
                        machine_type_id = %machine_type.type_id,
                        page_size = self.page_size,
                        "Machine listing filled a whole page, later pages are not fetched"
                    );
                }

                let mut batch = Vec::with_capacity(items.len());
                for item in items {
                    match parse_machine_id(&item.id) {
                        Ok(id) => batch.push(Machine::discovered(
                            id,
                            item.name,
                            machine_type.type_name.clone(),
                            shop_id.clone(),
                        )),
                        Err(e) => {
                            let e = SyncError::from(e);
                            warn!(
                                shop_id = %shop_id,
                                machine_type_id = %machine_type.type_id,
                                raw_id = %item.id,
                                error = %e,
                                "Rejecting machine with malformed id"
                            );
                            report.rejected += 1;
                        }
                    }
                }
                report.discovered += batch.len();

                match machines.insert_if_absent(&batch).await {
                    Ok(inserted) => report.inserted += inserted,
                    Err(e) => {
                        error!(
                            shop_id = %shop_id,
                            machine_type_id = %machine_type.type_id,
                            batch = batch.len(),
                            error = %e,
                            "Failed to store machine batch"
                        );
                        report.failed_batches += 1;
                    }
                }
            }
        }

        info!(
            discovered = report.discovered,
            inserted = report.inserted,
            rejected = report.rejected,
            skipped_shops = report.skipped_shops,
            failed_batches = report.failed_batches,
            "Machine list pass finished"
        );
        report
    }

    // =========================================================================
    // Detail Pass
    // =========================================================================

    /// Refreshes every stored machine and records finished sessions.
    pub async fn sync_machine_details(&self) -> DetailSyncReport {
        let mut report = DetailSyncReport::default();

        let stored = match self.db.machines().get_all().await {
            Ok(stored) => stored,
            Err(e) => {
                error!(error = %e, "Failed to load machines");
                return report;
            }
        };
        report.total = stored.len();

        for mut machine in stored {
            let detail = match self.api.fetch_detail(machine.id).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(machine_id = machine.id, error = %e, "Failed to fetch machine detail");
                    report.failed += 1;
                    continue;
                }
            };

            let now = self.clock.now();
            match apply_detail(&mut machine, &detail, now) {
                Observation::SessionStarted => {
                    debug!(machine_id = machine.id, start = now, "Usage session started");
                }
                Observation::SessionEnded(session) => {
                    if let Err(e) = self.db.usages().create(&session).await {
                        error!(
                            machine_id = machine.id,
                            start = session.start_time,
                            end = session.end_time,
                            error = %e,
                            "Failed to record usage session, will retry next pass"
                        );
                        report.failed += 1;
                        continue;
                    }
                    report.sessions_closed += 1;
                }
                Observation::UntrackedEnd => {
                    warn!(
                        machine_id = machine.id,
                        end = now,
                        "Machine left use without an observed start, no session recorded"
                    );
                }
                Observation::Unchanged => {}
            }

            match self.db.machines().update(&machine).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    error!(machine_id = machine.id, error = %e, "Failed to save machine");
                    report.failed += 1;
                }
            }
        }

        info!(
            total = report.total,
            updated = report.updated,
            failed = report.failed,
            sessions_closed = report.sessions_closed,
            "Machine detail pass finished"
        );
        report
    }
}

#[async_trait]
impl Reconcile for SyncEngine {
    async fn reconcile_machine_types(&self) {
        self.sync_machine_types().await;
    }

    async fn reconcile_machines(&self) {
        self.sync_machines().await;
    }

    async fn reconcile_machine_details(&self) {
        self.sync_machine_details().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
