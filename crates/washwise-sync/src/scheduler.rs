//! # Scheduler
//!
//! Drives the three reconciliation passes on their own cadences.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start()                                                                │
//! │    │                                                                    │
//! │    ├─► types pass ─► list pass ─► detail pass     (awaited, in order)   │
//! │    │                                                                    │
//! │    ├─► spawn types loop    ─┐                                           │
//! │    ├─► spawn machines loop ─┼─ each: select! { cancelled, tick }        │
//! │    └─► spawn details loop  ─┘                                           │
//! │                                                                         │
//! │  stop()  ──► watch::send(true) ──► every loop exits at its next select  │
//! │  join()  ──► await loop exit                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A loop awaits its pass before polling the timer again, so a pass never
//! overlaps itself. Ticks that fall due while a pass is running are
//! skipped, not queued. Different passes run independently of each other.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::CronSettings;
use crate::engine::Reconcile;
use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy)]
enum Pass {
    MachineTypes,
    Machines,
    MachineDetails,
}

impl Pass {
    fn name(self) -> &'static str {
        match self {
            Pass::MachineTypes => "machine_types",
            Pass::Machines => "machines",
            Pass::MachineDetails => "machine_details",
        }
    }

    async fn run(self, reconciler: &dyn Reconcile) {
        match self {
            Pass::MachineTypes => reconciler.reconcile_machine_types().await,
            Pass::Machines => reconciler.reconcile_machines().await,
            Pass::MachineDetails => reconciler.reconcile_machine_details().await,
        }
    }
}

/// Owns the polling loops.
pub struct Scheduler {
    reconciler: Arc<dyn Reconcile>,
    cron: CronSettings,
    cancel_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    started: bool,
}

impl Scheduler {
    pub fn new(reconciler: Arc<dyn Reconcile>, cron: CronSettings) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Scheduler {
            reconciler,
            cron,
            cancel_tx,
            tasks: Vec::new(),
            started: false,
        }
    }

    /// Runs the startup pass, then arms the three loops.
    ///
    /// Returns once the loops are spawned.
    pub async fn start(&mut self) -> SyncResult<()> {
        if self.started {
            return Err(SyncError::AlreadyStarted);
        }
        self.started = true;

        info!("Running startup reconciliation");
        for pass in [Pass::MachineTypes, Pass::Machines, Pass::MachineDetails] {
            pass.run(self.reconciler.as_ref()).await;
        }

        for (pass, period) in [
            (Pass::MachineTypes, self.cron.machine_types_interval()),
            (Pass::Machines, self.cron.machines_interval()),
            (Pass::MachineDetails, self.cron.machine_details_interval()),
        ] {
            let handle = tokio::spawn(run_loop(
                pass,
                period,
                self.reconciler.clone(),
                self.cancel_tx.subscribe(),
            ));
            self.tasks.push(handle);
        }

        info!(
            types_secs = self.cron.machine_types_interval_secs,
            machines_secs = self.cron.machines_interval_secs,
            details_secs = self.cron.machine_details_interval_secs,
            "Scheduler started"
        );
        Ok(())
    }

    /// Signals every loop to exit. Does not wait for in-flight passes.
    pub fn stop(&self) {
        self.cancel_tx.send_replace(true);
        info!("Scheduler stop requested");
    }

    /// Waits for all loops to exit.
    pub async fn join(&mut self) {
        for handle in self.tasks.drain(..) {
            let _ = handle.await;
        }
    }

    /// True between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.started && !*self.cancel_tx.borrow()
    }
}

async fn run_loop(
    pass: Pass,
    period: Duration,
    reconciler: Arc<dyn Reconcile>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if *cancel.borrow() {
            break;
        }

        tokio::select! {
            biased;

            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
            }

            _ = ticker.tick() => {
                debug!(pass = pass.name(), "Tick");
                pass.run(reconciler.as_ref()).await;
            }
        }
    }

    debug!(pass = pass.name(), "Loop stopped");
}

// =============================================================================
// Unit Tests
// =============================================================================
