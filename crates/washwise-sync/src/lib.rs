//! # washwise-sync: Polling & Reconciliation for WashWise
//!
//! Polls the vending platform on three cadences and folds what it sees into
//! the local store. Machines are discovered, their status is refreshed, and
//! usage sessions are inferred from status transitions.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sync Architecture                               │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                          Scheduler                               │  │
//! │  │                                                                  │  │
//! │  │  startup: types ─► machines ─► details   (once, awaited)         │  │
//! │  │  then three tokio tasks, one watch channel for cancellation      │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ Reconcile                               │
//! │                               ▼                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                          SyncEngine                              │  │
//! │  │                                                                  │  │
//! │  │  types pass     ──► MachineTypeCache                             │  │
//! │  │  machines pass  ──► MachineRepository::insert_if_absent          │  │
//! │  │  details pass   ──► apply_detail ─► UsageRepository::create      │  │
//! │  └───────────┬──────────────────────────────────────┬───────────────┘  │
//! │              │ VendingApi                           │ Database          │
//! │              ▼                                      ▼                   │
//! │  ┌────────────────────────┐            ┌────────────────────────┐      │
//! │  │ QiekjClient (reqwest)  │            │ washwise-db (SQLite)   │      │
//! │  └────────────────────────┘            └────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`cache`] - Per-shop machine type cache
//! - [`client`] - `VendingApi` trait and the reqwest-backed `QiekjClient`
//! - [`clock`] - System and manual clocks
//! - [`config`] - TOML + environment configuration
//! - [`engine`] - The three reconciliation passes
//! - [`error`] - Sync error types
//! - [`scheduler`] - Cadence loops and cancellation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use washwise_sync::{QiekjClient, Scheduler, SyncConfig, SyncEngine};
//!
//! let config = SyncConfig::load(None)?;
//! let api = Arc::new(QiekjClient::new(&config.api)?);
//! let engine = Arc::new(SyncEngine::new(api, database, &config));
//!
//! let mut scheduler = Scheduler::new(engine, config.cron);
//! scheduler.start().await?;
//! // ...
//! scheduler.stop();
//! scheduler.join().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::MachineTypeCache;
pub use client::{QiekjClient, VendingApi};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ApiSettings, CronSettings, ShopConfig, SyncConfig, CONFIG_PATH_ENV};
pub use engine::{DetailSyncReport, ListSyncReport, Reconcile, SyncEngine, TypesSyncReport};
pub use error::{SyncError, SyncResult};
pub use scheduler::Scheduler;
