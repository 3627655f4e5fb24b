//! # washwise-db: Database Layer for WashWise
//!
//! This crate provides database access for WashWise.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        WashWise Data Flow                               │
//! │                                                                         │
//! │  Sync engine (writes)              HTTP facade (reads)                 │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   washwise-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ MachineRepo   │    │ 0001_initial │  │   │
//! │  │   │ SqlitePool    │◄───│ UsageRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                     (database.path, WAL mode)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (machine, usage)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use washwise_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("washwise.db")).await?;
//!
//! let machines = db.machines().list_by_shop("S1").await?;
//! let sessions = db.usages().count_in_range(from, to).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::machine::MachineRepository;
pub use repository::usage::UsageRepository;
