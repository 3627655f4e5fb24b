//! # washwise-core: Pure Domain Logic for WashWise
//!
//! This crate is the **heart** of WashWise. It holds the laundry machine
//! domain model and the usage inference rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        WashWise Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/server (HTTP facade, axum)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        washwise-sync (scheduler, sync engine, type cache)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ washwise-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────────┐  ┌───────────────────────┐  │   │
//! │  │   │   types   │  │     usage     │  │      validation       │  │   │
//! │  │   │  Machine  │  │  estimator    │  │  machine id parsing   │  │   │
//! │  │   │  Session  │  │  transitions  │  │                       │  │   │
//! │  │   └───────────┘  └───────────────┘  └───────────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 washwise-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Machine, MachineType, UsageSession, ...)
//! - [`usage`] - Usage session detection and the duration estimator
//! - [`error`] - Domain error types
//! - [`validation`] - Identifier validation
//!
//! ## Example Usage
//!
//! ```rust
//! use washwise_core::usage::estimate_avg_use_time;
//!
//! // First valid sample becomes the estimate
//! assert_eq!(estimate_avg_use_time(0, 1800), 1800);
//!
//! // Short samples (self-clean cycles) are discarded
//! assert_eq!(estimate_avg_use_time(1800, 300), 1800);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod usage;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use types::*;
pub use usage::{apply_detail, estimate_avg_use_time, Observation};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sessions shorter than this (seconds) are treated as noise.
///
/// ## Business Reason
/// Short in-use blips are usually self-clean cycles or a user aborting a
/// program, not a real wash.
pub const MIN_SESSION_SECS: i64 = 10 * 60;

/// Sessions longer than this (seconds) are clamped before averaging.
///
/// ## Business Reason
/// A missed poll (service outage) can make a session look hours long.
/// Clamping stops one such artifact from inflating the average.
pub const MAX_SESSION_SECS: i64 = 120 * 60;

/// Predicted session length (seconds) while a machine has no estimate yet.
pub const DEFAULT_PREDICTED_USE_TIME_SECS: i64 = 45 * 60;
