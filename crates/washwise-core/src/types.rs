//! # Domain Types
//!
//! Core domain types used throughout WashWise.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Remote observations (transient)      Persistent records               │
//! │  ┌─────────────────┐                  ┌─────────────────┐              │
//! │  │  MachineType    │                  │    Machine      │              │
//! │  │  type_id        │   list pass      │  id (remote)    │              │
//! │  │  type_name      │ ───────────────► │  code (status)  │              │
//! │  └─────────────────┘                  │  last_use_time  │              │
//! │  ┌─────────────────┐                  │  avg_use_time   │              │
//! │  │ MachineListItem │                  └────────┬────────┘              │
//! │  │  id (string)    │                           │ detail pass           │
//! │  │  name           │                           ▼                       │
//! │  └─────────────────┘                  ┌─────────────────┐              │
//! │  ┌─────────────────┐                  │  UsageSession   │              │
//! │  │  MachineDetail  │ ───────────────► │  machine_id     │              │
//! │  │  error_code     │   on InUse end   │  start / end    │              │
//! │  └─────────────────┘                  └─────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Time Representation
//! All timestamps are unix seconds (`i64`). Durations are plain seconds.
//! Nothing in this module reads the clock; callers pass `now` explicitly.

use serde::{Deserialize, Serialize};

use crate::DEFAULT_PREDICTED_USE_TIME_SECS;

// =============================================================================
// Machine Status
// =============================================================================

/// Status code reported by the vending platform.
///
/// Only three codes carry meaning. Anything else is kept verbatim on the
/// machine record and treated as "not in use".
///
/// ## State Transitions That Matter
/// ```text
///   Available ──────► InUse        session starts (last_use_time = now)
///   InUse ──────────► anything     session ends   (UsageSession written)
///   everything else                no bookkeeping
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum MachineStatus {
    /// Idle and ready.
    Available,
    /// Powered off or unreachable. Newly discovered machines start here.
    Offline,
    /// Running a program.
    InUse,
    /// Any other platform code (fault codes and the like).
    Other(i32),
}

impl MachineStatus {
    /// Returns the raw platform code.
    pub const fn code(self) -> i32 {
        match self {
            MachineStatus::Available => 0,
            MachineStatus::Offline => 1,
            MachineStatus::InUse => 2,
            MachineStatus::Other(code) => code,
        }
    }

    /// Whether the machine is running a program.
    #[inline]
    pub const fn is_in_use(self) -> bool {
        matches!(self, MachineStatus::InUse)
    }
}

impl From<i32> for MachineStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => MachineStatus::Available,
            1 => MachineStatus::Offline,
            2 => MachineStatus::InUse,
            other => MachineStatus::Other(other),
        }
    }
}

impl From<MachineStatus> for i32 {
    fn from(status: MachineStatus) -> Self {
        status.code()
    }
}

// =============================================================================
// Machine Type
// =============================================================================

/// A category of machine offered by a shop (washer, dryer, shoe washer...).
///
/// Transient: only ever held in the type cache, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineType {
    /// Platform type id, opaque string.
    pub type_id: String,
    /// Human-readable type name, copied onto machines at discovery.
    pub type_name: String,
}

impl MachineType {
    pub fn new(type_id: impl Into<String>, type_name: impl Into<String>) -> Self {
        MachineType {
            type_id: type_id.into(),
            type_name: type_name.into(),
        }
    }
}

// =============================================================================
// Remote Observations
// =============================================================================

/// One entry of a shop's machine listing.
///
/// The id arrives as a string and has not been validated yet; see
/// [`crate::validation::parse_machine_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineListItem {
    pub id: String,
    pub name: String,
}

/// Current state of a single machine as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDetail {
    pub name: String,
    pub shop_id: String,
    /// Raw status code, see [`MachineStatus`].
    pub error_code: i32,
    /// Platform-supplied status message, if any.
    pub error_message: Option<String>,
}

impl MachineDetail {
    /// Decoded status.
    #[inline]
    pub fn status(&self) -> MachineStatus {
        MachineStatus::from(self.error_code)
    }
}

// =============================================================================
// Machine
// =============================================================================

/// A physical laundry machine, as stored locally.
///
/// ## Lifecycle
/// - Inserted (if absent) by the machine list pass with `code = Offline`
/// - Mutated by the detail pass and the usage tracker
/// - Never deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    /// Remote machine id, also the primary key.
    pub id: i64,
    pub name: String,
    /// Machine type name at first listing.
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub machine_type: String,
    pub shop_id: String,
    /// Raw status code, see [`MachineStatus`].
    pub code: i32,
    /// Status message, empty when the platform sent none.
    pub msg: String,
    /// Unix seconds at which the latest in-use session started.
    pub last_use_time: i64,
    /// Smoothed session length in seconds, `0` until the first valid sample.
    pub avg_use_time: i64,
}

impl Machine {
    /// Builds the record for a machine seen for the first time in a listing.
    pub fn discovered(
        id: i64,
        name: impl Into<String>,
        machine_type: impl Into<String>,
        shop_id: impl Into<String>,
    ) -> Self {
        Machine {
            id,
            name: name.into(),
            machine_type: machine_type.into(),
            shop_id: shop_id.into(),
            code: MachineStatus::Offline.code(),
            msg: String::new(),
            last_use_time: 0,
            avg_use_time: 0,
        }
    }

    /// Decoded status.
    #[inline]
    pub fn status(&self) -> MachineStatus {
        MachineStatus::from(self.code)
    }

    /// Expected session length in seconds.
    ///
    /// Falls back to [`DEFAULT_PREDICTED_USE_TIME_SECS`] before the first
    /// sample has been recorded.
    pub fn predicted_use_time(&self) -> i64 {
        if self.avg_use_time > 0 {
            self.avg_use_time
        } else {
            DEFAULT_PREDICTED_USE_TIME_SECS
        }
    }

    /// Estimated seconds until the current session ends.
    ///
    /// `0` when the machine is not in use or the prediction has elapsed.
    pub fn remaining_time(&self, now: i64) -> i64 {
        if !self.status().is_in_use() {
            return 0;
        }
        (self.last_use_time + self.predicted_use_time() - now).max(0)
    }
}

/// A machine together with the number of sessions started in a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MachineWithUsage {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub machine: Machine,
    pub usage_count: i64,
}

// =============================================================================
// Usage Session
// =============================================================================

/// A completed in-use interval, bounded by two polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct UsageSession {
    pub id: i64,
    pub machine_id: i64,
    pub start_time: i64,
    pub end_time: i64,
}

impl UsageSession {
    /// Session length in seconds.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }
}

/// A session about to be written; the store assigns the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUsageSession {
    pub machine_id: i64,
    pub start_time: i64,
    pub end_time: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
