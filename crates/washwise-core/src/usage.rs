//! # Usage Inference
//!
//! Detects the start and end of "machine in use" sessions from consecutive
//! status observations, and maintains a smoothed estimate of how long a
//! session takes.
//!
//! ## Detection
//! ```text
//!   stored code        fetched code       effect
//!   ───────────        ────────────       ──────────────────────────────────
//!   Available    ──►   InUse              last_use_time = now
//!   other        ──►   InUse              last_use_time = 0 (start unknown)
//!   InUse        ──►   anything else      session (last_use_time, now) closed
//!                                         avg_use_time = estimate(avg, dur)
//!                                         unless last_use_time == 0
//!   anything else                         nothing
//! ```
//!
//! `Offline → InUse` starts nothing: a machine first seen while already
//! running has no trustworthy start time. Clearing `last_use_time` there
//! keeps a start stamped by an earlier session from being reused when the
//! machine later leaves `InUse`.
//!
//! ## Estimator
//! ```text
//!   sample < 600s        discard (self-clean, aborted program)
//!   sample > 7200s       clamp to 7200s (missed polls)
//!   previous == 0        take the sample
//!   otherwise            (previous * 9 + sample) / 10
//! ```

use crate::types::{Machine, MachineDetail, MachineStatus, NewUsageSession};
use crate::{MAX_SESSION_SECS, MIN_SESSION_SECS};

// =============================================================================
// Estimator
// =============================================================================

/// Folds a new session length into the running average.
///
/// Integer arithmetic, truncating. With a fixed sample the estimate moves
/// monotonically toward it and never overshoots.
pub fn estimate_avg_use_time(previous_avg: i64, sample: i64) -> i64 {
    if sample < MIN_SESSION_SECS {
        return previous_avg;
    }
    let sample = sample.min(MAX_SESSION_SECS);
    if previous_avg == 0 {
        return sample;
    }
    (previous_avg * 9 + sample) / 10
}

// =============================================================================
// Transition Detection
// =============================================================================

/// Outcome of applying one detail observation to a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The machine went from Available to InUse.
    SessionStarted,
    /// The machine left InUse; the session must be persisted.
    SessionEnded(NewUsageSession),
    /// The machine left InUse but its start was never observed. Nothing is
    /// recorded and the estimate is left alone.
    UntrackedEnd,
    /// No bookkeeping needed.
    Unchanged,
}

/// Applies a freshly fetched detail to a stored machine record.
///
/// Transition detection compares the *stored* code with the fetched one, so
/// it runs before the descriptive fields are overwritten. On return the
/// record carries the new name, shop, code and message, plus any
/// `last_use_time` / `avg_use_time` change.
///
/// The caller persists the returned session (if any) before saving the
/// machine.
pub fn apply_detail(machine: &mut Machine, detail: &MachineDetail, now: i64) -> Observation {
    let previous = machine.status();
    let current = detail.status();

    let observation = match (previous, current) {
        (MachineStatus::Available, MachineStatus::InUse) => {
            machine.last_use_time = now;
            Observation::SessionStarted
        }
        (previous, MachineStatus::InUse) if !previous.is_in_use() => {
            machine.last_use_time = 0;
            Observation::Unchanged
        }
        (MachineStatus::InUse, current)
            if !current.is_in_use() && machine.last_use_time == 0 =>
        {
            Observation::UntrackedEnd
        }
        (MachineStatus::InUse, current) if !current.is_in_use() => {
            let session = NewUsageSession {
                machine_id: machine.id,
                start_time: machine.last_use_time,
                end_time: now,
            };
            machine.avg_use_time =
                estimate_avg_use_time(machine.avg_use_time, now - machine.last_use_time);
            Observation::SessionEnded(session)
        }
        _ => Observation::Unchanged,
    };

    machine.name = detail.name.clone();
    machine.shop_id = detail.shop_id.clone();
    machine.code = detail.error_code;
    machine.msg = detail.error_message.clone().unwrap_or_default();

    observation
}

// =============================================================================
// Unit Tests
// =============================================================================
