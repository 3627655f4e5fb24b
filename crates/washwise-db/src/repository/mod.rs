//! # Repository Module
//!
//! Database repository implementations for WashWise.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Calls What                                       │
//! │                                                                         │
//! │  List pass      ──► machines().insert_if_absent(batch)                 │
//! │  Detail pass    ──► machines().get_all() / update(m)                   │
//! │                 ──► usages().create(session)                           │
//! │  HTTP facade    ──► machines().list_by_shop_with_usage_count(..)       │
//! │                 ──► machines().get_by_id(id)                           │
//! │                 ──► usages().count_by_machine_in_range(..)             │
//! │                                                                         │
//! │  SQL lives only in this module.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`MachineRepository`](machine::MachineRepository) - Machine records
//! - [`UsageRepository`](usage::UsageRepository) - Completed usage sessions

pub mod machine;
pub mod usage;
