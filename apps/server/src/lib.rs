//! # WashWise Server
//!
//! Read-only HTTP facade over the machine store, plus the process wiring
//! that runs the sync scheduler next to it.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           HTTP Facade                                   │
//! │                                                                         │
//! │  GET /health                                 liveness + store check     │
//! │                                                                         │
//! │  v2 ─────────────────────────────────────────────────────────────────   │
//! │  GET /api/v2/shops                           configured shops           │
//! │  GET /api/v2/machines?shopId=                machines + 7-day usage     │
//! │  GET /api/v2/machine/{machineId}             one machine + history      │
//! │                                                                         │
//! │  v1 (legacy shapes) ─────────────────────────────────────────────────   │
//! │  GET /api/v1/getLaundryMachines?LaundryID=   machines keyed by id       │
//! │  GET /api/v1/getMachineDetail?MachineID=     history only               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Remaining time is always reported in seconds.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use washwise_db::Database;
use washwise_sync::{Clock, SyncConfig, SystemClock};

// Re-exports
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::router;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<SyncConfig>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(db: Database, config: SyncConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
