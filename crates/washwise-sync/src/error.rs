//! # Sync Error Types
//!
//! Error types for polling and reconciliation.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Remote API          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Api {code, msg}        │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Deserialization        │ │
//! │  │  ConfigLoad     │  │  HttpStatus     │  │  MissingData            │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Storage      │  │   Scheduler     │                              │
//! │  │                 │  │                 │                              │
//! │  │  Database       │  │  AlreadyStarted │                              │
//! │  │  InvalidMachine │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in a reconciliation pass is retried within the same cycle. The
//! categorization helpers exist for logging and for deciding what is fatal at
//! startup.

use thiserror::Error;
use washwise_core::ValidationError;
use washwise_db::DbError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all polling and reconciliation failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid platform base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request could not be sent or the connection dropped.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Platform answered with a non-success HTTP status.
    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),

    // =========================================================================
    // Remote API Errors
    // =========================================================================
    /// Platform returned a non-zero application code.
    ///
    /// ## When This Occurs
    /// - Unknown shop or machine id
    /// - Platform-side throttling or maintenance
    #[error("Platform error {code}: {message}")]
    Api { code: i64, message: String },

    /// Response body was not the expected JSON shape.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Envelope reported success but carried no data.
    #[error("Response for {0} carried no data")]
    MissingData(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Listing contained an unusable machine id.
    #[error("Invalid machine: {0}")]
    InvalidMachine(#[from] ValidationError),

    // =========================================================================
    // Scheduler Errors
    // =========================================================================
    /// `start()` was called on a running scheduler.
    #[error("Scheduler already started")]
    AlreadyStarted,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout
        } else if err.is_decode() {
            SyncError::DeserializationFailed(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::HttpStatus(status.as_u16())
        } else {
            SyncError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the same call could succeed on a later cycle.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - 5xx responses
    /// - Transient store errors
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::Timeout => true,
            SyncError::HttpStatus(status) => *status >= 500,
            SyncError::Database(db) => matches!(
                db,
                DbError::PoolExhausted | DbError::ConnectionFailed(_)
            ),
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_) | SyncError::InvalidUrl(_) | SyncError::ConfigLoadFailed(_)
        )
    }

    /// Returns true if the platform answered but the answer was unusable.
    pub fn is_remote_error(&self) -> bool {
        matches!(
            self,
            SyncError::Api { .. } | SyncError::DeserializationFailed(_) | SyncError::MissingData(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SyncError::ConnectionFailed("reset".into()).is_retryable());
        assert!(SyncError::Timeout.is_retryable());
        assert!(SyncError::HttpStatus(502).is_retryable());
        assert!(SyncError::Database(DbError::PoolExhausted).is_retryable());

        assert!(!SyncError::HttpStatus(404).is_retryable());
        assert!(!SyncError::InvalidConfig("bad".into()).is_retryable());
        assert!(!SyncError::Api {
            code: 1001,
            message: "shop closed".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_categories() {
        assert!(SyncError::InvalidUrl("x".into()).is_config_error());
        assert!(SyncError::MissingData("detail".into()).is_remote_error());
        assert!(!SyncError::AlreadyStarted.is_config_error());
    }

    #[test]
    fn test_api_error_carries_platform_message() {
        let err = SyncError::Api {
            code: 500,
            message: "系统繁忙".into(),
        };
        assert!(err.to_string().contains("系统繁忙"));
    }
}
