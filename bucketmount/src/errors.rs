//! Error types for sandbox and mount operations.
//!
//! Errors are split by who sees them:
//! - [`BucketMountError`]: failures reported by a [`Sandbox`](crate::Sandbox)
//!   implementation (process launch, output retrieval, bucket mount)
//! - [`ProbeError`]: which step of a mount-table probe failed
//!
//! Neither escapes [`ensure_bucket_mounted`](crate::ensure_bucket_mounted);
//! the orchestrator converts every failure into a boolean plus a log line.

use std::io;
use thiserror::Error;

use crate::sandbox::ProcessId;

// ============================================================================
// Sandbox Errors
// ============================================================================

/// Errors raised by sandbox capabilities.
#[derive(Debug, Error)]
pub enum BucketMountError {
    /// A command could not be launched or managed.
    #[error("process: {0}")]
    Process(String),

    /// The sandbox has no record of the given process.
    #[error("process not found: {0}")]
    ProcessNotFound(ProcessId),

    /// The mount capability reported a failure.
    #[error("mount {bucket} at {mount_path}: {reason}")]
    Mount {
        bucket: String,
        mount_path: String,
        reason: String,
    },

    /// A bounded wait elapsed.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Configuration could not be loaded or is invalid.
    #[error("config: {0}")]
    Config(String),

    /// Generic IO error (catch-all).
    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// Unexpected internal condition.
    #[error("internal: {0}")]
    Internal(String),
}

/// Result alias used across the crate.
pub type BucketMountResult<T> = Result<T, BucketMountError>;

impl From<serde_json::Error> for BucketMountError {
    fn from(err: serde_json::Error) -> Self {
        BucketMountError::Config(err.to_string())
    }
}

// ============================================================================
// Probe Errors
// ============================================================================

/// A mount-table probe step that failed.
///
/// The probe treats all of these as "not mounted".
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Launching the mount-table read failed.
    #[error("start mount-table read: {0}")]
    Start(#[source] BucketMountError),

    /// Waiting on the launched read failed.
    #[error("wait for mount-table read: {0}")]
    Wait(#[source] BucketMountError),

    /// Fetching captured output failed.
    #[error("read mount-table output: {0}")]
    Output(#[source] BucketMountError),
}
