//! Sandbox capabilities consumed by the probe and orchestrator.
//!
//! A [`Sandbox`] can start shell commands, report (possibly stale) process
//! status, return output captured so far, and mount a remote bucket.

mod local;

pub use local::LocalSandbox;

use crate::errors::BucketMountResult;
use crate::options::BucketCredentials;
use async_trait::async_trait;
use std::time::Duration;

/// Unique identifier for a launched process.
pub type ProcessId = String;

/// Handle to a command launched in the sandbox.
///
/// Similar to `std::process::Child` but only carries the id; output and
/// status are fetched back through the [`Sandbox`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessHandle {
    id: ProcessId,
}

impl ProcessHandle {
    pub fn new(id: impl Into<ProcessId>) -> Self {
        Self { id: id.into() }
    }

    /// Get the process ID.
    pub fn id(&self) -> &ProcessId {
        &self.id
    }
}

/// Process status as reported by the sandbox.
///
/// For short-lived commands this may lag the real state in either
/// direction, so callers should not gate on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Completed { exit_code: i32 },
    Error,
}

impl ProcessStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessStatus::Running)
    }
}

/// Output captured from a process so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Endpoint and credentials passed to [`Sandbox::mount_bucket`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountBucketOptions {
    pub endpoint: String,
    pub credentials: BucketCredentials,
}

/// Execution environment the bucket is mounted into.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Launch a shell command.
    async fn start_command(&self, command_line: &str) -> BucketMountResult<ProcessHandle>;

    /// Wait until the process leaves `Running` or `timeout` elapses.
    ///
    /// Returns the last observed status; a timeout yields `Running`.
    async fn wait_for_process(
        &self,
        handle: &ProcessHandle,
        timeout: Duration,
        poll_interval: Duration,
    ) -> BucketMountResult<ProcessStatus>;

    /// Output accumulated so far. May be empty before output is flushed.
    async fn captured_output(&self, handle: &ProcessHandle) -> BucketMountResult<CapturedOutput>;

    /// Forget a process the caller is done with.
    ///
    /// Its output is no longer retrievable afterwards. Sandboxes that keep
    /// no per-process state can rely on the default no-op.
    async fn release_process(&self, _handle: &ProcessHandle) {}

    /// Mount `bucket_name` at `mount_path`.
    ///
    /// Idempotency and races are up to the implementation; an error does not
    /// guarantee the mount is absent.
    async fn mount_bucket(
        &self,
        bucket_name: &str,
        mount_path: &str,
        options: &MountBucketOptions,
    ) -> BucketMountResult<()>;
}
