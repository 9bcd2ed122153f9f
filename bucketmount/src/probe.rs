//! Mount status probe.
//!
//! Reads the sandbox's mount table and decides whether a path is mounted by
//! the bucket driver. Reported process status is not trusted for these
//! short-lived reads: after one bounded wait the probe polls the captured
//! output directly and stops as soon as something arrives.

use crate::constants::probe as const_probe;
use crate::errors::{BucketMountError, ProbeError};
use crate::sandbox::{ProcessHandle, Sandbox};
use std::time::Duration;

/// Tunables for [`MountProbe`].
#[derive(Clone, Debug)]
pub struct ProbeSettings {
    /// Shell command that prints the mount table.
    pub command: String,

    /// Token a mount-table line must contain to count as a bucket mount.
    pub driver_marker: String,

    /// Cap on the initial wait for the read to finish.
    pub wait_timeout: Duration,

    /// Status poll interval passed to the sandbox during that wait.
    pub wait_poll_interval: Duration,

    /// Maximum number of output reads.
    pub poll_attempts: u32,

    /// Delay between output reads.
    pub poll_interval: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            command: const_probe::MOUNT_TABLE_COMMAND.to_string(),
            driver_marker: const_probe::DRIVER_MARKER.to_string(),
            wait_timeout: const_probe::WAIT_TIMEOUT,
            wait_poll_interval: const_probe::WAIT_POLL_INTERVAL,
            poll_attempts: const_probe::POLL_ATTEMPTS,
            poll_interval: const_probe::POLL_INTERVAL,
        }
    }
}

/// Answers "is this path mounted by the bucket driver?".
#[derive(Clone, Debug, Default)]
pub struct MountProbe {
    settings: ProbeSettings,
}

impl MountProbe {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Check whether `mount_path` is mounted.
    ///
    /// Never fails: any error while reading the mount table is logged and
    /// reported as "not mounted".
    pub async fn is_mounted(&self, sandbox: &dyn Sandbox, mount_path: &str) -> bool {
        if mount_path.is_empty() {
            tracing::warn!("Mount status requested for an empty path");
            return false;
        }

        match self.read_mount_table(sandbox).await {
            Ok(table) => {
                let mounted =
                    mount_table_has_mount(&table, mount_path, &self.settings.driver_marker);
                tracing::debug!(mount_path, mounted, "Mount table checked");
                mounted
            }
            Err(e) => {
                tracing::warn!("Could not check whether {} is mounted: {}", mount_path, e);
                false
            }
        }
    }

    /// Launch the mount-table read and return whatever stdout it produced.
    ///
    /// An empty string means no output showed up within the poll budget.
    /// The launched process is released before returning, on every path.
    pub async fn read_mount_table(&self, sandbox: &dyn Sandbox) -> Result<String, ProbeError> {
        let handle = sandbox
            .start_command(&self.settings.command)
            .await
            .map_err(ProbeError::Start)?;

        let result = self.collect_output(sandbox, &handle).await;
        sandbox.release_process(&handle).await;
        result
    }

    async fn collect_output(
        &self,
        sandbox: &dyn Sandbox,
        handle: &ProcessHandle,
    ) -> Result<String, ProbeError> {
        self.wait_briefly(sandbox, handle).await?;

        let attempts = self.settings.poll_attempts.max(1);
        for attempt in 1..=attempts {
            let output = sandbox
                .captured_output(handle)
                .await
                .map_err(ProbeError::Output)?;

            if !output.stdout.trim().is_empty() {
                tracing::debug!(attempt, "Mount table output available");
                return Ok(output.stdout);
            }

            if attempt < attempts {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }

        tracing::debug!(attempts, "No mount table output after polling");
        Ok(String::new())
    }

    /// Single bounded wait. Timeouts are expected for slow sandboxes and
    /// are not errors; the status itself is ignored.
    async fn wait_briefly(
        &self,
        sandbox: &dyn Sandbox,
        handle: &ProcessHandle,
    ) -> Result<(), ProbeError> {
        let cap = self.settings.wait_timeout + self.settings.wait_poll_interval;
        let wait = sandbox.wait_for_process(
            handle,
            self.settings.wait_timeout,
            self.settings.wait_poll_interval,
        );

        match tokio::time::timeout(cap, wait).await {
            Ok(Ok(status)) => {
                tracing::debug!(process_id = %handle.id(), ?status, "Mount table read wait finished");
                Ok(())
            }
            Ok(Err(BucketMountError::Timeout(elapsed))) => {
                tracing::debug!(?elapsed, "Mount table read still running, polling output");
                Ok(())
            }
            Ok(Err(e)) => Err(ProbeError::Wait(e)),
            Err(_) => {
                tracing::debug!("Sandbox wait did not return in time, polling output");
                Ok(())
            }
        }
    }
}

// ============================================================================
// Mount table matching
// ============================================================================

/// True if any line of `table` shows `mount_path` mounted by `driver_marker`.
pub fn mount_table_has_mount(table: &str, mount_path: &str, driver_marker: &str) -> bool {
    table
        .lines()
        .any(|line| line_mounts_path(line, mount_path, driver_marker))
}

/// Match a single mount-table line.
///
/// Accepted shapes, with the path as a whole whitespace-bounded token:
/// - `<source> <path> <fstype> ...` (`/proc/mounts`)
/// - `<path> <fstype> ...` (path-first tables, only when the second field
///   is not itself a path or the listing keyword `on`)
/// - `<source> on <path> type <fstype> (...)` (`mount`)
pub fn line_mounts_path(line: &str, mount_path: &str, driver_marker: &str) -> bool {
    if driver_marker.is_empty() || !line.contains(driver_marker) {
        return false;
    }

    let target = normalize_path(mount_path);
    if target.is_empty() {
        return false;
    }
    let escaped = escape_mount_path(target);

    // Listing form keeps spaces in paths verbatim.
    if line.contains(&format!(" on {} ", target)) {
        return true;
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    let is_target = |field: &&str| normalize_path(field) == escaped;

    if fields.get(1).is_some_and(is_target) {
        return true;
    }

    // First field is the mount source unless the second one can't be a mount point.
    let path_first = fields
        .get(1)
        .is_some_and(|second| !second.starts_with('/') && *second != "on");
    path_first && fields.first().is_some_and(is_target)
}

/// Strip trailing slashes, keeping `/` itself.
fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// `/proc/mounts` octal-escapes whitespace and backslashes in paths.
fn escape_mount_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        match ch {
            ' ' => escaped.push_str("\\040"),
            '\t' => escaped.push_str("\\011"),
            '\n' => escaped.push_str("\\012"),
            '\\' => escaped.push_str("\\134"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
