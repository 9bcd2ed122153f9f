//! Mount orchestration.
//!
//! Per invocation:
//!
//! ```text
//! Unconfigured ─────────────────────────────────────────────► false
//! Checking ──► AlreadyMounted ──────────────────────────────► true
//!          └─► Mounting ──► Mounted ────────────────────────► true
//!                       └─► MountFailed ──► Rechecking ──► Mounted ► true
//!                                                      └─► Failed  ► false
//! ```
//!
//! The mount driver can report an error after the mount actually landed, so
//! a failed mount is always followed by one more probe before giving up.

use crate::errors::BucketMountResult;
use crate::options::{MountOptions, MountTarget};
use crate::probe::MountProbe;
use crate::sandbox::{MountBucketOptions, Sandbox};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an [`MountOrchestrator::ensure`] call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountOutcome {
    /// Credentials incomplete; nothing was attempted.
    Unconfigured,
    /// The probe found the bucket already mounted.
    AlreadyMounted,
    /// The mount call succeeded.
    Mounted,
    /// The mount call failed but the follow-up probe found the mount.
    MountedAfterError,
    /// The mount call failed and the follow-up probe did not find the mount.
    Failed,
}

impl MountOutcome {
    /// True if the bucket is mounted at the end of the call.
    pub fn is_mounted(&self) -> bool {
        matches!(
            self,
            MountOutcome::AlreadyMounted | MountOutcome::Mounted | MountOutcome::MountedAfterError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MountOutcome::Unconfigured => "unconfigured",
            MountOutcome::AlreadyMounted => "already_mounted",
            MountOutcome::Mounted => "mounted",
            MountOutcome::MountedAfterError => "mounted_after_error",
            MountOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for MountOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ensures a bucket is mounted inside a sandbox.
pub struct MountOrchestrator<'a> {
    sandbox: &'a dyn Sandbox,
    probe: MountProbe,
}

impl<'a> MountOrchestrator<'a> {
    pub fn new(sandbox: &'a dyn Sandbox) -> Self {
        Self {
            sandbox,
            probe: MountProbe::default(),
        }
    }

    /// Replace the default probe.
    pub fn with_probe(mut self, probe: MountProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Probe only; never mounts.
    pub async fn is_mounted(&self, mount_path: &str) -> bool {
        self.probe.is_mounted(self.sandbox, mount_path).await
    }

    /// Make sure the configured bucket is mounted. Never fails.
    pub async fn ensure(&self, options: &MountOptions) -> MountOutcome {
        let Some(target) = options.target() else {
            tracing::info!(
                missing = ?options.missing_credentials(),
                "Bucket storage not configured, skipping mount"
            );
            return MountOutcome::Unconfigured;
        };

        if self.is_mounted(&target.mount_path).await {
            tracing::info!(
                "Bucket {} already mounted at {}",
                target.bucket_name,
                target.mount_path
            );
            return MountOutcome::AlreadyMounted;
        }

        tracing::info!(
            endpoint = %target.endpoint,
            "Mounting bucket {} at {}",
            target.bucket_name,
            target.mount_path
        );

        let err = match self.mount(&target).await {
            Ok(()) => {
                tracing::info!(
                    "Mounted bucket {} at {}",
                    target.bucket_name,
                    target.mount_path
                );
                return MountOutcome::Mounted;
            }
            Err(e) => e,
        };

        tracing::warn!("Mount call for {} reported an error: {}", target.bucket_name, err);

        if self.is_mounted(&target.mount_path).await {
            tracing::info!(
                "Bucket {} is mounted at {} despite the mount error",
                target.bucket_name,
                target.mount_path
            );
            return MountOutcome::MountedAfterError;
        }

        tracing::error!(
            "Failed to mount bucket {} at {}: {}",
            target.bucket_name,
            target.mount_path,
            err
        );
        MountOutcome::Failed
    }

    async fn mount(&self, target: &MountTarget) -> BucketMountResult<()> {
        let options = MountBucketOptions {
            endpoint: target.endpoint.clone(),
            credentials: target.credentials.clone(),
        };
        self.sandbox
            .mount_bucket(&target.bucket_name, &target.mount_path, &options)
            .await
    }
}

/// Mount the configured bucket unless it is already mounted.
///
/// Returns `true` if the bucket is mounted when the call returns. A `false`
/// result means the caller proceeds without persistent storage; it is never
/// an error.
pub async fn ensure_bucket_mounted(sandbox: &dyn Sandbox, options: &MountOptions) -> bool {
    MountOrchestrator::new(sandbox)
        .ensure(options)
        .await
        .is_mounted()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_mounted() {
        assert!(!MountOutcome::Unconfigured.is_mounted());
        assert!(MountOutcome::AlreadyMounted.is_mounted());
        assert!(MountOutcome::Mounted.is_mounted());
        assert!(MountOutcome::MountedAfterError.is_mounted());
        assert!(!MountOutcome::Failed.is_mounted());
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&MountOutcome::MountedAfterError).unwrap();
        assert_eq!(json, "\"mounted_after_error\"");
        assert_eq!(MountOutcome::AlreadyMounted.to_string(), "already_mounted");
    }
}
