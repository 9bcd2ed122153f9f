//! Configuration for bucket mounting.

use crate::constants::mount as const_mount;
use crate::errors::BucketMountResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ============================================================================
// Mount Options
// ============================================================================

/// Options for [`ensure_bucket_mounted`](crate::ensure_bucket_mounted).
///
/// Credentials are optional: when any of `access_key_id`,
/// `secret_access_key` or `account_id` is missing, mounting is treated as
/// disabled rather than failed.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MountOptions {
    /// Access key id for the bucket.
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret access key for the bucket.
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Storage account identifier, used to derive the endpoint.
    #[serde(default)]
    pub account_id: Option<String>,

    /// Bucket to mount.
    ///
    /// Default: `moltbot-data`
    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,

    /// Path inside the sandbox where the bucket is mounted.
    ///
    /// Default: `/data/moltbot`
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
}

fn default_bucket_name() -> String {
    const_mount::DEFAULT_BUCKET_NAME.to_string()
}

fn default_mount_path() -> String {
    const_mount::DEFAULT_MOUNT_PATH.to_string()
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            account_id: None,
            bucket_name: default_bucket_name(),
            mount_path: default_mount_path(),
        }
    }
}

impl MountOptions {
    /// Set all three credential fields.
    pub fn credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self.account_id = Some(account_id.into());
        self
    }

    /// Override the bucket name.
    pub fn bucket_name(mut self, name: impl Into<String>) -> Self {
        self.bucket_name = name.into();
        self
    }

    /// Override the mount path.
    pub fn mount_path(mut self, path: impl Into<String>) -> Self {
        self.mount_path = path.into();
        self
    }

    /// Load options from a JSON file.
    pub fn from_json_file(path: &Path) -> BucketMountResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Names of required credential fields that are absent or empty.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        [
            ("access_key_id", &self.access_key_id),
            ("secret_access_key", &self.secret_access_key),
            ("account_id", &self.account_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(name, _)| name)
        .collect()
    }

    /// Resolve into a mount target, or `None` if credentials are incomplete.
    pub fn target(&self) -> Option<MountTarget> {
        let access_key_id = non_empty(&self.access_key_id)?;
        let secret_access_key = non_empty(&self.secret_access_key)?;
        let account_id = non_empty(&self.account_id)?;

        Some(MountTarget {
            bucket_name: self.bucket_name.clone(),
            mount_path: self.mount_path.clone(),
            endpoint: storage_endpoint(account_id),
            credentials: BucketCredentials {
                access_key_id: access_key_id.to_string(),
                secret_access_key: secret_access_key.to_string(),
            },
        })
    }
}

// Secrets stay out of logs.
impl fmt::Debug for MountOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountOptions")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("account_id", &self.account_id)
            .field("bucket_name", &self.bucket_name)
            .field("mount_path", &self.mount_path)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Endpoint for a storage account.
pub fn storage_endpoint(account_id: &str) -> String {
    format!("https://{}.{}", account_id, const_mount::STORAGE_DOMAIN)
}

// ============================================================================
// Mount Target
// ============================================================================

/// Explicit credential pair handed to the mount capability.
#[derive(Clone, PartialEq, Eq)]
pub struct BucketCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for BucketCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Fully resolved description of one mount attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountTarget {
    pub bucket_name: String,
    pub mount_path: String,
    pub endpoint: String,
    pub credentials: BucketCredentials,
}
