//! Constants for bucket mounting
//!
//! Centralized location for default paths, driver names and probe timings.

/// Bucket and mount defaults
pub mod mount {
    /// Default bucket name when none is configured
    pub const DEFAULT_BUCKET_NAME: &str = "moltbot-data";

    /// Default mount point inside the sandbox
    pub const DEFAULT_MOUNT_PATH: &str = "/data/moltbot";

    /// Storage service domain; endpoints are `https://{account_id}.{domain}`
    pub const STORAGE_DOMAIN: &str = "r2.cloudflarestorage.com";

    /// Program that performs the mount
    pub const DRIVER_PROGRAM: &str = "s3fs";

    /// Credential variable names read by the driver
    pub mod driver_envs {
        pub const ACCESS_KEY_ID: &str = "AWSACCESSKEYID";
        pub const SECRET_ACCESS_KEY: &str = "AWSSECRETACCESSKEY";
    }
}

/// Mount-table probe defaults
pub mod probe {
    use std::time::Duration;

    /// Reads the machine-readable table first, falls back to the `mount` listing
    pub const MOUNT_TABLE_COMMAND: &str = "cat /proc/mounts 2>/dev/null || mount";

    /// Token identifying mounts made by the bucket driver
    pub const DRIVER_MARKER: &str = "s3fs";

    /// Cap on the single best-effort wait for the read to finish
    pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Status poll interval used during that wait
    pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

    /// Number of output reads before giving up
    pub const POLL_ATTEMPTS: u32 = 10;

    /// Delay between output reads
    pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
}

/// Environment variables read by the CLI
pub mod envs {
    pub const ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
    pub const ACCOUNT_ID: &str = "CF_ACCOUNT_ID";
    pub const BUCKET_NAME: &str = "R2_BUCKET_NAME";
    pub const MOUNT_PATH: &str = "BUCKETMOUNT_PATH";
}
