//! Bucketmount - idempotent object-storage mounts for sandboxes
//!
//! Checks whether a bucket is already mounted inside a sandbox and mounts it
//! if not, tolerating process status that lags the real command state and
//! mount calls that report errors after succeeding.
//!
//! ```rust,no_run
//! # async fn example() {
//! use bucketmount::{LocalSandbox, MountOptions, ensure_bucket_mounted};
//!
//! let sandbox = LocalSandbox::new();
//! let options = MountOptions::default()
//!     .credentials("access-key", "secret", "account-id")
//!     .mount_path("/data/moltbot");
//!
//! if !ensure_bucket_mounted(&sandbox, &options).await {
//!     println!("continuing without persistent storage");
//! }
//! # }
//! ```

pub mod constants;
pub mod errors;
pub mod logging;
pub mod options;
pub mod orchestrator;
pub mod probe;
pub mod sandbox;

pub use errors::{BucketMountError, BucketMountResult, ProbeError};
pub use options::{BucketCredentials, MountOptions, MountTarget, storage_endpoint};
pub use orchestrator::{MountOrchestrator, MountOutcome, ensure_bucket_mounted};
pub use probe::{MountProbe, ProbeSettings};
pub use sandbox::{
    CapturedOutput, LocalSandbox, MountBucketOptions, ProcessHandle, ProcessId, ProcessStatus,
    Sandbox,
};
