#![allow(dead_code)]

use assert_cmd::Command;
use std::time::Duration;

const MOUNT_ENVS: &[&str] = &[
    "R2_ACCESS_KEY_ID",
    "R2_SECRET_ACCESS_KEY",
    "CF_ACCOUNT_ID",
    "R2_BUCKET_NAME",
    "BUCKETMOUNT_PATH",
];

/// The CLI binary with mount variables from the caller's environment removed.
pub fn bucketmount() -> Command {
    let bin_path = env!("CARGO_BIN_EXE_bucketmount");
    let mut cmd = Command::new(bin_path);
    cmd.timeout(Duration::from_secs(30));
    for var in MOUNT_ENVS {
        cmd.env_remove(var);
    }
    cmd
}
