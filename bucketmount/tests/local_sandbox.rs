//! Probe and orchestrator against the host's real mount table.

#![cfg(target_os = "linux")]

use bucketmount::{LocalSandbox, MountOptions, MountOrchestrator, MountOutcome, MountProbe};

#[tokio::test]
async fn reads_host_mount_table() {
    let sandbox = LocalSandbox::new();
    let table = MountProbe::default()
        .read_mount_table(&sandbox)
        .await
        .expect("mount table should be readable");

    assert!(table.lines().count() > 0);
    assert!(table.contains(" / ") || table.contains(" on / "));
}

#[tokio::test]
async fn unmounted_path_is_reported_as_such() {
    let sandbox = LocalSandbox::new();
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().to_str().unwrap();

    assert!(!MountProbe::default().is_mounted(&sandbox, path).await);
}

#[tokio::test]
async fn unconfigured_options_touch_nothing() {
    let sandbox = LocalSandbox::new();
    let outcome = MountOrchestrator::new(&sandbox)
        .ensure(&MountOptions::default())
        .await;

    assert_eq!(outcome, MountOutcome::Unconfigured);
}
