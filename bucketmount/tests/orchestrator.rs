//! Integration tests for mount orchestration (skip, idempotency, reconciliation).

use bucketmount::{
    MountOptions, MountOrchestrator, MountOutcome, MountProbe, ProbeSettings,
    ensure_bucket_mounted,
};
use bucketmount_test_utils::{MountScript, ScriptedProcess, ScriptedSandbox};
use std::time::Duration;

const MOUNT_PATH: &str = "/data/moltbot";

fn configured() -> MountOptions {
    MountOptions::default()
        .credentials("AKID", "SECRET", "acct123")
        .bucket_name("moltbot-data")
        .mount_path(MOUNT_PATH)
}

// ============================================================================
// CONFIGURATION GATE
// ============================================================================

#[tokio::test(start_paused = true)]
async fn missing_account_id_skips_everything() {
    let sandbox = ScriptedSandbox::new();
    let mut options = configured();
    options.account_id = None;

    assert!(!ensure_bucket_mounted(&sandbox, &options).await);
    assert_eq!(sandbox.command_count(), 0);
    assert_eq!(sandbox.mount_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn any_missing_credential_skips_everything() {
    let cases: [fn(&mut MountOptions); 4] = [
        |o: &mut MountOptions| o.access_key_id = None,
        |o: &mut MountOptions| o.secret_access_key = None,
        |o: &mut MountOptions| o.account_id = None,
        |o: &mut MountOptions| o.secret_access_key = Some(String::new()),
    ];

    for clear in cases {
        let sandbox = ScriptedSandbox::new();
        let mut options = configured();
        clear(&mut options);

        let outcome = MountOrchestrator::new(&sandbox).ensure(&options).await;
        assert_eq!(outcome, MountOutcome::Unconfigured);
        assert_eq!(sandbox.command_count(), 0);
        assert_eq!(sandbox.mount_count(), 0);
    }
}

// ============================================================================
// IDEMPOTENCY
// ============================================================================

#[tokio::test(start_paused = true)]
async fn already_mounted_never_calls_mount() {
    let sandbox = ScriptedSandbox::new().with_mounted(MOUNT_PATH);

    let outcome = MountOrchestrator::new(&sandbox).ensure(&configured()).await;

    assert_eq!(outcome, MountOutcome::AlreadyMounted);
    assert_eq!(sandbox.command_count(), 1);
    assert_eq!(sandbox.mount_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn second_call_is_a_no_op() {
    let sandbox = ScriptedSandbox::new();
    let options = configured();

    assert!(ensure_bucket_mounted(&sandbox, &options).await);
    assert!(ensure_bucket_mounted(&sandbox, &options).await);

    assert_eq!(sandbox.mount_count(), 1);
    assert_eq!(sandbox.command_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn prefix_mount_does_not_count_as_mounted() {
    let sandbox = ScriptedSandbox::new().with_mounted("/data/moltbot2");

    let outcome = MountOrchestrator::new(&sandbox).ensure(&configured()).await;

    assert_eq!(outcome, MountOutcome::Mounted);
    assert_eq!(sandbox.mount_count(), 1);
}

// ============================================================================
// MOUNT ATTEMPT
// ============================================================================

#[tokio::test(start_paused = true)]
async fn not_mounted_then_mount_succeeds() {
    let sandbox = ScriptedSandbox::new();

    let outcome = MountOrchestrator::new(&sandbox).ensure(&configured()).await;

    assert_eq!(outcome, MountOutcome::Mounted);
    assert_eq!(sandbox.command_count(), 1);
    assert_eq!(sandbox.mount_count(), 1);
    assert!(sandbox.is_mounted(MOUNT_PATH));
}

#[tokio::test(start_paused = true)]
async fn mount_receives_endpoint_and_explicit_credentials() {
    let sandbox = ScriptedSandbox::new();

    assert!(ensure_bucket_mounted(&sandbox, &configured()).await);

    let calls = sandbox.mount_calls();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call.bucket_name, "moltbot-data");
    assert_eq!(call.mount_path, MOUNT_PATH);
    assert_eq!(
        call.options.endpoint,
        "https://acct123.r2.cloudflarestorage.com"
    );
    assert_eq!(call.options.credentials.access_key_id, "AKID");
    assert_eq!(call.options.credentials.secret_access_key, "SECRET");
}

// ============================================================================
// RECONCILIATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn mount_error_but_recheck_finds_mount() {
    let sandbox = ScriptedSandbox::new();
    sandbox.push_mount(MountScript::FailAfterMounting("fuse: device busy".into()));

    let outcome = MountOrchestrator::new(&sandbox).ensure(&configured()).await;

    assert_eq!(outcome, MountOutcome::MountedAfterError);
    assert!(outcome.is_mounted());
    assert_eq!(sandbox.mount_count(), 1);
    assert_eq!(sandbox.command_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn mount_error_and_recheck_still_unmounted() {
    let sandbox = ScriptedSandbox::new();
    sandbox.push_mount(MountScript::Fail("s3fs: bad credentials".into()));

    let outcome = MountOrchestrator::new(&sandbox).ensure(&configured()).await;

    assert_eq!(outcome, MountOutcome::Failed);
    assert!(!outcome.is_mounted());
    assert_eq!(sandbox.mount_count(), 1);
    assert_eq!(sandbox.command_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn recheck_uses_scripted_output() {
    let sandbox = ScriptedSandbox::new();
    sandbox
        .push_process(ScriptedProcess::output("proc /proc proc rw 0 0\n"))
        .push_process(ScriptedProcess::output(
            "s3fs on /data/moltbot type fuse.s3fs (rw,nosuid,nodev)\n",
        ));
    sandbox.push_mount(MountScript::Fail("transport endpoint not connected".into()));

    assert!(ensure_bucket_mounted(&sandbox, &configured()).await);
    assert!(!sandbox.is_mounted(MOUNT_PATH));
}

// ============================================================================
// PROBE FAILURES
// ============================================================================

#[tokio::test(start_paused = true)]
async fn probe_failures_fall_through_to_mount() {
    for script in [
        ScriptedProcess::failing_start(),
        ScriptedProcess::failing_wait(),
        ScriptedProcess::failing_output(),
    ] {
        let sandbox = ScriptedSandbox::new();
        sandbox.push_process(script);

        let outcome = MountOrchestrator::new(&sandbox).ensure(&configured()).await;

        assert_eq!(outcome, MountOutcome::Mounted);
        assert_eq!(sandbox.mount_count(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn unreadable_mount_table_and_failed_mount_is_false() {
    let sandbox = ScriptedSandbox::new();
    sandbox
        .push_process(ScriptedProcess::failing_output())
        .push_process(ScriptedProcess::failing_start());
    sandbox.push_mount(MountScript::Fail("no such bucket".into()));

    assert!(!ensure_bucket_mounted(&sandbox, &configured()).await);
    assert_eq!(sandbox.mount_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn custom_check_budget_is_used_by_orchestrator() {
    let sandbox = ScriptedSandbox::new().with_mounted(MOUNT_PATH);
    sandbox.push_process(ScriptedProcess::live_table().after_empty_reads(5));

    let orchestrator = MountOrchestrator::new(&sandbox).with_probe(MountProbe::new(ProbeSettings {
        poll_attempts: 2,
        poll_interval: Duration::from_millis(10),
        ..ProbeSettings::default()
    }));

    // Output never shows up within two reads, so the mount is attempted.
    let outcome = orchestrator.ensure(&configured()).await;
    assert_eq!(outcome, MountOutcome::Mounted);
    assert_eq!(sandbox.output_reads(), 2);
    assert_eq!(sandbox.mount_count(), 1);
    assert_eq!(sandbox.live_processes(), 0);
}
