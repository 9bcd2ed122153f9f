//! Shared test fixtures for bucketmount.
//!
//! [`ScriptedSandbox`] is an in-memory [`Sandbox`] that keeps its own mount
//! table. Each launched command either follows a queued [`ScriptedProcess`]
//! or, when the queue is empty, prints the current mount table. Mount calls
//! follow queued [`MountScript`]s, defaulting to success.

use async_trait::async_trait;
use bucketmount::{
    BucketMountError, BucketMountResult, CapturedOutput, MountBucketOptions, ProcessHandle,
    ProcessStatus, Sandbox,
};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::Duration;

/// `/proc/mounts` line for an s3fs mount at `path`.
pub fn s3fs_mount_line(path: &str) -> String {
    format!("s3fs {} fuse.s3fs rw,nosuid,nodev,relatime,user_id=0,group_id=0 0 0", path)
}

/// Mount table with the usual system entries plus s3fs mounts at `paths`.
pub fn mount_table<'a>(paths: impl IntoIterator<Item = &'a str>) -> String {
    let mut table = String::from(
        "proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0\n\
         tmpfs /tmp tmpfs rw,nosuid,nodev 0 0\n",
    );
    for path in paths {
        table.push_str(&s3fs_mount_line(path));
        table.push('\n');
    }
    table
}

// ============================================================================
// Scripts
// ============================================================================

/// Behavior of one launched command.
#[derive(Clone, Debug)]
pub struct ScriptedProcess {
    stdout: Option<String>,
    empty_reads: u32,
    status: ProcessStatus,
    fail_start: bool,
    fail_wait: bool,
    wait_timeout: bool,
    fail_output: bool,
}

impl Default for ScriptedProcess {
    fn default() -> Self {
        Self {
            stdout: None,
            empty_reads: 0,
            status: ProcessStatus::Completed { exit_code: 0 },
            fail_start: false,
            fail_wait: false,
            wait_timeout: false,
            fail_output: false,
        }
    }
}

impl ScriptedProcess {
    /// Print the sandbox's current mount table.
    pub fn live_table() -> Self {
        Self::default()
    }

    /// Print `stdout` instead of the live mount table.
    pub fn output(stdout: impl Into<String>) -> Self {
        Self {
            stdout: Some(stdout.into()),
            ..Self::default()
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn failing_wait() -> Self {
        Self {
            fail_wait: true,
            ..Self::default()
        }
    }

    pub fn failing_output() -> Self {
        Self {
            fail_output: true,
            ..Self::default()
        }
    }

    /// Return empty output for the first `n` reads.
    pub fn after_empty_reads(mut self, n: u32) -> Self {
        self.empty_reads = n;
        self
    }

    /// Status reported by `wait_for_process`.
    pub fn reporting(mut self, status: ProcessStatus) -> Self {
        self.status = status;
        self
    }

    /// Make `wait_for_process` fail with a timeout error.
    pub fn timing_out(mut self) -> Self {
        self.wait_timeout = true;
        self
    }
}

/// Behavior of one `mount_bucket` call.
#[derive(Clone, Debug)]
pub enum MountScript {
    /// Mount and return `Ok`.
    Succeed,
    /// Leave the table untouched and return an error.
    Fail(String),
    /// Mount, then return an error anyway.
    FailAfterMounting(String),
}

/// A recorded `mount_bucket` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountCall {
    pub bucket_name: String,
    pub mount_path: String,
    pub options: MountBucketOptions,
}

// ============================================================================
// ScriptedSandbox
// ============================================================================

#[derive(Default)]
struct State {
    mounted: BTreeSet<String>,
    process_scripts: VecDeque<ScriptedProcess>,
    mount_scripts: VecDeque<MountScript>,
    processes: HashMap<String, RunningProcess>,
    commands: Vec<String>,
    mount_calls: Vec<MountCall>,
    output_reads: usize,
    next_id: u64,
}

struct RunningProcess {
    script: ScriptedProcess,
    stdout: String,
    reads: u32,
}

/// In-memory [`Sandbox`] with scripted responses and call recording.
#[derive(Default)]
pub struct ScriptedSandbox {
    state: Mutex<State>,
}

impl ScriptedSandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `path` already mounted.
    pub fn with_mounted(self, path: &str) -> Self {
        self.state.lock().mounted.insert(path.to_string());
        self
    }

    /// Queue the behavior of the next launched command.
    pub fn push_process(&self, script: ScriptedProcess) -> &Self {
        self.state.lock().process_scripts.push_back(script);
        self
    }

    /// Queue the behavior of the next mount call.
    pub fn push_mount(&self, script: MountScript) -> &Self {
        self.state.lock().mount_scripts.push_back(script);
        self
    }

    /// Number of commands launched (one per mount-table read).
    pub fn command_count(&self) -> usize {
        self.state.lock().commands.len()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    pub fn mount_count(&self) -> usize {
        self.state.lock().mount_calls.len()
    }

    pub fn mount_calls(&self) -> Vec<MountCall> {
        self.state.lock().mount_calls.clone()
    }

    /// Number of `captured_output` calls across all processes.
    pub fn output_reads(&self) -> usize {
        self.state.lock().output_reads
    }

    /// Processes launched but not yet released.
    pub fn live_processes(&self) -> usize {
        self.state.lock().processes.len()
    }

    pub fn is_mounted(&self, path: &str) -> bool {
        self.state.lock().mounted.contains(path)
    }
}

fn unknown(handle: &ProcessHandle) -> BucketMountError {
    BucketMountError::ProcessNotFound(handle.id().clone())
}

#[async_trait]
impl Sandbox for ScriptedSandbox {
    async fn start_command(&self, command_line: &str) -> BucketMountResult<ProcessHandle> {
        let mut state = self.state.lock();
        state.commands.push(command_line.to_string());

        let script = state.process_scripts.pop_front().unwrap_or_default();
        if script.fail_start {
            return Err(BucketMountError::Process("scripted start failure".into()));
        }

        let stdout = match &script.stdout {
            Some(stdout) => stdout.clone(),
            None => mount_table(state.mounted.iter().map(String::as_str)),
        };

        state.next_id += 1;
        let id = format!("proc-{}", state.next_id);
        state.processes.insert(
            id.clone(),
            RunningProcess {
                script,
                stdout,
                reads: 0,
            },
        );
        Ok(ProcessHandle::new(id))
    }

    async fn wait_for_process(
        &self,
        handle: &ProcessHandle,
        timeout: Duration,
        _poll_interval: Duration,
    ) -> BucketMountResult<ProcessStatus> {
        let state = self.state.lock();
        let process = state.processes.get(handle.id()).ok_or_else(|| unknown(handle))?;

        if process.script.fail_wait {
            return Err(BucketMountError::Internal("scripted wait failure".into()));
        }
        if process.script.wait_timeout {
            return Err(BucketMountError::Timeout(timeout));
        }
        Ok(process.script.status)
    }

    async fn captured_output(&self, handle: &ProcessHandle) -> BucketMountResult<CapturedOutput> {
        let mut state = self.state.lock();
        state.output_reads += 1;
        let process = state
            .processes
            .get_mut(handle.id())
            .ok_or_else(|| unknown(handle))?;

        if process.script.fail_output {
            return Err(BucketMountError::Process("scripted output failure".into()));
        }

        process.reads += 1;
        if process.reads <= process.script.empty_reads {
            return Ok(CapturedOutput::default());
        }
        Ok(CapturedOutput {
            stdout: process.stdout.clone(),
            stderr: String::new(),
        })
    }

    async fn release_process(&self, handle: &ProcessHandle) {
        self.state.lock().processes.remove(handle.id());
    }

    async fn mount_bucket(
        &self,
        bucket_name: &str,
        mount_path: &str,
        options: &MountBucketOptions,
    ) -> BucketMountResult<()> {
        let mut state = self.state.lock();
        state.mount_calls.push(MountCall {
            bucket_name: bucket_name.to_string(),
            mount_path: mount_path.to_string(),
            options: options.clone(),
        });

        let mount_error = |reason: String| BucketMountError::Mount {
            bucket: bucket_name.to_string(),
            mount_path: mount_path.to_string(),
            reason,
        };

        match state.mount_scripts.pop_front().unwrap_or(MountScript::Succeed) {
            MountScript::Succeed => {
                state.mounted.insert(mount_path.to_string());
                Ok(())
            }
            MountScript::Fail(reason) => Err(mount_error(reason)),
            MountScript::FailAfterMounting(reason) => {
                state.mounted.insert(mount_path.to_string());
                Err(mount_error(reason))
            }
        }
    }
}
