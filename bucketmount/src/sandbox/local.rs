//! Host-process sandbox.
//!
//! Runs commands on the local host through `sh -c` and mounts buckets with
//! the `s3fs` driver. Output is pumped into shared buffers by background
//! tasks so it can be read while the process is still running.

use super::{CapturedOutput, MountBucketOptions, ProcessHandle, ProcessId, ProcessStatus, Sandbox};
use crate::constants::mount::{DRIVER_PROGRAM, driver_envs};
use crate::errors::{BucketMountError, BucketMountResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug)]
enum OutputStream {
    Stdout,
    Stderr,
}

/// State shared between a launched process and its pump tasks.
#[derive(Debug)]
struct ProcessRecord {
    stdout: Mutex<String>,
    stderr: Mutex<String>,
    status: Mutex<ProcessStatus>,
}

impl ProcessRecord {
    fn new() -> Self {
        Self {
            stdout: Mutex::new(String::new()),
            stderr: Mutex::new(String::new()),
            status: Mutex::new(ProcessStatus::Running),
        }
    }

    fn buffer(&self, stream: OutputStream) -> &Mutex<String> {
        match stream {
            OutputStream::Stdout => &self.stdout,
            OutputStream::Stderr => &self.stderr,
        }
    }

    fn status(&self) -> ProcessStatus {
        *self.status.lock()
    }

    fn output(&self) -> CapturedOutput {
        CapturedOutput {
            stdout: self.stdout.lock().clone(),
            stderr: self.stderr.lock().clone(),
        }
    }
}

/// [`Sandbox`] backed by the local host.
#[derive(Clone, Debug)]
pub struct LocalSandbox {
    shell: String,
    processes: Arc<Mutex<HashMap<ProcessId, Arc<ProcessRecord>>>>,
}

impl Default for LocalSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSandbox {
    pub fn new() -> Self {
        Self::with_shell("sh")
    }

    /// Use a different shell to interpret command lines (invoked as `<shell> -c`).
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            processes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of processes whose output is still retained.
    pub fn tracked_processes(&self) -> usize {
        self.processes.lock().len()
    }

    fn record(&self, handle: &ProcessHandle) -> BucketMountResult<Arc<ProcessRecord>> {
        self.processes
            .lock()
            .get(handle.id())
            .cloned()
            .ok_or_else(|| BucketMountError::ProcessNotFound(handle.id().clone()))
    }
}

/// Append everything read from `reader` to the record's buffer until EOF.
async fn pump<R>(mut reader: R, record: Arc<ProcessRecord>, stream: OutputStream)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]);
                record.buffer(stream).lock().push_str(&chunk);
            }
            Err(e) => {
                tracing::debug!("Output pump stopped: {}", e);
                break;
            }
        }
    }
}

#[async_trait]
impl Sandbox for LocalSandbox {
    async fn start_command(&self, command_line: &str) -> BucketMountResult<ProcessHandle> {
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                BucketMountError::Process(format!("Failed to spawn '{}': {}", command_line, e))
            })?;

        let id = uuid::Uuid::new_v4().to_string();
        let record = Arc::new(ProcessRecord::new());
        self.processes.lock().insert(id.clone(), record.clone());

        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(pump(out, record.clone(), OutputStream::Stdout)));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(pump(err, record.clone(), OutputStream::Stderr)));

        tracing::debug!(process_id = %id, command = command_line, "Started command");

        tokio::spawn(async move {
            let exit = child.wait().await;
            for task in [stdout, stderr].into_iter().flatten() {
                let _ = task.await;
            }
            let status = match exit {
                // Killed by signal: negative signal number
                Ok(status) => ProcessStatus::Completed {
                    exit_code: status.code().unwrap_or_else(|| {
                        use std::os::unix::process::ExitStatusExt;
                        -status.signal().unwrap_or(0)
                    }),
                },
                Err(e) => {
                    tracing::warn!("Failed to wait on child: {}", e);
                    ProcessStatus::Error
                }
            };
            *record.status.lock() = status;
        });

        Ok(ProcessHandle::new(id))
    }

    async fn wait_for_process(
        &self,
        handle: &ProcessHandle,
        timeout: Duration,
        poll_interval: Duration,
    ) -> BucketMountResult<ProcessStatus> {
        let record = self.record(handle)?;
        let deadline = Instant::now() + timeout;

        loop {
            let status = record.status();
            let now = Instant::now();
            if !status.is_running() || now >= deadline {
                return Ok(status);
            }
            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }

    async fn captured_output(&self, handle: &ProcessHandle) -> BucketMountResult<CapturedOutput> {
        Ok(self.record(handle)?.output())
    }

    // Pump and wait tasks keep their own reference until the child exits.
    async fn release_process(&self, handle: &ProcessHandle) {
        self.processes.lock().remove(handle.id());
    }

    async fn mount_bucket(
        &self,
        bucket_name: &str,
        mount_path: &str,
        options: &MountBucketOptions,
    ) -> BucketMountResult<()> {
        let mount_error = |reason: String| BucketMountError::Mount {
            bucket: bucket_name.to_string(),
            mount_path: mount_path.to_string(),
            reason,
        };

        tokio::fs::create_dir_all(mount_path)
            .await
            .map_err(|e| mount_error(format!("Failed to create mount point: {}", e)))?;

        // Credentials go to the driver's environment only.
        let output = Command::new(DRIVER_PROGRAM)
            .arg(bucket_name)
            .arg(mount_path)
            .arg("-o")
            .arg(format!("url={}", options.endpoint))
            .arg("-o")
            .arg("use_path_request_style")
            .env(driver_envs::ACCESS_KEY_ID, &options.credentials.access_key_id)
            .env(
                driver_envs::SECRET_ACCESS_KEY,
                &options.credentials.secret_access_key,
            )
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| mount_error(format!("Failed to run {}: {}", DRIVER_PROGRAM, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("{} exited with {}", DRIVER_PROGRAM, output.status),
                msg => msg.to_string(),
            };
            return Err(mount_error(reason));
        }

        Ok(())
    }
}
