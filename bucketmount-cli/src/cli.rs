use bucketmount::MountOptions;
use bucketmount::constants::envs;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{ensure::EnsureArgs, status::StatusArgs};

#[derive(Parser, Debug)]
#[command(name = "bucketmount", version, about = "Mount object-storage buckets idempotently")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mount the bucket unless it is already mounted
    Ensure(EnsureArgs),

    /// Report whether the bucket is mounted without mounting it
    Status(StatusArgs),
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Log filter directive (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Mount options as flags; each falls back to its environment variable, then
/// to the config file, then to the library default.
#[derive(Args, Debug, Default)]
pub struct MountFlags {
    /// JSON file with mount options
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Access key id for the bucket
    #[arg(long, env = envs::ACCESS_KEY_ID, hide_env_values = true)]
    pub access_key_id: Option<String>,

    /// Secret access key for the bucket
    #[arg(long, env = envs::SECRET_ACCESS_KEY, hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// Storage account id, used to build the endpoint
    #[arg(long, env = envs::ACCOUNT_ID)]
    pub account_id: Option<String>,

    /// Bucket name
    #[arg(long, env = envs::BUCKET_NAME)]
    pub bucket: Option<String>,

    /// Mount point inside the sandbox
    #[arg(long, env = envs::MOUNT_PATH)]
    pub mount_path: Option<String>,
}

impl MountFlags {
    pub fn resolve(&self) -> anyhow::Result<MountOptions> {
        let mut options = match &self.config {
            Some(path) => MountOptions::from_json_file(path).map_err(|e| {
                anyhow::anyhow!("Failed to load config {}: {}", path.display(), e)
            })?,
            None => MountOptions::default(),
        };

        if let Some(value) = &self.access_key_id {
            options.access_key_id = Some(value.clone());
        }
        if let Some(value) = &self.secret_access_key {
            options.secret_access_key = Some(value.clone());
        }
        if let Some(value) = &self.account_id {
            options.account_id = Some(value.clone());
        }
        if let Some(value) = &self.bucket {
            options.bucket_name = value.clone();
        }
        if let Some(value) = &self.mount_path {
            options.mount_path = value.clone();
        }

        Ok(options)
    }
}
