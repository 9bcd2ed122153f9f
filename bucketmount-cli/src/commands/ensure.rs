use bucketmount::{LocalSandbox, MountOrchestrator, MountOutcome};
use clap::Args;
use serde::Serialize;

use crate::cli::{GlobalFlags, MountFlags};

#[derive(Args, Debug)]
pub struct EnsureArgs {
    #[command(flatten)]
    pub mount: MountFlags,

    /// Exit with an error if the bucket is not mounted afterwards
    #[arg(long)]
    pub require: bool,
}

#[derive(Serialize)]
struct EnsureReport<'a> {
    bucket: &'a str,
    mount_path: &'a str,
    outcome: MountOutcome,
    mounted: bool,
}

pub async fn execute(args: EnsureArgs, global: &GlobalFlags) -> anyhow::Result<()> {
    let options = args.mount.resolve()?;
    tracing::debug!(
        bucket = %options.bucket_name,
        mount_path = %options.mount_path,
        "Resolved mount options"
    );
    let sandbox = LocalSandbox::new();

    let outcome = MountOrchestrator::new(&sandbox).ensure(&options).await;

    if global.json {
        let report = EnsureReport {
            bucket: &options.bucket_name,
            mount_path: &options.mount_path,
            outcome,
            mounted: outcome.is_mounted(),
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        match outcome {
            MountOutcome::Unconfigured => println!(
                "skipped: missing {}",
                options.missing_credentials().join(", ")
            ),
            _ => println!("{}: {}", options.mount_path, outcome),
        }
    }

    if args.require && !outcome.is_mounted() {
        anyhow::bail!(
            "Bucket {} is not mounted at {} ({})",
            options.bucket_name,
            options.mount_path,
            outcome
        );
    }
    Ok(())
}
