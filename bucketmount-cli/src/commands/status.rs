use bucketmount::{LocalSandbox, MountOrchestrator};
use clap::Args;
use serde::Serialize;

use crate::cli::{GlobalFlags, MountFlags};

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub mount: MountFlags,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    mount_path: &'a str,
    mounted: bool,
}

pub async fn execute(args: StatusArgs, global: &GlobalFlags) -> anyhow::Result<()> {
    let options = args.mount.resolve()?;
    tracing::debug!(
        bucket = %options.bucket_name,
        mount_path = %options.mount_path,
        "Resolved mount options"
    );
    let sandbox = LocalSandbox::new();

    let mounted = MountOrchestrator::new(&sandbox)
        .is_mounted(&options.mount_path)
        .await;

    if global.json {
        let report = StatusReport {
            mount_path: &options.mount_path,
            mounted,
        };
        println!("{}", serde_json::to_string(&report)?);
    } else if mounted {
        println!("{}: mounted", options.mount_path);
    } else {
        println!("{}: not mounted", options.mount_path);
    }
    Ok(())
}
