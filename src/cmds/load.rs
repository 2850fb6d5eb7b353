//! `git2kube load` — the `executeLoad` analogue: build a fetcher, selector
//! and sink from the parsed flags, run exactly one refresh, and propagate
//! any failure as the process exit code.

use crate::build;
use crate::cli::LoadCmd;
use git2kube::Scheduler;

pub async fn run(cmd: LoadCmd) -> anyhow::Result<()> {
    let fetcher = build::build_fetcher(&cmd.common);
    let selector = build::build_selector(&cmd.common)?;
    let sink = build::build_sink(&cmd.target).await?;

    let mut scheduler = Scheduler::new(fetcher, selector, sink, None);
    scheduler.run_load().await?;
    Ok(())
}
