//! `git2kube watch` — a synchronous initial refresh followed by a ticking
//! refresh loop, matching `cmd/watch.go`'s `refresh` helper wired into a
//! ticker and a signal channel.

use crate::build;
use crate::cli::WatchCmd;
use git2kube::Scheduler;

pub async fn run(cmd: WatchCmd) -> anyhow::Result<()> {
    let fetcher = build::build_fetcher(&cmd.common);
    let selector = build::build_selector(&cmd.common)?;
    let sink = build::build_sink(&cmd.target).await?;

    let mut scheduler = Scheduler::new(fetcher, selector, sink, cmd.healthcheck_file.clone());
    scheduler
        .run_watch(std::time::Duration::from_secs(cmd.interval))
        .await?;
    Ok(())
}
