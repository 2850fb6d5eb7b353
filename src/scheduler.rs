//! Drives one `Fetcher`/`Sink` pair through either a single refresh
//! ("load") or a ticking refresh loop ("watch"), the way
//! `cmd/watch.go`'s ticker-and-channel loop races a refresh tick against
//! `SIGINT`/`SIGTERM`, except built on `tokio::select!` instead of raw
//! channels.

use crate::fetch::Fetcher;
use crate::selector::Selector;
use crate::sink::{FileIterBox, Sink};
use crate::util::write_health;
use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

pub struct Scheduler {
    fetcher: Fetcher,
    selector: Selector,
    sink: Box<dyn Sink>,
    health_file: Option<PathBuf>,
}

impl Scheduler {
    pub fn new(
        fetcher: Fetcher,
        selector: Selector,
        sink: Box<dyn Sink>,
        health_file: Option<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            selector,
            sink,
            health_file,
        }
    }

    /// Fetches the latest commit, filters its tree, and uploads it.
    /// Returns the commit id that was materialized. Every invocation —
    /// success or failure — leaves the health file (when configured)
    /// reflecting the outcome.
    pub async fn refresh(&mut self) -> Result<String> {
        let result = self.fetch_filter_upload().await;

        if let Some(path) = &self.health_file {
            write_health(path, result.is_ok());
        }

        result
    }

    async fn fetch_filter_upload(&mut self) -> Result<String> {
        let fetcher = self.fetcher.clone();
        let handle = tokio::task::spawn_blocking(move || fetcher.fetch())
            .await
            .map_err(|e| Error::Config(format!("fetch task panicked: {e}")))??;

        let selector = self.selector.clone();
        let filtered: FileIterBox<'_> =
            Box::new(handle.files()?.filter(move |f| selector.keep(&f.path)));

        self.sink.upload(handle.id(), filtered).await?;

        Ok(handle.id().to_string())
    }

    /// One-shot mode: a single refresh, propagating any failure to the caller.
    pub async fn run_load(&mut self) -> Result<()> {
        let commit = self.refresh().await?;
        tracing::info!(commit = %commit, "loaded");
        Ok(())
    }

    /// Continuous mode: an initial synchronous refresh (fatal on failure,
    /// same as load), then a refresh every `interval` until a shutdown
    /// signal arrives. Refresh failures after the first are logged and
    /// retried on the next tick rather than ending the process.
    pub async fn run_watch(&mut self, interval: Duration) -> Result<()> {
        let commit = self.refresh().await?;
        tracing::info!(commit = %commit, "initial sync complete");

        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // the first tick fires immediately; we already just refreshed

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.refresh().await {
                        Ok(commit) => tracing::info!(commit = %commit, "refreshed"),
                        Err(e) => tracing::error!(error = %e, "refresh failed, retrying next tick"),
                    }
                }
                _ = shutdown_signal() => {
                    tracing::info!("shutdown signal received, exiting");
                    break;
                }
            }
        }

        Ok(())
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm =
        signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigterm.recv() => {},
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
