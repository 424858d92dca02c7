use std::path::Path;

use tracing::{info, warn};

use crate::{
    CancelHandle, EventLog, EventRecord, InputInjector, PlaybackConfig, ReplayConfig,
    ReplayReport, Scheduler,
};

/// Replays already parsed records once with their recorded pacing.
pub async fn replay_records<I>(
    records: Vec<EventRecord>,
    injector: &mut I,
    config: &PlaybackConfig,
    cancel: &CancelHandle,
) -> ReplayReport
where
    I: InputInjector + ?Sized,
{
    Scheduler::new(config).run(records, injector, cancel).await
}

/// Replays event logs against an injector.
///
/// One replay runs at a time per `Replayer`: [`Replayer::replay_file`]
/// borrows it mutably for the whole pass.
#[derive(Debug)]
pub struct Replayer<I> {
    injector: I,
    config: ReplayConfig,
    cancel: CancelHandle,
}

impl<I: InputInjector> Replayer<I> {
    pub fn new(injector: I, config: ReplayConfig) -> Self {
        Self {
            injector,
            config,
            cancel: CancelHandle::new(),
        }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    pub fn into_injector(self) -> I {
        self.injector
    }

    /// Handle that stops the replay currently running, or the next one if
    /// none is running.
    ///
    /// A cancellation ends exactly one pass. Once that pass returns, handles
    /// taken before it no longer affect this `Replayer`.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Loads the log at `path` and replays it once with its original pacing.
    ///
    /// Never fails: a missing log replays nothing, a broken row ends the log
    /// early, and rejected injections are recorded in the report.
    pub async fn replay_file(&mut self, path: impl AsRef<Path>) -> ReplayReport {
        let path = path.as_ref();
        let log = EventLog::load(path, &self.config.log).await;
        info!(path = %path.display(), events = log.len(), "starting replay");

        let cancel = std::mem::take(&mut self.cancel);
        let mut report =
            replay_records(log.records, &mut self.injector, &self.config.playback, &cancel).await;
        report.skipped_lines = log.skipped_lines;
        report.parse_error = log.aborted.map(|err| err.to_string());

        if report.failed() > 0 {
            warn!(failed = report.failed(), "some events could not be replayed");
        }
        info!(
            injected = report.injected(),
            failed = report.failed(),
            skipped = report.skipped(),
            "replay finished"
        );
        report
    }
}
