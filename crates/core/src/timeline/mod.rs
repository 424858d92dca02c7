use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::{
    DispatchOutcome, Dispatcher, EventRecord, InputInjector, PlaybackConfig, ReplayReport,
};

/// Cloneable switch that stops a replay at its next suspension point or
/// before its next dispatch.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`CancelHandle::cancel`] has been called.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Wall-clock wait before dispatching a record stamped `current`.
///
/// Non-positive gaps (repeated or out-of-order timestamps) and the first
/// record of a pass get no wait at all. A `speed` that is not a positive
/// finite number reproduces the recorded gap; a scaled gap too large for a
/// [`Duration`] saturates.
pub fn pacing_delay(
    previous: Option<DateTime<FixedOffset>>,
    current: DateTime<FixedOffset>,
    speed: f64,
) -> Duration {
    let Some(previous) = previous else {
        return Duration::ZERO;
    };
    let Ok(gap) = current.signed_duration_since(previous).to_std() else {
        return Duration::ZERO;
    };
    if speed == 1.0 || !speed.is_finite() || speed <= 0.0 {
        return gap;
    }
    Duration::try_from_secs_f64(gap.as_secs_f64() / speed).unwrap_or(Duration::MAX)
}

/// Walks records in order, reproducing the recorded gaps between them.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    dispatcher: Dispatcher,
    speed: f64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

impl Scheduler {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(config),
            speed: config.speed,
        }
    }

    /// Replays `records` once. Events are dispatched strictly one after the
    /// other; the only awaits are the pacing delays.
    pub async fn run<I>(
        &self,
        records: Vec<EventRecord>,
        injector: &mut I,
        cancel: &CancelHandle,
    ) -> ReplayReport
    where
        I: InputInjector + ?Sized,
    {
        let mut report = ReplayReport::default();
        let mut previous = None;

        for record in records {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let delay = pacing_delay(previous, record.timestamp, self.speed);
            if !delay.is_zero() {
                debug!(line = record.line, ?delay, "waiting before next event");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let status = self.dispatcher.dispatch(injector, &record);
            report.outcomes.push(DispatchOutcome {
                line: record.line,
                kind: record.kind,
                delay,
                status,
            });
            previous = Some(record.timestamp);
        }

        if report.cancelled {
            info!(dispatched = report.outcomes.len(), "replay cancelled");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_timestamp, InjectedInput, LogFormat, RecordingInjector};

    fn at(text: &str) -> DateTime<FixedOffset> {
        parse_timestamp(text).unwrap()
    }

    fn key_at(seconds: u32, vk: u16) -> EventRecord {
        let row = format!("KeyDown,2024-01-01T00:00:{seconds:02}Z,{vk},k,,,");
        EventRecord::parse_row(seconds as usize + 2, &row, &LogFormat::default())
            .unwrap()
            .unwrap()
    }

    fn assert_close(measured: Duration, expected: Duration) {
        assert!(
            measured >= expected && measured - expected < Duration::from_millis(5),
            "measured {measured:?}, expected {expected:?}"
        );
    }

    #[test]
    fn first_record_has_no_delay() {
        assert_eq!(pacing_delay(None, at("2024-01-01T00:00:05Z"), 1.0), Duration::ZERO);
    }

    #[test]
    fn positive_gap_is_reproduced() {
        let delay = pacing_delay(
            Some(at("2024-01-01T00:00:00Z")),
            at("2024-01-01T00:00:01.250Z"),
            1.0,
        );
        assert_eq!(delay, Duration::from_millis(1250));
    }

    #[test]
    fn non_positive_gaps_do_not_wait() {
        let t = at("2024-01-01T00:00:10Z");
        assert_eq!(pacing_delay(Some(t), t, 1.0), Duration::ZERO);
        assert_eq!(
            pacing_delay(Some(t), at("2024-01-01T00:00:09Z"), 1.0),
            Duration::ZERO
        );
    }

    #[test]
    fn speed_scales_the_gap() {
        let delay = pacing_delay(
            Some(at("2024-01-01T00:00:00Z")),
            at("2024-01-01T00:00:02Z"),
            4.0,
        );
        assert_eq!(delay, Duration::from_millis(500));
    }

    #[test]
    fn tiny_speed_saturates_instead_of_overflowing() {
        let delay = pacing_delay(
            Some(at("2024-01-01T00:00:00Z")),
            at("2024-01-01T00:00:01Z"),
            1e-300,
        );
        assert_eq!(delay, Duration::MAX);
    }

    #[test]
    fn unusable_speed_keeps_recorded_gap() {
        let previous = Some(at("2024-01-01T00:00:00Z"));
        let current = at("2024-01-01T00:00:03Z");
        for speed in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert_eq!(
                pacing_delay(previous, current, speed),
                Duration::from_secs(3),
                "speed {speed}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dispatches_after_recorded_gaps() {
        let mut injector = RecordingInjector::new();
        let records = vec![key_at(0, 1), key_at(3, 2), key_at(3, 3), key_at(4, 4)];

        let report = Scheduler::default()
            .run(records, &mut injector, &CancelHandle::new())
            .await;

        let times: Vec<_> = injector.timed_inputs().iter().map(|(t, _)| *t).collect();
        assert_close(times[1] - times[0], Duration::from_secs(3));
        assert_eq!(times[2] - times[1], Duration::ZERO);
        assert_close(times[3] - times[2], Duration::from_secs(1));
        assert_eq!(report.injected(), 4);
        assert_eq!(report.total_delay(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_order_timestamps_dispatch_immediately() {
        let mut injector = RecordingInjector::new();
        let records = vec![key_at(5, 1), key_at(2, 2), key_at(4, 3)];

        let report = Scheduler::default()
            .run(records, &mut injector, &CancelHandle::new())
            .await;

        let delays: Vec<_> = report.outcomes.iter().map(|o| o.delay).collect();
        assert_eq!(
            delays,
            vec![Duration::ZERO, Duration::ZERO, Duration::from_secs(2)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_records_still_advance_the_clock() {
        let mut injector = RecordingInjector::new();
        let unknown = EventRecord::parse_row(
            3,
            "Scroll,2024-01-01T00:00:02Z,,,,,",
            &LogFormat::default(),
        )
        .unwrap()
        .unwrap();
        let records = vec![key_at(0, 1), unknown, key_at(3, 2)];

        let report = Scheduler::default()
            .run(records, &mut injector, &CancelHandle::new())
            .await;

        assert_eq!(report.outcomes[1].delay, Duration::from_secs(2));
        assert_eq!(report.outcomes[2].delay, Duration::from_secs(1));
        assert_eq!(
            injector.inputs(),
            vec![
                InjectedInput::Key { vk: 1, pressed: true },
                InjectedInput::Key { vk: 2, pressed: true },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_a_pending_wait() {
        let mut injector = RecordingInjector::new();
        let cancel = CancelHandle::new();
        let records = vec![key_at(0, 1), key_at(30, 2), key_at(40, 3)];

        let scheduler = Scheduler::default();
        let trigger = cancel.clone();
        let (report, ()) = tokio::join!(
            scheduler.run(records, &mut injector, &cancel),
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                trigger.cancel();
            }
        );

        assert!(report.cancelled);
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(injector.inputs().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn saturated_wait_can_still_be_cancelled() {
        let mut injector = RecordingInjector::new();
        let cancel = CancelHandle::new();
        let scheduler = Scheduler::new(&PlaybackConfig {
            speed: 1e-300,
            ..PlaybackConfig::default()
        });
        let records = vec![key_at(0, 1), key_at(1, 2)];

        let trigger = cancel.clone();
        let (report, ()) = tokio::join!(
            scheduler.run(records, &mut injector, &cancel),
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                trigger.cancel();
            }
        );

        assert!(report.cancelled);
        assert_eq!(injector.inputs(), vec![InjectedInput::Key { vk: 1, pressed: true }]);
    }

    #[tokio::test]
    async fn cancelled_before_start_dispatches_nothing() {
        let mut injector = RecordingInjector::new();
        let cancel = CancelHandle::new();
        cancel.cancel();

        let report = Scheduler::default()
            .run(vec![key_at(0, 1)], &mut injector, &cancel)
            .await;

        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert!(injector.inputs().is_empty());
    }
}
