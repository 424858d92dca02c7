use std::io::Write;
use std::time::Duration;

use input_replay_core::{
    DispatchStatus, InjectedInput, MouseButton, PlaybackConfig, RecordingInjector, ReplayConfig,
    Replayer,
};
use tempfile::NamedTempFile;

const HEADER: &str = "EventType,Timestamp,KeyCode,KeyChar,Button,X,Y";

fn write_log(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp log");
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn replayer() -> Replayer<RecordingInjector> {
    Replayer::new(RecordingInjector::new(), ReplayConfig::default())
}

#[tokio::test]
async fn single_key_down_injects_one_key_without_moving_cursor() {
    let log = write_log(&["KeyDown,2024-01-01T00:00:00Z,65,A,,,"]);
    let mut replayer = replayer();

    let report = replayer.replay_file(log.path()).await;

    assert_eq!(report.injected(), 1);
    assert_eq!(
        replayer.injector().inputs(),
        vec![InjectedInput::Key {
            vk: 65,
            pressed: true
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn mouse_click_keeps_recorded_spacing() {
    let log = write_log(&[
        "MouseDown,2024-01-01T00:00:00Z,,,Left,100,200",
        "MouseUp,2024-01-01T00:00:02Z,,,Left,100,200",
    ]);
    let mut replayer = replayer();

    let report = replayer.replay_file(log.path()).await;

    let injector = replayer.into_injector();
    assert_eq!(
        injector.inputs(),
        vec![
            InjectedInput::CursorMove { x: 100, y: 200 },
            InjectedInput::MouseButton {
                button: MouseButton::Left,
                pressed: true
            },
            InjectedInput::CursorMove { x: 100, y: 200 },
            InjectedInput::MouseButton {
                button: MouseButton::Left,
                pressed: false
            },
        ]
    );

    let timed = injector.timed_inputs();
    let gap = timed[2].0 - timed[1].0;
    assert!(gap >= Duration::from_secs(2) && gap < Duration::from_millis(2005));
    assert_eq!(report.outcomes[1].delay, Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn short_row_between_valid_rows_is_skipped() {
    let log = write_log(&[
        "KeyDown,2024-01-01T00:00:00Z,65,A,,,",
        "KeyUp,2024-01-01T00:00:00.5Z,65,A",
        "KeyUp,2024-01-01T00:00:01Z,65,A,,,",
    ]);
    let mut replayer = replayer();

    let report = replayer.replay_file(log.path()).await;

    assert_eq!(report.skipped_lines, vec![3]);
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[1].line, 4);
    assert_eq!(report.outcomes[1].delay, Duration::from_secs(1));
    assert_eq!(
        replayer.injector().inputs(),
        vec![
            InjectedInput::Key {
                vk: 65,
                pressed: true
            },
            InjectedInput::Key {
                vk: 65,
                pressed: false
            },
        ]
    );
}

#[tokio::test]
async fn missing_log_replays_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut replayer = replayer();

    let report = replayer.replay_file(dir.path().join("missing.csv")).await;

    assert!(report.outcomes.is_empty());
    assert!(report.parse_error.is_none());
    assert!(replayer.injector().inputs().is_empty());
}

#[tokio::test]
async fn broken_timestamp_replays_rows_read_before_it() {
    let log = write_log(&[
        "KeyDown,2024-01-01T00:00:00Z,65,A,,,",
        "KeyUp,01/01/2024 soon,65,A,,,",
        "KeyDown,2024-01-01T00:00:00Z,66,B,,,",
    ]);
    let mut replayer = replayer();

    let report = replayer.replay_file(log.path()).await;

    assert_eq!(report.outcomes.len(), 1);
    let reason = report.parse_error.expect("parse error should be reported");
    assert!(reason.contains("line 3"));
}

#[tokio::test]
async fn rejected_injections_do_not_stop_the_replay() {
    let log = write_log(&[
        "KeyDown,2024-01-01T00:00:00Z,65,A,,,",
        "MouseDown,2024-01-01T00:00:00Z,,,Right,5,5",
        "KeyUp,2024-01-01T00:00:00Z,65,A,,,",
    ]);
    let injector = RecordingInjector::new().rejecting_keys();
    let mut replayer = Replayer::new(injector, ReplayConfig::default());

    let report = replayer.replay_file(log.path()).await;

    assert_eq!(report.failed(), 2);
    assert_eq!(report.injected(), 1);
    assert!(matches!(report.outcomes[1].status, DispatchStatus::Injected));
}

#[tokio::test(start_paused = true)]
async fn speed_factor_compresses_gaps() {
    let log = write_log(&[
        "KeyDown,2024-01-01T00:00:00Z,65,A,,,",
        "KeyUp,2024-01-01T00:00:04Z,65,A,,,",
    ]);
    let config = ReplayConfig {
        playback: PlaybackConfig {
            speed: 2.0,
            ..PlaybackConfig::default()
        },
        ..ReplayConfig::default()
    };
    let mut replayer = Replayer::new(RecordingInjector::new(), config);

    let report = replayer.replay_file(log.path()).await;

    assert_eq!(report.outcomes[1].delay, Duration::from_secs(2));
}

#[tokio::test]
async fn cancelled_replayer_dispatches_nothing() {
    let log = write_log(&["KeyDown,2024-01-01T00:00:00Z,65,A,,,"]);
    let mut replayer = replayer();
    replayer.cancel_handle().cancel();

    let report = replayer.replay_file(log.path()).await;

    assert!(report.cancelled);
    assert!(replayer.injector().inputs().is_empty());
}
