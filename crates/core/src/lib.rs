//! Core library for replaying recorded keyboard and mouse event logs.
//!
//! A replay reads an event log into [`EventRecord`]s, waits out the gap
//! between consecutive timestamps, and hands each record to an
//! [`InputInjector`]. Nothing in a replay fails the whole operation; every
//! problem ends up in the log and in the returned [`ReplayReport`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod inject;
pub mod log;
pub mod record;
pub mod replay;
pub mod report;
pub mod timeline;

pub use config::{LogFormat, PlaybackConfig, ReplayConfig};
pub use dispatch::{ButtonFlags, DispatchStatus, Dispatcher, SkipReason};
pub use error::{ReplayError, Result};
#[cfg(target_os = "windows")]
pub use inject::SendInputInjector;
pub use inject::{
    native_injector, DryRunInjector, InjectError, InjectResult, InjectedInput, InputInjector,
    RecordingInjector,
};
pub use log::EventLog;
pub use record::{parse_timestamp, EventKind, EventRecord, KeyAction, MouseAction, MouseButton};
pub use replay::{replay_records, Replayer};
pub use report::{DispatchOutcome, ReplayReport};
pub use timeline::{pacing_delay, CancelHandle, Scheduler};
