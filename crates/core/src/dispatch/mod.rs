use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    EventKind, EventRecord, InputInjector, KeyAction, MouseAction, MouseButton, PlaybackConfig,
};

/// `SendInput` mouse flag pair for one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonFlags {
    pub down: u32,
    pub up: u32,
}

impl ButtonFlags {
    pub const fn for_button(button: MouseButton) -> Self {
        let down = match button {
            MouseButton::Left => 0x0002,
            MouseButton::Right => 0x0008,
            MouseButton::Middle => 0x0020,
        };
        Self { down, up: down << 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Neither a keyboard nor a mouse event.
    UnknownEventType,
    /// Keyboard-family label other than `KeyDown`/`KeyUp`.
    NoKeyAction,
}

/// Result of dispatching one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchStatus {
    Injected,
    Skipped(SkipReason),
    Failed(String),
}

/// Turns records into injector calls. Holds no state between records.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    move_cursor_on_click: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            move_cursor_on_click: true,
        }
    }
}

impl Dispatcher {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            move_cursor_on_click: config.move_cursor_on_click,
        }
    }

    pub fn dispatch<I>(&self, injector: &mut I, record: &EventRecord) -> DispatchStatus
    where
        I: InputInjector + ?Sized,
    {
        let status = match &record.kind {
            EventKind::Key(action) => self.dispatch_key(injector, record, action),
            EventKind::Mouse(action) => self.dispatch_mouse(injector, record, action),
            EventKind::Unknown(_) => DispatchStatus::Skipped(SkipReason::UnknownEventType),
        };

        if let DispatchStatus::Failed(reason) = &status {
            warn!(line = record.line, kind = %record.kind, %reason, "failed to replay event");
        } else {
            debug!(line = record.line, kind = %record.kind, ?status, "dispatched event");
        }
        status
    }

    fn dispatch_key<I>(
        &self,
        injector: &mut I,
        record: &EventRecord,
        action: &KeyAction,
    ) -> DispatchStatus
    where
        I: InputInjector + ?Sized,
    {
        let pressed = match action {
            KeyAction::Down => true,
            KeyAction::Up => false,
            KeyAction::Other(_) => return DispatchStatus::Skipped(SkipReason::NoKeyAction),
        };

        let vk: u16 = match record.key_code.trim().parse() {
            Ok(vk) => vk,
            Err(err) => {
                return DispatchStatus::Failed(format!(
                    "invalid key code `{}` for key {}: {err}",
                    record.key_code, record.key_char
                ))
            }
        };

        match injector.inject_key(vk, pressed) {
            Ok(()) => DispatchStatus::Injected,
            Err(err) => DispatchStatus::Failed(format!(
                "{} for key {}: {err}",
                record.kind, record.key_char
            )),
        }
    }

    fn dispatch_mouse<I>(
        &self,
        injector: &mut I,
        record: &EventRecord,
        action: &MouseAction,
    ) -> DispatchStatus
    where
        I: InputInjector + ?Sized,
    {
        let pressed = match action {
            MouseAction::Down => Some(true),
            MouseAction::Up => Some(false),
            MouseAction::Other(_) => None,
        };

        let mut failures = Vec::new();
        if pressed.is_none() || self.move_cursor_on_click {
            if let Err(err) = injector.move_cursor(record.x, record.y) {
                failures.push(err.to_string());
            }
        }

        if let Some(pressed) = pressed {
            let button = record.button.unwrap_or(MouseButton::Middle);
            if let Err(err) = injector.inject_mouse_button(button, pressed) {
                failures.push(format!(
                    "{} at ({}, {}) with {button}: {err}",
                    record.kind, record.x, record.y
                ));
            }
        }

        if failures.is_empty() {
            DispatchStatus::Injected
        } else {
            DispatchStatus::Failed(failures.join("; "))
        }
    }
}
