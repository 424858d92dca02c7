//! Synthetic input injection.
//!
//! [`InputInjector`] is the only seam between replay and the operating
//! system. Each platform backend lives behind it, alongside injectors that
//! never touch the OS.

#[cfg(target_os = "windows")]
mod win32;

#[cfg(target_os = "windows")]
pub use self::win32::SendInputInjector;

use tokio::time::Instant;
use tracing::info;

use crate::MouseButton;

pub type InjectResult = std::result::Result<(), InjectError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    /// The OS accepted zero of the submitted events.
    #[error("input injection was rejected: {0}")]
    Rejected(String),
    /// The OS refused to move the cursor.
    #[error("cursor move to ({x}, {y}) was rejected")]
    CursorRejected { x: i32, y: i32 },
}

/// Capability to submit one synthetic input event at a time.
pub trait InputInjector {
    fn inject_key(&mut self, vk: u16, pressed: bool) -> InjectResult;

    fn inject_mouse_button(&mut self, button: MouseButton, pressed: bool) -> InjectResult;

    /// Sets the absolute cursor position in screen pixels.
    fn move_cursor(&mut self, x: i32, y: i32) -> InjectResult;
}

impl<T: InputInjector + ?Sized> InputInjector for Box<T> {
    fn inject_key(&mut self, vk: u16, pressed: bool) -> InjectResult {
        (**self).inject_key(vk, pressed)
    }

    fn inject_mouse_button(&mut self, button: MouseButton, pressed: bool) -> InjectResult {
        (**self).inject_mouse_button(button, pressed)
    }

    fn move_cursor(&mut self, x: i32, y: i32) -> InjectResult {
        (**self).move_cursor(x, y)
    }
}

/// Returns the injector for the current platform.
///
/// Platforms without a native backend get a [`DryRunInjector`].
pub fn native_injector() -> Box<dyn InputInjector + Send> {
    #[cfg(target_os = "windows")]
    {
        Box::new(SendInputInjector::new())
    }
    #[cfg(not(target_os = "windows"))]
    {
        tracing::warn!("no native input injector for this platform, falling back to dry run");
        Box::new(DryRunInjector)
    }
}

/// Accepts every call and only logs it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunInjector;

impl InputInjector for DryRunInjector {
    fn inject_key(&mut self, vk: u16, pressed: bool) -> InjectResult {
        info!(vk, pressed, "dry run: key");
        Ok(())
    }

    fn inject_mouse_button(&mut self, button: MouseButton, pressed: bool) -> InjectResult {
        info!(%button, pressed, "dry run: mouse button");
        Ok(())
    }

    fn move_cursor(&mut self, x: i32, y: i32) -> InjectResult {
        info!(x, y, "dry run: cursor move");
        Ok(())
    }
}

/// A call observed by [`RecordingInjector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedInput {
    Key { vk: u16, pressed: bool },
    MouseButton { button: MouseButton, pressed: bool },
    CursorMove { x: i32, y: i32 },
}

/// Keeps every call in memory, timestamped with the tokio clock.
///
/// Rejection switches make the injector behave like an OS that refuses the
/// input. Rejected calls are still recorded.
#[derive(Debug, Default, Clone)]
pub struct RecordingInjector {
    calls: Vec<(Instant, InjectedInput)>,
    reject_keys: bool,
    reject_mouse: bool,
    reject_cursor: bool,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting_keys(mut self) -> Self {
        self.reject_keys = true;
        self
    }

    pub fn rejecting_mouse(mut self) -> Self {
        self.reject_mouse = true;
        self
    }

    pub fn rejecting_cursor(mut self) -> Self {
        self.reject_cursor = true;
        self
    }

    pub fn inputs(&self) -> Vec<InjectedInput> {
        self.calls.iter().map(|(_, input)| *input).collect()
    }

    /// Calls with the instant each one was made.
    pub fn timed_inputs(&self) -> &[(Instant, InjectedInput)] {
        &self.calls
    }

    fn record(&mut self, input: InjectedInput, reject: bool) -> InjectResult {
        self.calls.push((Instant::now(), input));
        if !reject {
            return Ok(());
        }
        Err(match input {
            InjectedInput::CursorMove { x, y } => InjectError::CursorRejected { x, y },
            other => InjectError::Rejected(format!("{other:?}")),
        })
    }
}

impl InputInjector for RecordingInjector {
    fn inject_key(&mut self, vk: u16, pressed: bool) -> InjectResult {
        let reject = self.reject_keys;
        self.record(InjectedInput::Key { vk, pressed }, reject)
    }

    fn inject_mouse_button(&mut self, button: MouseButton, pressed: bool) -> InjectResult {
        let reject = self.reject_mouse;
        self.record(InjectedInput::MouseButton { button, pressed }, reject)
    }

    fn move_cursor(&mut self, x: i32, y: i32) -> InjectResult {
        let reject = self.reject_cursor;
        self.record(InjectedInput::CursorMove { x, y }, reject)
    }
}
