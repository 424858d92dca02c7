use std::mem::size_of;

use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_KEYUP, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::SetCursorPos;

use super::{InjectError, InjectResult, InputInjector};
use crate::{ButtonFlags, MouseButton};

/// Injects input through `SendInput` and `SetCursorPos`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SendInputInjector;

impl SendInputInjector {
    pub fn new() -> Self {
        Self
    }

    fn send(input: INPUT, what: String) -> InjectResult {
        // SAFETY: the slice holds one fully initialised INPUT and cbsize is its size.
        let accepted = unsafe { SendInput(&[input], size_of::<INPUT>() as i32) };
        if accepted == 0 {
            return Err(InjectError::Rejected(what));
        }
        Ok(())
    }
}

impl InputInjector for SendInputInjector {
    fn inject_key(&mut self, vk: u16, pressed: bool) -> InjectResult {
        let flags = if pressed {
            KEYBD_EVENT_FLAGS(0)
        } else {
            KEYEVENTF_KEYUP
        };
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        Self::send(input, format!("key {vk} pressed={pressed}"))
    }

    fn inject_mouse_button(&mut self, button: MouseButton, pressed: bool) -> InjectResult {
        let flags = ButtonFlags::for_button(button);
        let flag = if pressed { flags.down } else { flags.up };
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dwFlags: MOUSE_EVENT_FLAGS(flag),
                    ..Default::default()
                },
            },
        };
        Self::send(input, format!("{button} button pressed={pressed}"))
    }

    fn move_cursor(&mut self, x: i32, y: i32) -> InjectResult {
        // SAFETY: SetCursorPos has no pointer arguments.
        unsafe { SetCursorPos(x, y) }.map_err(|_| InjectError::CursorRejected { x, y })
    }
}
