use crate::input::InputEncoder;
use bytes::Bytes;
use serde::Serialize;

const MODIFIERS: [&str; 6] = [
    "ShiftLeft",
    "ShiftRight",
    "ControlLeft",
    "ControlRight",
    "AltLeft",
    "AltRight",
];

/// A key transition identified by its physical DOM `code` (e.g. `KeyA`) plus
/// the produced `key` value (e.g. `a`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: String,
    pub key: String,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn down(code: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            key: key.into(),
            pressed: true,
        }
    }

    pub fn up(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            key: String::new(),
            pressed: false,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyPayload<'a> {
    keycodes: Vec<u16>,
    key: &'a str,
    key_unicode: u16,
}

/// Maps held keys onto Linux input scancodes.
///
/// Only modifiers stay held across key-downs: pressing a second ordinary key
/// replaces the first, so each payload is "modifiers + one key".
#[derive(Debug, Default)]
pub struct KeyboardEncoder {
    held: Vec<String>,
}

impl KeyboardEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self) -> &[String] {
        &self.held
    }

    fn key_down(&mut self, event: &KeyEvent) -> Option<Bytes> {
        self.held.retain(|code| MODIFIERS.contains(&code.as_str()));
        self.held.push(event.code.clone());

        let keycodes: Vec<u16> = self.held.iter().filter_map(|c| scancode(c)).collect();
        if keycodes.is_empty() {
            return None;
        }

        let mut units = event.key.encode_utf16();
        let key_unicode = match (units.next(), units.next()) {
            (Some(unit), None) => unit,
            _ => 0,
        };

        let payload = KeyPayload {
            keycodes,
            key: &event.key,
            key_unicode,
        };
        serde_json::to_vec(&payload).ok().map(Bytes::from)
    }

    fn key_up(&mut self, event: &KeyEvent) {
        self.held.retain(|code| code != &event.code);
    }
}

impl InputEncoder for KeyboardEncoder {
    type Event = KeyEvent;

    fn encode(&mut self, event: &KeyEvent) -> Option<Bytes> {
        if event.pressed {
            self.key_down(event)
        } else {
            self.key_up(event);
            None
        }
    }
}

/// Scancode for a DOM key `code`, or `None` for keys the peer cannot inject.
pub fn scancode(code: &str) -> Option<u16> {
    let value = match code {
        "Escape" => 1,
        "Digit1" => 2,
        "Digit2" => 3,
        "Digit3" => 4,
        "Digit4" => 5,
        "Digit5" => 6,
        "Digit6" => 7,
        "Digit7" => 8,
        "Digit8" => 9,
        "Digit9" => 10,
        "Digit0" => 11,
        "Minus" => 12,
        "Equal" => 13,
        "Backspace" => 14,
        "Tab" => 15,
        "KeyQ" => 16,
        "KeyW" => 17,
        "KeyE" => 18,
        "KeyR" => 19,
        "KeyT" => 20,
        "KeyY" => 21,
        "KeyU" => 22,
        "KeyI" => 23,
        "KeyO" => 24,
        "KeyP" => 25,
        "BracketLeft" => 26,
        "BracketRight" => 27,
        "Enter" => 28,
        "ControlLeft" => 29,
        "KeyA" => 30,
        "KeyS" => 31,
        "KeyD" => 32,
        "KeyF" => 33,
        "KeyG" => 34,
        "KeyH" => 35,
        "KeyJ" => 36,
        "KeyK" => 37,
        "KeyL" => 38,
        "Semicolon" => 39,
        "Quote" => 40,
        "Backquote" => 41,
        "ShiftLeft" => 42,
        "Backslash" => 43,
        "KeyZ" => 44,
        "KeyX" => 45,
        "KeyC" => 46,
        "KeyV" => 47,
        "KeyB" => 48,
        "KeyN" => 49,
        "KeyM" => 50,
        "Comma" => 51,
        "Period" => 52,
        "Slash" => 53,
        "ShiftRight" => 54,
        "NumpadMultiply" => 55,
        "AltLeft" => 56,
        "Space" => 57,
        "CapsLock" => 58,
        "F1" => 59,
        "F2" => 60,
        "F3" => 61,
        "F4" => 62,
        "F5" => 63,
        "F6" => 64,
        "F7" => 65,
        "F8" => 66,
        "F9" => 67,
        "F10" => 68,
        "NumLock" => 69,
        "Numpad7" => 71,
        "Numpad8" => 72,
        "Numpad9" => 73,
        "NumpadSubtract" => 74,
        "Numpad4" => 75,
        "Numpad5" => 76,
        "Numpad6" => 77,
        "NumpadAdd" => 78,
        "Numpad1" => 79,
        "Numpad2" => 80,
        "Numpad3" => 81,
        "Numpad0" => 82,
        "NumpadDecimal" => 83,
        "F11" => 87,
        "F12" => 88,
        "NumpadEnter" => 96,
        "ControlRight" => 97,
        "NumpadDivide" => 98,
        "AltRight" => 100,
        "Home" => 102,
        "ArrowUp" => 103,
        "PageUp" => 104,
        "ArrowLeft" => 105,
        "ArrowRight" => 106,
        "End" => 107,
        "ArrowDown" => 108,
        "PageDown" => 109,
        "Insert" => 110,
        "Delete" => 111,
        _ => return None,
    };
    Some(value)
}
