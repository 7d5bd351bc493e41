use crate::input::InputEncoder;
use bytes::Bytes;
use serde::Serialize;

/// Analog movement smaller than this is noise.
pub const ANALOG_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ButtonState {
    pub pressed: bool,
    pub value: f64,
}

/// A polled view of one gamepad.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GamepadSnapshot {
    pub buttons: Vec<ButtonState>,
    pub axes: Vec<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ButtonChange {
    idx: usize,
    pressed: bool,
    value: f64,
}

#[derive(Debug, Serialize, PartialEq)]
struct AxisChange {
    idx: usize,
    value: f64,
}

#[derive(Debug, Serialize)]
struct GamepadPayload {
    buttons: Vec<ButtonChange>,
    axes: Vec<AxisChange>,
}

impl GamepadPayload {
    fn to_bytes(&self) -> Option<Bytes> {
        serde_json::to_vec(self).ok().map(Bytes::from)
    }
}

/// Diffs consecutive snapshots and emits only what changed.
#[derive(Debug, Default)]
pub struct GamepadEncoder {
    buttons: Vec<Option<ButtonState>>,
    axes: Vec<Option<f64>>,
}

impl GamepadEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything seen so far; the next snapshot is reported in full.
    pub fn reset(&mut self) {
        self.buttons.clear();
        self.axes.clear();
    }

    /// Payload that releases every button and centres every axis seen so far.
    pub fn release(&self) -> Option<Bytes> {
        GamepadPayload {
            buttons: (0..self.buttons.len())
                .map(|idx| ButtonChange {
                    idx,
                    pressed: false,
                    value: 0.0,
                })
                .collect(),
            axes: (0..self.axes.len())
                .map(|idx| AxisChange { idx, value: 0.0 })
                .collect(),
        }
        .to_bytes()
    }

    fn diff_buttons(&mut self, buttons: &[ButtonState]) -> Vec<ButtonChange> {
        if self.buttons.len() < buttons.len() {
            self.buttons.resize(buttons.len(), None);
        }

        let mut changed = Vec::new();
        for (idx, button) in buttons.iter().enumerate() {
            let moved = match self.buttons[idx] {
                None => true,
                Some(prev) => {
                    (prev.value - button.value).abs() > ANALOG_THRESHOLD
                        || prev.pressed != button.pressed
                }
            };
            if moved {
                changed.push(ButtonChange {
                    idx,
                    pressed: button.pressed,
                    value: button.value,
                });
            }
            self.buttons[idx] = Some(*button);
        }
        changed
    }

    fn diff_axes(&mut self, axes: &[f64]) -> Vec<AxisChange> {
        if self.axes.len() < axes.len() {
            self.axes.resize(axes.len(), None);
        }

        let mut changed = Vec::new();
        for (idx, raw) in axes.iter().enumerate() {
            let value = if raw.abs() < ANALOG_THRESHOLD { 0.0 } else { *raw };
            let moved = match self.axes[idx] {
                None => true,
                Some(prev) => {
                    (prev - value).abs() > ANALOG_THRESHOLD
                        || (prev != value && value.abs() == 1.0)
                }
            };
            if moved {
                changed.push(AxisChange { idx, value });
            }
            self.axes[idx] = Some(value);
        }
        changed
    }
}

impl InputEncoder for GamepadEncoder {
    type Event = GamepadSnapshot;

    fn encode(&mut self, snapshot: &GamepadSnapshot) -> Option<Bytes> {
        let payload = GamepadPayload {
            buttons: self.diff_buttons(&snapshot.buttons),
            axes: self.diff_axes(&snapshot.axes),
        };
        if payload.buttons.is_empty() && payload.axes.is_empty() {
            return None;
        }
        payload.to_bytes()
    }
}
