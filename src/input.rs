//! Keyboard and pointer input for the viewer window.
//!
//! Raw winit events are folded into two things the scene cares about: the
//! pointer position in normalized device coordinates, and a queue of
//! [`Command`]s from key presses. Held keys do not repeat.
//!
//! | Key | Command |
//! |-----|---------|
//! | `1` | Simulated hand: open palm |
//! | `2` | Simulated hand: peace sign |
//! | `3` | Simulated hand: fist |
//! | `0` | Simulated hand: none |
//! | `Space` | Capture a photo |
//! | `R` | Toggle the video source between ready and not ready |
//! | `Backspace` | Reset to the tree |
//! | `Escape` | Quit |

use crate::gesture::FingerPose;
use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// An action requested from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set the simulated hand's fingers, or hide it.
    SimulateHand(Option<FingerPose>),
    Capture,
    ToggleSourceReady,
    Reset,
    Quit,
}

impl Command {
    /// Command bound to `key`, if any.
    pub fn for_key(key: KeyCode) -> Option<Command> {
        Some(match key {
            KeyCode::Digit1 => Command::SimulateHand(Some(FingerPose::OPEN_PALM)),
            KeyCode::Digit2 => Command::SimulateHand(Some(FingerPose::PEACE)),
            KeyCode::Digit3 => Command::SimulateHand(Some(FingerPose::FIST)),
            KeyCode::Digit0 => Command::SimulateHand(None),
            KeyCode::Space => Command::Capture,
            KeyCode::KeyR => Command::ToggleSourceReady,
            KeyCode::Backspace => Command::Reset,
            KeyCode::Escape => Command::Quit,
            _ => return None,
        })
    }
}

/// Input state for one window.
#[derive(Debug)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    commands: Vec<Command>,
    pointer_px: Vec2,
    pointer_ndc: Vec2,
    window_size: (u32, u32),
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    pub fn new() -> Self {
        Self {
            keys_held: HashSet::new(),
            commands: Vec::new(),
            pointer_px: Vec2::ZERO,
            pointer_ndc: Vec2::ZERO,
            window_size: (800, 600),
        }
    }

    /// Pointer in `[-1, 1]²`, origin at the window center, `+y` up.
    pub fn pointer(&self) -> Vec2 {
        self.pointer_ndc
    }

    /// Commands queued since the last call.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.pointer_ndc = to_ndc(self.pointer_px, self.window_size);
    }

    /// Fold a winit window event into the input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press(key),
                        ElementState::Released => self.release(key),
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.move_pointer(Vec2::new(position.x as f32, position.y as f32));
            }
            _ => {}
        }
    }

    fn press(&mut self, key: KeyCode) {
        // Only the first press of a held key counts.
        if self.keys_held.insert(key) {
            if let Some(command) = Command::for_key(key) {
                self.commands.push(command);
            }
        }
    }

    fn release(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    fn move_pointer(&mut self, px: Vec2) {
        self.pointer_px = px;
        self.pointer_ndc = to_ndc(px, self.window_size);
    }
}

/// Window pixel position to normalized device coordinates.
fn to_ndc(px: Vec2, (w, h): (u32, u32)) -> Vec2 {
    if w == 0 || h == 0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        (px.x / w as f32) * 2.0 - 1.0,
        1.0 - (px.y / h as f32) * 2.0,
    )
}
