//! Keyboard and mouse state for the viewer.
//!
//! [`InputState`] accumulates window events between frames. [`InputEdgeState`]
//! turns polled key levels into one-shot presses by remembering the previous frame.

use glam::Vec2;
use std::collections::HashSet;

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse buttons pressed this frame.
    mouse_pressed: HashSet<MouseButton>,

    /// Mouse movement delta this frame.
    mouse_delta: Vec2,
    /// Raw motion received since the last `begin_frame`.
    accumulated_delta: Vec2,

    /// Scroll lines this frame (positive = away from the user).
    scroll: f32,
    accumulated_scroll: f32,

    /// Whether the cursor is captured/locked.
    cursor_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch motion and scroll received since the last frame. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.mouse_delta = self.accumulated_delta;
        self.accumulated_delta = Vec2::ZERO;
        self.scroll = self.accumulated_scroll;
        self.accumulated_scroll = 0.0;
    }

    /// Clear one-shot button presses. Call once the frame has consumed them.
    pub fn end_frame(&mut self) {
        self.mouse_pressed.clear();
    }

    /// Process a keyboard event. OS auto-repeat arrives as extra presses and is harmless here.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_held.contains(&button) {
                    self.mouse_pressed.insert(button);
                }
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
            }
        }
    }

    /// Process raw mouse motion.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.accumulated_delta.x += delta.0 as f32;
        self.accumulated_delta.y += delta.1 as f32;
    }

    /// Process a wheel event, in lines.
    pub fn process_scroll(&mut self, lines: f32) {
        self.accumulated_scroll += lines;
    }

    /// Drop every held key and button, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys_held.clear();
        self.mouse_held.clear();
    }

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a mouse button was pressed this frame.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// Get the mouse movement delta for this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Check if the cursor is locked.
    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    /// Set cursor lock state.
    pub fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
    }

    /// WASD axes: x = strafe right, y = forward. Not normalized.
    pub fn get_movement_input(&self) -> Vec2 {
        let mut movement = Vec2::ZERO;

        if self.is_key_held(KeyCode::KeyW) {
            movement.y += 1.0;
        }
        if self.is_key_held(KeyCode::KeyS) {
            movement.y -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyA) {
            movement.x -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyD) {
            movement.x += 1.0;
        }

        movement
    }
}

/// Previous-frame pressed flags for edge-triggered keys.
///
/// Call [`InputEdgeState::rising`] once per key per frame with the key's current level;
/// it reports `true` only on the first frame of a press.
#[derive(Debug, Default)]
pub struct InputEdgeState {
    was_down: HashSet<KeyCode>,
}

impl InputEdgeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `down` against the previous frame's level for `key` and record it.
    pub fn rising(&mut self, key: KeyCode, down: bool) -> bool {
        let was_down = if down {
            !self.was_down.insert(key)
        } else {
            self.was_down.remove(&key)
        };
        down && !was_down
    }

    /// Poll `key` from `input`, see [`InputEdgeState::rising`].
    pub fn just_pressed(&mut self, input: &InputState, key: KeyCode) -> bool {
        self.rising(key, input.is_key_held(key))
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_toggle_key_fires_once() {
        let mut input = InputState::new();
        let mut edges = InputEdgeState::new();
        let mut flag = false;

        input.process_keyboard(KeyCode::KeyZ, ElementState::Pressed);
        for _ in 0..30 {
            input.begin_frame();
            // auto-repeat while held
            input.process_keyboard(KeyCode::KeyZ, ElementState::Pressed);
            if edges.just_pressed(&input, KeyCode::KeyZ) {
                flag = !flag;
            }
        }
        assert!(flag, "exactly one flip leaves the flag set");

        input.process_keyboard(KeyCode::KeyZ, ElementState::Released);
        input.begin_frame();
        assert!(!edges.just_pressed(&input, KeyCode::KeyZ));

        input.process_keyboard(KeyCode::KeyZ, ElementState::Pressed);
        input.begin_frame();
        assert!(edges.just_pressed(&input, KeyCode::KeyZ));
    }

    #[test]
    fn edges_are_tracked_per_key() {
        let mut edges = InputEdgeState::new();
        assert!(edges.rising(KeyCode::KeyT, true));
        assert!(edges.rising(KeyCode::KeyL, true));
        assert!(!edges.rising(KeyCode::KeyT, true));
        assert!(!edges.rising(KeyCode::KeyL, false));
        assert!(edges.rising(KeyCode::KeyL, true));
    }

    #[test]
    fn motion_and_scroll_latch_per_frame() {
        let mut input = InputState::new();
        input.process_mouse_motion((3.0, -1.0));
        input.process_mouse_motion((2.0, 4.0));
        input.process_scroll(1.0);
        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, 3.0));
        assert_eq!(input.scroll(), 1.0);

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.scroll(), 0.0);
    }

    #[test]
    fn click_registers_once() {
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.is_mouse_pressed(MouseButton::Left));
        input.begin_frame();
        assert!(input.is_mouse_pressed(MouseButton::Left));
        input.end_frame();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(!input.is_mouse_pressed(MouseButton::Left), "still held, not a new click");
    }

    #[test]
    fn opposing_movement_keys_cancel() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyS, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        assert_eq!(input.get_movement_input(), Vec2::new(1.0, 0.0));
    }
}
