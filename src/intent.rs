//! Input intent components.
//!
//! [`MovementIntent`] is the boundary between whatever produces input (a
//! keyboard binding, a gamepad, an AI, a replay) and the controller. Producers
//! write axes and button states into it; the controller reads them and tracks
//! press/release edges itself.

use bevy::prelude::*;

/// The discrete actions the controller understands.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerAction {
    Jump,
    Dash,
    Slide,
    Attack,
}

/// Held state of a button plus the edges seen since the last visual frame.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionButton {
    held: bool,
    pressed: bool,
    released: bool,
}

impl ActionButton {
    /// Press the button. Does nothing if it is already held.
    pub fn press(&mut self) {
        if !self.held {
            self.held = true;
            self.pressed = true;
        }
    }

    /// Release the button. Does nothing if it is not held.
    pub fn release(&mut self) {
        if self.held {
            self.held = false;
            self.released = true;
        }
    }

    /// Forward the current button state; edges are derived from changes.
    pub fn set(&mut self, held: bool) {
        if held {
            self.press();
        } else {
            self.release();
        }
    }

    /// Whether the button is currently down.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Whether the button went down since the last frame.
    pub fn was_pressed(&self) -> bool {
        self.pressed
    }

    /// Whether the button came up since the last frame.
    pub fn was_released(&self) -> bool {
        self.released
    }

    /// Forget this frame's edges.
    pub(crate) fn latch(&mut self) {
        self.pressed = false;
        self.released = false;
    }
}

/// Per-character input intent.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_character_controller::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_move(Vec2::new(0.0, 2.0));
/// assert_eq!(intent.move_axis(), Vec2::Y);
///
/// intent.set_action(ControllerAction::Jump, true);
/// assert!(intent.was_pressed(ControllerAction::Jump));
/// assert!(intent.is_held(ControllerAction::Jump));
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Move input, `y` forward and `x` right, length at most 1.
    move_axis: Vec2,
    /// Look input accumulated since the last visual frame.
    look_axis: Vec2,
    jump: ActionButton,
    dash: ActionButton,
    slide: ActionButton,
    attack: ActionButton,
}

impl MovementIntent {
    /// Create an empty intent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the move axis. Longer vectors are scaled down to length 1.
    pub fn set_move(&mut self, axis: Vec2) {
        self.move_axis = axis.clamp_length_max(1.0);
    }

    /// Current move axis.
    pub fn move_axis(&self) -> Vec2 {
        self.move_axis
    }

    /// Add look input (e.g. a mouse delta). Consumed once per visual frame.
    pub fn add_look(&mut self, delta: Vec2) {
        self.look_axis += delta;
    }

    /// Replace the pending look input (e.g. a stick position).
    pub fn set_look(&mut self, axis: Vec2) {
        self.look_axis = axis;
    }

    /// Pending look input.
    pub fn look_axis(&self) -> Vec2 {
        self.look_axis
    }

    /// Take the pending look input, leaving zero behind.
    pub fn take_look(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_axis)
    }

    /// Clear axes and release every button.
    pub fn clear(&mut self) {
        self.move_axis = Vec2::ZERO;
        self.look_axis = Vec2::ZERO;
        for action in [
            ControllerAction::Jump,
            ControllerAction::Dash,
            ControllerAction::Slide,
            ControllerAction::Attack,
        ] {
            self.button_mut(action).release();
        }
    }

    /// The button for an action.
    pub fn button(&self, action: ControllerAction) -> &ActionButton {
        match action {
            ControllerAction::Jump => &self.jump,
            ControllerAction::Dash => &self.dash,
            ControllerAction::Slide => &self.slide,
            ControllerAction::Attack => &self.attack,
        }
    }

    fn button_mut(&mut self, action: ControllerAction) -> &mut ActionButton {
        match action {
            ControllerAction::Jump => &mut self.jump,
            ControllerAction::Dash => &mut self.dash,
            ControllerAction::Slide => &mut self.slide,
            ControllerAction::Attack => &mut self.attack,
        }
    }

    /// Forward a button's held state.
    pub fn set_action(&mut self, action: ControllerAction, held: bool) {
        self.button_mut(action).set(held);
    }

    /// Press a button.
    pub fn press(&mut self, action: ControllerAction) {
        self.button_mut(action).press();
    }

    /// Release a button.
    pub fn release(&mut self, action: ControllerAction) {
        self.button_mut(action).release();
    }

    pub fn is_held(&self, action: ControllerAction) -> bool {
        self.button(action).is_held()
    }

    pub fn was_pressed(&self, action: ControllerAction) -> bool {
        self.button(action).was_pressed()
    }

    pub fn was_released(&self, action: ControllerAction) -> bool {
        self.button(action).was_released()
    }

    /// Forget every press/release edge. Run once at the end of a visual frame.
    pub(crate) fn latch_edges(&mut self) {
        self.jump.latch();
        self.dash.latch();
        self.slide.latch();
        self.attack.latch();
    }
}
