//! Jump-feel gravity shaping.
//!
//! The physics engine keeps applying its own gravity. On top of that, every
//! physics step adds a fraction of it again depending on the jump phase:
//! nothing extra while ascending with jump held (the apex hang), a lot extra
//! once the jump is released early (the short hop), and a moderate amount once
//! falling or once the hang window runs out.

use bevy::prelude::*;

use crate::config::ControllerConfig;

/// Bonus speed granted by a jump and paid back when its apex ends.
pub const JUMP_BONUS_SPEED: f32 = 1.0;

/// Tracks the hang window that starts with a jump.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct ApexTimer {
    active: bool,
    elapsed: f32,
}

impl ApexTimer {
    /// Whether a jump's apex window is running (and its bonus is outstanding).
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds since the window started.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Start a fresh window.
    pub fn start(&mut self) {
        self.active = true;
        self.elapsed = 0.0;
    }

    /// Advance the window by a visual frame.
    pub fn advance(&mut self, dt: f32) {
        if self.active {
            self.elapsed += dt;
        }
    }

    /// Whether the window has run its full length.
    pub fn expired(&self, threshold: f32) -> bool {
        self.active && self.elapsed >= threshold
    }

    /// Stop the window. Returns the bonus speed to pay back, which is
    /// non-zero only the first time a given window is reset.
    pub fn reset(&mut self) -> f32 {
        let owed = if self.active { JUMP_BONUS_SPEED } else { 0.0 };
        self.active = false;
        self.elapsed = 0.0;
        owed
    }
}

/// Which gravity branch a physics step took.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityBranch {
    /// Descending, or the hang window expired: `fall_multiplier` applies.
    Falling,
    /// Still ascending with jump released: `low_jump_multiplier` applies.
    ShortHop,
    /// Ascending with jump held inside the window, or at rest: no extra gravity.
    Hang,
}

/// Output of [`shape_vertical_velocity`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapedGravity {
    /// New vertical velocity, already clamped to terminal fall speed.
    pub vertical_velocity: f32,
    /// Branch that produced it.
    pub branch: GravityBranch,
    /// Bonus speed to subtract (the jump bonus paid back by this step).
    pub bonus_payback: f32,
}

/// Apply one physics step of gravity shaping to a vertical velocity.
///
/// `gravity_y` is the engine's vertical gravity (negative for down).
pub fn shape_vertical_velocity(
    vertical_velocity: f32,
    jump_held: bool,
    apex: &mut ApexTimer,
    gravity_y: f32,
    config: &ControllerConfig,
    dt: f32,
) -> ShapedGravity {
    let mut vy = vertical_velocity;
    let mut bonus_payback = 0.0;

    let branch = if vy < 0.0 || apex.expired(config.jump_apex_threshold) {
        bonus_payback = apex.reset();
        vy += gravity_y * (config.fall_multiplier - 1.0) * dt;
        GravityBranch::Falling
    } else if vy > 0.0 && !jump_held {
        bonus_payback = apex.reset();
        vy += gravity_y * (config.low_jump_multiplier - 1.0) * dt;
        GravityBranch::ShortHop
    } else {
        GravityBranch::Hang
    };

    ShapedGravity {
        vertical_velocity: vy.max(-config.max_fall_speed),
        branch,
        bonus_payback,
    }
}
