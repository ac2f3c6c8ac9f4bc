//! First-person look orientation.
//!
//! Yaw turns the whole body about world-up; pitch only tilts the camera pivot.
//! Both are stored in degrees.

use bevy::prelude::*;

/// Accumulated yaw and pitch.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct LookState {
    yaw: f32,
    pitch: f32,
}

impl LookState {
    /// Create a look state, clamping `pitch` into the given bounds.
    pub fn new(yaw: f32, pitch: f32, min_pitch: f32, max_pitch: f32) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(min_pitch, max_pitch),
        }
    }

    /// Yaw in degrees. Unbounded; positive turns right.
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees. Negative looks up.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Apply one frame of look input scaled by frame time.
    pub fn apply_input(
        &mut self,
        input: Vec2,
        sensitivity: Vec2,
        dt: f32,
        min_pitch: f32,
        max_pitch: f32,
    ) {
        self.yaw += input.x * sensitivity.x * dt;
        self.pitch = (self.pitch - input.y * sensitivity.y * dt).clamp(min_pitch, max_pitch);
    }

    /// Body rotation about world-up.
    pub fn body_rotation(&self) -> Quat {
        Quat::from_rotation_y(-self.yaw.to_radians())
    }

    /// Camera pivot rotation about its local right axis.
    pub fn pivot_rotation(&self) -> Quat {
        Quat::from_rotation_x(-self.pitch.to_radians())
    }

    /// Horizontal facing derived from the yaw.
    pub fn facing(&self) -> Facing {
        Facing::from_rotation(self.body_rotation())
    }
}

/// Horizontal basis used to turn 2D move input into world directions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facing {
    pub forward: Vec3,
    pub right: Vec3,
}

impl Default for Facing {
    fn default() -> Self {
        Self {
            forward: Vec3::NEG_Z,
            right: Vec3::X,
        }
    }
}

impl Facing {
    pub fn new(forward: Vec3, right: Vec3) -> Self {
        Self { forward, right }
    }

    /// Facing of a body rotated by `rotation` (Bevy's forward is -Z).
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            forward: rotation * Vec3::NEG_Z,
            right: rotation * Vec3::X,
        }
    }

    /// World direction for a 2D input where `y` is forward and `x` is right.
    pub fn to_world(&self, input: Vec2) -> Vec3 {
        self.forward * input.y + self.right * input.x
    }
}

/// Marks the entity the camera hangs from.
///
/// Its local rotation is driven by the pitch of `character`. Usually a child
/// of the character so it inherits the yaw.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CameraPivot {
    /// The controlled character whose pitch this pivot follows.
    pub character: Entity,
}

impl CameraPivot {
    pub fn new(character: Entity) -> Self {
        Self { character }
    }
}
