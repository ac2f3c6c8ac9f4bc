//! The movement state machine.
//!
//! [`CharacterController`] owns every piece of per-character state: the
//! movement mode, bonus speed, apex and dash timers, the slide decay queue,
//! look angles and the latest ground contact. It is only ever mutated through
//! the methods below, which the plugin's systems call once per visual frame or
//! once per physics step.
//!
//! Rigid-body velocity is never written from the visual frame. Requests made
//! there (jump, dash entry) are recorded and acted on by the next
//! [`CharacterController::fixed_step`].

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::ControllerConfig;
use crate::gravity::{ApexTimer, GravityBranch, JUMP_BONUS_SPEED, shape_vertical_velocity};
use crate::intent::{ControllerAction, MovementIntent};
use crate::look::{Facing, LookState};
use crate::sensor::GroundContact;
use crate::slide::SlideBoosts;

/// Upper bound of the bonus speed added to `move_speed`.
pub const MAX_BONUS_SPEED: f32 = 25.0;

/// Top-level movement mode.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MovementMode {
    /// Regular ground/air movement with gravity shaping.
    #[default]
    Moving,
    /// A dash is running; move and jump input are ignored.
    Dashing,
}

/// Dash bookkeeping.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct DashState {
    elapsed: f32,
    armed: bool,
    impulse_pending: bool,
}

impl Default for DashState {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            armed: true,
            impulse_pending: false,
        }
    }
}

/// Per-step inputs gathered by the physics system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInput {
    /// Move input, `y` forward and `x` right.
    pub move_axis: Vec2,
    /// Whether jump is currently held.
    pub jump_held: bool,
    /// Horizontal facing of the body.
    pub facing: Facing,
    /// Vertical component of the physics engine's gravity.
    pub gravity_y: f32,
    /// Fixed timestep length in seconds.
    pub dt: f32,
}

impl StepInput {
    /// Gather step inputs from an intent.
    pub fn from_intent(intent: &MovementIntent, facing: Facing, gravity_y: f32, dt: f32) -> Self {
        Self {
            move_axis: intent.move_axis(),
            jump_held: intent.is_held(ControllerAction::Jump),
            facing,
            gravity_y,
            dt,
        }
    }
}

/// What a physics step wants done to the rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Velocity to write back.
    pub velocity: Vec3,
    /// Impulse to apply after the velocity is written, if any.
    pub impulse: Option<Vec3>,
    /// Gravity branch taken, `None` while dashing.
    pub gravity: Option<GravityBranch>,
}

/// Core character controller state.
///
/// # Example
///
/// ```rust
/// use platformer_character_controller::prelude::*;
///
/// let controller = CharacterController::new();
/// assert_eq!(controller.mode(), MovementMode::Moving);
/// assert!(controller.dash_armed());
/// assert_eq!(controller.bonus_speed(), 0.0);
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
#[require(MovementIntent, ControllerConfig, Transform)]
pub struct CharacterController {
    mode: MovementMode,
    /// Unclamped ledger of granted minus paid-back bonus speed.
    bonus_speed: f32,
    apex: ApexTimer,
    dash: DashState,
    previous_move_direction: Vec2,
    look: LookState,
    slide: SlideBoosts,
    jump_queued: bool,
    /// Latest ground probe hit, walkable or not.
    #[reflect(ignore)]
    floor: Option<CollisionData>,
    grounded: bool,
}

impl CharacterController {
    /// Create a controller facing -Z with a level camera.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller with an initial look direction (degrees).
    pub fn with_look(yaw: f32, pitch: f32, config: &ControllerConfig) -> Self {
        Self {
            look: LookState::new(yaw, pitch, config.min_pitch, config.max_pitch),
            ..default()
        }
    }

    // === Observability ===

    /// Current movement mode.
    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn is_dashing(&self) -> bool {
        self.mode == MovementMode::Dashing
    }

    /// Bonus speed as applied to movement, always within `[0, MAX_BONUS_SPEED]`.
    pub fn bonus_speed(&self) -> f32 {
        self.bonus_speed.clamp(0.0, MAX_BONUS_SPEED)
    }

    pub fn look(&self) -> &LookState {
        &self.look
    }

    pub fn yaw(&self) -> f32 {
        self.look.yaw()
    }

    pub fn pitch(&self) -> f32 {
        self.look.pitch()
    }

    /// Horizontal facing derived from the yaw.
    pub fn facing(&self) -> Facing {
        self.look.facing()
    }

    /// Whether the last ground probe found walkable ground.
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Whatever the last ground probe hit.
    pub fn floor(&self) -> Option<&CollisionData> {
        self.floor.as_ref()
    }

    pub fn dash_armed(&self) -> bool {
        self.dash.armed
    }

    /// Seconds spent in the current (or last) dash.
    pub fn dash_elapsed(&self) -> f32 {
        self.dash.elapsed
    }

    pub fn apex(&self) -> &ApexTimer {
        &self.apex
    }

    /// Last non-zero move input seen while moving.
    pub fn previous_move_direction(&self) -> Vec2 {
        self.previous_move_direction
    }

    pub fn slide_boosts(&self) -> &SlideBoosts {
        &self.slide
    }

    /// Whether a jump is waiting for the next physics step.
    pub fn jump_queued(&self) -> bool {
        self.jump_queued
    }

    // === Sensor ===

    /// Store the result of a ground probe.
    pub fn set_ground_contact(&mut self, contact: GroundContact) {
        self.floor = contact.hit;
        self.grounded = contact.grounded;
    }

    // === Visual frame ===

    /// Ask for a jump. Only accepted while moving and grounded.
    pub fn request_jump(&mut self) -> bool {
        if self.mode != MovementMode::Moving || !self.grounded {
            return false;
        }
        self.jump_queued = true;
        true
    }

    /// Ask for a dash. Enters [`MovementMode::Dashing`] if the dash is armed.
    pub fn request_dash(&mut self, config: &ControllerConfig) -> bool {
        if !config.dash_enabled || !self.dash.armed || self.mode != MovementMode::Moving {
            return false;
        }
        self.mode = MovementMode::Dashing;
        self.dash = DashState {
            elapsed: 0.0,
            armed: false,
            impulse_pending: true,
        };
        debug!("dash started");
        true
    }

    /// Slide press: grant the slide boost and schedule its decay.
    ///
    /// Ignored while dashing. Returns whether the boost was granted.
    pub fn press_slide(&mut self, config: &ControllerConfig) -> bool {
        if self.mode != MovementMode::Moving {
            return false;
        }
        self.bonus_speed += config.slide_boost;
        self.slide
            .schedule(config.slide_boost, config.slide_boost_duration);
        debug!(
            boost = config.slide_boost,
            pending = self.slide.pending(),
            "slide boost granted"
        );
        true
    }

    /// Advance the apex window by a visual frame.
    pub fn advance_apex(&mut self, dt: f32) {
        self.apex.advance(dt);
    }

    /// Apply one frame of look input.
    pub fn update_look(&mut self, input: Vec2, dt: f32, config: &ControllerConfig) {
        self.look.apply_input(
            input,
            config.look_sensitivity,
            dt,
            config.min_pitch,
            config.max_pitch,
        );
    }

    // === Physics step ===

    /// Run one physics step against the body's current velocity.
    pub fn fixed_step(
        &mut self,
        config: &ControllerConfig,
        input: StepInput,
        velocity: Vec3,
    ) -> StepOutcome {
        let outcome = match self.mode {
            MovementMode::Moving => self.step_moving(config, &input, velocity),
            MovementMode::Dashing => self.step_dashing(config, &input, velocity),
        };

        self.bonus_speed -= self.slide.advance(input.dt);

        outcome
    }

    fn step_moving(
        &mut self,
        config: &ControllerConfig,
        input: &StepInput,
        mut velocity: Vec3,
    ) -> StepOutcome {
        let mut impulse = None;

        if std::mem::take(&mut self.jump_queued) {
            // A jump inside a running window settles the old bonus first.
            self.bonus_speed -= self.apex.reset();
            velocity.y = 0.0;
            impulse = Some(Vec3::Y * config.jump_impulse);
            self.apex.start();
            self.bonus_speed += JUMP_BONUS_SPEED;
            debug!(impulse = config.jump_impulse, "jump");
        }

        velocity = self.apply_movement(config, input, velocity);

        let shaped = shape_vertical_velocity(
            velocity.y,
            input.jump_held,
            &mut self.apex,
            input.gravity_y,
            config,
            input.dt,
        );
        self.bonus_speed -= shaped.bonus_payback;
        velocity.y = shaped.vertical_velocity;
        trace!(branch = ?shaped.branch, vy = velocity.y, "gravity shaped");

        StepOutcome {
            velocity,
            impulse,
            gravity: Some(shaped.branch),
        }
    }

    fn apply_movement(
        &mut self,
        config: &ControllerConfig,
        input: &StepInput,
        velocity: Vec3,
    ) -> Vec3 {
        let speed = config.move_speed + self.bonus_speed();
        let horizontal = input.facing.to_world(input.move_axis) * speed;

        if input.move_axis != Vec2::ZERO {
            self.previous_move_direction = input.move_axis;
        }

        Vec3::new(horizontal.x, velocity.y, horizontal.z)
    }

    fn step_dashing(
        &mut self,
        config: &ControllerConfig,
        input: &StepInput,
        mut velocity: Vec3,
    ) -> StepOutcome {
        // Jumps requested before the dash started are dropped.
        self.jump_queued = false;
        velocity.y = 0.0;

        let mut impulse = None;
        if std::mem::take(&mut self.dash.impulse_pending) {
            velocity.x = 0.0;
            velocity.z = 0.0;

            let direction = if self.previous_move_direction == Vec2::ZERO {
                input.facing.forward
            } else {
                input.facing.to_world(self.previous_move_direction)
            };
            impulse = Some(direction * config.dash_strength());
        }

        self.dash.elapsed += input.dt;
        if self.dash.elapsed >= config.dash_duration {
            self.mode = MovementMode::Moving;
            self.dash.armed = true;
            debug!(elapsed = self.dash.elapsed, "dash finished");
        }

        StepOutcome {
            velocity,
            impulse,
            gravity: None,
        }
    }
}
