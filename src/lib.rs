//! # `platformer_character_controller`
//!
//! A 3D rigidbody platformer character controller with physics backend abstraction.
//!
//! This crate turns per-frame input into velocity and impulse commands on a
//! dynamic rigid body:
//! - Ground detection with a short sphere cast and a walkable-angle limit
//! - Jumps with "better gravity": an apex hang, a heavier fall and a short hop
//!   when jump is released early
//! - A timed dash that runs as its own movement mode
//! - Slide boosts that decay on a fixed schedule
//! - Time-scaled first-person yaw/pitch look
//! - Abstracts physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! All per-character state lives in the [`CharacterController`](controller::CharacterController)
//! component. Input arrives through [`MovementIntent`](intent::MovementIntent):
//! 1. Every visual frame (`Update`) the backend probes the ground, button
//!    presses become requests (jump, dash, slide, attack) and look input turns
//!    the body and camera pivot.
//! 2. Every physics step (`FixedUpdate`) the controller consumes those
//!    requests, sets horizontal velocity, shapes gravity and runs the dash.
//! 3. Rotation is written in `PostUpdate`, after everything else has moved.
//!
//! Rigid-body velocity is only ever written from the physics step.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use platformer_character_controller::prelude::*;
//!
//! // Create controller components for a player character
//! let controller = CharacterController::new();
//! let config = ControllerConfig::player();
//! let intent = MovementIntent::default();
//!
//! // These can be spawned as a bundle with physics components
//! assert!(config.validate().is_ok());
//! ```

use bevy::prelude::*;
use bevy::transform::TransformSystem;

pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod error;
pub mod gravity;
pub mod intent;
pub mod look;
pub mod sensor;
pub mod slide;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::collision::CollisionData;
    pub use crate::config::{ControllerConfig, GroundProbeConfig};
    pub use crate::controller::{CharacterController, MAX_BONUS_SPEED, MovementMode};
    pub use crate::error::ConfigError;
    pub use crate::gravity::GravityBranch;
    pub use crate::intent::{ControllerAction, MovementIntent};
    pub use crate::look::{CameraPivot, Facing, LookState};
    pub use crate::state::{Airborne, Dashing, Grounded, InvalidControllerConfig};
    pub use crate::{AttackRequested, CharacterControllerPlugin, CharacterControllerSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// Emitted on the frame attack is pressed.
///
/// The controller does nothing else with attacks; spawning a projectile or
/// playing an animation is up to the game.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AttackRequested {
    /// The character that attacked.
    pub character: Entity,
    /// World position of the character when the press was seen.
    pub position: Vec3,
}

/// System sets for ordering controller work.
///
/// The same sets are configured in both `Update` and `FixedUpdate`:
/// - **Validation**: config validation and body checks
/// - **Sensors**: ground probing (added by the backend plugin)
/// - **Input**: button edges and look input (`Update` only)
/// - **Movement**: the physics step (`FixedUpdate` only)
/// - **Sync**: marker components and edge latching, plus the orientation
///   write in `PostUpdate`
///
/// Input producers writing [`MovementIntent`](intent::MovementIntent) in
/// `Update` should run `.before(CharacterControllerSet::Input)`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterControllerSet {
    Validation,
    Sensors,
    Input,
    Movement,
    Sync,
}

/// Main plugin for the character controller system.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (velocity, impulses, ground casts).
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use platformer_character_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(CharacterControllerPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct CharacterControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for CharacterControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for CharacterControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::CharacterController>();
        app.register_type::<controller::MovementMode>();
        app.register_type::<config::ControllerConfig>();
        app.register_type::<config::GroundProbeConfig>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<look::CameraPivot>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::Dashing>();
        app.register_type::<state::InvalidControllerConfig>();

        app.add_event::<AttackRequested>();

        let sets = (
            CharacterControllerSet::Validation,
            CharacterControllerSet::Sensors,
            CharacterControllerSet::Input,
            CharacterControllerSet::Movement,
            CharacterControllerSet::Sync,
        );
        app.configure_sets(Update, sets.chain());
        app.configure_sets(FixedUpdate, sets.chain());

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            Update,
            (
                systems::validate_controller_configs,
                systems::verify_physics_body::<B>,
            )
                .in_set(CharacterControllerSet::Validation),
        );
        app.add_systems(
            FixedUpdate,
            (
                systems::validate_controller_configs,
                systems::verify_physics_body::<B>,
            )
                .in_set(CharacterControllerSet::Validation),
        );

        // Visual frame
        app.add_systems(
            Update,
            (systems::dispatch_actions, systems::update_look_and_apex)
                .chain()
                .in_set(CharacterControllerSet::Input),
        );
        app.add_systems(
            Update,
            (systems::sync_state_markers, systems::latch_action_edges)
                .in_set(CharacterControllerSet::Sync),
        );

        // Physics step
        app.add_systems(
            FixedUpdate,
            systems::apply_controller_step::<B>.in_set(CharacterControllerSet::Movement),
        );
        app.add_systems(
            FixedUpdate,
            systems::sync_state_markers.in_set(CharacterControllerSet::Sync),
        );

        // Orientation after all other motion, before transforms propagate
        app.add_systems(
            PostUpdate,
            systems::apply_orientation
                .in_set(CharacterControllerSet::Sync)
                .before(TransformSystem::TransformPropagate),
        );
    }
}
