//! Physics backend abstraction.
//!
//! The controller never talks to a physics engine directly. Everything it
//! needs from one (reading and writing velocity, impulses, gravity, the fixed
//! timestep) goes through [`CharacterPhysicsBackend`], so the same state
//! machine can run on Rapier3D or on a hand-rolled body in tests.

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// Backends also own ground sensing: the plugin returned by
/// [`CharacterPhysicsBackend::plugin`] is expected to add a system to
/// [`CharacterControllerSet::Sensors`](crate::CharacterControllerSet::Sensors)
/// that casts the probe described by
/// [`GroundCast`](crate::sensor::GroundCast) and stores the result with
/// [`CharacterController::set_ground_contact`](crate::controller::CharacterController::set_ground_contact).
///
/// See `Rapier3dBackend` for the bundled implementation.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// The velocity component type used by this backend.
    type VelocityComponent: Component;

    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Whether `entity` carries the rigid body this backend drives.
    fn has_body(world: &World, entity: Entity) -> bool;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Apply an impulse to an entity.
    ///
    /// Impulse is an instantaneous change in momentum, resolved by the
    /// engine's next step.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3);

    /// Get the gravity vector the engine applies to an entity.
    fn get_gravity(world: &World, entity: Entity) -> Vec3;

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.timestep().as_secs_f32())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
