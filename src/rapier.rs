//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::geometry::Group;
use bevy_rapier3d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::CollisionData;
use crate::config::ControllerConfig;
use crate::controller::CharacterController;
use crate::sensor::{self, GroundCast};
use crate::state::InvalidControllerConfig;

/// Gravity used when no Rapier context exists yet.
const FALLBACK_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Rapier3D physics backend for the character controller.
///
/// This backend uses `bevy_rapier3d` for velocity and impulses. Ground
/// detection is handled by a dedicated Rapier system that receives the
/// `RapierContext` as a system parameter.
///
/// # Fixed schedule
///
/// The controller adds its extra gravity once per `FixedUpdate` tick, so
/// Rapier must step in the same schedule:
///
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
///
/// With Rapier left in `PostUpdate` a slow frame runs several controller
/// ticks per engine step, and jumps get heavier as the frame rate drops.
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    type VelocityComponent = Velocity;

    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn has_body(world: &World, entity: Entity) -> bool {
        world.get::<RigidBody>(entity).is_some() && world.get::<Velocity>(entity).is_some()
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
            return;
        }

        // No ExternalImpulse: apply the equivalent velocity change directly.
        let mass = world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|&mass| mass > 0.0 && mass.is_finite())
            .unwrap_or(1.0);
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel += impulse / mass;
        }
    }

    fn get_gravity(world: &World, entity: Entity) -> Vec3 {
        let scale = world
            .get::<GravityScale>(entity)
            .map(|g| g.0)
            .unwrap_or(1.0);

        let gravity = world
            .try_query::<&RapierConfiguration>()
            .and_then(|mut query| query.iter(world).next().map(|config| config.gravity))
            .unwrap_or(FALLBACK_GRAVITY);

        gravity * scale
    }
}

/// Plugin that sets up Rapier3D-specific systems for the character controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::CharacterControllerSet;

        // Jumps are decided in the visual frame, movement in the physics step;
        // both need a fresh ground contact.
        app.add_systems(
            Update,
            rapier_ground_detection.in_set(CharacterControllerSet::Sensors),
        );
        app.add_systems(
            FixedUpdate,
            rapier_ground_detection.in_set(CharacterControllerSet::Sensors),
        );

        // Velocity, impulses and rotation must reach Rapier before it syncs
        // its bodies, whichever schedule it steps in.
        app.configure_sets(
            FixedUpdate,
            CharacterControllerSet::Sync.before(PhysicsSet::SyncBackend),
        );
        app.configure_sets(
            PostUpdate,
            CharacterControllerSet::Sync.before(PhysicsSet::SyncBackend),
        );
    }
}

/// Sweep the probe sphere using RapierContext.
fn rapier_shapecast(
    context: &RapierContext,
    cast: &GroundCast,
    exclude_entity: Entity,
) -> Option<CollisionData> {
    let shape = Collider::ball(cast.radius);

    let filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(cast.layers),
        ));

    context
        .cast_shape(
            cast.origin,
            Quat::IDENTITY,
            cast.direction,
            &shape,
            ShapeCastOptions {
                max_time_of_impact: cast.max_distance,
                stop_at_penetration: false,
                ..default()
            },
            filter,
        )
        .map(|(hit_entity, hit)| {
            let normal = hit.details.map(|d| d.normal1).unwrap_or(-cast.direction);
            let hit_point = cast.origin + cast.direction * hit.time_of_impact;
            CollisionData::new(hit.time_of_impact, normal, hit_point, Some(hit_entity))
        })
}

/// Rapier-specific ground detection system using a sphere cast.
fn rapier_ground_detection(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<
        (
            Entity,
            &GlobalTransform,
            &ControllerConfig,
            &mut CharacterController,
        ),
        Without<InvalidControllerConfig>,
    >,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, config, mut controller) in &mut q_controllers {
        let probe = &config.ground_probe;
        let cast = GroundCast::from_probe(transform, probe);

        let contact = sensor::probe(&cast, probe.max_walkable_angle, |cast| {
            rapier_shapecast(&context, cast, entity)
        });

        if contact.grounded != controller.is_grounded() {
            trace!(%entity, grounded = contact.grounded, "ground contact changed");
        }
        controller.set_ground_contact(contact);
    }
}

/// Bundle of Rapier components for a controlled character.
///
/// The controller writes velocity directly, so the body needs a [`Velocity`]
/// and an [`ExternalImpulse`] for jumps and dashes. Rotation is locked: the
/// controller turns the body itself from the look yaw. Friction is zero so
/// walls and floors do not eat the horizontal speed.
///
/// # Example
///
/// ```ignore
/// commands.spawn((
///     CharacterController::new(),
///     ControllerConfig::player(),
///     Rapier3dCharacterBundle::new(),
///     Collider::capsule_y(0.5, 0.5),
/// ));
/// ```
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`] for characters.
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Updated by Rapier each physics step.
    pub velocity: Velocity,
    /// Impulses applied this step (jump, dash).
    pub external_impulse: ExternalImpulse,
    /// Which axes are locked.
    pub locked_axes: LockedAxes,
    /// Surface friction of the character's collider.
    pub friction: Friction,
    /// Computed mass properties. Rapier updates this based on the entity's collider.
    pub mass_properties: ReadMassProperties,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dCharacterBundle {
    /// Create a dynamic, rotation-locked, frictionless character body.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
            mass_properties: ReadMassProperties::default(),
        }
    }

    /// Set the rigid body type for the character.
    ///
    /// ```ignore
    /// let bundle = Rapier3dCharacterBundle::new()
    ///     .with_body(RigidBody::KinematicVelocityBased);
    /// ```
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
