//! Core controller systems.
//!
//! These systems drive [`CharacterController`] from the two host ticks. They
//! are generic over the physics backend where they touch the rigid body.

use bevy::prelude::*;

use crate::AttackRequested;
use crate::backend::CharacterPhysicsBackend;
use crate::config::ControllerConfig;
use crate::controller::{CharacterController, StepInput};
use crate::intent::{ControllerAction, MovementIntent};
use crate::look::CameraPivot;
use crate::state::{Airborne, Dashing, Grounded, InvalidControllerConfig};

/// Validate configs when they are added or changed.
///
/// A failing config gets an [`InvalidControllerConfig`] marker, which every
/// movement system filters out. Fixing the config removes it again.
pub fn validate_controller_configs(
    mut commands: Commands,
    q_configs: Query<
        (Entity, &ControllerConfig, Option<&InvalidControllerConfig>),
        Changed<ControllerConfig>,
    >,
) {
    for (entity, config, invalid) in &q_configs {
        match config.validate() {
            Ok(()) => {
                if invalid.is_some() {
                    info!(%entity, "controller config accepted");
                    commands.entity(entity).remove::<InvalidControllerConfig>();
                }
            }
            Err(err) => {
                let reason = err.to_string();
                // Both ticks run this system; only report a new reason once.
                if invalid.is_none_or(|marker| marker.reason != reason) {
                    error!(%entity, %reason, "controller config rejected");
                    commands
                        .entity(entity)
                        .insert(InvalidControllerConfig { reason });
                }
            }
        }
    }
}

/// Panic if a freshly added controller has no body for the backend to drive.
pub fn verify_physics_body<B: CharacterPhysicsBackend>(
    world: &World,
    q_added: Query<Entity, Added<CharacterController>>,
) {
    for entity in &q_added {
        if !B::has_body(world, entity) {
            panic!(
                "{entity} has a CharacterController but no physics body for the configured backend"
            );
        }
    }
}

/// Turn this frame's button edges into controller requests.
pub fn dispatch_actions(
    mut attacks: EventWriter<AttackRequested>,
    mut q_controllers: Query<
        (
            Entity,
            &mut CharacterController,
            &ControllerConfig,
            &MovementIntent,
            &mut Transform,
            &GlobalTransform,
        ),
        Without<InvalidControllerConfig>,
    >,
) {
    for (entity, mut controller, config, intent, mut transform, global) in &mut q_controllers {
        if intent.was_pressed(ControllerAction::Jump) && !controller.request_jump() {
            trace!(%entity, grounded = controller.is_grounded(), "jump rejected");
        }

        if intent.was_pressed(ControllerAction::Dash) {
            controller.request_dash(config);
        }

        if intent.was_pressed(ControllerAction::Slide) && controller.press_slide(config) {
            transform.scale.y = config.slide_height_scale;
        }
        if intent.was_released(ControllerAction::Slide) {
            transform.scale.y = 1.0;
        }

        if intent.was_pressed(ControllerAction::Attack) {
            attacks.write(AttackRequested {
                character: entity,
                position: global.translation(),
            });
        }
    }
}

/// Apply look input and advance the apex window by the frame time.
pub fn update_look_and_apex(
    time: Res<Time>,
    mut q_controllers: Query<
        (
            &mut CharacterController,
            &ControllerConfig,
            &mut MovementIntent,
        ),
        Without<InvalidControllerConfig>,
    >,
) {
    let dt = time.delta_secs();
    for (mut controller, config, mut intent) in &mut q_controllers {
        let look = intent.take_look();
        controller.update_look(look, dt, config);
        controller.advance_apex(dt);
    }
}

/// Forget press/release edges once the visual frame has seen them.
pub fn latch_action_edges(mut q_intents: Query<&mut MovementIntent>) {
    for mut intent in &mut q_intents {
        intent.latch_edges();
    }
}

/// Run one physics step of every controller.
///
/// Velocity is written first and the impulse (jump or dash) applied on top,
/// so the engine sees both in the same step.
pub fn apply_controller_step<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, ControllerConfig, MovementIntent)> = world
        .query_filtered::<(Entity, &ControllerConfig, &MovementIntent), (
            With<CharacterController>,
            Without<InvalidControllerConfig>,
        )>()
        .iter(world)
        .map(|(e, config, intent)| (e, *config, intent.clone()))
        .collect();

    for (entity, config, intent) in entities {
        let velocity = B::get_velocity(world, entity);
        let gravity = B::get_gravity(world, entity);

        let outcome = {
            let Some(mut controller) = world.get_mut::<CharacterController>(entity) else {
                continue;
            };
            let input = StepInput::from_intent(&intent, controller.facing(), gravity.y, dt);
            controller.fixed_step(&config, input, velocity)
        };

        B::set_velocity(world, entity, outcome.velocity);
        if let Some(impulse) = outcome.impulse {
            B::apply_impulse(world, entity, impulse);
        }
    }
}

/// Sync state marker components with the controller.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &CharacterController,
        Has<Grounded>,
        Has<Airborne>,
        Has<Dashing>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, has_dashing) in &q_controllers {
        let grounded = controller.is_grounded();
        if grounded && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !grounded && (has_grounded || !has_airborne) {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }

        let dashing = controller.is_dashing();
        if dashing && !has_dashing {
            commands.entity(entity).insert(Dashing);
        } else if !dashing && has_dashing {
            commands.entity(entity).remove::<Dashing>();
        }
    }
}

/// Rotate bodies by yaw and camera pivots by pitch.
pub fn apply_orientation(
    mut q_bodies: Query<(&CharacterController, &mut Transform)>,
    mut q_pivots: Query<(&CameraPivot, &mut Transform), Without<CharacterController>>,
) {
    for (pivot, mut transform) in &mut q_pivots {
        if let Ok((controller, _)) = q_bodies.get(pivot.character) {
            let rotation = controller.look().pivot_rotation();
            if transform.rotation != rotation {
                transform.rotation = rotation;
            }
        }
    }

    // Skip unchanged rotations so physics engines don't see a teleport.
    for (controller, mut transform) in &mut q_bodies {
        let rotation = controller.look().body_rotation();
        if transform.rotation != rotation {
            transform.rotation = rotation;
        }
    }
}
