//! Integration tests for the character controller.
//!
//! These drive the full plugin in a headless app against a small in-test
//! physics backend: a body that only stores velocity and impulses, and a flat
//! (or tilted) ground plane the sensor casts against. Schedules are run by
//! hand so each test controls exactly which visual frames and physics steps
//! happen.

use std::time::Duration;

use bevy::prelude::*;
use platformer_character_controller::backend::CharacterPhysicsBackend;
use platformer_character_controller::prelude::*;
use platformer_character_controller::sensor::{self, GroundCast};

const DT: f32 = 1.0 / 64.0;
const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

// ==================== Test Backend ====================

/// A body that records what the controller asked for.
#[derive(Component, Default)]
struct TestBody {
    velocity: Vec3,
    impulses: Vec<Vec3>,
}

/// An infinite plane the ground sensor can hit.
#[derive(Resource, Clone, Copy)]
struct TestGround {
    height: f32,
    normal: Vec3,
}

struct TestBackend;

impl CharacterPhysicsBackend for TestBackend {
    type VelocityComponent = TestBody;

    fn plugin() -> impl Plugin {
        TestBackendPlugin
    }

    fn has_body(world: &World, entity: Entity) -> bool {
        world.get::<TestBody>(entity).is_some()
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<TestBody>(entity)
            .map(|b| b.velocity)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.velocity = velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        // Unit mass.
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.velocity += impulse;
            body.impulses.push(impulse);
        }
    }

    fn get_gravity(_world: &World, _entity: Entity) -> Vec3 {
        GRAVITY
    }
}

struct TestBackendPlugin;

impl Plugin for TestBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            test_ground_detection.in_set(CharacterControllerSet::Sensors),
        );
        app.add_systems(
            FixedUpdate,
            test_ground_detection.in_set(CharacterControllerSet::Sensors),
        );
    }
}

fn test_ground_detection(
    ground: Option<Res<TestGround>>,
    mut q: Query<(&Transform, &ControllerConfig, &mut CharacterController)>,
) {
    for (transform, config, mut controller) in &mut q {
        let probe = &config.ground_probe;
        let cast = GroundCast::from_probe(&GlobalTransform::from(*transform), probe);
        let contact = sensor::probe(&cast, probe.max_walkable_angle, |cast| {
            let ground = ground.as_deref()?;
            let distance = cast.origin.y - cast.radius - ground.height;
            (0.0..=cast.max_distance).contains(&distance).then(|| {
                CollisionData::new(
                    distance,
                    ground.normal,
                    cast.origin + cast.direction * distance,
                    None,
                )
            })
        });
        controller.set_ground_contact(contact);
    }
}

// ==================== Helpers ====================

fn create_test_app() -> App {
    let mut app = App::new();
    app.init_resource::<Time>();
    app.insert_resource(Time::<Fixed>::from_seconds(DT as f64));
    app.add_plugins(CharacterControllerPlugin::<TestBackend>::default());
    app
}

fn flat_ground(app: &mut App) {
    app.insert_resource(TestGround {
        height: 0.0,
        normal: Vec3::Y,
    });
}

fn tilted_ground(app: &mut App, degrees: f32) {
    let radians = degrees.to_radians();
    app.insert_resource(TestGround {
        height: 0.0,
        normal: Vec3::new(radians.sin(), radians.cos(), 0.0),
    });
}

/// Probe origin sits 0.2 above the plane, so the sphere hits within the allowance.
const STANDING: Vec3 = Vec3::new(0.0, 1.1, 0.0);

fn spawn_character(app: &mut App, controller: CharacterController, config: ControllerConfig) -> Entity {
    let transform = Transform::from_translation(STANDING);
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            controller,
            config,
            TestBody::default(),
        ))
        .id()
}

fn spawn_default(app: &mut App) -> Entity {
    spawn_character(app, CharacterController::new(), ControllerConfig::default())
}

/// Run one visual frame lasting `dt` seconds.
fn frame_for(app: &mut App, dt: f32) {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(dt));
    app.world_mut().run_schedule(Update);
}

fn frame(app: &mut App) {
    frame_for(app, 1.0 / 60.0);
}

/// Run one physics step.
fn step(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

fn steps(app: &mut App, n: usize) {
    for _ in 0..n {
        step(app);
    }
}

fn intent(app: &mut App, entity: Entity) -> Mut<'_, MovementIntent> {
    app.world_mut().get_mut::<MovementIntent>(entity).unwrap()
}

fn controller(app: &App, entity: Entity) -> &CharacterController {
    app.world().get::<CharacterController>(entity).unwrap()
}

fn body(app: &App, entity: Entity) -> &TestBody {
    app.world().get::<TestBody>(entity).unwrap()
}

fn set_body_velocity(app: &mut App, entity: Entity, velocity: Vec3) {
    app.world_mut().get_mut::<TestBody>(entity).unwrap().velocity = velocity;
}

// ==================== Ground Detection Tests ====================

mod ground_detection {
    use super::*;

    #[test]
    fn flat_ground_is_grounded() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);

        step(&mut app);

        assert!(controller(&app, character).is_grounded());
        assert!(app.world().get::<Grounded>(character).is_some());
        assert!(app.world().get::<Airborne>(character).is_none());
    }

    #[test]
    fn no_ground_is_airborne() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);

        step(&mut app);

        assert!(!controller(&app, character).is_grounded());
        assert!(controller(&app, character).floor().is_none());
        assert!(app.world().get::<Airborne>(character).is_some());
    }

    #[test]
    fn ground_out_of_reach_is_airborne() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);
        app.world_mut()
            .get_mut::<Transform>(character)
            .unwrap()
            .translation
            .y = 3.0;

        step(&mut app);

        assert!(!controller(&app, character).is_grounded());
    }

    #[test]
    fn gentle_slope_is_grounded() {
        let mut app = create_test_app();
        tilted_ground(&mut app, 15.0);
        let character = spawn_default(&mut app);

        step(&mut app);

        assert!(controller(&app, character).is_grounded());
    }

    #[test]
    fn steep_slope_is_hit_but_not_grounded() {
        let mut app = create_test_app();
        tilted_ground(&mut app, 25.0);
        let character = spawn_default(&mut app);

        step(&mut app);

        let controller = controller(&app, character);
        assert!(controller.floor().is_some());
        assert!(!controller.is_grounded());
    }

    #[test]
    fn markers_follow_takeoff() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);
        step(&mut app);
        assert!(app.world().get::<Grounded>(character).is_some());

        app.world_mut().remove_resource::<TestGround>();
        step(&mut app);

        assert!(app.world().get::<Grounded>(character).is_none());
        assert!(app.world().get::<Airborne>(character).is_some());
    }
}

// ==================== Movement Tests ====================

mod movement {
    use super::*;

    #[test]
    fn forward_input_facing_positive_z() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let config = ControllerConfig::default();
        let character = spawn_character(
            &mut app,
            CharacterController::with_look(180.0, 0.0, &config),
            config,
        );

        intent(&mut app, character).set_move(Vec2::new(0.0, 1.0));
        step(&mut app);

        let velocity = body(&app, character).velocity;
        assert!(velocity.x.abs() < 1e-4, "x = {}", velocity.x);
        assert!((velocity.z - 11.0).abs() < 1e-4, "z = {}", velocity.z);
    }

    #[test]
    fn no_input_stops_horizontal_motion() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);
        set_body_velocity(&mut app, character, Vec3::new(4.0, 0.0, -4.0));

        step(&mut app);

        let velocity = body(&app, character).velocity;
        assert_eq!(velocity.x, 0.0);
        assert_eq!(velocity.z, 0.0);
    }

    #[test]
    fn falling_speed_is_clamped() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);
        set_body_velocity(&mut app, character, Vec3::new(0.0, -29.95, 0.0));

        step(&mut app);

        assert_eq!(body(&app, character).velocity.y, -30.0);
    }
}

// ==================== Jump Tests ====================

mod jump {
    use super::*;

    #[test]
    fn grounded_jump_applies_one_impulse() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);
        set_body_velocity(&mut app, character, Vec3::new(0.0, -0.4, 0.0));

        intent(&mut app, character).press(ControllerAction::Jump);
        frame(&mut app);
        assert!(controller(&app, character).jump_queued());

        step(&mut app);

        let body = body(&app, character);
        assert_eq!(body.impulses, vec![Vec3::Y * 7.0]);
        assert_eq!(body.velocity.y, 7.0);
        assert!(controller(&app, character).apex().is_active());
        assert_eq!(controller(&app, character).bonus_speed(), 1.0);

        // Holding jump never re-triggers it.
        frame(&mut app);
        step(&mut app);
        assert_eq!(app.world().get::<TestBody>(character).unwrap().impulses.len(), 1);
    }

    #[test]
    fn airborne_jump_is_ignored() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Jump);
        frame(&mut app);
        step(&mut app);

        assert!(body(&app, character).impulses.is_empty());
        assert!(!controller(&app, character).apex().is_active());
    }

    #[test]
    fn release_during_ascent_cuts_the_jump() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Jump);
        frame(&mut app);
        step(&mut app);

        // Held: floaty apex, no extra gravity.
        step(&mut app);
        assert_eq!(body(&app, character).velocity.y, 7.0);

        intent(&mut app, character).release(ControllerAction::Jump);
        frame(&mut app);
        step(&mut app);

        let expected = 7.0 + GRAVITY.y * (4.0 - 1.0) * DT;
        let vy = body(&app, character).velocity.y;
        assert!((vy - expected).abs() < 1e-5, "vy = {vy}");
        assert!(!controller(&app, character).apex().is_active());
        assert_eq!(controller(&app, character).bonus_speed(), 0.0);
    }

    #[test]
    fn apex_window_runs_on_frame_time() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Jump);
        frame(&mut app);
        step(&mut app);

        frame_for(&mut app, 0.2);
        step(&mut app);

        // Still rising and held, but the hang window is over.
        let expected = 7.0 + GRAVITY.y * (2.5 - 1.0) * DT;
        let vy = body(&app, character).velocity.y;
        assert!((vy - expected).abs() < 1e-5, "vy = {vy}");
        assert_eq!(controller(&app, character).bonus_speed(), 0.0);
    }
}

// ==================== Dash Tests ====================

mod dash {
    use super::*;

    #[test]
    fn dash_follows_previous_move_direction() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);

        intent(&mut app, character).set_move(Vec2::new(1.0, 0.0));
        step(&mut app);
        intent(&mut app, character).set_move(Vec2::ZERO);

        intent(&mut app, character).press(ControllerAction::Dash);
        frame(&mut app);
        assert_eq!(controller(&app, character).mode(), MovementMode::Dashing);

        step(&mut app);

        let body = body(&app, character);
        assert_eq!(body.impulses, vec![Vec3::X * 54.0]);
        assert_eq!(body.velocity, Vec3::X * 54.0);
        assert!(app.world().get::<Dashing>(character).is_some());
    }

    #[test]
    fn dash_ends_after_duration() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Dash);
        frame(&mut app);

        // 0.175 s at 1/64 s per step: still dashing after 11 steps.
        steps(&mut app, 11);
        assert!(controller(&app, character).is_dashing());
        assert!(!controller(&app, character).dash_armed());
        assert_eq!(body(&app, character).velocity.y, 0.0);

        step(&mut app);
        assert_eq!(controller(&app, character).mode(), MovementMode::Moving);
        assert!(controller(&app, character).dash_armed());
        assert!(app.world().get::<Dashing>(character).is_none());
        assert_eq!(body(&app, character).impulses.len(), 1);
    }

    #[test]
    fn pressing_again_mid_dash_does_nothing() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Dash);
        frame(&mut app);
        steps(&mut app, 3);
        let elapsed = controller(&app, character).dash_elapsed();

        intent(&mut app, character).release(ControllerAction::Dash);
        frame(&mut app);
        intent(&mut app, character).press(ControllerAction::Dash);
        frame(&mut app);

        assert!(controller(&app, character).is_dashing());
        assert_eq!(controller(&app, character).dash_elapsed(), elapsed);
    }

    #[test]
    fn dash_ignores_move_input() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Dash);
        frame(&mut app);
        step(&mut app);
        let after_impulse = body(&app, character).velocity;

        intent(&mut app, character).set_move(Vec2::new(1.0, 0.0));
        step(&mut app);

        assert_eq!(body(&app, character).velocity, after_impulse);
    }

    #[test]
    fn disabled_dash_keeps_moving() {
        let mut app = create_test_app();
        let character = spawn_character(
            &mut app,
            CharacterController::new(),
            ControllerConfig::without_dash(),
        );

        intent(&mut app, character).press(ControllerAction::Dash);
        frame(&mut app);
        step(&mut app);

        assert_eq!(controller(&app, character).mode(), MovementMode::Moving);
        assert!(body(&app, character).impulses.is_empty());
    }
}

// ==================== Slide Tests ====================

mod slide {
    use super::*;

    #[test]
    fn slide_boost_outlives_release() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Slide);
        frame(&mut app);
        assert!((controller(&app, character).bonus_speed() - 2.65).abs() < 1e-6);
        assert_eq!(app.world().get::<Transform>(character).unwrap().scale.y, 0.5);

        intent(&mut app, character).release(ControllerAction::Slide);
        frame(&mut app);
        assert_eq!(app.world().get::<Transform>(character).unwrap().scale.y, 1.0);
        assert!((controller(&app, character).bonus_speed() - 2.65).abs() < 1e-6);

        steps(&mut app, 127);
        assert!((controller(&app, character).bonus_speed() - 2.65).abs() < 1e-6);

        step(&mut app);
        assert_eq!(controller(&app, character).bonus_speed(), 0.0);
    }

    #[test]
    fn boosted_speed_applies_to_movement() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Slide);
        intent(&mut app, character).set_move(Vec2::new(0.0, 1.0));
        frame(&mut app);
        step(&mut app);

        let velocity = body(&app, character).velocity;
        let speed = Vec2::new(velocity.x, velocity.z).length();
        assert!((speed - 13.65).abs() < 1e-4, "speed = {speed}");
    }

    #[test]
    fn slide_during_dash_is_ignored() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Dash);
        frame(&mut app);
        intent(&mut app, character).press(ControllerAction::Slide);
        frame(&mut app);

        assert_eq!(controller(&app, character).bonus_speed(), 0.0);
        assert_eq!(app.world().get::<Transform>(character).unwrap().scale.y, 1.0);
    }
}

// ==================== Look Tests ====================

mod look {
    use super::*;

    #[test]
    fn look_turns_body_and_pivot() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);
        let pivot = app
            .world_mut()
            .spawn((Transform::default(), CameraPivot::new(character)))
            .id();

        intent(&mut app, character).add_look(Vec2::new(1.0, 1.0));
        frame_for(&mut app, 0.5);
        app.world_mut().run_schedule(PostUpdate);

        let controller = controller(&app, character);
        assert_eq!(controller.yaw(), 12.0);
        assert_eq!(controller.pitch(), -15.0);

        let body_rotation = app.world().get::<Transform>(character).unwrap().rotation;
        assert!(body_rotation.angle_between(Quat::from_rotation_y(-12f32.to_radians())) < 1e-4);

        let pivot_rotation = app.world().get::<Transform>(pivot).unwrap().rotation;
        assert!(pivot_rotation.angle_between(Quat::from_rotation_x(15f32.to_radians())) < 1e-4);

        // Look input is consumed by the frame.
        assert_eq!(app.world().get::<MovementIntent>(character).unwrap().look_axis(), Vec2::ZERO);
    }

    #[test]
    fn pitch_stops_at_bound() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);

        for _ in 0..300 {
            intent(&mut app, character).add_look(Vec2::new(0.0, 1.0));
            frame(&mut app);
        }

        assert_eq!(controller(&app, character).pitch(), -80.0);
    }

    #[test]
    fn yaw_changes_movement_facing() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);

        // 90 degrees to the right over one frame.
        intent(&mut app, character).add_look(Vec2::new(90.0 / 24.0, 0.0));
        frame_for(&mut app, 1.0);
        intent(&mut app, character).set_move(Vec2::new(0.0, 1.0));
        step(&mut app);

        let velocity = body(&app, character).velocity;
        assert!((velocity.x - 11.0).abs() < 1e-3, "velocity = {velocity}");
        assert!(velocity.z.abs() < 1e-3, "velocity = {velocity}");
    }
}

// ==================== Attack Tests ====================

mod attack {
    use super::*;

    #[test]
    fn attack_press_emits_event() {
        let mut app = create_test_app();
        let character = spawn_default(&mut app);

        intent(&mut app, character).press(ControllerAction::Attack);
        frame(&mut app);
        // Held, no new edge.
        frame(&mut app);

        let events = app.world().resource::<Events<AttackRequested>>();
        let mut cursor = events.get_cursor();
        let seen: Vec<AttackRequested> = cursor.read(events).copied().collect();

        assert_eq!(
            seen,
            vec![AttackRequested {
                character,
                position: STANDING,
            }]
        );
    }
}

// ==================== Configuration Tests ====================

mod configuration {
    use super::*;

    #[test]
    fn invalid_config_freezes_controller_until_fixed() {
        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_character(
            &mut app,
            CharacterController::new(),
            ControllerConfig::default().with_pitch_bounds(10.0, -10.0),
        );

        frame(&mut app);
        let marker = app.world().get::<InvalidControllerConfig>(character);
        assert!(marker.is_some());

        intent(&mut app, character).set_move(Vec2::new(0.0, 1.0));
        step(&mut app);
        assert_eq!(body(&app, character).velocity, Vec3::ZERO);

        *app.world_mut().get_mut::<ControllerConfig>(character).unwrap() =
            ControllerConfig::default();
        frame(&mut app);
        assert!(app.world().get::<InvalidControllerConfig>(character).is_none());

        step(&mut app);
        assert!(body(&app, character).velocity.length() > 10.0);
    }

    #[test]
    fn config_from_ron_drives_controller() {
        let config = ControllerConfig::from_ron("(move_speed: 4.0, dash_enabled: false)").unwrap();

        let mut app = create_test_app();
        flat_ground(&mut app);
        let character = spawn_character(&mut app, CharacterController::new(), config);

        intent(&mut app, character).set_move(Vec2::new(1.0, 0.0));
        step(&mut app);

        assert_eq!(body(&app, character).velocity.x, 4.0);
    }

    #[test]
    #[should_panic(expected = "no physics body")]
    fn missing_body_panics() {
        let mut app = create_test_app();
        app.world_mut()
            .spawn((Transform::default(), CharacterController::new()));

        frame(&mut app);
    }

    #[test]
    fn controller_pulls_in_required_components() {
        let mut app = create_test_app();
        let character = app
            .world_mut()
            .spawn((CharacterController::new(), TestBody::default()))
            .id();

        assert!(app.world().get::<MovementIntent>(character).is_some());
        assert!(app.world().get::<ControllerConfig>(character).is_some());
        assert!(app.world().get::<Transform>(character).is_some());
    }
}
