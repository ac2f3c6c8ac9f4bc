//! First Person Example
//!
//! A playable first-person character on a floor with a gentle ramp, a steep
//! ramp and a few platforms.
//!
//! ## Controls
//! - **WASD**: Move
//! - **Mouse**: Look
//! - **Space**: Jump (hold for a higher jump)
//! - **Left Shift**: Dash
//! - **Left Ctrl** (hold): Slide
//! - **Left Click**: Attack (drops a marker ball)
//! - **Escape**: Release the cursor

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};
use bevy_rapier3d::prelude::*;
use platformer_character_controller::prelude::*;

// ==================== Constants ====================

const PLAYER_HALF_HEIGHT: f32 = 0.5;
const PLAYER_RADIUS: f32 = 0.5;
const EYE_HEIGHT: f32 = 0.6;

/// Mouse deltas are pixels per frame; scale them to roughly stick-sized input.
const MOUSE_SCALE: f32 = 0.5;

/// Marker component for the player entity.
#[derive(Component)]
struct Player;

// ==================== Main ====================

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "First Person - Character Controller Example".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        // Physics
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
        // Character controller
        .add_plugins(CharacterControllerPlugin::<Rapier3dBackend>::default())
        // Systems
        .add_systems(Startup, (setup, grab_cursor))
        .add_systems(
            Update,
            (handle_input, toggle_cursor).before(CharacterControllerSet::Input),
        )
        .add_systems(Update, spawn_attack_markers.after(CharacterControllerSet::Input))
        .run();
}

// ==================== Setup ====================

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.9, 0.4, 0.0)),
    ));

    let ground = materials.add(Color::srgb(0.35, 0.4, 0.35));
    let props = materials.add(Color::srgb(0.6, 0.55, 0.5));

    // Floor
    spawn_block(
        &mut commands,
        &mut meshes,
        ground,
        Vec3::new(0.0, -0.5, 0.0),
        Vec3::new(40.0, 0.5, 40.0),
        Quat::IDENTITY,
    );

    // Walkable ramp (15 degrees) and a ramp too steep to stand on (35 degrees)
    spawn_block(
        &mut commands,
        &mut meshes,
        props.clone(),
        Vec3::new(-8.0, 0.5, -10.0),
        Vec3::new(2.0, 0.2, 5.0),
        Quat::from_rotation_x(15f32.to_radians()),
    );
    spawn_block(
        &mut commands,
        &mut meshes,
        props.clone(),
        Vec3::new(8.0, 1.0, -10.0),
        Vec3::new(2.0, 0.2, 5.0),
        Quat::from_rotation_x(35f32.to_radians()),
    );

    // Platforms
    for (i, height) in [1.0, 2.0, 3.0].into_iter().enumerate() {
        spawn_block(
            &mut commands,
            &mut meshes,
            props.clone(),
            Vec3::new(-4.0 + i as f32 * 4.0, height, -20.0),
            Vec3::new(1.5, 0.25, 1.5),
            Quat::IDENTITY,
        );
    }

    spawn_player(&mut commands, &mut meshes, &mut materials);

    commands.spawn((
        Text::new(
            "WASD: Move | Mouse: Look | Space: Jump | Shift: Dash | Ctrl: Slide | Click: Attack",
        ),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
    ));
}

fn spawn_block(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    material: Handle<StandardMaterial>,
    position: Vec3,
    half_extents: Vec3,
    rotation: Quat,
) {
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::from_size(half_extents * 2.0))),
        MeshMaterial3d(material),
        Transform::from_translation(position).with_rotation(rotation),
        RigidBody::Fixed,
        Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
    ));
}

fn spawn_player(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let config = ControllerConfig::player();

    let player = commands
        .spawn((
            Player,
            CharacterController::new(),
            config,
            Rapier3dCharacterBundle::new(),
            Collider::capsule_y(PLAYER_HALF_HEIGHT, PLAYER_RADIUS),
            Mesh3d(meshes.add(Capsule3d::new(PLAYER_RADIUS, PLAYER_HALF_HEIGHT * 2.0))),
            MeshMaterial3d(materials.add(Color::srgb(0.2, 0.5, 0.9))),
            Transform::from_xyz(0.0, 2.0, 0.0),
        ))
        .id();

    commands.spawn((
        CameraPivot::new(player),
        Camera3d::default(),
        Transform::from_xyz(0.0, EYE_HEIGHT, 0.0),
        ChildOf(player),
    ));
}

// ==================== Input ====================

fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut query: Query<&mut MovementIntent, With<Player>>,
) {
    let focused = windows
        .single()
        .is_ok_and(|window| window.cursor_options.grab_mode != CursorGrabMode::None);

    for mut intent in &mut query {
        if !focused {
            intent.clear();
            continue;
        }

        let mut axis = Vec2::ZERO;
        if keyboard.pressed(KeyCode::KeyW) {
            axis.y += 1.0;
        }
        if keyboard.pressed(KeyCode::KeyS) {
            axis.y -= 1.0;
        }
        if keyboard.pressed(KeyCode::KeyD) {
            axis.x += 1.0;
        }
        if keyboard.pressed(KeyCode::KeyA) {
            axis.x -= 1.0;
        }
        intent.set_move(axis);

        // Screen y grows downward; look input y is positive up.
        let delta = mouse_motion.delta * MOUSE_SCALE;
        intent.add_look(Vec2::new(delta.x, -delta.y));

        intent.set_action(ControllerAction::Jump, keyboard.pressed(KeyCode::Space));
        intent.set_action(ControllerAction::Dash, keyboard.pressed(KeyCode::ShiftLeft));
        intent.set_action(
            ControllerAction::Slide,
            keyboard.pressed(KeyCode::ControlLeft),
        );
        intent.set_action(
            ControllerAction::Attack,
            mouse_buttons.pressed(MouseButton::Left),
        );
    }
}

fn grab_cursor(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = windows.single_mut() {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    }
}

/// Escape releases the cursor, clicking grabs it again.
fn toggle_cursor(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Ok(mut window) = windows.single_mut() else {
        return;
    };

    if keyboard.just_pressed(KeyCode::Escape) {
        window.cursor_options.grab_mode = CursorGrabMode::None;
        window.cursor_options.visible = true;
    } else if mouse_buttons.just_pressed(MouseButton::Left)
        && window.cursor_options.grab_mode == CursorGrabMode::None
    {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    }
}

// ==================== Attack ====================

fn spawn_attack_markers(
    mut commands: Commands,
    mut attacks: EventReader<AttackRequested>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    q_controllers: Query<&CharacterController>,
) {
    for attack in attacks.read() {
        let forward = q_controllers
            .get(attack.character)
            .map(|controller| controller.facing().forward)
            .unwrap_or(Vec3::NEG_Z);

        commands.spawn((
            Mesh3d(meshes.add(Sphere::new(0.2))),
            MeshMaterial3d(materials.add(Color::srgb(0.9, 0.3, 0.2))),
            Transform::from_translation(attack.position + forward * 1.5 + Vec3::Y * 0.5),
            RigidBody::Dynamic,
            Collider::ball(0.2),
        ));
    }
}
