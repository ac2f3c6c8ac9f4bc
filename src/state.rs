//! State marker components.
//!
//! These mirror the controller's internal state so gameplay code can filter
//! on them in queries. They are added and removed by the controller systems;
//! writing them by hand has no effect on movement.

use bevy::prelude::*;

/// Marker component indicating the character is grounded.
///
/// Added when the ground probe hits a surface flatter than
/// `max_walkable_angle`. Mutually exclusive with [`Airborne`].
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use platformer_character_controller::prelude::*;
///
/// fn landed(q: Query<Entity, Added<Grounded>>) {
///     for entity in &q {
///         info!("{entity} landed");
///     }
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component present while a dash is running.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Dashing;

/// Present on characters whose [`ControllerConfig`](crate::config::ControllerConfig)
/// failed validation. The controller skips them until the config is fixed.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct InvalidControllerConfig {
    pub reason: String,
}
