//! Ground sensing.
//!
//! The sensor is a single downward sphere cast. Backends own the actual
//! physics query; this module describes the cast and classifies its result,
//! so every backend agrees on what "grounded" means.

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::GroundProbeConfig;

/// A downward sphere cast request built from a [`GroundProbeConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundCast {
    /// World-space origin of the sphere.
    pub origin: Vec3,
    /// Sphere radius.
    pub radius: f32,
    /// Cast direction (always world down).
    pub direction: Vec3,
    /// Maximum travel distance.
    pub max_distance: f32,
    /// Collision groups that count as ground.
    pub layers: u32,
}

impl GroundCast {
    /// Build the cast for a body with the given global transform.
    pub fn from_probe(body: &GlobalTransform, probe: &GroundProbeConfig) -> Self {
        Self {
            origin: body.transform_point(probe.offset),
            radius: probe.radius,
            direction: Vec3::NEG_Y,
            max_distance: probe.allowance,
            layers: probe.layers,
        }
    }
}

/// Result of one ground probe.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundContact {
    /// Whatever the cast hit, walkable or not.
    pub hit: Option<CollisionData>,
    /// True iff `hit` is walkable.
    pub grounded: bool,
}

/// Whether a surface with this hit is shallow enough to stand on.
///
/// The comparison is strict: a surface exactly at `max_angle` degrees is a wall.
pub fn is_walkable(hit: &CollisionData, max_angle: f32) -> bool {
    hit.angle_from(Vec3::Y) < max_angle
}

/// Run a ground probe using `cast` to perform the physics query.
///
/// Has no side effects beyond the query itself, so it is safe to call every
/// frame; with an unchanged world it returns the same contact every time.
pub fn probe(
    request: &GroundCast,
    max_walkable_angle: f32,
    cast: impl FnOnce(&GroundCast) -> Option<CollisionData>,
) -> GroundContact {
    let hit = cast(request);
    let grounded = hit
        .as_ref()
        .is_some_and(|hit| is_walkable(hit, max_walkable_angle));
    GroundContact { hit, grounded }
}
