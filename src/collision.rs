//! Shape-cast hit data shared between physics backends and the controller.

use bevy::prelude::*;

/// Information about a shapecast collision.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance travelled along the cast before the hit.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Angle between the hit normal and `up`, in degrees.
    ///
    /// A zero-length normal is treated as pointing straight down, so it is
    /// never considered walkable.
    pub fn angle_from(&self, up: Vec3) -> f32 {
        let normal = self.normal.normalize_or_zero();
        if normal == Vec3::ZERO {
            return 180.0;
        }
        normal.angle_between(up).to_degrees()
    }
}
