//! Controller configuration components.
//!
//! Every tunable of the controller lives in [`ControllerConfig`]. The defaults
//! reproduce the reference feel: a quick 11 u/s run, a short floaty apex, a
//! heavy fall and a three-times-amplified dash.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Ground probe geometry.
///
/// The probe is a small sphere swept straight down from a point near the
/// character's feet. Only hits on the configured layers whose surface normal
/// is within `max_walkable_angle` of world-up count as ground.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundProbeConfig {
    /// Probe origin in the character's local space.
    ///
    /// Transformed by the body's transform, so it follows the body the way a
    /// child object would (including the slide pose scale).
    pub offset: Vec3,
    /// Radius of the swept sphere.
    pub radius: f32,
    /// How far below the origin the sphere travels.
    pub allowance: f32,
    /// Surfaces tilted this much or more from world-up are not ground (degrees).
    pub max_walkable_angle: f32,
    /// Bitmask of collision groups considered ground.
    pub layers: u32,
}

impl Default for GroundProbeConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, -0.9, 0.0),
            radius: 0.08,
            allowance: 0.325,
            max_walkable_angle: 20.0,
            layers: u32::MAX,
        }
    }
}

/// Configuration parameters for the character controller.
///
/// Read-only at runtime from the controller's point of view. Changing it
/// through reflection or a system is fine; the new values are validated again
/// before the next update (see [`ControllerConfig::validate`]).
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct ControllerConfig {
    // === Movement ===
    /// Base horizontal speed (units/second).
    pub move_speed: f32,

    // === Jump ===
    /// Upward impulse applied on jump.
    pub jump_impulse: f32,
    /// Extra gravity multiplier once falling or once the apex window expires.
    pub fall_multiplier: f32,
    /// Extra gravity multiplier when jump is released while still ascending.
    pub low_jump_multiplier: f32,
    /// Length of the reduced-gravity apex window (seconds).
    pub jump_apex_threshold: f32,
    /// Terminal fall speed (units/second, positive).
    pub max_fall_speed: f32,

    // === Dash ===
    /// When false the dash is never armed and dash presses are ignored.
    pub dash_enabled: bool,
    /// Base dash impulse.
    pub dash_impulse: f32,
    /// Multiplier applied to `dash_impulse`.
    pub dash_amplifier: f32,
    /// How long the dash state lasts (seconds).
    pub dash_duration: f32,

    // === Slide ===
    /// Bonus speed granted by each slide press.
    pub slide_boost: f32,
    /// Delay before a slide boost is taken back (seconds of physics time).
    pub slide_boost_duration: f32,
    /// Vertical scale of the body while the slide button is held.
    pub slide_height_scale: f32,

    // === Look ===
    /// Degrees per second per unit of look input (x = yaw, y = pitch).
    pub look_sensitivity: Vec2,
    /// Lowest pitch in degrees (looking up is negative).
    pub min_pitch: f32,
    /// Highest pitch in degrees.
    pub max_pitch: f32,

    // === Ground ===
    /// Ground sensor geometry.
    pub ground_probe: GroundProbeConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 11.0,

            jump_impulse: 7.0,
            fall_multiplier: 2.5,
            low_jump_multiplier: 4.0,
            jump_apex_threshold: 0.185,
            max_fall_speed: 30.0,

            dash_enabled: true,
            dash_impulse: 18.0,
            dash_amplifier: 3.0,
            dash_duration: 0.175,

            slide_boost: 2.65,
            slide_boost_duration: 2.0,
            slide_height_scale: 0.5,

            // 0.4 / 0.5 degrees per frame at 60 fps
            look_sensitivity: Vec2::new(24.0, 30.0),
            min_pitch: -80.0,
            max_pitch: 80.0,

            ground_probe: GroundProbeConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Config tuned for a player character. Same as the defaults.
    pub fn player() -> Self {
        Self::default()
    }

    /// Default config with the dash state disabled.
    pub fn without_dash() -> Self {
        Self {
            dash_enabled: false,
            ..default()
        }
    }

    /// Parse a RON document and validate the result.
    ///
    /// Missing fields take their default values.
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Total impulse of a dash.
    #[inline]
    pub fn dash_strength(&self) -> f32 {
        self.dash_impulse * self.dash_amplifier
    }

    /// Check every tunable, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("move_speed", self.move_speed)?;

        non_negative("jump_impulse", self.jump_impulse)?;
        at_least_one("fall_multiplier", self.fall_multiplier)?;
        at_least_one("low_jump_multiplier", self.low_jump_multiplier)?;
        non_negative("jump_apex_threshold", self.jump_apex_threshold)?;
        positive("max_fall_speed", self.max_fall_speed)?;

        non_negative("dash_impulse", self.dash_impulse)?;
        non_negative("dash_amplifier", self.dash_amplifier)?;
        if self.dash_enabled {
            positive("dash_duration", self.dash_duration)?;
        }

        non_negative("slide_boost", self.slide_boost)?;
        positive("slide_boost_duration", self.slide_boost_duration)?;
        in_range("slide_height_scale", self.slide_height_scale, f32::EPSILON, 1.0)?;

        finite("look_sensitivity.x", self.look_sensitivity.x)?;
        finite("look_sensitivity.y", self.look_sensitivity.y)?;
        in_range("min_pitch", self.min_pitch, -90.0, 90.0)?;
        in_range("max_pitch", self.max_pitch, -90.0, 90.0)?;
        if self.min_pitch >= self.max_pitch {
            return Err(ConfigError::InvertedPitchBounds {
                min: self.min_pitch,
                max: self.max_pitch,
            });
        }

        let probe = &self.ground_probe;
        finite("ground_probe.offset.x", probe.offset.x)?;
        finite("ground_probe.offset.y", probe.offset.y)?;
        finite("ground_probe.offset.z", probe.offset.z)?;
        positive("ground_probe.radius", probe.radius)?;
        positive("ground_probe.allowance", probe.allowance)?;
        in_range(
            "ground_probe.max_walkable_angle",
            probe.max_walkable_angle,
            f32::EPSILON,
            90.0,
        )?;

        Ok(())
    }

    /// Builder: set move speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Builder: set jump impulse.
    pub fn with_jump_impulse(mut self, impulse: f32) -> Self {
        self.jump_impulse = impulse;
        self
    }

    /// Builder: set fall and low-jump gravity multipliers.
    pub fn with_gravity_multipliers(mut self, fall: f32, low_jump: f32) -> Self {
        self.fall_multiplier = fall;
        self.low_jump_multiplier = low_jump;
        self
    }

    /// Builder: set the apex hang window.
    pub fn with_apex_threshold(mut self, seconds: f32) -> Self {
        self.jump_apex_threshold = seconds;
        self
    }

    /// Builder: set terminal fall speed.
    pub fn with_max_fall_speed(mut self, speed: f32) -> Self {
        self.max_fall_speed = speed;
        self
    }

    /// Builder: set dash impulse, amplifier and duration.
    pub fn with_dash(mut self, impulse: f32, amplifier: f32, duration: f32) -> Self {
        self.dash_impulse = impulse;
        self.dash_amplifier = amplifier;
        self.dash_duration = duration;
        self
    }

    /// Builder: enable or disable the dash.
    pub fn with_dash_enabled(mut self, enabled: bool) -> Self {
        self.dash_enabled = enabled;
        self
    }

    /// Builder: set slide boost amount and how long it lasts.
    pub fn with_slide(mut self, boost: f32, duration: f32) -> Self {
        self.slide_boost = boost;
        self.slide_boost_duration = duration;
        self
    }

    /// Builder: set look sensitivity.
    pub fn with_look_sensitivity(mut self, x: f32, y: f32) -> Self {
        self.look_sensitivity = Vec2::new(x, y);
        self
    }

    /// Builder: set pitch bounds (degrees).
    pub fn with_pitch_bounds(mut self, min: f32, max: f32) -> Self {
        self.min_pitch = min;
        self.max_pitch = max;
        self
    }

    /// Builder: set ground probe geometry.
    pub fn with_ground_probe(mut self, probe: GroundProbeConfig) -> Self {
        self.ground_probe = probe;
        self
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { field, value });
    }
    Ok(())
}

fn at_least_one(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 1.0 {
        return Err(ConfigError::BelowOne { field, value });
    }
    Ok(())
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
