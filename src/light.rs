//! Scene lights.
//!
//! A directional light stores the direction its light *travels*; the vector
//! toward the light used in shading is the negation. A point light stores a
//! position and the toward-light vector is computed per hit point.

use glam::DVec3;

use crate::ray::Color;
use crate::scene::SceneError;

/// Emitter geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Positional light; shadow rays stop at this point.
    Point {
        /// World-space light position
        position: DVec3,
    },
    /// Light arriving from infinitely far away along `direction`.
    Directional {
        /// Unit direction of travel
        direction: DVec3,
    },
}

/// One light in the scene's ordered light list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Disabled lights add no diffuse term and cast no shadow rays
    pub enabled: bool,
    /// Position or direction
    pub kind: LightKind,
    /// Emitted color (editor-facing; the lighting law weighs by `weight`)
    pub color: Color,
    /// Share of the diffuse term contributed by this light
    pub weight: f64,
}

impl Light {
    /// Enabled point light.
    pub fn point(position: DVec3, color: Color, weight: f64) -> Self {
        Self {
            enabled: true,
            kind: LightKind::Point { position },
            color,
            weight,
        }
    }

    /// Enabled directional light; `direction` is normalized here.
    pub fn directional(direction: DVec3, color: Color, weight: f64) -> Result<Self, SceneError> {
        Ok(Self {
            enabled: true,
            kind: LightKind::Directional { direction: unit_direction(direction)? },
            color,
            weight,
        })
    }

    /// Unit vector from `point` toward the light and the distance a shadow
    /// ray may travel before it has passed the light.
    pub fn toward(&self, point: DVec3) -> (DVec3, f64) {
        match self.kind {
            LightKind::Point { position } => {
                let to_light = position - point;
                let distance = to_light.length();
                (to_light / distance, distance)
            }
            LightKind::Directional { direction } => (-direction, f64::INFINITY),
        }
    }

    /// Whether the light is directional.
    pub fn is_directional(&self) -> bool {
        matches!(self.kind, LightKind::Directional { .. })
    }
}

/// Normalize an edited direction, rejecting vectors too short to carry one.
pub fn unit_direction(v: DVec3) -> Result<DVec3, SceneError> {
    if !v.is_finite() || v.length() <= 1e-4 {
        return Err(SceneError::ZeroDirection);
    }
    Ok(v.normalize())
}
