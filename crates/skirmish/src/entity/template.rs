//! Entity templates: the shared, read-only blueprint behind every entity.
//!
//! Templates are registered once with the manager and shared by `Arc` between
//! all entities made from them. The `template_type` string groups templates
//! for filtering ("every Tank") and tells the level loader which kind of
//! entity a declaration produces.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::raycast::Aabb;

/// Template type tags with built-in behaviour.
pub mod types {
    pub const TANK: &str = "Tank";
    pub const PROJECTILE: &str = "Projectile";
    pub const AMMO: &str = "Ammo";
    pub const HEALTH: &str = "Health";
    pub const MINE: &str = "Mine";
    pub const SCENERY: &str = "Scenery";
    pub const BUILDING: &str = "Building";
}

/// Movement and combat stats shared by every tank of a template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankStats {
    pub max_speed: f32,
    pub acceleration: f32,
    /// Hull turn rate, radians per second.
    pub turn_speed: f32,
    /// Turret turn rate, radians per second.
    pub turret_turn_speed: f32,
    pub max_hp: u32,
    /// Damage dealt by this tank's shell.
    pub shell_damage: u32,
}

impl TankStats {
    pub(crate) fn validate(&self, template: &str) -> Result<(), SimError> {
        let invalid = |field, reason: &str| SimError::InvalidField {
            owner: template.to_string(),
            field,
            reason: reason.to_string(),
        };
        if !(self.max_speed > 0.0) {
            return Err(invalid("max_speed", "must be positive"));
        }
        if !(self.acceleration > 0.0) {
            return Err(invalid("acceleration", "must be positive"));
        }
        if !(self.turn_speed > 0.0) {
            return Err(invalid("turn_speed", "must be positive"));
        }
        if !(self.turret_turn_speed >= 0.0) {
            return Err(invalid("turret_turn_speed", "must not be negative"));
        }
        if self.max_hp == 0 {
            return Err(invalid("max_hp", "must be at least 1"));
        }
        Ok(())
    }
}

/// Shared configuration for a class of entities.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTemplate {
    template_type: String,
    name: String,
    mesh: String,
    tank: Option<TankStats>,
    bounds: Aabb,
}

impl EntityTemplate {
    pub(crate) fn new(template_type: &str, name: &str, mesh: &str) -> Self {
        Self {
            template_type: template_type.to_string(),
            name: name.to_string(),
            mesh: mesh.to_string(),
            tank: None,
            bounds: Aabb::UNIT,
        }
    }

    pub(crate) fn with_tank_stats(mut self, stats: TankStats) -> Self {
        self.tank = Some(stats);
        self
    }

    pub(crate) fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn template_type(&self) -> &str {
        &self.template_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mesh reference for the renderer. The core never loads it.
    pub fn mesh(&self) -> &str {
        &self.mesh
    }

    /// Stats for tank templates, `None` otherwise.
    pub fn tank_stats(&self) -> Option<&TankStats> {
        self.tank.as_ref()
    }

    /// Local-space bounding box used when this template blocks line of sight.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> TankStats {
        TankStats {
            max_speed: 40.0,
            acceleration: 4.2,
            turn_speed: 2.0,
            turret_turn_speed: 1.0,
            max_hp: 200,
            shell_damage: 20,
        }
    }

    #[test]
    fn valid_stats_pass() {
        assert!(stats().validate("Scout").is_ok());
    }

    #[test]
    fn zero_acceleration_is_rejected() {
        let bad = TankStats {
            acceleration: 0.0,
            ..stats()
        };
        match bad.validate("Scout") {
            Err(SimError::InvalidField { field, .. }) => assert_eq!(field, "acceleration"),
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn nan_speed_is_rejected() {
        let bad = TankStats {
            max_speed: f32::NAN,
            ..stats()
        };
        assert!(bad.validate("Scout").is_err());
    }

    #[test]
    fn template_defaults_to_unit_bounds() {
        let t = EntityTemplate::new(types::BUILDING, "Hut", "Hut.x");
        assert_eq!(t.bounds(), Aabb::UNIT);
        assert!(t.tank_stats().is_none());
        assert_eq!(t.template_type(), "Building");
    }
}
