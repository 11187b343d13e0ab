//! Read-only views for displays and tooling.
//!
//! [`TankInfo`] is what an on-screen label or inspector panel shows for one
//! tank. [`WorldSnapshot`] freezes a whole frame into plain serialisable data,
//! which the headless runner can write out as JSON.

use std::path::Path;

use serde::Serialize;

use crate::entity::{Entity, EntityId, Team};
use crate::error::SimError;
use crate::manager::EntityView;
use crate::math::{Quat, Vec3};
use crate::sim::Simulation;
use crate::time::SimClock;

/// Display data for one tank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankInfo {
    pub id: EntityId,
    pub name: String,
    pub team: Team,
    pub team_name: String,
    pub state: &'static str,
    pub hp: u32,
    pub max_hp: u32,
    pub shells_available: u32,
    pub shells_fired: u32,
    pub position: Vec3,
    pub target_point: Vec3,
    /// An obstacle lies somewhere along the turret's line of fire.
    pub obstacle_ahead: bool,
}

impl TankInfo {
    /// Info for `entity`, or `None` if it is not a tank.
    pub fn of(entity: &Entity, view: &impl EntityView, obstacle_type: &str) -> Option<Self> {
        let tank = entity.as_tank()?;
        let (turret_position, turret_rotation) = tank.turret_frame(entity.transform());
        Some(Self {
            id: entity.id(),
            name: entity.name().to_string(),
            team: tank.team(),
            team_name: tank.team().to_string(),
            state: tank.state().display_name(),
            hp: tank.hp(),
            max_hp: tank.max_hp(),
            shells_available: tank.shells_available(),
            shells_fired: tank.shells_fired(),
            position: entity.position(),
            target_point: tank.target_point(),
            obstacle_ahead: view.intersects(turret_position, turret_rotation * Vec3::Z, obstacle_type),
        })
    }
}

/// Placement of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub name: String,
    pub template: String,
    pub kind: &'static str,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// One frame of the battle as plain data.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub clock: SimClock,
    pub winner: Option<Team>,
    pub entities: Vec<EntitySnapshot>,
    pub tanks: Vec<TankInfo>,
    #[cfg(feature = "diagnostics")]
    pub pool: crate::manager::PoolStats,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Simulation {
    /// Display info for one tank.
    pub fn tank_info(&self, id: EntityId) -> Option<TankInfo> {
        let entity = self.manager.get(id)?;
        TankInfo::of(entity, &self.manager, &self.config().obstacle_type)
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let obstacle_type = &self.config().obstacle_type;
        let entities = self
            .manager
            .iter()
            .map(|e| {
                let t = e.transform();
                EntitySnapshot {
                    id: e.id(),
                    name: e.name().to_string(),
                    template: e.template_name().to_string(),
                    kind: e.kind().label(),
                    translation: t.translation,
                    rotation: t.rotation,
                    scale: t.scale,
                }
            })
            .collect();
        let tanks = self
            .manager
            .iter()
            .filter_map(|e| TankInfo::of(e, &self.manager, obstacle_type))
            .collect();
        WorldSnapshot {
            clock: self.clock,
            winner: self.winning_team(),
            entities,
            tanks,
            #[cfg(feature = "diagnostics")]
            pool: self.manager.pool_stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Placement;
    use crate::raycast::Aabb;
    use crate::sim::tests::{battle, tank_at};

    #[test]
    fn tank_info_reports_display_fields() {
        let mut sim = battle();
        let a = tank_at(&mut sim, "Scout", "A-1", Team::A, Vec3::ZERO);
        let info = sim.tank_info(a).unwrap();
        assert_eq!(info.name, "A-1");
        assert_eq!(info.team_name, "Team A");
        assert_eq!(info.state, "Inactive");
        assert_eq!((info.hp, info.max_hp), (100, 100));
        assert_eq!(info.shells_available, 10);
        assert!(!info.obstacle_ahead);
    }

    #[test]
    fn obstacle_in_front_of_turret_is_flagged() {
        let mut sim = battle();
        sim.manager
            .create_obstacle_template(
                "Building",
                "Hut",
                "Hut.x",
                Aabb::new(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 10.0, 5.0)),
            )
            .unwrap();
        sim.manager
            .create_entity("Hut", Placement::new("hut").at(Vec3::new(0.0, 0.0, 30.0)))
            .unwrap();
        let a = tank_at(&mut sim, "Scout", "A-1", Team::A, Vec3::new(0.0, 1.0, 0.0));
        assert!(sim.tank_info(a).unwrap().obstacle_ahead);
    }

    #[test]
    fn snapshot_serialises_every_entity() {
        let mut sim = battle();
        tank_at(&mut sim, "Scout", "A-1", Team::A, Vec3::ZERO);
        sim.step(0.02);
        let snap = sim.snapshot();
        assert_eq!(snap.entities.len(), 1);
        assert_eq!(snap.tanks.len(), 1);
        assert_eq!(snap.winner, Some(Team::A));

        let json = snap.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entities"][0]["kind"], "tank");
        assert_eq!(value["tanks"][0]["state"], "Inactive");
        assert_eq!(value["clock"]["frame_count"], 1);
    }
}
