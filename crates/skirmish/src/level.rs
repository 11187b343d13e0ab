//! # Levels — Templates and Entities From JSON
//!
//! A level file declares the templates first, then the entities made from
//! them:
//!
//! ```json
//! {
//!   "config": { "seed": 1 },
//!   "templates": [
//!     { "type": "Tank", "name": "Rogue Scout", "mesh": "HoverTank02.x",
//!       "max_speed": 40, "acceleration": 4.2, "turn_speed": 2,
//!       "turret_turn_speed": 1.047, "max_hp": 200, "shell_damage": 20 }
//!   ],
//!   "entities": [
//!     { "template": "Rogue Scout", "name": "A-1", "team": 0,
//!       "position": { "x": -75, "y": 0.5, "z": 20 },
//!       "rotation": { "y": 90 },
//!       "waypoints": [ { "x": -30, "z": 20 }, { "x": -15, "z": 25 } ] },
//!     { "template": "Tree", "name": "Tree", "count": 20,
//!       "position": { "x": -80, "z": 90, "randomise": { "x": 200, "z": 100 } } }
//!   ]
//! }
//! ```
//!
//! What an entity declaration produces follows its template: tank stats make
//! a tank, `Ammo` / `Health` make crates, `Mine` a mine, `Projectile` a shell,
//! anything else plain scenery. Any vector may carry a `randomise` spread; each
//! axis then moves by up to half the spread either way, rolled separately for
//! every copy when `count` is used.
//!
//! Loading is all-or-nothing: if any declaration fails, everything this load
//! created is removed again before the error is returned.

use std::path::Path;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::entity::template::types;
use crate::entity::{CrateSpawn, Entity, EntityId, MineSpawn, Placement, TankSpawn, TankStats, Team};
use crate::error::SimError;
use crate::manager::EntityView;
use crate::math::{Vec3, random_range, random_spread};
use crate::raycast::Aabb;
use crate::sim::Simulation;

// ── Document types ───────────────────────────────────────────────────────

/// A whole level file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Tuning used by [`LevelData::build_simulation`] unless overridden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SimConfig>,
    #[serde(default)]
    pub templates: Vec<TemplateDecl>,
    #[serde(default)]
    pub entities: Vec<EntityDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDecl {
    #[serde(rename = "type")]
    pub template_type: String,
    pub name: String,
    pub mesh: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turret_turn_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_damage: Option<u32>,
    /// Local bounding box, for templates that block line of sight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Aabb>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDecl {
    pub template: String,
    pub name: String,
    /// Create this many copies, named `name-1`, `name-2`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<VectorDecl>,
    /// Euler angles in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<VectorDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<VectorDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<Vec<VectorDecl>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_speed: Option<f32>,
    /// Upper bound; the actual value is rolled between 5 and this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respawn_time: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_distance: Option<f32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub spawn_alive: bool,
    /// Upper bound; the actual value is rolled between 5 and this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_radius: Option<f32>,

    /// Name of the tank that owns a shell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// A vector with an optional random spread. Missing axes are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDecl {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub randomise: Option<Spread>,
}

/// Full width of a random spread per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spread {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl VectorDecl {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            randomise: None,
        }
    }

    /// The declared vector, moved by up to half the spread on each axis.
    pub fn resolve(&self, rng: &mut Rng) -> Vec3 {
        let base = Vec3::new(self.x, self.y, self.z);
        match self.randomise {
            Some(s) => base + random_spread(rng, Vec3::new(s.x, s.y, s.z) * 0.5),
            None => base,
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────────────

/// What one load added, for rollback.
#[derive(Default)]
struct Created {
    templates: Vec<String>,
    entities: Vec<EntityId>,
}

impl LevelData {
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        log::info!("loading level {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build a fresh simulation for this level. `config` overrides the
    /// level's own config section.
    pub fn build_simulation(&self, config: Option<SimConfig>) -> Result<Simulation, SimError> {
        let config = config.or_else(|| self.config.clone()).unwrap_or_default();
        let mut sim = Simulation::new(config);
        self.spawn_into(&mut sim)?;
        Ok(sim)
    }

    /// Register every template and create every entity in `sim`. Returns the
    /// new entity ids in declaration order. On error nothing is left behind.
    pub fn spawn_into(&self, sim: &mut Simulation) -> Result<Vec<EntityId>, SimError> {
        let mut created = Created::default();
        match self.spawn_all(sim, &mut created) {
            Ok(()) => {
                log::info!(
                    "level loaded: {} templates, {} entities",
                    created.templates.len(),
                    created.entities.len()
                );
                Ok(created.entities)
            }
            Err(e) => {
                log::warn!("level load failed, rolling back: {e}");
                for &id in created.entities.iter().rev() {
                    sim.destroy_entity(id);
                }
                for name in &created.templates {
                    sim.manager.destroy_template(name);
                }
                Err(e)
            }
        }
    }

    fn spawn_all(&self, sim: &mut Simulation, created: &mut Created) -> Result<(), SimError> {
        for decl in &self.templates {
            decl.register(sim)?;
            created.templates.push(decl.name.clone());
        }
        for decl in &self.entities {
            let copies = decl.count.unwrap_or(1);
            for i in 1..=copies {
                let name = if copies > 1 {
                    format!("{}-{i}", decl.name)
                } else {
                    decl.name.clone()
                };
                let id = decl.spawn(name, sim)?;
                created.entities.push(id);
            }
        }
        Ok(())
    }
}

impl TemplateDecl {
    fn register(&self, sim: &mut Simulation) -> Result<(), SimError> {
        let m = &mut sim.manager;
        if self.template_type == types::TANK {
            return m.create_tank_template(&self.template_type, &self.name, &self.mesh, self.tank_stats()?);
        }
        match self.bounds {
            Some(bounds) => m.create_obstacle_template(&self.template_type, &self.name, &self.mesh, bounds),
            None => m.create_template(&self.template_type, &self.name, &self.mesh),
        }
    }

    fn tank_stats(&self) -> Result<TankStats, SimError> {
        fn required<T>(name: &str, field: &'static str, value: Option<T>) -> Result<T, SimError> {
            value.ok_or_else(|| SimError::MissingField {
                owner: name.to_string(),
                field,
            })
        }
        Ok(TankStats {
            max_speed: required(&self.name, "max_speed", self.max_speed)?,
            acceleration: required(&self.name, "acceleration", self.acceleration)?,
            turn_speed: required(&self.name, "turn_speed", self.turn_speed)?,
            turret_turn_speed: required(&self.name, "turret_turn_speed", self.turret_turn_speed)?,
            max_hp: required(&self.name, "max_hp", self.max_hp)?,
            shell_damage: required(&self.name, "shell_damage", self.shell_damage)?,
        })
    }
}

impl EntityDecl {
    fn missing(&self, field: &'static str) -> SimError {
        SimError::MissingField {
            owner: self.name.clone(),
            field,
        }
    }

    fn placement(&self, name: String, rng: &mut Rng) -> Placement {
        let position = self.position.map_or(Vec3::ZERO, |v| v.resolve(rng));
        let degrees = self.rotation.map_or(Vec3::ZERO, |v| v.resolve(rng));
        let scale = self.scale.map_or(Vec3::ONE, |v| v.resolve(rng));
        let radians = Vec3::new(degrees.x.to_radians(), degrees.y.to_radians(), degrees.z.to_radians());
        Placement::new(name).at(position).rotated(radians).scaled(scale)
    }

    fn spawn(&self, name: String, sim: &mut Simulation) -> Result<EntityId, SimError> {
        let template = sim
            .manager
            .template(&self.template)
            .ok_or_else(|| SimError::UnknownTemplate(self.template.clone()))?;
        let is_tank = template.tank_stats().is_some();
        let template_type = template.template_type().to_string();
        let placement = self.placement(name, &mut sim.rng);

        if is_tank {
            let team = self.team.ok_or_else(|| self.missing("team"))?;
            let waypoints = self.waypoints.as_ref().ok_or_else(|| self.missing("waypoints"))?;
            let route = waypoints.iter().map(|w| w.resolve(&mut sim.rng)).collect();
            return sim
                .manager
                .create_tank(&self.template, TankSpawn::new(Team::new(team), route), placement);
        }

        match template_type.as_str() {
            types::AMMO | types::HEALTH => {
                let cfg = &sim.manager.config().pickup;
                let mut spawn = CrateSpawn::from_config(cfg);
                if let Some(speed) = self.rotation_speed {
                    spawn.rotation_speed = speed;
                }
                if let Some(time) = self.respawn_time {
                    spawn.respawn_time = random_range(&mut sim.rng, 5.0, time);
                }
                if let Some(distance) = self.pickup_distance {
                    spawn.pickup_distance = distance;
                }
                spawn.spawn_alive = self.spawn_alive;
                sim.manager.create_crate(&self.template, &spawn, placement)
            }
            types::MINE => {
                let mut spawn = MineSpawn::roll(&sim.manager.config().mine, &mut sim.rng);
                if let Some(time) = self.respawn_time {
                    spawn.respawn_time = time;
                }
                if let Some(radius) = self.damage_radius {
                    spawn.damage_radius = random_range(&mut sim.rng, 5.0, radius);
                }
                spawn.spawn_alive = self.spawn_alive;
                sim.manager.create_mine(&self.template, &spawn, placement)
            }
            types::PROJECTILE => {
                let owner_name = self.owner.as_deref().ok_or_else(|| self.missing("owner"))?;
                let owner = sim
                    .manager
                    .iter()
                    .find(|e| e.name() == owner_name && e.as_tank().is_some())
                    .map(Entity::id)
                    .ok_or_else(|| SimError::UnknownOwner(owner_name.to_string()))?;
                sim.manager.create_shell(&self.template, owner, placement)
            }
            _ => sim.manager.create_entity(&self.template, placement),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{PickupState, TankState};
    use crate::manager::EntityFilter;

    const DEMO: &str = include_str!("../levels/skirmish.json");

    fn seeded() -> Simulation {
        Simulation::new(SimConfig {
            seed: Some(3),
            ..SimConfig::default()
        })
    }

    #[test]
    fn demo_level_loads() {
        let level = LevelData::from_json(DEMO).unwrap();
        let sim = level.build_simulation(None).unwrap();
        let m = &sim.manager;
        assert_eq!(m.team_count(Team::A), 3);
        assert_eq!(m.team_count(Team::B), 3);
        for (tank, _) in m.tanks() {
            assert!(m.shell_of(tank.id()).is_some(), "{} has no shell", tank.name());
        }
        assert!(m.find(EntityFilter::of_type("Building")).is_some());
        assert!(m.find(EntityFilter::named("A-1")).is_some());
        assert_eq!(sim.config().seed, Some(2024));
    }

    #[test]
    fn count_suffixes_names_and_randomises_each_copy() {
        let json = r#"{
            "templates": [ { "type": "Scenery", "name": "Tree", "mesh": "Tree1.x" } ],
            "entities": [
                { "template": "Tree", "name": "Tree", "count": 3,
                  "position": { "x": 10, "randomise": { "x": 4, "z": 4 } },
                  "rotation": { "y": 90 } }
            ]
        }"#;
        let mut sim = seeded();
        let ids = LevelData::from_json(json).unwrap().spawn_into(&mut sim).unwrap();
        assert_eq!(ids.len(), 3);
        let names: Vec<&str> = ids.iter().map(|&id| sim.manager.get(id).unwrap().name()).collect();
        assert_eq!(names, ["Tree-1", "Tree-2", "Tree-3"]);
        for &id in &ids {
            let e = sim.manager.get(id).unwrap();
            let p = e.position();
            assert!((8.0..=12.0).contains(&p.x) && (-2.0..=2.0).contains(&p.z));
            assert!((e.transform().forward() - Vec3::X).length() < 0.001);
        }
    }

    #[test]
    fn failed_load_rolls_back() {
        let json = r#"{
            "templates": [
                { "type": "Scenery", "name": "Tree", "mesh": "Tree1.x" },
                { "type": "Projectile", "name": "Shell", "mesh": "Bullet.x" }
            ],
            "entities": [
                { "template": "Tree", "name": "T" },
                { "template": "Shell", "name": "S", "owner": "Nobody" }
            ]
        }"#;
        let mut sim = seeded();
        let err = LevelData::from_json(json).unwrap().spawn_into(&mut sim).unwrap_err();
        assert!(matches!(err, SimError::UnknownOwner(name) if name == "Nobody"));
        assert!(sim.manager.is_empty());
        assert_eq!(sim.manager.template_count(), 0);
    }

    #[test]
    fn tank_template_needs_every_stat() {
        let json = r#"{ "templates": [
            { "type": "Tank", "name": "Half", "mesh": "x", "max_speed": 10 }
        ] }"#;
        let err = LevelData::from_json(json).unwrap().spawn_into(&mut seeded()).unwrap_err();
        assert!(matches!(err, SimError::MissingField { field: "acceleration", .. }));
    }

    #[test]
    fn tank_entity_needs_team_and_waypoints() {
        let json = r#"{
            "templates": [ { "type": "Tank", "name": "T", "mesh": "x", "max_speed": 10,
                "acceleration": 2, "turn_speed": 1, "turret_turn_speed": 1,
                "max_hp": 100, "shell_damage": 10 } ],
            "entities": [ { "template": "T", "name": "A-1", "team": 0 } ]
        }"#;
        let err = LevelData::from_json(json).unwrap().spawn_into(&mut seeded()).unwrap_err();
        assert!(matches!(err, SimError::MissingField { field: "waypoints", .. }));
    }

    #[test]
    fn unknown_template_is_reported() {
        let json = r#"{ "entities": [ { "template": "Ghost", "name": "g" } ] }"#;
        let err = LevelData::from_json(json).unwrap().spawn_into(&mut seeded()).unwrap_err();
        assert!(matches!(err, SimError::UnknownTemplate(name) if name == "Ghost"));
    }

    #[test]
    fn pickups_take_declared_values() {
        let json = r#"{
            "templates": [
                { "type": "Health", "name": "Health", "mesh": "Cube.x" },
                { "type": "Mine", "name": "Mine", "mesh": "Mine.x" }
            ],
            "entities": [
                { "template": "Health", "name": "h", "pickup_distance": 8,
                  "respawn_time": 20, "spawn_alive": true },
                { "template": "Mine", "name": "m", "damage_radius": 12 }
            ]
        }"#;
        let mut sim = seeded();
        let ids = LevelData::from_json(json).unwrap().spawn_into(&mut sim).unwrap();
        let health = sim.manager.get(ids[0]).and_then(Entity::as_crate).unwrap();
        assert_eq!(health.pickup_distance(), 8.0);
        assert_eq!(health.state(), PickupState::Alive);
        let mine = sim.manager.get(ids[1]).and_then(Entity::as_mine).unwrap();
        assert!((5.0..=12.0).contains(&mine.damage_radius()));
        assert_eq!(mine.state(), PickupState::Collected);
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(LevelData::from_json("{ not json"), Err(SimError::Json(_))));
    }

    #[test]
    fn demo_battle_runs() {
        let mut sim = LevelData::from_json(DEMO).unwrap().build_simulation(None).unwrap();
        sim.start_all();
        for _ in 0..300 {
            sim.step(1.0 / 60.0);
        }
        let (_, tank) = sim.manager.tanks().next().unwrap();
        assert_ne!(tank.state(), TankState::Inactive);
    }
}
