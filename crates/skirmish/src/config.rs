//! Simulation tuning.
//!
//! Every constant the state machines use lives here so a level file (or the
//! `--config` flag of the runner) can override it. Each section is
//! `#[serde(default)]`, so a document only has to mention the values it
//! changes:
//!
//! ```json
//! { "tank": { "vision_cone_degrees": 25.0 }, "seed": 42 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::template::types;
use crate::error::SimError;

/// All tuning for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub arena: ArenaConfig,
    pub tank: TankConfig,
    pub shell: ShellConfig,
    pub pickup: PickupConfig,
    pub mine: MineConfig,
    /// Template type treated as line-of-sight blocking geometry.
    pub obstacle_type: String,
    /// Seed for the simulation RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            tank: TankConfig::default(),
            shell: ShellConfig::default(),
            pickup: PickupConfig::default(),
            mine: MineConfig::default(),
            obstacle_type: types::BUILDING.to_string(),
            seed: None,
        }
    }
}

impl SimConfig {
    /// Load a config document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Where things respawn and how they fall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Respawn positions are drawn from `±respawn_half_x` on X.
    pub respawn_half_x: f32,
    /// Respawn positions are drawn from `±respawn_half_z` on Z.
    pub respawn_half_z: f32,
    /// Height pickups and mines drop from.
    pub spawn_height: f32,
    /// Downward acceleration while falling.
    pub gravity: f32,
    /// Y coordinate used to park collected or spent entities below the floor.
    pub hidden_y: f32,
    /// A tank wandering for ammo picks a point within this distance of the origin.
    pub wander_radius: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            respawn_half_x: 100.0,
            respawn_half_z: 50.0,
            spawn_height: 30.0,
            gravity: 20.0,
            hidden_y: -10.0,
            wander_radius: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankConfig {
    pub shell_capacity: u32,
    /// Maximum distance for spotting and firing.
    pub firing_range: f32,
    pub vision_cone_degrees: f32,
    /// The turret stops turning and snaps once within this angle.
    pub aim_stop_degrees: f32,
    /// Turret turn rate multiplier while aiming or tracking a movement target.
    pub aim_turn_multiplier: f32,
    /// Hull turn rate multiplier while evading or assisting.
    pub evade_turn_multiplier: f32,
    /// Seconds between locking onto an enemy and firing.
    pub aim_delay: f32,
    pub destruct_time: f32,
    /// Evade points are drawn from `±evade_radius` around the tank.
    pub evade_radius: f32,
    /// Assist points are drawn from `±assist_spread` around the caller.
    pub assist_spread: f32,
    /// Distance at which a movement target counts as reached.
    pub arrival_radius: f32,
    /// HP fraction at or below which a tank calls for help and looks for health.
    pub low_health_fraction: f32,
    pub max_health_packs: u32,
    /// Muzzle offset along the turret axis.
    pub barrel_length: f32,
    /// Turret rise speed during the destruction animation.
    pub destruct_rise_speed: f32,
    /// Spin multiplier (of turret turn speed) during the destruction animation.
    pub destruct_spin_multiplier: f32,
    pub chase_camera_distance: f32,
    pub chase_camera_height: f32,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            shell_capacity: 10,
            firing_range: 100.0,
            vision_cone_degrees: 15.0,
            aim_stop_degrees: 1.0,
            aim_turn_multiplier: 1.5,
            evade_turn_multiplier: 3.0,
            aim_delay: 1.0,
            destruct_time: 1.0,
            evade_radius: 40.0,
            assist_spread: 2.5,
            arrival_radius: 5.0,
            low_health_fraction: 0.4,
            max_health_packs: 2,
            barrel_length: 4.0,
            destruct_rise_speed: 50.0,
            destruct_spin_multiplier: 10.0,
            chase_camera_distance: 20.0,
            chase_camera_height: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub life: f32,
    pub speed: f32,
    /// Distance to a tank that counts as a hit.
    pub hit_radius: f32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            life: 1.5,
            speed: 100.0,
            hit_radius: 5.0,
        }
    }
}

/// Ammo and health crates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    pub rotation_speed: f32,
    pub respawn_time: f32,
    pub pickup_distance: f32,
    /// How long a claim by a seeking tank lasts before it lapses.
    pub claim_cooldown: f32,
    pub ammo_min: u32,
    pub ammo_max: u32,
    pub health_min: u32,
    pub health_max: u32,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 5.0,
            respawn_time: 5.0,
            pickup_distance: 5.0,
            claim_cooldown: 15.0,
            ammo_min: 3,
            ammo_max: 10,
            health_min: 50,
            health_max: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MineConfig {
    pub respawn_time: f32,
    pub damage_radius: f32,
    pub fuse_min: f32,
    pub fuse_max: f32,
    pub damage_min: u32,
    pub damage_max: u32,
    /// Height a mine rests at above the floor.
    pub rest_height: f32,
}

impl Default for MineConfig {
    fn default() -> Self {
        Self {
            respawn_time: 15.0,
            damage_radius: 10.0,
            fuse_min: 2.0,
            fuse_max: 6.0,
            damage_min: 25,
            damage_max: 100,
            rest_height: 1.5,
        }
    }
}
