//! Everyday imports for driving a battle: `use skirmish::prelude::*`.

pub use crate::config::SimConfig;
pub use crate::control::ChaseCameraCycle;
pub use crate::entity::{
    CrateSpawn, Entity, EntityId, EntityKind, MineSpawn, PickupState, Placement, Resource, ShellState,
    TankSpawn, TankState, TankStats, Team,
};
pub use crate::error::SimError;
pub use crate::level::LevelData;
pub use crate::manager::{EntityFilter, EntityManager, EntityView};
pub use crate::math::{Quat, Transform, Vec3};
pub use crate::messenger::{Message, MessageKind, Messenger};
pub use crate::raycast::{Aabb, Ray};
pub use crate::sim::Simulation;
pub use crate::snapshot::{TankInfo, WorldSnapshot};
