//! # Entities
//!
//! Every object in a level is an [`Entity`]: an id, a display name, a shared
//! template, a transform, and an [`EntityKind`] payload carrying the
//! behaviour-specific state.
//!
//! ## Module Overview
//!
//! - [`id`] — Monotonic entity ids
//! - [`template`] — Shared read-only blueprints
//! - [`tank`] — Tank AI state machine
//! - [`pickup`] — Ammo and health crates (and the respawn cycle mines share)
//! - [`mine`] — Timed area-damage hazard
//! - [`shell`] — Reusable projectile
//!
//! ## Update
//!
//! The manager calls [`Entity::update`] once per frame with an
//! [`UpdateContext`]. The context gives mutable access to every *other* entity
//! (via [`Neighbours`]), the messenger, the RNG and the tuning, so an update
//! never needs global state. The return value tells the manager whether to
//! keep the entity after the pass.

pub mod id;
pub mod mine;
pub mod pickup;
pub mod shell;
pub mod tank;
pub mod template;

use std::sync::Arc;

use fastrand::Rng;

use crate::config::{ShellConfig, SimConfig};
use crate::manager::Neighbours;
use crate::math::{Mat4, Vec3, Transform};
use crate::messenger::Messenger;

pub use id::EntityId;
pub use mine::{Mine, MineSpawn};
pub use pickup::{Crate, CrateSpawn, PickupState, Resource};
pub use shell::{Shell, ShellState};
pub use tank::{Tank, TankSpawn, TankState, Team};
pub use template::{EntityTemplate, TankStats};

/// What the manager should do with an entity after its update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Continue,
    /// Remove the entity once the current pass finishes.
    Destroy,
}

/// Services handed to an entity for the duration of its update.
pub struct UpdateContext<'a> {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Every entity except the one being updated.
    pub others: Neighbours<'a>,
    pub messenger: &'a mut Messenger,
    pub rng: &'a mut Rng,
    pub config: &'a SimConfig,
}

/// Behaviour-specific state.
#[derive(Debug, Clone)]
pub enum EntityKind {
    /// Static geometry: buildings, trees, the floor.
    Scenery,
    Tank(Box<Tank>),
    Shell(Shell),
    Crate(Crate),
    Mine(Mine),
}

impl EntityKind {
    /// Short label for logs and snapshots.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Scenery => "scenery",
            EntityKind::Tank(_) => "tank",
            EntityKind::Shell(_) => "shell",
            EntityKind::Crate(_) => "crate",
            EntityKind::Mine(_) => "mine",
        }
    }
}

/// Name, position, orientation and scale for a new entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub name: String,
    pub transform: Transform,
}

impl Placement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.translation = position;
        self
    }

    /// Euler angles in radians, applied Y, then X, then Z.
    pub fn rotated(mut self, euler: Vec3) -> Self {
        let t = self.transform;
        self.transform = Transform::from_placement(t.translation, euler, t.scale);
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }
}

/// One live object in the simulation.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    name: String,
    template: Arc<EntityTemplate>,
    transform: Transform,
    kind: EntityKind,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        template: Arc<EntityTemplate>,
        placement: Placement,
        kind: EntityKind,
    ) -> Self {
        Self {
            id,
            name: placement.name,
            template,
            transform: placement.transform,
            kind,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &EntityTemplate {
        &self.template
    }

    pub fn template_name(&self) -> &str {
        self.template.name()
    }

    pub fn template_type(&self) -> &str {
        self.template.template_type()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn as_tank(&self) -> Option<&Tank> {
        match &self.kind {
            EntityKind::Tank(tank) => Some(&**tank),
            _ => None,
        }
    }

    pub fn as_tank_mut(&mut self) -> Option<&mut Tank> {
        match &mut self.kind {
            EntityKind::Tank(tank) => Some(&mut **tank),
            _ => None,
        }
    }

    pub fn as_shell(&self) -> Option<&Shell> {
        match &self.kind {
            EntityKind::Shell(shell) => Some(shell),
            _ => None,
        }
    }

    pub fn as_crate(&self) -> Option<&Crate> {
        match &self.kind {
            EntityKind::Crate(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_crate_mut(&mut self) -> Option<&mut Crate> {
        match &mut self.kind {
            EntityKind::Crate(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_mine(&self) -> Option<&Mine> {
        match &self.kind {
            EntityKind::Mine(mine) => Some(mine),
            _ => None,
        }
    }

    /// A tank that has not started its destruction sequence.
    pub fn is_living_tank(&self) -> bool {
        self.as_tank().is_some_and(Tank::is_alive)
    }

    /// World matrices for the renderer: the root, then body and turret for tanks.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let root = self.transform.matrix();
        match &self.kind {
            EntityKind::Tank(tank) => vec![
                root,
                root * tank.body().matrix(),
                root * tank.turret().matrix(),
            ],
            _ => vec![root],
        }
    }

    /// Launch this entity if it is a shell. Returns `false` for anything else.
    pub(crate) fn fire_shell(&mut self, muzzle: Vec3, target: Vec3, config: &ShellConfig) -> bool {
        match &mut self.kind {
            EntityKind::Shell(shell) => {
                shell.fire(&mut self.transform, muzzle, target, config);
                true
            }
            _ => false,
        }
    }

    /// Run one frame of this entity's behaviour.
    pub(crate) fn update(&mut self, ctx: &mut UpdateContext<'_>) -> UpdateOutcome {
        let Entity {
            id,
            transform,
            kind,
            ..
        } = self;
        match kind {
            EntityKind::Scenery => UpdateOutcome::Continue,
            EntityKind::Tank(tank) => tank.update(*id, transform, ctx),
            EntityKind::Shell(shell) => shell.update(*id, transform, ctx),
            EntityKind::Crate(c) => c.update(transform, ctx),
            EntityKind::Mine(mine) => mine.update(*id, transform, ctx),
        }
    }
}
