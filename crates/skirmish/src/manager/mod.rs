//! # Entity Manager
//!
//! The [`EntityManager`] owns every template and every entity.
//!
//! ## Storage
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ EntityManager                                            │
//! │                                                          │
//! │  templates: HashMap<String, Arc<EntityTemplate>>         │
//! │    unique by name, shared with every entity made from it │
//! │                                                          │
//! │  entities: Vec<Entity>                                   │
//! │    packed list, the iteration order                      │
//! │                                                          │
//! │  index: HashMap<EntityId, usize>                         │
//! │    id → slot in the packed list                          │
//! │                                                          │
//! │  ids: IdAllocator                                        │
//! │    monotonic, never reused                               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Destroying an entity swap-removes it from the packed list and patches the
//! index entry of whichever entity moved into the hole. Ids are never handed
//! out twice, so a stale id simply stops resolving.
//!
//! ## Update pass
//!
//! [`EntityManager::update_all`] walks a snapshot of the ids. For each one it
//! splits the packed list around the entity's slot, hands the entity an
//! [`UpdateContext`] whose [`Neighbours`] see everything else, and collects the
//! entities that ask to be destroyed. They are removed after the pass, so no
//! slot moves while the pass is running.

mod view;

pub use view::{Enumeration, EntityFilter, EntityView, Neighbours};

use std::collections::HashMap;
use std::sync::Arc;

use fastrand::Rng;

use crate::config::SimConfig;
use crate::entity::id::IdAllocator;
use crate::entity::template::types;
use crate::entity::{
    Crate, CrateSpawn, Entity, EntityId, EntityKind, EntityTemplate, Mine, MineSpawn, Placement,
    Resource, Shell, Tank, TankSpawn, TankStats, UpdateContext, UpdateOutcome,
};
use crate::error::SimError;
use crate::math::{Mat4, Vec3};
use crate::messenger::Messenger;
use crate::raycast::Aabb;

/// What a renderer needs to draw one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem<'a> {
    pub id: EntityId,
    pub mesh: &'a str,
    /// Root matrix, then body and turret for tanks.
    pub matrices: Vec<Mat4>,
}

/// Entity pool counters, reset at the start of every update pass.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    pub alive: usize,
    pub templates: usize,
    /// Id the next created entity will get.
    pub next_id: EntityId,
    pub spawned_this_frame: u32,
    pub destroyed_this_frame: u32,
}

pub struct EntityManager {
    config: SimConfig,
    templates: HashMap<String, Arc<EntityTemplate>>,
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    ids: IdAllocator,
    #[cfg(feature = "diagnostics")]
    spawned_this_frame: u32,
    #[cfg(feature = "diagnostics")]
    destroyed_this_frame: u32,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            config,
            templates: HashMap::new(),
            entities: Vec::new(),
            index: HashMap::new(),
            ids: IdAllocator::new(),
            #[cfg(feature = "diagnostics")]
            spawned_this_frame: 0,
            #[cfg(feature = "diagnostics")]
            destroyed_this_frame: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    // ── Templates ────────────────────────────────────────────────────

    /// Register a template without tank stats.
    pub fn create_template(&mut self, template_type: &str, name: &str, mesh: &str) -> Result<(), SimError> {
        self.insert_template(EntityTemplate::new(template_type, name, mesh))
    }

    /// Register a template whose local bounding box blocks line of sight.
    pub fn create_obstacle_template(
        &mut self,
        template_type: &str,
        name: &str,
        mesh: &str,
        bounds: Aabb,
    ) -> Result<(), SimError> {
        self.insert_template(EntityTemplate::new(template_type, name, mesh).with_bounds(bounds))
    }

    pub fn create_tank_template(
        &mut self,
        template_type: &str,
        name: &str,
        mesh: &str,
        stats: TankStats,
    ) -> Result<(), SimError> {
        stats.validate(name)?;
        self.insert_template(EntityTemplate::new(template_type, name, mesh).with_tank_stats(stats))
    }

    fn insert_template(&mut self, template: EntityTemplate) -> Result<(), SimError> {
        if template.name().is_empty() {
            return Err(SimError::InvalidField {
                owner: template.template_type().to_string(),
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.templates.contains_key(template.name()) {
            return Err(SimError::DuplicateTemplate(template.name().to_string()));
        }
        log::debug!("template \"{}\" ({})", template.name(), template.template_type());
        self.templates
            .insert(template.name().to_string(), Arc::new(template));
        Ok(())
    }

    pub fn template(&self, name: &str) -> Option<&EntityTemplate> {
        self.templates.get(name).map(|t| &**t)
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Unregister a template. Entities already made from it keep their copy.
    pub fn destroy_template(&mut self, name: &str) -> bool {
        self.templates.remove(name).is_some()
    }

    pub fn destroy_all_templates(&mut self) {
        self.templates.clear();
    }

    fn resolve(&self, name: &str) -> Result<Arc<EntityTemplate>, SimError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::UnknownTemplate(name.to_string()))
    }

    // ── Creation ─────────────────────────────────────────────────────

    /// Create a behaviour-less entity (scenery, obstacles).
    pub fn create_entity(&mut self, template: &str, placement: Placement) -> Result<EntityId, SimError> {
        let template = self.resolve(template)?;
        Ok(self.insert(template, placement, EntityKind::Scenery))
    }

    pub fn create_tank(
        &mut self,
        template: &str,
        spawn: TankSpawn,
        placement: Placement,
    ) -> Result<EntityId, SimError> {
        let template = self.resolve(template)?;
        let Some(stats) = template.tank_stats().copied() else {
            return Err(SimError::TemplateMismatch {
                template: template.name().to_string(),
                expected: "tank",
            });
        };
        let tank = Tank::new(stats, spawn, &placement.transform, &self.config.tank);
        Ok(self.insert(template, placement, EntityKind::Tank(Box::new(tank))))
    }

    /// Create the shell for tank `owner`. The shell copies the owner's team
    /// and damage and starts parked.
    pub fn create_shell(
        &mut self,
        template: &str,
        owner: EntityId,
        placement: Placement,
    ) -> Result<EntityId, SimError> {
        let template = self.resolve(template)?;
        let Some((team, damage)) = self
            .get(owner)
            .filter(|e| e.is_living_tank())
            .and_then(Entity::as_tank)
            .map(|t| (t.team(), t.stats().shell_damage))
        else {
            return Err(SimError::UnknownOwner(owner.to_string()));
        };
        let shell = Shell::new(owner, team, damage, &self.config.shell);
        let mut placement = placement;
        placement.transform.translation.y = self.config.arena.hidden_y;
        Ok(self.insert(template, placement, EntityKind::Shell(shell)))
    }

    /// Create an ammo or health crate; the resource follows the template type.
    pub fn create_crate(
        &mut self,
        template: &str,
        spawn: &CrateSpawn,
        placement: Placement,
    ) -> Result<EntityId, SimError> {
        let template = self.resolve(template)?;
        let Some(resource) = Resource::from_template_type(template.template_type()) else {
            return Err(SimError::TemplateMismatch {
                template: template.name().to_string(),
                expected: "crate",
            });
        };
        let c = Crate::new(resource, spawn, &placement.transform, &self.config);
        let placement = self.park_unless(spawn.spawn_alive, placement);
        Ok(self.insert(template, placement, EntityKind::Crate(c)))
    }

    pub fn create_mine(
        &mut self,
        template: &str,
        spawn: &MineSpawn,
        placement: Placement,
    ) -> Result<EntityId, SimError> {
        let template = self.resolve(template)?;
        if template.template_type() != types::MINE {
            return Err(SimError::TemplateMismatch {
                template: template.name().to_string(),
                expected: "mine",
            });
        }
        let mine = Mine::new(spawn, &placement.transform, &self.config);
        let placement = self.park_unless(spawn.spawn_alive, placement);
        Ok(self.insert(template, placement, EntityKind::Mine(mine)))
    }

    /// Pickups that start collected wait below the floor.
    fn park_unless(&self, alive: bool, mut placement: Placement) -> Placement {
        if !alive {
            placement.transform.translation = Vec3::new(0.0, self.config.arena.hidden_y, 0.0);
        }
        placement
    }

    fn insert(&mut self, template: Arc<EntityTemplate>, placement: Placement, kind: EntityKind) -> EntityId {
        let id = self.ids.allocate();
        log::debug!("create {} {id} \"{}\" from \"{}\"", kind.label(), placement.name, template.name());
        self.index.insert(id, self.entities.len());
        self.entities.push(Entity::new(id, template, placement, kind));
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_frame += 1;
        }
        id
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = *self.index.get(&id)?;
        self.entities.get_mut(slot)
    }

    /// Every entity matching `filter`, in packed-list order.
    pub fn find_all(&self, filter: EntityFilter<'_>) -> Vec<EntityId> {
        self.matching(filter).map(Entity::id).collect()
    }

    /// Start a lazy filtered enumeration.
    pub fn begin_enum<'a, 'f>(&'a self, filter: EntityFilter<'f>) -> Enumeration<'a, 'f> {
        Enumeration::new(&self.entities, filter)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // ── Destruction ──────────────────────────────────────────────────

    /// Remove an entity. Returns `false` if the id is not live.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.index.remove(&id) else {
            return false;
        };
        let removed = self.entities.swap_remove(slot);
        if let Some(moved) = self.entities.get(slot) {
            self.index.insert(moved.id(), slot);
        }
        log::debug!("destroy {} {id} \"{}\"", removed.kind().label(), removed.name());
        #[cfg(feature = "diagnostics")]
        {
            self.destroyed_this_frame += 1;
        }
        true
    }

    pub fn destroy_all_entities(&mut self) {
        #[cfg(feature = "diagnostics")]
        {
            self.destroyed_this_frame += self.entities.len() as u32;
        }
        self.entities.clear();
        self.index.clear();
    }

    // ── Frame ────────────────────────────────────────────────────────

    /// Run one update pass. Returns the ids destroyed by it; their pending
    /// messages are discarded.
    pub fn update_all(&mut self, dt: f32, messenger: &mut Messenger, rng: &mut Rng) -> Vec<EntityId> {
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_frame = 0;
            self.destroyed_this_frame = 0;
        }

        let ids: Vec<EntityId> = self.entities.iter().map(Entity::id).collect();
        let mut doomed = Vec::new();
        for id in ids {
            let Some(&slot) = self.index.get(&id) else {
                continue;
            };
            let (before, rest) = self.entities.split_at_mut(slot);
            let Some((current, after)) = rest.split_first_mut() else {
                continue;
            };
            let mut ctx = UpdateContext {
                dt,
                others: Neighbours::new(before, after, &self.index),
                messenger: &mut *messenger,
                rng: &mut *rng,
                config: &self.config,
            };
            if current.update(&mut ctx) == UpdateOutcome::Destroy {
                doomed.push(id);
            }
        }

        for &id in &doomed {
            self.destroy_entity(id);
            messenger.discard(id);
        }
        doomed
    }

    /// Mesh and world matrices for every entity.
    pub fn render_items(&self) -> Vec<RenderItem<'_>> {
        self.entities
            .iter()
            .map(|e| RenderItem {
                id: e.id(),
                mesh: e.template().mesh(),
                matrices: e.world_matrices(),
            })
            .collect()
    }

    #[cfg(feature = "diagnostics")]
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            alive: self.entities.len(),
            templates: self.templates.len(),
            next_id: self.ids.peek(),
            spawned_this_frame: self.spawned_this_frame,
            destroyed_this_frame: self.destroyed_this_frame,
        }
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityView for EntityManager {
    fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    fn get(&self, id: EntityId) -> Option<&Entity> {
        let slot = *self.index.get(&id)?;
        self.entities.get(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{PickupState, Team};

    fn stats() -> TankStats {
        TankStats {
            max_speed: 20.0,
            acceleration: 10.0,
            turn_speed: 2.0,
            turret_turn_speed: 1.0,
            max_hp: 100,
            shell_damage: 20,
        }
    }

    fn manager() -> EntityManager {
        let mut m = EntityManager::new();
        m.create_tank_template("Tank", "Rogue Scout", "HoverTank.x", stats()).unwrap();
        m.create_template("Projectile", "Shell Type 1", "Bullet.x").unwrap();
        m.create_template("Ammo", "Ammo", "Ammo.x").unwrap();
        m.create_template("Health", "Health", "Health.x").unwrap();
        m.create_template("Mine", "Mine", "Mine.x").unwrap();
        m.create_template("Scenery", "Tree", "Tree.x").unwrap();
        m
    }

    fn tank(m: &mut EntityManager, name: &str, team: Team, at: Vec3) -> EntityId {
        m.create_tank("Rogue Scout", TankSpawn::new(team, vec![at]), Placement::new(name).at(at))
            .unwrap()
    }

    #[test]
    fn duplicate_template_is_rejected() {
        let mut m = manager();
        let err = m.create_template("Scenery", "Tree", "Other.x").unwrap_err();
        assert!(matches!(err, SimError::DuplicateTemplate(name) if name == "Tree"));
        assert_eq!(m.template("Tree").unwrap().mesh(), "Tree.x");
    }

    #[test]
    fn invalid_tank_stats_are_rejected() {
        let mut m = manager();
        let bad = TankStats {
            acceleration: 0.0,
            ..stats()
        };
        let err = m.create_tank_template("Tank", "Broken", "x", bad).unwrap_err();
        assert!(matches!(err, SimError::InvalidField { field: "acceleration", .. }));
        assert!(m.template("Broken").is_none());
        assert!(m.create_template("Scenery", "", "x").is_err());
    }

    #[test]
    fn unknown_template_leaves_no_entity_and_no_id() {
        let mut m = manager();
        let err = m.create_entity("Nope", Placement::new("x")).unwrap_err();
        assert!(matches!(err, SimError::UnknownTemplate(_)));
        assert!(m.is_empty());
        let id = m.create_entity("Tree", Placement::new("t")).unwrap();
        assert_eq!(id, EntityId::from_raw(1));
    }

    #[test]
    fn template_kind_must_fit() {
        let mut m = manager();
        let err = m
            .create_tank("Tree", TankSpawn::new(Team::A, vec![]), Placement::new("t"))
            .unwrap_err();
        assert!(matches!(err, SimError::TemplateMismatch { expected: "tank", .. }));
        let spawn = CrateSpawn::from_config(&m.config().pickup);
        assert!(m.create_crate("Mine", &spawn, Placement::new("c")).is_err());
        assert!(m.is_empty());
    }

    #[test]
    fn shell_needs_a_tank_owner() {
        let mut m = manager();
        let tree = m.create_entity("Tree", Placement::new("t")).unwrap();
        let err = m.create_shell("Shell Type 1", tree, Placement::new("s")).unwrap_err();
        assert!(matches!(err, SimError::UnknownOwner(_)));

        let owner = tank(&mut m, "A-1", Team::B, Vec3::ZERO);
        let shell = m.create_shell("Shell Type 1", owner, Placement::new("s")).unwrap();
        let s = m.get(shell).and_then(Entity::as_shell).unwrap();
        assert_eq!(s.owner(), owner);
        assert_eq!(s.owner_team(), Team::B);
        assert_eq!(s.damage(), 20);
        assert_eq!(m.shell_of(owner).map(Entity::id), Some(shell));
    }

    #[test]
    fn destroy_swaps_and_fixes_index() {
        let mut m = manager();
        let a = m.create_entity("Tree", Placement::new("a")).unwrap();
        let b = m.create_entity("Tree", Placement::new("b")).unwrap();
        let c = m.create_entity("Tree", Placement::new("c")).unwrap();

        assert!(m.destroy_entity(a));
        assert!(!m.destroy_entity(a));
        assert!(m.get(a).is_none());
        assert_eq!(m.get(c).unwrap().name(), "c");
        assert_eq!(m.get(b).unwrap().name(), "b");
        assert_eq!(m.len(), 2);

        let d = m.create_entity("Tree", Placement::new("d")).unwrap();
        assert_eq!(d, EntityId::from_raw(4));
        assert!(m.get(a).is_none());
    }

    #[test]
    fn find_and_enumerate_with_wildcards() {
        let mut m = manager();
        tank(&mut m, "A-1", Team::A, Vec3::ZERO);
        tank(&mut m, "A-2", Team::A, Vec3::ZERO);
        m.create_entity("Tree", Placement::new("A-1")).unwrap();

        assert_eq!(m.find_all(EntityFilter::named("A-1")).len(), 2);
        assert_eq!(m.find_all(EntityFilter::of_type("Tank")).len(), 2);
        assert_eq!(m.find_all(EntityFilter::new("A-1", "", "Scenery")).len(), 1);
        assert_eq!(m.find(EntityFilter::new("", "Rogue Scout", "")).unwrap().name(), "A-1");
        assert!(m.find(EntityFilter::named("Z")).is_none());

        // Two enumerations in flight at once.
        let mut tanks = m.begin_enum(EntityFilter::of_type("Tank"));
        let mut everything = m.begin_enum(EntityFilter::any());
        assert_eq!(tanks.next().unwrap().name(), "A-1");
        assert_eq!(everything.next().unwrap().name(), "A-1");
        assert_eq!(tanks.next().unwrap().name(), "A-2");
        assert!(tanks.next().is_none());
        assert_eq!(everything.count(), 2);

        let first: Vec<_> = m.begin_enum(EntityFilter::any()).map(Entity::id).collect();
        let second: Vec<_> = m.begin_enum(EntityFilter::any()).map(Entity::id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn winning_team_needs_exactly_one_side() {
        let mut m = manager();
        assert_eq!(m.winning_team(), None);
        let a = tank(&mut m, "A-1", Team::A, Vec3::ZERO);
        assert_eq!(m.winning_team(), Some(Team::A));
        let b = tank(&mut m, "B-1", Team::B, Vec3::ZERO);
        assert_eq!(m.winning_team(), None);
        assert_eq!(m.team_count(Team::A), 1);
        m.destroy_entity(a);
        assert_eq!(m.winning_team(), Some(Team::B));
        m.destroy_entity(b);
        assert_eq!(m.winning_team(), None);
    }

    #[test]
    fn parked_pickups_wait_below_floor() {
        let mut m = manager();
        let spawn = CrateSpawn::from_config(&m.config().pickup);
        let parked = m.create_crate("Ammo", &spawn, Placement::new("a").at(Vec3::new(5.0, 0.0, 5.0))).unwrap();
        let alive = m
            .create_crate("Health", &spawn.clone().alive(), Placement::new("h").at(Vec3::new(5.0, 0.0, 5.0)))
            .unwrap();
        assert_eq!(m.get(parked).unwrap().position(), Vec3::new(0.0, -10.0, 0.0));
        assert_eq!(m.get(alive).unwrap().position(), Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(m.available_crate_count(Resource::Health), 1);
        assert_eq!(m.available_crate_count(Resource::Ammo), 0);
        assert_eq!(m.crate_count(Resource::Ammo), 1);
        assert_eq!(
            m.get(alive).and_then(Entity::as_crate).map(Crate::state),
            Some(PickupState::Alive)
        );
    }

    #[test]
    fn render_items_cover_tank_parts() {
        let mut m = manager();
        tank(&mut m, "A-1", Team::A, Vec3::ZERO);
        m.create_entity("Tree", Placement::new("t")).unwrap();
        let items = m.render_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].mesh, "HoverTank.x");
        assert_eq!(items[0].matrices.len(), 3);
        assert_eq!(items[1].matrices.len(), 1);
    }

    #[test]
    fn segment_blocked_by_obstacle_bounds() {
        let mut m = manager();
        m.create_obstacle_template(
            "Building",
            "Hut",
            "Hut.x",
            Aabb::new(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 10.0, 5.0)),
        )
        .unwrap();
        m.create_entity("Hut", Placement::new("hut")).unwrap();

        let from = Vec3::new(-20.0, 1.0, 0.0);
        assert!(m.segment_blocked(from, Vec3::new(20.0, 1.0, 0.0), "Building"));
        assert!(!m.segment_blocked(from, Vec3::new(-10.0, 1.0, 0.0), "Building"));
        assert!(!m.segment_blocked(from, Vec3::new(20.0, 1.0, 0.0), "Tree"));
        assert!(m.intersects(from, Vec3::X, "Building"));
        assert!(!m.intersects(from, Vec3::NEG_X, "Building"));
    }

    #[test]
    fn update_removes_finished_entities_after_the_pass() {
        let mut m = manager();
        let owner = tank(&mut m, "A-1", Team::A, Vec3::ZERO);
        let shell = m.create_shell("Shell Type 1", owner, Placement::new("s")).unwrap();
        let mut messenger = Messenger::new();
        let mut rng = Rng::with_seed(1);

        assert!(m.update_all(0.016, &mut messenger, &mut rng).is_empty());
        m.destroy_entity(owner);
        let gone = m.update_all(0.016, &mut messenger, &mut rng);
        assert_eq!(gone, vec![shell]);
        assert!(m.is_empty());
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn pool_stats_count_per_frame() {
        let mut m = manager();
        m.create_entity("Tree", Placement::new("a")).unwrap();
        m.create_entity("Tree", Placement::new("b")).unwrap();
        let stats = m.pool_stats();
        assert_eq!(stats.spawned_this_frame, 2);
        assert_eq!(stats.alive, 2);
        assert_eq!(stats.next_id, EntityId::from_raw(3));

        m.update_all(0.016, &mut Messenger::new(), &mut Rng::with_seed(0));
        assert_eq!(m.pool_stats().spawned_this_frame, 0);
    }
}
