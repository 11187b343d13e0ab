//! # Views — Shared Read Queries
//!
//! The same questions get asked from two places: from outside the frame (the
//! level loader, the runner, a renderer) against the whole
//! [`EntityManager`](super::EntityManager), and from inside one entity's update
//! against *every other* entity. [`EntityView`] captures the questions once;
//! both the manager and [`Neighbours`] implement its two required methods and
//! get the rest for free.
//!
//! ```text
//!   packed list:  [ e0 | e1 | e2 | e3 | e4 ]
//!                         ▲
//!                    updating e2
//!
//!   Neighbours { before: [e0, e1], after: [e3, e4] }
//! ```
//!
//! `Neighbours` is a split borrow of the packed list around the entity being
//! updated, so the updating entity can hold `&mut self` while reading (and in
//! two documented cases, writing) its neighbours.

use std::collections::HashMap;

use crate::entity::{Crate, Entity, EntityId, Resource, Tank, Team};
use crate::math::Vec3;
use crate::raycast::{Ray, world_bounds};

// ── Filter ───────────────────────────────────────────────────────────────

/// Match by entity name, template name and template type. An empty string
/// matches anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityFilter<'f> {
    pub name: &'f str,
    pub template_name: &'f str,
    pub template_type: &'f str,
}

impl<'f> EntityFilter<'f> {
    pub fn new(name: &'f str, template_name: &'f str, template_type: &'f str) -> Self {
        Self {
            name,
            template_name,
            template_type,
        }
    }

    /// Matches every entity.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of_type(template_type: &'f str) -> Self {
        Self {
            template_type,
            ..Self::default()
        }
    }

    pub fn named(name: &'f str) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        fn field(want: &str, have: &str) -> bool {
            want.is_empty() || want == have
        }
        field(self.name, entity.name())
            && field(self.template_name, entity.template_name())
            && field(self.template_type, entity.template_type())
    }
}

// ── Enumeration ──────────────────────────────────────────────────────────

/// Lazy, filtered walk over the packed list. Each enumeration owns its own
/// cursor, so any number can be alive at once.
pub struct Enumeration<'a, 'f> {
    entities: std::slice::Iter<'a, Entity>,
    filter: EntityFilter<'f>,
}

impl<'a, 'f> Enumeration<'a, 'f> {
    pub(crate) fn new(entities: &'a [Entity], filter: EntityFilter<'f>) -> Self {
        Self {
            entities: entities.iter(),
            filter,
        }
    }
}

impl<'a> Iterator for Enumeration<'a, '_> {
    type Item = &'a Entity;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = self.filter;
        self.entities.find(|e| filter.matches(e))
    }
}

// ── EntityView ───────────────────────────────────────────────────────────

/// Read-only queries over a set of entities.
pub trait EntityView {
    /// Every entity in the view, in packed-list order.
    fn iter(&self) -> impl Iterator<Item = &Entity>;

    fn get(&self, id: EntityId) -> Option<&Entity>;

    fn matching<'s>(&'s self, filter: EntityFilter<'s>) -> impl Iterator<Item = &'s Entity> {
        self.iter().filter(move |e| filter.matches(e))
    }

    /// First entity matching `filter`.
    fn find(&self, filter: EntityFilter<'_>) -> Option<&Entity> {
        self.iter().find(|e| filter.matches(e))
    }

    /// Every tank, including those in their destruction sequence.
    fn tanks(&self) -> impl Iterator<Item = (&Entity, &Tank)> {
        self.iter().filter_map(|e| e.as_tank().map(|t| (e, t)))
    }

    fn living_tanks(&self) -> impl Iterator<Item = (&Entity, &Tank)> {
        self.tanks().filter(|(_, t)| t.is_alive())
    }

    /// Living tanks on `team`.
    fn team_tanks(&self, team: Team) -> impl Iterator<Item = (&Entity, &Tank)> {
        self.living_tanks().filter(move |(_, t)| t.team() == team)
    }

    /// Living tanks on any team but `team`.
    fn enemy_tanks(&self, team: Team) -> impl Iterator<Item = (&Entity, &Tank)> {
        self.living_tanks().filter(move |(_, t)| t.team() != team)
    }

    fn team_count(&self, team: Team) -> usize {
        self.team_tanks(team).count()
    }

    /// The only team with living tanks. `None` while two or more teams are
    /// still fighting, or once nobody is left.
    fn winning_team(&self) -> Option<Team> {
        let mut living = self.living_tanks().map(|(_, t)| t.team());
        let first = living.next()?;
        living.all(|team| team == first).then_some(first)
    }

    /// Crates of `resource` on the ground and not claimed.
    fn available_crates(&self, resource: Resource) -> impl Iterator<Item = (&Entity, &Crate)> {
        self.crates(resource).filter(|(_, c)| c.is_available())
    }

    fn available_crate_count(&self, resource: Resource) -> usize {
        self.available_crates(resource).count()
    }

    /// Every crate of `resource`, whatever its state.
    fn crates(&self, resource: Resource) -> impl Iterator<Item = (&Entity, &Crate)> {
        self.iter()
            .filter_map(|e| e.as_crate().map(|c| (e, c)))
            .filter(move |(_, c)| c.resource() == resource)
    }

    fn crate_count(&self, resource: Resource) -> usize {
        self.crates(resource).count()
    }

    /// The shell owned by `owner`.
    fn shell_of(&self, owner: EntityId) -> Option<&Entity> {
        self.iter()
            .find(|e| e.as_shell().is_some_and(|s| s.owner() == owner))
    }

    /// Whether a ray from `origin` along `direction` meets any entity whose
    /// template type is `obstacle_type`, at any distance ahead.
    fn intersects(&self, origin: Vec3, direction: Vec3, obstacle_type: &str) -> bool {
        let ray = Ray::new(origin, direction);
        self.matching(EntityFilter::of_type(obstacle_type))
            .any(|e| world_bounds(e).ray_interval(&ray).is_some())
    }

    /// Whether an obstacle sits between `from` and `to`.
    fn segment_blocked(&self, from: Vec3, to: Vec3, obstacle_type: &str) -> bool {
        let (ray, length) = Ray::between(from, to);
        self.matching(EntityFilter::of_type(obstacle_type))
            .filter_map(|e| world_bounds(e).ray_interval(&ray))
            .any(|(entry, _)| entry <= length)
    }
}

// ── Neighbours ───────────────────────────────────────────────────────────

/// Every entity except the one being updated.
pub struct Neighbours<'a> {
    before: &'a mut [Entity],
    after: &'a mut [Entity],
    index: &'a HashMap<EntityId, usize>,
}

impl<'a> Neighbours<'a> {
    /// `before` and `after` are the packed list on either side of the
    /// updating entity; `index` maps ids to packed-list slots.
    pub(crate) fn new(
        before: &'a mut [Entity],
        after: &'a mut [Entity],
        index: &'a HashMap<EntityId, usize>,
    ) -> Self {
        Self {
            before,
            after,
            index,
        }
    }

    fn locate(&self, id: EntityId) -> Option<Side> {
        let slot = *self.index.get(&id)?;
        let split = self.before.len();
        if slot < split {
            Some(Side::Before(slot))
        } else if slot > split {
            Some(Side::After(slot - split - 1))
        } else {
            None
        }
    }

    /// Mutable access to a neighbour. `None` for unknown ids and for the
    /// updating entity itself.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.locate(id)? {
            Side::Before(i) => self.before.get_mut(i),
            Side::After(i) => self.after.get_mut(i),
        }
    }
}

enum Side {
    Before(usize),
    After(usize),
}

impl EntityView for Neighbours<'_> {
    fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.before.iter().chain(self.after.iter())
    }

    fn get(&self, id: EntityId) -> Option<&Entity> {
        match self.locate(id)? {
            Side::Before(i) => self.before.get(i),
            Side::After(i) => self.after.get(i),
        }
    }
}
