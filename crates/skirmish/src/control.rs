//! # Control — Orders From Outside the Simulation
//!
//! Everything an input or GUI layer does to a running battle goes through
//! here. Orders are ordinary [`Message`]s sent from
//! [`EntityId::SYSTEM`], so a tank handles "the player told me to patrol"
//! exactly like any other message, at its next update. Repairs and resupply
//! are direct, clamped setters.
//!
//! [`ChaseCameraCycle`] steps a follow camera through the tanks, the way a
//! viewer cycles with a key press.

use crate::entity::{Entity, EntityId};
use crate::manager::EntityView;
use crate::math::{Transform, Vec3};
use crate::messenger::{Message, MessageKind};
use crate::sim::Simulation;

impl Simulation {
    /// Queue a message from the system sender.
    pub fn send(&mut self, to: EntityId, kind: MessageKind) {
        self.messenger.send(to, Message::system(kind));
    }

    fn broadcast(&mut self, kind: MessageKind) -> usize {
        let tanks: Vec<EntityId> = self.manager.tanks().map(|(e, _)| e.id()).collect();
        for &id in &tanks {
            self.send(id, kind);
        }
        tanks.len()
    }

    /// Send `Start` to every tank. Returns how many were told.
    pub fn start_all(&mut self) -> usize {
        let n = self.broadcast(MessageKind::Start);
        log::info!("started {n} tank(s)");
        n
    }

    /// Send `Stop` to every tank.
    pub fn stop_all(&mut self) -> usize {
        self.broadcast(MessageKind::Stop)
    }

    pub fn order_patrol(&mut self, id: EntityId) {
        self.send(id, MessageKind::Patrol);
    }

    pub fn order_evade(&mut self, id: EntityId) {
        self.send(id, MessageKind::Evade);
    }

    /// Drive a tank to `point`: the point becomes its target and the next
    /// `Evade` keeps it instead of rolling a random one. Returns `false` if
    /// `id` is not a tank.
    pub fn direct_tank(&mut self, id: EntityId, point: Vec3) -> bool {
        let Some(tank) = self.manager.get_mut(id).and_then(Entity::as_tank_mut) else {
            return false;
        };
        tank.set_target_point(point, true);
        self.send(id, MessageKind::Evade);
        true
    }

    /// Damage a tank as if a shell had hit it.
    pub fn inflict(&mut self, id: EntityId, damage: u32) {
        self.send(id, MessageKind::Hit(damage));
    }

    /// Repair a tank, clamped to its maximum. Returns the HP actually added,
    /// or `None` if `id` is not a tank.
    pub fn restore_health(&mut self, id: EntityId, amount: u32) -> Option<u32> {
        self.manager
            .get_mut(id)
            .and_then(Entity::as_tank_mut)
            .map(|t| t.restore_health(amount))
    }

    /// Resupply a tank, clamped to its capacity.
    pub fn restore_shells(&mut self, id: EntityId, amount: u32) -> Option<u32> {
        self.manager
            .get_mut(id)
            .and_then(Entity::as_tank_mut)
            .map(|t| t.restore_shells(amount))
    }

    /// The tank closest to `point` within `max_distance`, for picking.
    pub fn nearest_tank(&self, point: Vec3, max_distance: f32) -> Option<EntityId> {
        self.manager
            .tanks()
            .map(|(e, _)| (e.id(), e.position().distance(point)))
            .filter(|&(_, d)| d <= max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

// ── Chase camera ─────────────────────────────────────────────────────────

/// Which tank the viewer is following. `None` is the free camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChaseCameraCycle {
    current: Option<EntityId>,
}

impl ChaseCameraCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<EntityId> {
        self.current
    }

    /// Follow the next tank in id order, wrapping to the free camera after the last.
    pub fn next(&mut self, view: &impl EntityView) -> Option<EntityId> {
        let ids = tank_ids(view);
        self.current = match self.current {
            None => ids.first().copied(),
            Some(cur) => ids.iter().copied().find(|&id| id > cur),
        };
        self.current
    }

    /// Follow the previous tank in id order, wrapping to the free camera before the first.
    pub fn previous(&mut self, view: &impl EntityView) -> Option<EntityId> {
        let ids = tank_ids(view);
        self.current = match self.current {
            None => ids.last().copied(),
            Some(cur) => ids.iter().rev().copied().find(|&id| id < cur),
        };
        self.current
    }

    /// Switch to the free camera.
    pub fn free(&mut self) {
        self.current = None;
    }

    /// World transform of the followed tank's chase camera. Falls back to the
    /// free camera when the tank is gone.
    pub fn camera(&mut self, view: &impl EntityView) -> Option<Transform> {
        let camera = self
            .current
            .and_then(|id| view.get(id))
            .and_then(Entity::as_tank)
            .map(|t| *t.chase_camera());
        if camera.is_none() {
            self.current = None;
        }
        camera
    }
}

fn tank_ids(view: &impl EntityView) -> Vec<EntityId> {
    let mut ids: Vec<EntityId> = view.tanks().map(|(e, _)| e.id()).collect();
    ids.sort();
    ids
}
