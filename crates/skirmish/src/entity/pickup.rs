//! # Pickups — Ammo and Health Crates
//!
//! Crates and mines share one lifecycle, the [`RespawnCycle`]:
//!
//! ```text
//!   Collected ──timer──▶ Respawn ──landed──▶ Alive ──picked up / exploded──▶ Collected
//!   (parked below        (falling from        (on the ground,
//!    the floor)           spawn height)         interactive)
//! ```
//!
//! A crate is picked up by the first living tank that comes within its pickup
//! distance. The tank gets exactly one grant, clamped to its capacity, and the
//! crate immediately returns to `Collected`.
//!
//! ## Claims
//!
//! A tank heading for a crate marks it as claimed so other tanks pick a
//! different one. The claim is advisory: whoever arrives first still wins, and
//! a claim that is never followed up lapses after
//! [`PickupConfig::claim_cooldown`] seconds.

use serde::Serialize;

use crate::config::{ArenaConfig, PickupConfig, SimConfig};
use crate::entity::{Entity, UpdateContext, UpdateOutcome};
use crate::manager::EntityView;
use crate::math::{Transform, Vec3, random_range, random_u32};

/// Where a crate or mine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PickupState {
    Alive,
    Respawn,
    Collected,
}

/// What a crate restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Resource {
    Ammo,
    Health,
}

impl Resource {
    /// Resource for a crate template type, if it is one.
    pub fn from_template_type(template_type: &str) -> Option<Self> {
        use crate::entity::template::types;
        match template_type {
            types::AMMO => Some(Resource::Ammo),
            types::HEALTH => Some(Resource::Health),
            _ => None,
        }
    }
}

// ── Respawn cycle ────────────────────────────────────────────────────────

/// Timer-driven hide / drop / land cycle shared by crates and mines.
#[derive(Debug, Clone)]
pub(crate) struct RespawnCycle {
    state: PickupState,
    /// Upper bound for the countdown; each respawn rolls between half and all of it.
    respawn_time: f32,
    countdown: f32,
    /// How far below the spawn height the entity comes to rest.
    drop: f32,
    rest_y: f32,
    fall_speed: f32,
}

impl RespawnCycle {
    /// A cycle that starts parked, or already on the ground at `start_alive_y`.
    pub fn new(respawn_time: f32, drop: f32, start_alive_y: Option<f32>) -> Self {
        Self {
            state: if start_alive_y.is_some() {
                PickupState::Alive
            } else {
                PickupState::Collected
            },
            respawn_time,
            countdown: respawn_time,
            drop,
            rest_y: start_alive_y.unwrap_or(0.0),
            fall_speed: 0.0,
        }
    }

    pub fn state(&self) -> PickupState {
        self.state
    }

    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    /// Advance the `Collected` and `Respawn` phases. `Alive` is left to the owner.
    pub fn tick(&mut self, transform: &mut Transform, dt: f32, rng: &mut fastrand::Rng, arena: &ArenaConfig) {
        match self.state {
            PickupState::Collected => {
                self.countdown -= dt;
                if self.countdown <= 0.0 {
                    self.begin_respawn(transform, rng, arena);
                }
            }
            PickupState::Respawn => {
                self.fall_speed += arena.gravity * dt;
                transform.translation.y -= self.fall_speed * dt;
                if transform.translation.y <= self.rest_y {
                    transform.translation.y = self.rest_y;
                    self.fall_speed = 0.0;
                    self.state = PickupState::Alive;
                }
            }
            PickupState::Alive => {}
        }
    }

    fn begin_respawn(&mut self, transform: &mut Transform, rng: &mut fastrand::Rng, arena: &ArenaConfig) {
        self.countdown = random_range(rng, self.respawn_time * 0.5, self.respawn_time);
        transform.translation = Vec3::new(
            random_range(rng, -arena.respawn_half_x, arena.respawn_half_x),
            arena.spawn_height,
            random_range(rng, -arena.respawn_half_z, arena.respawn_half_z),
        );
        self.rest_y = arena.spawn_height - self.drop;
        self.fall_speed = 0.0;
        self.state = PickupState::Respawn;
    }

    /// Park below the floor and wait for the next respawn.
    pub fn collect(&mut self, transform: &mut Transform, arena: &ArenaConfig) {
        transform.translation = Vec3::new(0.0, arena.hidden_y, 0.0);
        self.state = PickupState::Collected;
    }
}

// ── Crate ────────────────────────────────────────────────────────────────

/// Per-crate spawn parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CrateSpawn {
    /// Spin, radians per second.
    pub rotation_speed: f32,
    pub respawn_time: f32,
    pub pickup_distance: f32,
    /// Start on the ground at the placement position instead of parked.
    pub spawn_alive: bool,
}

impl CrateSpawn {
    pub fn from_config(cfg: &PickupConfig) -> Self {
        Self {
            rotation_speed: cfg.rotation_speed,
            respawn_time: cfg.respawn_time,
            pickup_distance: cfg.pickup_distance,
            spawn_alive: false,
        }
    }

    pub fn alive(mut self) -> Self {
        self.spawn_alive = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Crate {
    resource: Resource,
    cycle: RespawnCycle,
    rotation_speed: f32,
    pickup_distance: f32,
    claimed: bool,
    claim_timer: f32,
}

impl Crate {
    pub(crate) fn new(resource: Resource, spawn: &CrateSpawn, placement: &Transform, cfg: &SimConfig) -> Self {
        let alive_y = spawn.spawn_alive.then_some(placement.translation.y);
        Self {
            resource,
            cycle: RespawnCycle::new(spawn.respawn_time, cfg.arena.spawn_height, alive_y),
            rotation_speed: spawn.rotation_speed,
            pickup_distance: spawn.pickup_distance,
            claimed: false,
            claim_timer: 0.0,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn state(&self) -> PickupState {
        self.cycle.state()
    }

    pub fn pickup_distance(&self) -> f32 {
        self.pickup_distance
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// On the ground and not claimed by a seeking tank.
    pub fn is_available(&self) -> bool {
        self.state() == PickupState::Alive && !self.claimed
    }

    pub(crate) fn claim(&mut self, cooldown: f32) {
        self.claimed = true;
        self.claim_timer = cooldown;
    }

    pub(crate) fn update(&mut self, transform: &mut Transform, ctx: &mut UpdateContext<'_>) -> UpdateOutcome {
        let dt = ctx.dt;
        if self.state() != PickupState::Alive {
            self.cycle.tick(transform, dt, ctx.rng, &ctx.config.arena);
            return UpdateOutcome::Continue;
        }

        transform.rotate_local_y(self.rotation_speed * dt);
        if self.claimed {
            self.claim_timer -= dt;
            if self.claim_timer <= 0.0 {
                log::debug!("{:?} crate claim lapsed", self.resource);
                self.claimed = false;
            }
        }

        let here = transform.translation;
        let taker = ctx
            .others
            .living_tanks()
            .find(|(e, _)| e.position().distance(here) < self.pickup_distance)
            .map(|(e, _)| e.id());
        let Some(taker) = taker else {
            return UpdateOutcome::Continue;
        };

        let cfg = &ctx.config.pickup;
        let Some(tank) = ctx.others.get_mut(taker).and_then(Entity::as_tank_mut) else {
            return UpdateOutcome::Continue;
        };
        match self.resource {
            Resource::Ammo => {
                let granted = tank.restore_shells(random_u32(ctx.rng, cfg.ammo_min, cfg.ammo_max));
                log::debug!("tank {taker} picked up {granted} shells");
            }
            Resource::Health => {
                let granted = tank.restore_health(random_u32(ctx.rng, cfg.health_min, cfg.health_max));
                tank.record_health_pack();
                log::debug!("tank {taker} picked up {granted} hp");
            }
        }
        self.claimed = false;
        self.cycle.collect(transform, &ctx.config.arena);
        UpdateOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_from_template_type() {
        assert_eq!(Resource::from_template_type("Ammo"), Some(Resource::Ammo));
        assert_eq!(Resource::from_template_type("Health"), Some(Resource::Health));
        assert_eq!(Resource::from_template_type("Mine"), None);
    }

    #[test]
    fn cycle_respawns_and_lands() {
        let arena = ArenaConfig::default();
        let mut rng = fastrand::Rng::with_seed(1);
        let mut t = Transform::IDENTITY;
        let mut cycle = RespawnCycle::new(2.0, 30.0, None);
        assert_eq!(cycle.state(), PickupState::Collected);

        cycle.tick(&mut t, 2.5, &mut rng, &arena);
        assert_eq!(cycle.state(), PickupState::Respawn);
        assert_eq!(t.translation.y, 30.0);
        assert!(t.translation.x.abs() <= 100.0 && t.translation.z.abs() <= 50.0);
        assert!((1.0..=2.0).contains(&cycle.countdown()));

        for _ in 0..500 {
            cycle.tick(&mut t, 0.01, &mut rng, &arena);
        }
        assert_eq!(cycle.state(), PickupState::Alive);
        assert_eq!(t.translation.y, 0.0);
    }

    #[test]
    fn collect_parks_below_floor() {
        let arena = ArenaConfig::default();
        let mut t = Transform::from_xyz(5.0, 0.0, 5.0);
        let mut cycle = RespawnCycle::new(5.0, 30.0, Some(0.0));
        assert_eq!(cycle.state(), PickupState::Alive);
        cycle.collect(&mut t, &arena);
        assert_eq!(cycle.state(), PickupState::Collected);
        assert_eq!(t.translation, Vec3::new(0.0, -10.0, 0.0));
    }

    #[test]
    fn claimed_crate_is_not_available() {
        let cfg = SimConfig::default();
        let spawn = CrateSpawn::from_config(&cfg.pickup).alive();
        let mut c = Crate::new(Resource::Ammo, &spawn, &Transform::IDENTITY, &cfg);
        assert!(c.is_available());
        c.claim(15.0);
        assert!(!c.is_available());
        assert!(c.is_claimed());
    }
}
