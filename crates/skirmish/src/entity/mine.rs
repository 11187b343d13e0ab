//! Mines: timed area damage.
//!
//! A mine shares the crate [respawn cycle](super::pickup). While it sits on
//! the ground its fuse burns down; when the fuse runs out, every living tank
//! inside the damage radius is sent a `Hit` and the mine goes back under the floor
//! with a freshly rolled fuse.

use fastrand::Rng;

use crate::config::{MineConfig, SimConfig};
use crate::entity::pickup::RespawnCycle;
use crate::entity::{EntityId, PickupState, UpdateContext, UpdateOutcome};
use crate::manager::EntityView;
use crate::math::{Transform, random_range, random_u32};
use crate::messenger::{Message, MessageKind};

/// Per-mine spawn parameters. Use [`MineSpawn::roll`] for randomised damage
/// and fuse.
#[derive(Debug, Clone, PartialEq)]
pub struct MineSpawn {
    pub respawn_time: f32,
    pub damage_radius: f32,
    pub damage: u32,
    /// Seconds on the ground before the first explosion.
    pub fuse: f32,
    /// Start on the ground at the placement position instead of parked.
    pub spawn_alive: bool,
}

impl MineSpawn {
    /// Defaults from `cfg`, with damage and fuse drawn from their ranges.
    pub fn roll(cfg: &MineConfig, rng: &mut Rng) -> Self {
        Self {
            respawn_time: cfg.respawn_time,
            damage_radius: cfg.damage_radius,
            damage: random_u32(rng, cfg.damage_min, cfg.damage_max),
            fuse: random_range(rng, cfg.fuse_min, cfg.fuse_max),
            spawn_alive: false,
        }
    }

    pub fn alive(mut self) -> Self {
        self.spawn_alive = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Mine {
    cycle: RespawnCycle,
    damage_radius: f32,
    damage: u32,
    fuse: f32,
}

impl Mine {
    pub(crate) fn new(spawn: &MineSpawn, placement: &Transform, cfg: &SimConfig) -> Self {
        let alive_y = spawn.spawn_alive.then_some(placement.translation.y);
        let drop = cfg.arena.spawn_height - cfg.mine.rest_height;
        Self {
            cycle: RespawnCycle::new(spawn.respawn_time, drop, alive_y),
            damage_radius: spawn.damage_radius,
            damage: spawn.damage,
            fuse: spawn.fuse,
        }
    }

    pub fn state(&self) -> PickupState {
        self.cycle.state()
    }

    pub fn damage(&self) -> u32 {
        self.damage
    }

    pub fn damage_radius(&self) -> f32 {
        self.damage_radius
    }

    /// Seconds until the next explosion while on the ground.
    pub fn fuse(&self) -> f32 {
        self.fuse
    }

    pub(crate) fn update(
        &mut self,
        me: EntityId,
        transform: &mut Transform,
        ctx: &mut UpdateContext<'_>,
    ) -> UpdateOutcome {
        let dt = ctx.dt;
        if self.state() != PickupState::Alive {
            self.cycle.tick(transform, dt, ctx.rng, &ctx.config.arena);
            return UpdateOutcome::Continue;
        }

        self.fuse -= dt;
        if self.fuse > 0.0 {
            return UpdateOutcome::Continue;
        }

        let here = transform.translation;
        let victims: Vec<EntityId> = ctx
            .others
            .living_tanks()
            .filter(|(e, _)| e.position().distance(here) < self.damage_radius)
            .map(|(e, _)| e.id())
            .collect();
        for victim in &victims {
            ctx.messenger.send(*victim, Message::new(me, MessageKind::Hit(self.damage)));
        }
        log::debug!("mine {me} exploded, {} tank(s) caught", victims.len());

        let cfg = &ctx.config.mine;
        self.fuse = random_range(ctx.rng, cfg.fuse_min, cfg.fuse_max);
        self.cycle.collect(transform, &ctx.config.arena);
        UpdateOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_stays_in_configured_ranges() {
        let cfg = MineConfig::default();
        let mut rng = Rng::with_seed(11);
        for _ in 0..50 {
            let spawn = MineSpawn::roll(&cfg, &mut rng);
            assert!((25..=100).contains(&spawn.damage));
            assert!((2.0..=6.0).contains(&spawn.fuse));
            assert!(!spawn.spawn_alive);
        }
    }

    #[test]
    fn new_mine_starts_parked() {
        let cfg = SimConfig::default();
        let spawn = MineSpawn::roll(&cfg.mine, &mut Rng::with_seed(2));
        let mine = Mine::new(&spawn, &Transform::IDENTITY, &cfg);
        assert_eq!(mine.state(), PickupState::Collected);
        assert_eq!(mine.damage_radius(), 10.0);
    }
}
