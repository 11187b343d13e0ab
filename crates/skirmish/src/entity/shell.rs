//! Shells: one reusable projectile per tank.
//!
//! A tank never spawns a projectile. It looks up the shell it owns and fires it
//! again, which teleports the shell to the muzzle and points it at the target.
//! Owner team and damage are copied in when the shell is created, so a shell
//! still in flight after its owner is destroyed can finish its trip. Once it
//! lands and the owner is gone, the shell asks to be removed.

use serde::Serialize;

use crate::config::ShellConfig;
use crate::entity::{EntityId, Team, UpdateContext, UpdateOutcome};
use crate::manager::EntityView;
use crate::math::{Transform, Vec3};
use crate::messenger::{Message, MessageKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShellState {
    Alive,
    Destroyed,
}

#[derive(Debug, Clone)]
pub struct Shell {
    owner: EntityId,
    owner_team: Team,
    damage: u32,
    state: ShellState,
    /// Seconds of flight left.
    life: f32,
}

impl Shell {
    pub(crate) fn new(owner: EntityId, owner_team: Team, damage: u32, cfg: &ShellConfig) -> Self {
        Self {
            owner,
            owner_team,
            damage,
            state: ShellState::Destroyed,
            life: cfg.life,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn owner_team(&self) -> Team {
        self.owner_team
    }

    pub fn damage(&self) -> u32 {
        self.damage
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn life(&self) -> f32 {
        self.life
    }

    /// Place at the muzzle, aim at `target` and start flying.
    pub(crate) fn fire(&mut self, transform: &mut Transform, muzzle: Vec3, target: Vec3, cfg: &ShellConfig) {
        transform.translation = muzzle;
        transform.face(target);
        self.life = cfg.life;
        self.state = ShellState::Alive;
    }

    pub(crate) fn update(
        &mut self,
        me: EntityId,
        transform: &mut Transform,
        ctx: &mut UpdateContext<'_>,
    ) -> UpdateOutcome {
        let config = ctx.config;
        let cfg = &config.shell;
        if self.state == ShellState::Destroyed {
            if ctx.others.get(self.owner).is_none() {
                log::debug!("shell {me} outlived its owner {}", self.owner);
                return UpdateOutcome::Destroy;
            }
            return UpdateOutcome::Continue;
        }

        self.life -= ctx.dt;
        if self.life <= 0.0 {
            self.land(transform, ctx);
            return UpdateOutcome::Continue;
        }
        transform.move_local_z(cfg.speed * ctx.dt);

        let here = transform.translation;
        let struck = ctx
            .others
            .tanks()
            .find(|(e, _)| e.id() != self.owner && e.position().distance(here) < cfg.hit_radius)
            .map(|(e, t)| (e.id(), t.team()));
        if let Some((victim, team)) = struck {
            if team != self.owner_team {
                log::debug!("shell {me} hit tank {victim} for {}", self.damage);
                ctx.messenger
                    .send(victim, Message::new(self.owner, MessageKind::Hit(self.damage)));
            }
            self.land(transform, ctx);
        }
        UpdateOutcome::Continue
    }

    /// Stop flying and park below the floor, ready to be fired again.
    fn land(&mut self, transform: &mut Transform, ctx: &UpdateContext<'_>) {
        self.state = ShellState::Destroyed;
        self.life = ctx.config.shell.life;
        transform.translation = Vec3::new(0.0, ctx.config.arena.hidden_y, 0.0);
    }
}
