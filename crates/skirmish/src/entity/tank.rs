//! # Tank — The Combat AI
//!
//! Each tank runs a small finite state machine:
//!
//! ```text
//!             Start                 enemy in cone
//!  Inactive ─────────▶ Patrol ───────────────────▶ Aim
//!     ▲                 ▲  ▲                        │ fire
//!     │ Stop            │  │ arrived                ▼
//!     └──── (any) ──────┘  └──── Evade / Assist / FindAmmo / FindHealth
//!
//!  lethal Hit (any) ──▶ Destruct ──▶ removed
//! ```
//!
//! An update runs in three steps: drain the mailbox, run the current state's
//! behaviour, then drive forward along the hull's facing at the current speed.
//!
//! Every change of state goes through `enter_state`, which resets the speed
//! and the setup for the new state (aim timer, evade point, claimed crate) in
//! one place.
//!
//! ## References to other entities
//!
//! The enemy of interest, the tank's own shell and a claimed crate are stored
//! as [`EntityId`]s and looked up again on every use. A lookup that misses is
//! normal: the enemy may have been destroyed since the last frame. The tank
//! then drops the goal and goes back to patrolling.

use std::fmt;

use serde::Serialize;

use crate::config::TankConfig;
use crate::entity::{Entity, EntityId, Resource, TankStats, UpdateContext, UpdateOutcome};
use crate::manager::EntityView;
use crate::math::{Quat, Transform, Vec3, random_spread, yaw_towards};
use crate::messenger::{Message, MessageKind};

// ── Team ─────────────────────────────────────────────────────────────────

/// Side a tank fights for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Team(u32);

impl Team {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "Team A"),
            1 => write!(f, "Team B"),
            n => write!(f, "Team {n}"),
        }
    }
}

// ── State ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TankState {
    Inactive,
    Patrol,
    Aim,
    Evade,
    FindAmmo,
    FindHealth,
    Assist,
    Destruct,
}

impl TankState {
    /// Human-readable name for on-screen display.
    pub fn display_name(self) -> &'static str {
        match self {
            TankState::Inactive => "Inactive",
            TankState::Patrol => "Patrol",
            TankState::Aim => "Aim",
            TankState::Evade => "Evade",
            TankState::FindAmmo => "Find Ammo",
            TankState::FindHealth => "Find Health",
            TankState::Assist => "Assist",
            TankState::Destruct => "Destruct",
        }
    }
}

impl fmt::Display for TankState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Per-tank spawn parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TankSpawn {
    pub team: Team,
    /// Waypoints visited in order, wrapping back to the first.
    pub patrol_route: Vec<Vec3>,
}

impl TankSpawn {
    pub fn new(team: Team, patrol_route: Vec<Vec3>) -> Self {
        Self { team, patrol_route }
    }
}

// ── Tank ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Tank {
    stats: TankStats,
    team: Team,
    state: TankState,

    hp: u32,
    shell_capacity: u32,
    shells_available: u32,
    shells_fired: u32,
    health_packs: u32,

    speed: f32,
    target_point: Vec3,
    /// Distance at which `target_point` counts as reached.
    arrival_radius: f32,
    patrol_route: Vec<Vec3>,
    next_waypoint: usize,

    enemy: Option<EntityId>,
    shell: Option<EntityId>,
    claimed_crate: Option<EntityId>,

    aim_timer: f32,
    destruct_timer: f32,
    player_driven: bool,
    can_request_help: bool,
    collecting_health: bool,

    /// Hull, relative to the root transform.
    body: Transform,
    /// Turret, relative to the root transform.
    turret: Transform,
    chase_camera: Transform,
}

impl Tank {
    pub(crate) fn new(stats: TankStats, spawn: TankSpawn, root: &Transform, cfg: &TankConfig) -> Self {
        let mut tank = Self {
            stats,
            team: spawn.team,
            state: TankState::Inactive,
            hp: stats.max_hp,
            shell_capacity: cfg.shell_capacity,
            shells_available: cfg.shell_capacity,
            shells_fired: 0,
            health_packs: 0,
            speed: 0.0,
            target_point: root.translation,
            arrival_radius: cfg.arrival_radius,
            patrol_route: spawn.patrol_route,
            next_waypoint: 0,
            enemy: None,
            shell: None,
            claimed_crate: None,
            aim_timer: cfg.aim_delay,
            destruct_timer: cfg.destruct_time,
            player_driven: false,
            can_request_help: true,
            collecting_health: false,
            body: Transform::IDENTITY,
            turret: Transform::IDENTITY,
            chase_camera: Transform::IDENTITY,
        };
        tank.track_with_camera(root, cfg);
        tank
    }

    // ── Read-only stats ──────────────────────────────────────────────

    pub fn stats(&self) -> &TankStats {
        &self.stats
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn state(&self) -> TankState {
        self.state
    }

    /// Still fighting (not in `Destruct`).
    pub fn is_alive(&self) -> bool {
        self.state != TankState::Destruct
    }

    pub fn hp(&self) -> u32 {
        self.hp
    }

    pub fn max_hp(&self) -> u32 {
        self.stats.max_hp
    }

    pub fn shell_capacity(&self) -> u32 {
        self.shell_capacity
    }

    pub fn shells_available(&self) -> u32 {
        self.shells_available
    }

    pub fn shells_fired(&self) -> u32 {
        self.shells_fired
    }

    pub fn health_packs_collected(&self) -> u32 {
        self.health_packs
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn target_point(&self) -> Vec3 {
        self.target_point
    }

    pub fn patrol_route(&self) -> &[Vec3] {
        &self.patrol_route
    }

    pub fn enemy(&self) -> Option<EntityId> {
        self.enemy
    }

    /// Crate this tank is currently heading for, if any.
    pub fn claimed_crate(&self) -> Option<EntityId> {
        self.claimed_crate
    }

    pub fn is_player_driven(&self) -> bool {
        self.player_driven
    }

    pub fn body(&self) -> &Transform {
        &self.body
    }

    pub fn turret(&self) -> &Transform {
        &self.turret
    }

    /// Camera trailing behind and above the hull, looking at the tank.
    pub fn chase_camera(&self) -> &Transform {
        &self.chase_camera
    }

    /// World position and orientation of the turret.
    pub fn turret_frame(&self, root: &Transform) -> (Vec3, Quat) {
        let position = root.matrix().transform_point3(self.turret.translation);
        (position, root.rotation * self.turret.rotation)
    }

    // ── Setters for the input layer ──────────────────────────────────

    /// Set where the tank drives next. `player_driven` keeps an `Evade` from
    /// replacing the point with a random one.
    pub fn set_target_point(&mut self, point: Vec3, player_driven: bool) {
        self.target_point = point;
        self.player_driven = player_driven;
    }

    /// Add HP, clamped to the maximum. Returns the amount actually granted.
    /// Destroyed tanks cannot be repaired.
    pub fn restore_health(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let granted = amount.min(self.stats.max_hp - self.hp);
        self.hp += granted;
        granted
    }

    /// Add shells, clamped to capacity. Returns the number actually granted.
    pub fn restore_shells(&mut self, amount: u32) -> u32 {
        let granted = amount.min(self.shell_capacity - self.shells_available);
        self.shells_available += granted;
        granted
    }

    /// Set the magazine directly, clamped to capacity.
    pub fn set_shells(&mut self, shells: u32) {
        self.shells_available = shells.min(self.shell_capacity);
    }

    /// Set HP directly, clamped to `1..=max_hp`. Use a `Hit` message to kill.
    pub fn set_hp(&mut self, hp: u32) {
        if self.is_alive() {
            self.hp = hp.clamp(1, self.stats.max_hp);
        }
    }

    /// Count a health crate pickup and end the current search for one.
    pub(crate) fn record_health_pack(&mut self) {
        self.health_packs += 1;
        self.collecting_health = false;
    }

    // ── Update ───────────────────────────────────────────────────────

    pub(crate) fn update(
        &mut self,
        me: EntityId,
        root: &mut Transform,
        ctx: &mut UpdateContext<'_>,
    ) -> UpdateOutcome {
        while let Some(message) = ctx.messenger.fetch(me) {
            self.handle_message(me, message, root, ctx);
        }

        match self.state {
            TankState::Inactive => {}
            TankState::Patrol => self.patrol(me, root, ctx),
            TankState::Aim => self.aim(me, root, ctx),
            TankState::Evade => self.evade(me, root, ctx),
            TankState::FindAmmo => self.find_ammo(me, root, ctx),
            TankState::FindHealth => self.find_health(me, root, ctx),
            TankState::Assist => self.assist(me, root, ctx),
            TankState::Destruct => {
                if self.destruct(ctx) {
                    log::info!("tank {me} destroyed");
                    return UpdateOutcome::Destroy;
                }
            }
        }

        root.move_local_z(self.speed * ctx.dt);
        self.track_with_camera(root, &ctx.config.tank);
        UpdateOutcome::Continue
    }

    fn handle_message(
        &mut self,
        me: EntityId,
        message: Message,
        root: &mut Transform,
        ctx: &mut UpdateContext<'_>,
    ) {
        use TankState::*;
        match message.kind {
            MessageKind::Start => {
                if self.state == Inactive {
                    self.enter_state(Patrol, me, root, ctx);
                }
            }
            MessageKind::Stop => {
                if self.state != Destruct {
                    self.enter_state(Inactive, me, root, ctx);
                }
            }
            MessageKind::Hit(damage) => self.on_hit(damage, me, root, ctx),
            MessageKind::Patrol => {
                if self.state != Destruct {
                    self.enter_state(Patrol, me, root, ctx);
                }
            }
            MessageKind::Evade => {
                if !matches!(self.state, Inactive | Destruct) {
                    self.enter_state(Evade, me, root, ctx);
                }
            }
            MessageKind::Help => {
                if self.state == Destruct {
                    return;
                }
                let Some(caller) = ctx.others.get(message.from).map(Entity::position) else {
                    log::debug!("tank {me}: help request from vanished {}", message.from);
                    return;
                };
                let spread = ctx.config.tank.assist_spread;
                self.target_point = caller + random_spread(ctx.rng, Vec3::new(spread, 0.0, spread));
                self.enter_state(Assist, me, root, ctx);
            }
        }
    }

    fn on_hit(&mut self, damage: u32, me: EntityId, root: &mut Transform, ctx: &mut UpdateContext<'_>) {
        if self.state == TankState::Destruct {
            return;
        }
        if damage >= self.hp {
            self.hp = 0;
            self.enter_state(TankState::Destruct, me, root, ctx);
            return;
        }

        self.hp -= damage;
        let config = ctx.config;
        let cfg = &config.tank;
        if self.hp as f32 > self.stats.max_hp as f32 * cfg.low_health_fraction {
            return;
        }

        if self.can_request_help {
            let here = root.translation;
            let mate = ctx
                .others
                .team_tanks(self.team)
                .map(|(e, _)| (e.id(), e.position().distance_squared(here)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id);
            if let Some(mate) = mate {
                log::debug!("tank {me}: asking {mate} for help");
                ctx.messenger.send(mate, Message::new(me, MessageKind::Help));
                self.can_request_help = false;
            }
        }

        let wants_health = !self.collecting_health
            && self.health_packs < cfg.max_health_packs
            && ctx.others.available_crate_count(Resource::Health) > 0;
        if wants_health {
            self.collecting_health = true;
            self.enter_state(TankState::FindHealth, me, root, ctx);
        }
    }

    /// Switch state and run the new state's setup. Entering the current state
    /// is a no-op.
    fn enter_state(
        &mut self,
        next: TankState,
        me: EntityId,
        root: &mut Transform,
        ctx: &mut UpdateContext<'_>,
    ) {
        if next == self.state {
            return;
        }
        let config = ctx.config;
        let cfg = &config.tank;
        if self.state == TankState::FindHealth {
            self.collecting_health = false;
        }
        self.speed = 0.0;
        self.arrival_radius = cfg.arrival_radius;
        self.claimed_crate = None;

        match next {
            TankState::Patrol => self.aim_timer = cfg.aim_delay,
            TankState::Evade => {
                if !self.player_driven {
                    let r = cfg.evade_radius;
                    self.target_point =
                        root.translation + random_spread(ctx.rng, Vec3::new(r, 0.0, r));
                }
            }
            TankState::FindAmmo => {
                if !self.seek_crate(Resource::Ammo, root, ctx) {
                    if self.shells_available > 0 {
                        self.enter_state(TankState::Evade, me, root, ctx);
                        return;
                    }
                    self.wander(root, ctx);
                }
            }
            TankState::FindHealth => {
                if !self.seek_crate(Resource::Health, root, ctx) {
                    self.collecting_health = false;
                    self.enter_state(TankState::Patrol, me, root, ctx);
                    return;
                }
            }
            TankState::Destruct => {
                self.enemy = None;
                self.destruct_timer = cfg.destruct_time;
            }
            TankState::Inactive | TankState::Aim | TankState::Assist => {}
        }

        log::debug!("tank {me}: {} -> {}", self.state, next);
        self.state = next;
    }

    // ── State behaviours ─────────────────────────────────────────────

    fn patrol(&mut self, me: EntityId, root: &mut Transform, ctx: &mut UpdateContext<'_>) {
        let dt = ctx.dt;
        self.target_point = self
            .patrol_route
            .get(self.next_waypoint)
            .copied()
            .unwrap_or(root.translation);
        self.turret.rotate_local_y(-self.stats.turret_turn_speed * dt);

        if self.move_tank(root, self.stats.turn_speed, dt) && !self.patrol_route.is_empty() {
            self.next_waypoint = (self.next_waypoint + 1) % self.patrol_route.len();
        }

        if self.shells_available == 0 && ctx.others.available_crate_count(Resource::Ammo) > 0 {
            self.enter_state(TankState::FindAmmo, me, root, ctx);
            return;
        }

        if let Some(enemy) = self.spot_enemy(root, ctx) {
            log::debug!("tank {me}: spotted {enemy}");
            self.enemy = Some(enemy);
            self.enter_state(TankState::Aim, me, root, ctx);
        }
    }

    /// First living enemy inside the turret's vision cone, within firing range
    /// and not hidden behind an obstacle.
    fn spot_enemy(&self, root: &Transform, ctx: &UpdateContext<'_>) -> Option<EntityId> {
        let cfg = &ctx.config.tank;
        let here = root.translation;
        let (_, turret_rotation) = self.turret_frame(root);
        let facing = flat(turret_rotation * Vec3::Z);

        ctx.others
            .enemy_tanks(self.team)
            .find(|(enemy, _)| {
                let there = enemy.position();
                here.distance(there) < cfg.firing_range
                    && facing.angle_between(flat(there - here)).to_degrees() < cfg.vision_cone_degrees
                    && !ctx.others.segment_blocked(here, there, &ctx.config.obstacle_type)
            })
            .map(|(enemy, _)| enemy.id())
    }

    fn aim(&mut self, me: EntityId, root: &mut Transform, ctx: &mut UpdateContext<'_>) {
        let dt = ctx.dt;
        let config = ctx.config;
        let cfg = &config.tank;
        let target = self
            .enemy
            .and_then(|id| ctx.others.get(id))
            .filter(|e| e.is_living_tank())
            .map(Entity::position);
        let Some(target) = target else {
            log::debug!("tank {me}: lost its target");
            self.enemy = None;
            self.enter_state(TankState::Patrol, me, root, ctx);
            return;
        };

        if self.aim_timer >= 0.0 {
            self.aim_timer -= dt;
            let rate = self.stats.turret_turn_speed * cfg.aim_turn_multiplier;
            self.turn_turret_towards(root, target, rate, dt, cfg.aim_stop_degrees);
            return;
        }

        let here = root.translation;
        let in_range = here.distance(target) < cfg.firing_range
            && !ctx.others.segment_blocked(here, target, &config.obstacle_type);
        if !in_range {
            self.enemy = None;
            self.enter_state(TankState::Patrol, me, root, ctx);
            return;
        }
        if self.shells_available == 0 {
            self.enter_state(TankState::FindAmmo, me, root, ctx);
            return;
        }

        if self.fire(me, root, target, ctx) {
            self.shells_available -= 1;
            self.shells_fired += 1;
        }
        self.enemy = None;

        let low_on_ammo = self.shells_available * 2 < self.shell_capacity;
        let can_restock = self.shells_available == 0
            || ctx.others.available_crate_count(Resource::Ammo) > 0;
        let next = if low_on_ammo && can_restock {
            TankState::FindAmmo
        } else {
            TankState::Evade
        };
        self.enter_state(next, me, root, ctx);
    }

    /// Launch this tank's shell from the muzzle toward `target`.
    fn fire(&mut self, me: EntityId, root: &Transform, target: Vec3, ctx: &mut UpdateContext<'_>) -> bool {
        let cached = self.shell.filter(|&id| {
            ctx.others
                .get(id)
                .and_then(Entity::as_shell)
                .is_some_and(|s| s.owner() == me)
        });
        let Some(shell_id) = cached.or_else(|| ctx.others.shell_of(me).map(Entity::id)) else {
            log::warn!("tank {me} has no shell to fire");
            return false;
        };
        self.shell = Some(shell_id);

        let (turret_position, turret_rotation) = self.turret_frame(root);
        let muzzle = turret_position + turret_rotation * Vec3::Z * ctx.config.tank.barrel_length;
        let shell_config = &ctx.config.shell;
        let fired = ctx
            .others
            .get_mut(shell_id)
            .is_some_and(|shell| shell.fire_shell(muzzle, target, shell_config));
        if fired {
            log::debug!("tank {me} fired {shell_id}");
        }
        fired
    }

    fn evade(&mut self, me: EntityId, root: &mut Transform, ctx: &mut UpdateContext<'_>) {
        let turn = self.stats.turn_speed * ctx.config.tank.evade_turn_multiplier;
        if self.move_tank(root, turn, ctx.dt) {
            self.player_driven = false;
            self.turret.rotation = Quat::IDENTITY;
            self.enter_state(TankState::Patrol, me, root, ctx);
        } else {
            self.track_target(root, ctx);
        }
    }

    fn assist(&mut self, me: EntityId, root: &mut Transform, ctx: &mut UpdateContext<'_>) {
        let turn = self.stats.turn_speed * ctx.config.tank.evade_turn_multiplier;
        if self.move_tank(root, turn, ctx.dt) {
            self.turret.rotation = Quat::IDENTITY;
            self.enter_state(TankState::Patrol, me, root, ctx);
        } else {
            self.track_target(root, ctx);
        }
    }

    fn find_ammo(&mut self, me: EntityId, root: &mut Transform, ctx: &mut UpdateContext<'_>) {
        if !self.move_tank(root, self.stats.turn_speed, ctx.dt) {
            self.track_target(root, ctx);
            return;
        }
        if self.shells_available > 0 {
            self.enter_state(TankState::Patrol, me, root, ctx);
        } else if !self.seek_crate(Resource::Ammo, root, ctx) {
            self.wander(root, ctx);
        }
    }

    fn find_health(&mut self, me: EntityId, root: &mut Transform, ctx: &mut UpdateContext<'_>) {
        if !self.move_tank(root, self.stats.turn_speed, ctx.dt) {
            self.track_target(root, ctx);
            return;
        }
        let still_needed =
            self.collecting_health && self.health_packs < ctx.config.tank.max_health_packs;
        if !(still_needed && self.seek_crate(Resource::Health, root, ctx)) {
            self.enter_state(TankState::Patrol, me, root, ctx);
        }
    }

    /// Spin the wreck and lift the turret. Returns `true` once the animation is over.
    fn destruct(&mut self, ctx: &UpdateContext<'_>) -> bool {
        let cfg = &ctx.config.tank;
        let spin = self.stats.turret_turn_speed * cfg.destruct_spin_multiplier * ctx.dt;
        self.body.rotate_local_y(spin);
        self.turret.rotate_local_y(spin);
        self.turret.translation.y += cfg.destruct_rise_speed * ctx.dt;
        self.destruct_timer -= ctx.dt;
        self.destruct_timer < 0.0
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Claim the nearest available crate of `resource` and head for it.
    fn seek_crate(&mut self, resource: Resource, root: &Transform, ctx: &mut UpdateContext<'_>) -> bool {
        let here = root.translation;
        let nearest = ctx
            .others
            .available_crates(resource)
            .map(|(e, c)| (e.id(), e.position(), c.pickup_distance()))
            .min_by(|a, b| {
                a.1.distance_squared(here)
                    .total_cmp(&b.1.distance_squared(here))
            });
        let Some((crate_id, position, reach)) = nearest else {
            return false;
        };

        let cooldown = ctx.config.pickup.claim_cooldown;
        if let Some(claimed) = ctx.others.get_mut(crate_id).and_then(Entity::as_crate_mut) {
            claimed.claim(cooldown);
        }
        self.claimed_crate = Some(crate_id);
        self.target_point = position;
        self.arrival_radius = reach * 0.5;
        true
    }

    /// Keep the turret on the movement target while driving.
    fn track_target(&mut self, root: &Transform, ctx: &UpdateContext<'_>) {
        let cfg = &ctx.config.tank;
        let rate = self.stats.turret_turn_speed * cfg.aim_turn_multiplier;
        self.turn_turret_towards(root, self.target_point, rate, ctx.dt, cfg.aim_stop_degrees);
    }

    /// Head for a random point in the arena.
    fn wander(&mut self, root: &Transform, ctx: &mut UpdateContext<'_>) {
        let r = ctx.config.arena.wander_radius;
        let mut point = random_spread(ctx.rng, Vec3::new(r, 0.0, r));
        point.y = root.translation.y;
        self.target_point = point;
    }

    /// Turn toward and drive at `target_point`, braking to stop on it.
    /// Returns `true` once stopped inside the arrival radius.
    fn move_tank(&mut self, root: &mut Transform, turn_rate: f32, dt: f32) -> bool {
        let offset = flat(self.target_point - root.translation);
        let distance = offset.length();

        if distance > self.arrival_radius {
            let direction = offset / distance;
            let facing = flat(root.forward()).normalize_or_zero();
            let step = turn_rate * dt;
            if facing.dot(direction) < step.cos() {
                let sign = if root.right().dot(direction) > 0.0 { 1.0 } else { -1.0 };
                root.rotate_local_y(sign * step);
            } else {
                root.face_flat(self.target_point);
            }
        }

        let accel = self.stats.acceleration;
        let braking_distance = 0.5 * self.speed * self.speed / accel;
        if distance - self.arrival_radius > braking_distance {
            self.speed = (self.speed + accel * dt).min(self.stats.max_speed);
            false
        } else {
            self.speed -= accel * dt;
            if self.speed < 0.0 {
                self.speed = 0.0;
                return true;
            }
            false
        }
    }

    /// Rotate the turret toward `point`, snapping onto it once within
    /// `stop_degrees`. Returns `true` when facing the point.
    fn turn_turret_towards(
        &mut self,
        root: &Transform,
        point: Vec3,
        rate: f32,
        dt: f32,
        stop_degrees: f32,
    ) -> bool {
        let (position, rotation) = self.turret_frame(root);
        let to_point = flat(point - position);
        if to_point.length_squared() <= f32::EPSILON {
            return true;
        }
        let facing = flat(rotation * Vec3::Z);
        let angle = facing.angle_between(to_point);
        if angle.to_degrees() > stop_degrees {
            let sign = if (rotation * Vec3::X).dot(to_point) > 0.0 { 1.0 } else { -1.0 };
            self.turret.rotate_local_y(sign * (rate * dt).min(angle));
            false
        } else {
            if let Some(yaw) = yaw_towards(position, point) {
                self.turret.rotation = root.rotation.inverse() * Quat::from_rotation_y(yaw);
            }
            true
        }
    }

    fn track_with_camera(&mut self, root: &Transform, cfg: &TankConfig) {
        let eye = root.translation - flat(root.forward()) * cfg.chase_camera_distance
            + Vec3::Y * cfg.chase_camera_height;
        self.chase_camera = Transform::from_translation(eye).looking_at(root.translation, Vec3::Y);
    }
}

/// Project onto the ground plane.
fn flat(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn stats() -> TankStats {
        TankStats {
            max_speed: 20.0,
            acceleration: 10.0,
            turn_speed: 2.0,
            turret_turn_speed: 1.0,
            max_hp: 200,
            shell_damage: 20,
        }
    }

    fn tank() -> Tank {
        let cfg = SimConfig::default();
        Tank::new(
            stats(),
            TankSpawn::new(Team::A, vec![Vec3::new(0.0, 0.0, 50.0)]),
            &Transform::IDENTITY,
            &cfg.tank,
        )
    }

    #[test]
    fn new_tank_is_inactive_and_full() {
        let t = tank();
        assert_eq!(t.state(), TankState::Inactive);
        assert_eq!(t.hp(), 200);
        assert_eq!(t.shells_available(), 10);
        assert_eq!(t.shells_fired(), 0);
        assert!(t.is_alive());
    }

    #[test]
    fn restore_health_clamps_to_max() {
        let mut t = tank();
        t.set_hp(150);
        assert_eq!(t.restore_health(100), 50);
        assert_eq!(t.hp(), 200);
        assert_eq!(t.restore_health(10), 0);
    }

    #[test]
    fn restore_shells_clamps_to_capacity() {
        let mut t = tank();
        t.set_shells(8);
        assert_eq!(t.restore_shells(5), 2);
        assert_eq!(t.shells_available(), 10);
        t.set_shells(99);
        assert_eq!(t.shells_available(), 10);
    }

    #[test]
    fn set_hp_cannot_kill_or_overheal() {
        let mut t = tank();
        t.set_hp(0);
        assert_eq!(t.hp(), 1);
        t.set_hp(1000);
        assert_eq!(t.hp(), 200);
    }

    #[test]
    fn move_tank_accelerates_then_arrives() {
        let mut t = tank();
        let mut root = Transform::IDENTITY;
        t.target_point = Vec3::new(0.0, 0.0, 30.0);
        let mut arrived = false;
        for _ in 0..2000 {
            if t.move_tank(&mut root, 2.0, 0.01) {
                arrived = true;
                break;
            }
            assert!(t.speed() <= 20.0);
            root.move_local_z(t.speed() * 0.01);
        }
        assert!(arrived);
        assert_eq!(t.speed(), 0.0);
        assert!(root.translation.distance(t.target_point) < 6.0);
    }

    #[test]
    fn move_tank_turns_toward_target() {
        let mut t = tank();
        let mut root = Transform::IDENTITY;
        t.target_point = Vec3::new(50.0, 0.0, 0.0);
        for _ in 0..200 {
            t.move_tank(&mut root, 2.0, 0.01);
        }
        assert!(root.forward().dot(Vec3::X) > 0.99);
    }

    #[test]
    fn turret_snaps_when_close() {
        let mut t = tank();
        let root = Transform::IDENTITY;
        let target = Vec3::new(0.2, 0.0, 100.0);
        assert!(t.turn_turret_towards(&root, target, 1.0, 0.016, 1.0));
        let (_, rotation) = t.turret_frame(&root);
        let facing = rotation * Vec3::Z;
        assert!(facing.normalize().cross(target.normalize()).length() < 1e-4);
    }

    #[test]
    fn turret_turns_right_for_targets_on_the_right() {
        let mut t = tank();
        let root = Transform::IDENTITY;
        assert!(!t.turn_turret_towards(&root, Vec3::new(100.0, 0.0, 0.0), 1.0, 0.1, 1.0));
        let (_, rotation) = t.turret_frame(&root);
        assert!((rotation * Vec3::Z).x > 0.0);
    }

    #[test]
    fn chase_camera_sits_behind_and_above() {
        let t = tank();
        let cam = t.chase_camera().translation;
        assert!((cam - Vec3::new(0.0, 5.0, -20.0)).length() < 0.001);
    }

    #[test]
    fn team_names() {
        assert_eq!(Team::A.to_string(), "Team A");
        assert_eq!(Team::B.to_string(), "Team B");
        assert_eq!(Team::new(4).to_string(), "Team 4");
    }

    #[test]
    fn state_display_names() {
        assert_eq!(TankState::FindAmmo.to_string(), "Find Ammo");
        assert_eq!(TankState::FindHealth.display_name(), "Find Health");
    }
}
