//! # Simulation — One Running Battle
//!
//! [`Simulation`] bundles the services a battle needs into a single value:
//! the [`EntityManager`], the [`Messenger`], the RNG and the [`SimClock`].
//! Nothing is global; two simulations can run side by side.
//!
//! ```ignore
//! let mut sim = Simulation::new(SimConfig::default());
//! LevelData::from_file("levels/skirmish.json")?.spawn_into(&mut sim)?;
//! sim.start_all();
//! while sim.winning_team().is_none() {
//!     sim.step(1.0 / 60.0);
//! }
//! ```
//!
//! The control surface for an input or GUI layer (start/stop, orders, repairs,
//! picking) lives in [`control`](crate::control).

use fastrand::Rng;

use crate::config::SimConfig;
use crate::entity::{EntityId, Team};
use crate::manager::{EntityManager, EntityView};
use crate::messenger::Messenger;
use crate::time::SimClock;

pub struct Simulation {
    pub manager: EntityManager,
    pub messenger: Messenger,
    pub clock: SimClock,
    pub(crate) rng: Rng,
    winner: Option<Team>,
}

impl Simulation {
    /// A simulation with no templates or entities. The RNG is seeded from
    /// `config.seed` when set.
    pub fn new(config: SimConfig) -> Self {
        let rng = config.seed.map_or_else(Rng::new, Rng::with_seed);
        Self {
            manager: EntityManager::with_config(config),
            messenger: Messenger::new(),
            clock: SimClock::new(),
            rng,
            winner: None,
        }
    }

    pub fn config(&self) -> &SimConfig {
        self.manager.config()
    }

    /// Advance every entity by `dt` seconds. Returns the ids removed during
    /// the frame.
    pub fn step(&mut self, dt: f32) -> Vec<EntityId> {
        self.clock.advance(dt);
        let dt = self.clock.delta_secs();
        let destroyed = self
            .manager
            .update_all(dt, &mut self.messenger, &mut self.rng);

        let winner = self.manager.winning_team();
        if winner != self.winner {
            if let Some(team) = winner {
                log::info!(
                    "{team} wins after {:.1}s ({} tank(s) left)",
                    self.clock.elapsed_secs(),
                    self.manager.team_count(team)
                );
            }
            self.winner = winner;
        }
        destroyed
    }

    /// The only team with living tanks, if any.
    pub fn winning_team(&self) -> Option<Team> {
        self.manager.winning_team()
    }

    /// Remove an entity and drop its mailbox.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        self.messenger.discard(id);
        self.manager.destroy_entity(id)
    }

    /// Remove every entity and template and forget queued messages. The
    /// clock and RNG keep running.
    pub fn clear(&mut self) {
        self.manager.destroy_all_entities();
        self.manager.destroy_all_templates();
        self.messenger.clear();
        self.winner = None;
    }
}
