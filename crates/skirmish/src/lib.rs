//! # Skirmish — Tank Battle Simulation Core
//!
//! Two teams of autonomous tanks patrol, spot, aim at and shoot each other,
//! fight over ammo and health crates, dodge mines and call teammates for help.
//! This crate is the simulation underneath: entity state machines, the
//! messenger that connects them, and the [`EntityManager`](manager::EntityManager)
//! that owns everything. Rendering and input live elsewhere and talk to the
//! core through read-only views and the control methods on
//! [`Simulation`](sim::Simulation).
//!
//! Start with `use skirmish::prelude::*`, load a level with
//! [`LevelData`](level::LevelData) and call [`Simulation::step`](sim::Simulation::step)
//! once per frame.

pub mod config;
pub mod control;
pub mod entity;
pub mod error;
pub mod level;
pub mod manager;
pub mod math;
pub mod messenger;
pub mod prelude;
pub mod raycast;
pub mod sim;
pub mod snapshot;
pub mod time;
