//! # Entity IDs — Stable, Never Reused
//!
//! An [`EntityId`] is a plain `u32` handed out by a monotonic counter. Tanks
//! remember enemies, shells remember owners and messages remember senders, all
//! by id. Because ids are never recycled, a stale id can only miss:
//!
//! ```text
//! 1. Spawn tank       → EntityId(7)
//! 2. Shell stores owner = 7
//! 3. Tank destroyed   → get(7) == None from now on
//! 4. Next spawn       → EntityId(8), never 7
//! ```
//!
//! Id 0 is reserved for [`EntityId::SYSTEM`], the sender used by input and GUI
//! code, and is never allocated.
//!
//! ## Comparison
//!
//! Generational indices (hecs, bevy_ecs) recycle slots and detect staleness
//! with a generation counter. A single counter is enough here: entity counts
//! are small and a `u32` will not wrap during a level.

use std::fmt;

use serde::Serialize;

/// Identifier of one entity for its whole lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Sender identity for messages that come from outside the simulation.
    pub const SYSTEM: Self = Self(0);

    /// Wrap a raw value. Only useful for tests and diagnostics; ids normally
    /// come from the manager.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn is_system(self) -> bool {
        self == Self::SYSTEM
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_system() {
            write!(f, "EntityId(system)")
        } else {
            write!(f, "EntityId({})", self.0)
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out ids in increasing order, starting at 1.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut alloc = IdAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_eq!(alloc.peek().raw(), 3);
    }

    #[test]
    fn never_hands_out_system() {
        let mut alloc = IdAllocator::new();
        for _ in 0..100 {
            assert!(!alloc.allocate().is_system());
        }
    }

    #[test]
    fn display_and_debug() {
        let id = EntityId::from_raw(12);
        assert_eq!(format!("{id}"), "#12");
        assert_eq!(format!("{id:?}"), "EntityId(12)");
        assert_eq!(format!("{:?}", EntityId::SYSTEM), "EntityId(system)");
    }
}
