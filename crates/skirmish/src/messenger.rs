//! # Messenger — Mailboxes Between Entities
//!
//! Entities never call each other. A tank that wants help posts a
//! [`Message`] to a teammate's mailbox; the teammate reads it the next time its
//! own update runs.
//!
//! ```text
//!   sender ──send(to, msg)──▶ queues[to]: [m1, m2, m3] ──fetch(to)──▶ recipient
//! ```
//!
//! Delivery is FIFO per recipient. Ordering across different recipients
//! follows the manager's iteration order and is otherwise unspecified. A
//! message sent earlier in a frame is visible to any recipient that updates
//! later in the same frame, including the sender reading its own queue.

use std::collections::{HashMap, VecDeque};

use crate::entity::EntityId;

/// What a message asks the recipient to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageKind {
    /// Leave `Inactive` and start patrolling.
    Start,
    /// Go `Inactive`.
    Stop,
    /// Take this much damage.
    Hit(u32),
    Patrol,
    Evade,
    /// A teammate is in trouble at the sender's position.
    Help,
}

/// A message in flight. Plain data, copied into the recipient's queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Message {
    /// Sending entity, or [`EntityId::SYSTEM`] for input and GUI orders.
    pub from: EntityId,
    pub kind: MessageKind,
}

impl Message {
    pub fn new(from: EntityId, kind: MessageKind) -> Self {
        Self { from, kind }
    }

    /// A message on behalf of the outside world.
    pub fn system(kind: MessageKind) -> Self {
        Self::new(EntityId::SYSTEM, kind)
    }
}

/// Per-recipient FIFO queues.
#[derive(Debug, Default)]
pub struct Messenger {
    queues: HashMap<EntityId, VecDeque<Message>>,
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the recipient's queue. Always succeeds; a queue for
    /// an id that never updates just sits there until [`discard`](Self::discard).
    pub fn send(&mut self, to: EntityId, message: Message) {
        self.queues.entry(to).or_default().push_back(message);
    }

    /// Pop the oldest message for `to`.
    pub fn fetch(&mut self, to: EntityId) -> Option<Message> {
        let queue = self.queues.get_mut(&to)?;
        let message = queue.pop_front();
        if queue.is_empty() {
            self.queues.remove(&to);
        }
        message
    }

    /// Number of messages waiting for `to`.
    pub fn pending(&self, to: EntityId) -> usize {
        self.queues.get(&to).map_or(0, VecDeque::len)
    }

    /// Drop everything queued for `to`. Returns how many messages were dropped.
    pub fn discard(&mut self, to: EntityId) -> usize {
        self.queues.remove(&to).map_or(0, |q| q.len())
    }

    pub fn clear(&mut self) {
        self.queues.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> EntityId {
        EntityId::from_raw(n)
    }

    #[test]
    fn fifo_per_recipient() {
        let mut m = Messenger::new();
        m.send(id(1), Message::system(MessageKind::Start));
        m.send(id(1), Message::system(MessageKind::Hit(20)));
        m.send(id(1), Message::system(MessageKind::Stop));

        assert_eq!(m.fetch(id(1)).unwrap().kind, MessageKind::Start);
        assert_eq!(m.fetch(id(1)).unwrap().kind, MessageKind::Hit(20));
        assert_eq!(m.fetch(id(1)).unwrap().kind, MessageKind::Stop);
        assert!(m.fetch(id(1)).is_none());
    }

    #[test]
    fn recipients_are_independent() {
        let mut m = Messenger::new();
        m.send(id(1), Message::new(id(2), MessageKind::Help));
        m.send(id(2), Message::system(MessageKind::Evade));

        let to_two = m.fetch(id(2)).unwrap();
        assert_eq!(to_two.kind, MessageKind::Evade);
        assert_eq!(to_two.from, EntityId::SYSTEM);
        assert_eq!(m.pending(id(1)), 1);
        assert_eq!(m.fetch(id(1)).unwrap().from, id(2));
    }

    #[test]
    fn fetch_on_empty_is_none() {
        let mut m = Messenger::new();
        assert!(m.fetch(id(9)).is_none());
        assert_eq!(m.pending(id(9)), 0);
    }

    #[test]
    fn unknown_recipient_accumulates_until_discarded() {
        let mut m = Messenger::new();
        m.send(id(404), Message::system(MessageKind::Patrol));
        m.send(id(404), Message::system(MessageKind::Patrol));
        assert_eq!(m.pending(id(404)), 2);
        assert_eq!(m.discard(id(404)), 2);
        assert_eq!(m.pending(id(404)), 0);
    }
}
