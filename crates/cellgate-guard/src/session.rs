//! Per-subscriber session contexts and the fixed-capacity pool.
//!
//! A context is allocated on the first event for a subscriber,
//! retained across events, and released only on an explicit detach.
//! The pool never allocates after construction.

use cellgate_core::{SubscriberId, Timestamp};

use crate::fsm::GateState;
use crate::permit::DowngradePermit;

/// Mutable per-subscriber state for the downgrade guard.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub(crate) subscriber: SubscriberId,
    pub(crate) current_state: GateState,
    pub(crate) previous_state: GateState,
    pub(crate) cached_permit: Option<DowngradePermit>,
    pub(crate) has_permit: bool,
    pub(crate) permit_expiry: Timestamp,
    pub(crate) state_entry_time: Timestamp,
    pub(crate) in_emergency: bool,
    pub(crate) emergency_number: u32,
    pub(crate) permit_failures: u32,
    pub(crate) attach_failures: u32,
    pub(crate) transition_count: u32,
}

impl SessionContext {
    /// Fresh context in the initial state.
    #[must_use]
    pub fn new(subscriber: SubscriberId) -> Self {
        Self {
            subscriber,
            current_state: GateState::Init,
            previous_state: GateState::Init,
            cached_permit: None,
            has_permit: false,
            permit_expiry: Timestamp::default(),
            state_entry_time: Timestamp::default(),
            in_emergency: false,
            emergency_number: 0,
            permit_failures: 0,
            attach_failures: 0,
            transition_count: 0,
        }
    }

    /// Subscriber this context belongs to.
    #[must_use]
    pub fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    /// Current machine state.
    #[must_use]
    pub fn state(&self) -> GateState {
        self.current_state
    }

    /// Whether a validated permit is held.
    #[must_use]
    pub fn has_permit(&self) -> bool {
        self.has_permit
    }

    /// Whether an emergency call is in progress.
    #[must_use]
    pub fn in_emergency(&self) -> bool {
        self.in_emergency
    }

    /// Transitions taken by this context so far.
    #[must_use]
    pub fn transition_count(&self) -> u32 {
        self.transition_count
    }

    /// Failed permit validations so far.
    #[must_use]
    pub fn permit_failures(&self) -> u32 {
        self.permit_failures
    }

    /// Failed attach attempts so far.
    #[must_use]
    pub fn attach_failures(&self) -> u32 {
        self.attach_failures
    }
}

/// Fixed-capacity pool of session contexts with linear lookup.
pub struct SessionPool {
    slots: Vec<Option<SessionContext>>,
}

impl SessionPool {
    /// Creates a pool with `capacity` context slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Total slot capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of allocated contexts.
    #[must_use]
    pub fn active(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Borrows the context for a subscriber, if allocated.
    #[must_use]
    pub fn get(&self, subscriber: SubscriberId) -> Option<&SessionContext> {
        self.slots
            .iter()
            .flatten()
            .find(|ctx| ctx.subscriber == subscriber)
    }

    /// Finds the context for a subscriber, allocating a fresh one in
    /// the first free slot if none exists. Returns `None` only when
    /// the pool is exhausted.
    pub fn get_or_allocate(&mut self, subscriber: SubscriberId) -> Option<&mut SessionContext> {
        let position = self
            .slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|ctx| ctx.subscriber == subscriber));
        if let Some(index) = position {
            return self.slots[index].as_mut();
        }

        let free = self.slots.iter().position(Option::is_none)?;
        self.slots[free] = Some(SessionContext::new(subscriber));
        self.slots[free].as_mut()
    }

    /// Releases a subscriber's context. Returns `true` if one existed.
    pub fn release(&mut self, subscriber: SubscriberId) -> bool {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|ctx| ctx.subscriber == subscriber) {
                *slot = None;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_on_first_use() {
        let mut pool = SessionPool::new(2);
        assert_eq!(pool.active(), 0);

        let ctx = pool.get_or_allocate(SubscriberId::new(1)).unwrap();
        assert_eq!(ctx.state(), GateState::Init);
        assert_eq!(pool.active(), 1);
    }

    #[test]
    fn test_lookup_returns_same_context() {
        let mut pool = SessionPool::new(2);
        pool.get_or_allocate(SubscriberId::new(1))
            .unwrap()
            .attach_failures = 2;

        let ctx = pool.get_or_allocate(SubscriberId::new(1)).unwrap();
        assert_eq!(ctx.attach_failures(), 2);
        assert_eq!(pool.active(), 1);
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let mut pool = SessionPool::new(2);
        assert!(pool.get_or_allocate(SubscriberId::new(1)).is_some());
        assert!(pool.get_or_allocate(SubscriberId::new(2)).is_some());
        assert!(pool.get_or_allocate(SubscriberId::new(3)).is_none());
        // Existing subscribers still resolve
        assert!(pool.get_or_allocate(SubscriberId::new(2)).is_some());
    }

    #[test]
    fn test_release_frees_slot() {
        let mut pool = SessionPool::new(1);
        assert!(pool.get_or_allocate(SubscriberId::new(1)).is_some());
        assert!(pool.release(SubscriberId::new(1)));
        assert!(!pool.release(SubscriberId::new(1)));
        assert!(pool.get_or_allocate(SubscriberId::new(2)).is_some());
    }
}
