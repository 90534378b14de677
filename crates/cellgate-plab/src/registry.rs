//! Fixed-capacity binding registry.
//!
//! Open-addressed table of (subscriber, fingerprint, timestamp)
//! bindings, indexed by subscriber id modulo capacity with bounded
//! linear probing. Storage is allocated once at construction; the hot
//! path never allocates.

use cellgate_core::{RegistryError, SubscriberId, Timestamp};
use cellgate_dsp::FingerprintHandle;

/// One enrolled binding.
#[derive(Debug, Clone)]
pub struct BindingEntry {
    /// Enrolled subscriber.
    pub subscriber: SubscriberId,
    /// Stored channel fingerprint.
    pub handle: FingerprintHandle,
    /// Enrolment (or last refresh) time.
    pub timestamp: Timestamp,
}

/// Registry occupancy summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Number of live bindings.
    pub count: usize,
    /// Raw-counter minimum over live binding timestamps, if any.
    pub oldest: Option<Timestamp>,
}

/// Open-addressed binding table with bounded probing.
///
/// Invariants: at most one live entry per subscriber id; every live
/// entry sits within `probe_limit` slots of its home index.
pub struct BindingRegistry {
    slots: Vec<Option<BindingEntry>>,
    probe_limit: usize,
    validity_window: u64,
    len: usize,
}

impl BindingRegistry {
    /// Creates a registry with the given capacity, probe limit, and
    /// binding validity window (in timestamp ticks).
    ///
    /// Capacity and probe limit are fixed for the registry's lifetime;
    /// the configuration layer validates them before construction.
    #[must_use]
    pub fn new(capacity: usize, probe_limit: usize, validity_window: u64) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            probe_limit,
            validity_window,
            len: 0,
        }
    }

    /// Number of live bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the registry holds no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total slot capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Configured binding validity window in ticks.
    #[must_use]
    pub fn validity_window(&self) -> u64 {
        self.validity_window
    }

    /// Whether an entry is still inside the validity window at `now`.
    #[must_use]
    pub fn is_fresh(&self, entry: &BindingEntry, now: Timestamp) -> bool {
        now.age_since(entry.timestamp) <= self.validity_window
    }

    fn home_index(&self, subscriber: SubscriberId) -> usize {
        (subscriber.raw() % self.slots.len() as u64) as usize
    }

    /// Finds the live binding for a subscriber, if enrolled.
    #[must_use]
    pub fn lookup(&self, subscriber: SubscriberId) -> Option<&BindingEntry> {
        let home = self.home_index(subscriber);
        for probe in 0..self.probe_limit {
            let index = (home + probe) % self.slots.len();
            if let Some(entry) = &self.slots[index] {
                if entry.subscriber == subscriber {
                    return Some(entry);
                }
            }
        }
        None
    }

    /// Inserts or refreshes a binding.
    ///
    /// The probe window is scanned for an existing entry for this
    /// subscriber before any free slot is taken; a free slot earlier
    /// in the window must not shadow a live entry later in it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Full`] when every slot in the probe
    /// window belongs to a different subscriber. The caller may
    /// [`expire`](Self::expire) and retry.
    pub fn upsert(
        &mut self,
        subscriber: SubscriberId,
        handle: FingerprintHandle,
        timestamp: Timestamp,
    ) -> Result<(), RegistryError> {
        let home = self.home_index(subscriber);
        let capacity = self.slots.len();

        let mut free_slot = None;
        let mut target = None;
        for probe in 0..self.probe_limit {
            let index = (home + probe) % capacity;
            match &self.slots[index] {
                Some(entry) if entry.subscriber == subscriber => {
                    target = Some(index);
                    break;
                }
                Some(_) => {}
                None => {
                    if free_slot.is_none() {
                        free_slot = Some(index);
                    }
                }
            }
        }

        let index = match target.or(free_slot) {
            Some(index) => index,
            None => {
                return Err(RegistryError::Full {
                    index: home,
                    probe_limit: self.probe_limit,
                })
            }
        };

        if self.slots[index].is_none() {
            self.len += 1;
        }
        self.slots[index] = Some(BindingEntry {
            subscriber,
            handle,
            timestamp,
        });
        Ok(())
    }

    /// Clears every binding whose modular age at `now` exceeds the
    /// validity window. Returns the number of bindings cleared.
    pub fn expire(&mut self, now: Timestamp) -> usize {
        let mut cleared = 0;
        for slot in &mut self.slots {
            let stale = slot
                .as_ref()
                .is_some_and(|entry| now.age_since(entry.timestamp) > self.validity_window);
            if stale {
                *slot = None;
                cleared += 1;
            }
        }
        self.len -= cleared;
        cleared
    }

    /// Occupancy summary: live-binding count and the raw-counter
    /// minimum timestamp.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let oldest = self
            .slots
            .iter()
            .flatten()
            .map(|entry| entry.timestamp)
            .min();
        RegistryStats {
            count: self.len,
            oldest,
        }
    }
}
