use glam::Vec2;
use log::trace;

use std::collections::HashMap;

use crate::types::BodyId;

/// Canonical unordered pair key: smaller id first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(pub BodyId, pub BodyId);

impl PairKey {
    #[inline]
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

/// Accumulated resting velocity one body keeps in a pair.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RestingBias {
    pub velocity: Vec2,
    pub angular_velocity: f32,
}

/// Persistent per-pair record used to warm-start the resting pass.
#[derive(Clone, Debug)]
pub struct RestingEntry {
    pub key: PairKey,
    lo: RestingBias,
    hi: RestingBias,
    /// Tick of the most recent contact.
    pub last_contact: u64,
}

impl RestingEntry {
    fn new(key: PairKey, tick: u64) -> Self {
        Self {
            key,
            lo: RestingBias::default(),
            hi: RestingBias::default(),
            last_contact: tick,
        }
    }

    /// Bias stored for `id`, which must be one of the pair's bodies.
    pub fn bias(&self, id: BodyId) -> RestingBias {
        if id == self.key.0 { self.lo } else { self.hi }
    }

    pub fn bias_mut(&mut self, id: BodyId) -> &mut RestingBias {
        debug_assert!(id == self.key.0 || id == self.key.1, "body {id:?} not in pair {:?}", self.key);
        if id == self.key.0 { &mut self.lo } else { &mut self.hi }
    }
}

/// Cross-tick store of resting biases, addressed only by `PairKey`.
#[derive(Clone, Debug, Default)]
pub struct ContactCache {
    entries: HashMap<PairKey, RestingEntry>,
}

impl ContactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record contact for `key` at `tick`, creating the entry on first contact.
    pub fn touch(&mut self, key: PairKey, tick: u64) -> &mut RestingEntry {
        let entry = self.entries.entry(key).or_insert_with(|| {
            trace!("resting cache: new entry {:?} at tick {}", key, tick);
            RestingEntry::new(key, tick)
        });
        entry.last_contact = tick;
        entry
    }

    pub fn get(&self, key: PairKey) -> Option<&RestingEntry> {
        self.entries.get(&key)
    }

    pub fn get_mut(&mut self, key: PairKey) -> Option<&mut RestingEntry> {
        self.entries.get_mut(&key)
    }

    /// Bias for `id` in pair `key`; zero when the pair has no entry.
    pub fn bias(&self, key: PairKey, id: BodyId) -> RestingBias {
        self.entries.get(&key).map(|e| e.bias(id)).unwrap_or_default()
    }

    /// Drop every entry idle for more than `window` ticks. Returns how many were removed.
    ///
    /// Each decision only looks at its own entry, so map order does not matter.
    pub fn evict(&mut self, tick: u64, window: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, e| {
            let keep = tick.saturating_sub(e.last_contact) <= window;
            if !keep {
                trace!("resting cache: evict {:?} (idle since tick {})", key, e.last_contact);
            }
            keep
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
