//! Bounded insertion-ordered knowledge caches.
//!
//! The engine keeps three of these (market patterns, strategy performance,
//! risk factors). Inserting a new key at capacity evicts exactly the
//! oldest-inserted entry; updating an existing key leaves the order alone.
//! They feed status reporting only and are never consulted by propagation.

use std::collections::VecDeque;
use std::time::SystemTime;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::StrategyCandidate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundedCache<V> {
    capacity: usize,
    map: HashMap<String, V>,
    order: VecDeque<String>,
}

impl<V> BoundedCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.map.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    /// Insert or update. A new key at capacity evicts the oldest-inserted
    /// entry first; an existing key is updated in place.
    pub fn insert(&mut self, key: String, value: V) {
        if self.capacity == 0 {
            return;
        }
        if !self.map.contains_key(&key) {
            if self.map.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.map.remove(&oldest);
                }
            }
            self.order.push_back(key.clone());
        }
        self.map.insert(key, value);
    }

    /// Fetch a value, inserting `make()` first when the key is new (with
    /// the same eviction rule as [`insert`](Self::insert)). Returns `None`
    /// only for a zero-capacity cache.
    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> V) -> Option<&mut V> {
        if !self.map.contains_key(key) {
            if self.capacity == 0 {
                return None;
            }
            self.insert(key.to_string(), make());
        }
        self.map.get_mut(key)
    }

    /// Keys in insertion order, oldest first.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }
}

/// How often a (symbol, 24h-change-bucket) pair has been seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternStat {
    pub first_seen: SystemTime,
    pub count: u32,
    pub performance: f32,
}

/// A candidate strategy that scored well in simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub candidate: StrategyCandidate,
    pub score: f32,
    pub created: SystemTime,
}

/// An asset flagged for an outsized 24h swing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub swing_pct: f32,
    pub observed: SystemTime,
}
