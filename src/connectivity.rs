//! Sparse directed weighted connectivity between neurons.
//!
//! Storage is row-major adjacency plus a column index of predecessor ids.
//! The matrix is applied as `out[i] = sum_j w(i,j) * v[j]`, while the
//! plasticity rule walks the *column* of a spiking neuron to find its
//! predecessors. Both reads are O(degree).

use serde::{Deserialize, Serialize};

use crate::prng::Prng;

pub type NeuronId = usize;

/// One stored entry `(row, target) -> weight`. Zero weights are never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Synapse {
    pub target: u32,
    pub weight: f32,
}

#[derive(Debug, Clone)]
pub struct Connectivity {
    // rows[i] holds the entries of matrix row i.
    rows: Vec<Vec<Synapse>>,
    // sources[j] holds every row id with a nonzero entry in column j.
    sources: Vec<Vec<u32>>,
}

impl Connectivity {
    /// Random sparse wiring: every neuron gets `per_neuron` distinct entries
    /// toward other neurons (no self-loops) with weights uniform in
    /// [-0.3, 0.3].
    pub fn random(neuron_count: usize, per_neuron: usize, rng: &mut Prng) -> Self {
        let mut rows: Vec<Vec<Synapse>> = Vec::with_capacity(neuron_count);
        for i in 0..neuron_count {
            let targets = rng.sample_distinct(neuron_count, per_neuron, i);
            let mut row = Vec::with_capacity(targets.len());
            for j in targets {
                row.push(Synapse {
                    target: j as u32,
                    weight: rng.gen_range_f32(-0.3, 0.3),
                });
            }
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    /// Rebuild from plain rows (used by the state image loader).
    pub fn from_rows(rows: Vec<Vec<Synapse>>) -> Self {
        let n = rows.len();
        let mut store = Self {
            rows,
            sources: vec![Vec::new(); n],
        };
        store.rebuild_sources();
        store
    }

    pub fn neuron_count(&self) -> usize {
        self.rows.len()
    }

    pub fn edge_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    pub fn rows(&self) -> &[Vec<Synapse>] {
        &self.rows
    }

    pub fn get(&self, i: NeuronId, j: NeuronId) -> f32 {
        self.rows[i]
            .iter()
            .find(|s| s.target as usize == j)
            .map(|s| s.weight)
            .unwrap_or(0.0)
    }

    /// Insert, update, or (with `weight == 0.0`) remove a single entry.
    pub fn set(&mut self, i: NeuronId, j: NeuronId, weight: f32) {
        let row = &mut self.rows[i];
        match row.iter_mut().find(|s| s.target as usize == j) {
            Some(existing) => {
                if weight == 0.0 {
                    row.retain(|s| s.target as usize != j);
                    self.sources[j].retain(|&src| src as usize != i);
                } else {
                    existing.weight = weight;
                }
            }
            None => {
                if weight != 0.0 {
                    row.push(Synapse {
                        target: j as u32,
                        weight,
                    });
                    self.sources[j].push(i as u32);
                }
            }
        }
    }

    /// Add `delta` to an existing entry, clamping to [-1, 1].
    /// Does nothing if the entry is absent; removes it if the sum lands on
    /// exactly zero (zero weights are never stored).
    pub fn bump(&mut self, i: NeuronId, j: NeuronId, delta: f32) {
        let Some(existing) = self.rows[i].iter_mut().find(|s| s.target as usize == j) else {
            return;
        };
        let next = (existing.weight + delta).clamp(-1.0, 1.0);
        if next == 0.0 {
            self.rows[i].retain(|s| s.target as usize != j);
            self.sources[j].retain(|&src| src as usize != i);
        } else {
            existing.weight = next;
        }
    }

    /// Predecessor row ids of column `j` (rows with a nonzero entry there).
    pub fn neighbors_in(&self, j: NeuronId) -> &[u32] {
        &self.sources[j]
    }

    /// Sparse matrix-vector product: `out[i] = sum_j w(i,j) * v[j]`.
    #[cfg(not(feature = "parallel"))]
    pub fn apply(&self, v: &[f32]) -> Vec<f32> {
        self.rows.iter().map(|row| row_sum(row, v)).collect()
    }

    /// Sparse matrix-vector product: `out[i] = sum_j w(i,j) * v[j]`.
    #[cfg(feature = "parallel")]
    pub fn apply(&self, v: &[f32]) -> Vec<f32> {
        use rayon::prelude::*;
        self.rows.par_iter().map(|row| row_sum(row, v)).collect()
    }

    /// Drop every entry with `|weight| < eps` and return how many went.
    pub fn prune_below(&mut self, eps: f32) -> usize {
        let mut removed = 0;
        for row in &mut self.rows {
            let before = row.len();
            row.retain(|s| s.weight.abs() >= eps);
            removed += before - row.len();
        }
        if removed > 0 {
            self.rebuild_sources();
        }
        removed
    }

    fn rebuild_sources(&mut self) {
        for col in &mut self.sources {
            col.clear();
        }
        for (i, row) in self.rows.iter().enumerate() {
            for s in row {
                self.sources[s.target as usize].push(i as u32);
            }
        }
    }
}

#[inline]
fn row_sum(row: &[Synapse], v: &[f32]) -> f32 {
    row.iter().map(|s| s.weight * v[s.target as usize]).sum()
}
