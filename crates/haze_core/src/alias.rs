//! Alias-method sampling of a discrete distribution.
//!
//! Builds a flat redirect table from an arbitrary non-negative weight array in
//! O(n), supporting O(1) sampling and O(1) exact-probability lookup. The table
//! layout is `#[repr(C)]` so it uploads directly as a structured GPU buffer
//! for the tracing kernel.

use bytemuck::{Pod, Zeroable};

/// One table unit: accept threshold plus the redirect index taken on reject.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct AliasEntry {
    /// Acceptance threshold in [0, 1] for this index.
    pub prob: f32,
    /// Index sampled when the threshold draw rejects.
    pub alias: u32,
}

/// An alias table over `n` weights, with its normalized PMF retained.
///
/// The alias entries alone cannot answer "what is the probability of index
/// i?", so the normalized PMF is kept alongside as the side channel the
/// kernel needs for Monte-Carlo weighting.
#[derive(Clone, Debug)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
    pmf: Vec<f32>,
}

impl AliasTable {
    /// Build the table from non-negative weights (need not sum to 1).
    ///
    /// Panics on an empty or all-zero weight array; callers must guard
    /// degenerate input (e.g. substitute a uniform distribution).
    pub fn build(weights: &[f32]) -> Self {
        let n = weights.len();
        assert!(n > 0, "alias table requires at least one weight");
        debug_assert!(weights.iter().all(|&w| w >= 0.0));

        let sum: f32 = weights.iter().sum();
        assert!(sum > 0.0, "alias table requires a positive weight sum");

        let pmf: Vec<f32> = weights.iter().map(|&w| w / sum).collect();

        // Scale to mean 1 and partition into under- and over-full indices.
        let scale = n as f32 / sum;
        let mut scaled: Vec<f32> = weights.iter().map(|&w| w * scale).collect();

        let mut small: Vec<u32> = Vec::new();
        let mut large: Vec<u32> = Vec::new();
        for (i, &s) in scaled.iter().enumerate() {
            if s < 1.0 {
                small.push(i as u32);
            } else {
                large.push(i as u32);
            }
        }

        let mut entries = vec![AliasEntry { prob: 0.0, alias: 0 }; n];

        while let Some(s) = small.pop() {
            let Some(l) = large.pop() else {
                // No over-full index left to pair with; hand s back so the
                // leftover pass below resolves it.
                small.push(s);
                break;
            };

            entries[s as usize] = AliasEntry {
                prob: scaled[s as usize],
                alias: l,
            };

            scaled[l as usize] -= 1.0 - scaled[s as usize];
            if scaled[l as usize] < 1.0 {
                small.push(l);
            } else {
                large.push(l);
            }
        }

        // Leftovers absorb residual floating-point error: threshold 1 means
        // the alias is never taken.
        for &i in large.iter().chain(small.iter()) {
            entries[i as usize] = AliasEntry { prob: 1.0, alias: i };
        }

        Self { entries, pmf }
    }

    /// Number of table units (equals the weight count).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sample an index from two uniform draws in [0, 1).
    pub fn sample(&self, u_index: f32, u_threshold: f32) -> usize {
        let n = self.entries.len();
        let i = ((u_index * n as f32) as usize).min(n - 1);
        let entry = self.entries[i];
        if u_threshold < entry.prob {
            i
        } else {
            entry.alias as usize
        }
    }

    /// Sample an index using an RNG (convenience over [`Self::sample`]).
    pub fn sample_with(&self, rng: &mut impl rand::Rng) -> usize {
        self.sample(rng.gen::<f32>(), rng.gen::<f32>())
    }

    /// Exact normalized probability of the given index.
    pub fn probability(&self, index: usize) -> f32 {
        self.pmf[index]
    }

    /// Table units, for GPU upload.
    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    /// The normalized PMF side channel, for GPU upload.
    pub fn probabilities(&self) -> &[f32] {
        &self.pmf
    }
}
