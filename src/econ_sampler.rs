// Epoch Activity Sampler
//
// Simulates the hourly selection of active and reserve mixes within one
// interval. Every epoch draws the active set, then the reserve set, by
// stake-weighted sampling without replacement over the nodes' sigma values.
// The per-node result is the fraction of epochs spent in each role.

use crate::econ_config::SamplerKind;
use crate::econ_error::{EconError, Result};
use crate::econ_interface::EpochRole;
use log::debug;
use rand::Rng;

/// Consecutive draws landing on an already selected node before the index is
/// rebuilt from the live weights (clears accumulated rounding residue)
const MAX_STALE_DRAWS: usize = 64;

// ============================================================================
// Selection Index
// ============================================================================

/// Weight structure supporting draw-by-cumulative-weight and removal
pub trait SelectionIndex: Clone {
    fn from_weights(weights: &[f64]) -> Self;

    /// Sum of the weights still in the index
    fn total(&self) -> f64;

    /// Node whose cumulative weight range contains `target`
    fn find(&self, target: f64) -> usize;

    /// Take a node out of the index (its weight becomes zero)
    fn remove(&mut self, index: usize);

    /// Recompute the structure from the live weights
    fn rebuild(&mut self);
}

/// Shrinking cumulative-sum array scanned linearly
#[derive(Debug, Clone)]
pub struct CumulativeScan {
    weights: Vec<f64>,
    cumul: Vec<f64>,
}

impl SelectionIndex for CumulativeScan {
    fn from_weights(weights: &[f64]) -> Self {
        let mut index = Self {
            weights: weights.to_vec(),
            cumul: Vec::with_capacity(weights.len()),
        };
        index.rebuild();
        index
    }

    fn total(&self) -> f64 {
        self.cumul.last().copied().unwrap_or(0.0)
    }

    fn find(&self, target: f64) -> usize {
        self.cumul
            .iter()
            .position(|&c| c >= target)
            .unwrap_or(self.cumul.len().saturating_sub(1))
    }

    fn remove(&mut self, index: usize) {
        let weight = self.weights[index];
        self.weights[index] = 0.0;
        for c in &mut self.cumul[index..] {
            *c -= weight;
        }
    }

    fn rebuild(&mut self) {
        self.cumul.clear();
        let mut cumul = 0.0;
        for &w in &self.weights {
            cumul += w;
            self.cumul.push(cumul);
        }
    }
}

/// Binary indexed (Fenwick) tree of weights, O(log n) draw and removal
#[derive(Debug, Clone)]
pub struct FenwickIndex {
    weights: Vec<f64>,
    tree: Vec<f64>,
}

impl FenwickIndex {
    fn add(&mut self, index: usize, delta: f64) {
        let mut i = index + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += i & i.wrapping_neg();
        }
    }
}

impl SelectionIndex for FenwickIndex {
    fn from_weights(weights: &[f64]) -> Self {
        let mut index = Self {
            weights: weights.to_vec(),
            tree: vec![0.0; weights.len() + 1],
        };
        index.rebuild();
        index
    }

    fn total(&self) -> f64 {
        let mut sum = 0.0;
        let mut i = self.weights.len();
        while i > 0 {
            sum += self.tree[i];
            i &= i - 1;
        }
        sum
    }

    fn find(&self, target: f64) -> usize {
        let n = self.weights.len();
        if n == 0 {
            return 0;
        }
        let mut pos = 0;
        let mut remaining = target;
        let mut step = 1usize << (usize::BITS - 1 - n.leading_zeros());
        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] <= remaining {
                pos = next;
                remaining -= self.tree[next];
            }
            step >>= 1;
        }
        pos.min(n - 1)
    }

    fn remove(&mut self, index: usize) {
        let weight = self.weights[index];
        self.weights[index] = 0.0;
        self.add(index, -weight);
    }

    fn rebuild(&mut self) {
        // linear-time construction
        let n = self.weights.len();
        self.tree.iter_mut().for_each(|t| *t = 0.0);
        for i in 1..=n {
            self.tree[i] += self.weights[i - 1];
            let parent = i + (i & i.wrapping_neg());
            if parent <= n {
                self.tree[parent] += self.tree[i];
            }
        }
    }
}

// ============================================================================
// Sampler
// ============================================================================

/// Per-node fractions of epochs spent active and in reserve
#[derive(Debug, Clone, Default)]
pub struct ActivityShares {
    pub active: Vec<f64>,
    pub reserve: Vec<f64>,
}

/// Role of every node in one epoch
#[derive(Debug, Clone)]
pub struct EpochAssignment {
    pub roles: Vec<EpochRole>,
}

impl EpochAssignment {
    pub fn count(&self, role: EpochRole) -> usize {
        self.roles.iter().filter(|&&r| r == role).count()
    }
}

/// Stake-weighted active/reserve selection for one interval's nodes
pub struct EpochSampler {
    weights: Vec<f64>,
    active_slots: usize,
    reserve_slots: usize,
    kind: SamplerKind,
}

impl EpochSampler {
    /// # Arguments
    /// * `weights` - sigma of every node, indexed by serial
    /// * `active_slots` - layers * mixnet width
    /// * `reserve_slots` - k minus active slots
    pub fn new(weights: Vec<f64>, active_slots: usize, reserve_slots: usize, kind: SamplerKind) -> Result<Self> {
        let selectable = weights.iter().filter(|&&w| w > 0.0).count();
        if active_slots + reserve_slots > selectable {
            return Err(EconError::invalid(format!(
                "{} active + {} reserve slots exceed {} nodes with positive stake",
                active_slots, reserve_slots, selectable
            )));
        }
        Ok(Self {
            weights,
            active_slots,
            reserve_slots,
            kind,
        })
    }

    /// Sample `epochs` epochs and aggregate per-node role fractions
    pub fn run<R: Rng>(&self, epochs: usize, rng: &mut R) -> ActivityShares {
        match self.kind {
            SamplerKind::Fenwick => self.run_with(&FenwickIndex::from_weights(&self.weights), epochs, rng),
            SamplerKind::CumulativeScan => self.run_with(&CumulativeScan::from_weights(&self.weights), epochs, rng),
        }
    }

    /// Draw a single epoch's active and reserve sets
    pub fn sample_epoch<R: Rng>(&self, rng: &mut R) -> EpochAssignment {
        match self.kind {
            SamplerKind::Fenwick => self.epoch_with(&FenwickIndex::from_weights(&self.weights), rng),
            SamplerKind::CumulativeScan => self.epoch_with(&CumulativeScan::from_weights(&self.weights), rng),
        }
    }

    fn run_with<I: SelectionIndex, R: Rng>(&self, base: &I, epochs: usize, rng: &mut R) -> ActivityShares {
        let n = self.weights.len();
        let mut active_counts = vec![0usize; n];
        let mut reserve_counts = vec![0usize; n];

        for _ in 0..epochs {
            let assignment = self.epoch_with(base, rng);
            for (i, role) in assignment.roles.iter().enumerate() {
                match role {
                    EpochRole::Active => active_counts[i] += 1,
                    EpochRole::Reserve => reserve_counts[i] += 1,
                    EpochRole::Unselected => {}
                }
            }
        }

        debug!(
            "sampled {} epochs over {} nodes ({} active, {} reserve slots)",
            epochs, n, self.active_slots, self.reserve_slots
        );

        let epochs = epochs.max(1) as f64;
        ActivityShares {
            active: active_counts.iter().map(|&c| c as f64 / epochs).collect(),
            reserve: reserve_counts.iter().map(|&c| c as f64 / epochs).collect(),
        }
    }

    fn epoch_with<I: SelectionIndex, R: Rng>(&self, base: &I, rng: &mut R) -> EpochAssignment {
        let mut index = base.clone();
        let mut roles = vec![EpochRole::Unselected; self.weights.len()];

        // active set first, the reserve set from the remaining weight mass
        select_into(&mut index, self.active_slots, EpochRole::Active, &mut roles, rng);
        select_into(&mut index, self.reserve_slots, EpochRole::Reserve, &mut roles, rng);

        EpochAssignment { roles }
    }
}

/// Weighted sampling without replacement of `target` nodes into `role`
fn select_into<I: SelectionIndex, R: Rng>(
    index: &mut I,
    target: usize,
    role: EpochRole,
    roles: &mut [EpochRole],
    rng: &mut R,
) -> usize {
    let mut selected = 0;
    let mut stale = 0;

    while selected < target {
        let total = index.total();
        if total <= 0.0 {
            break;
        }

        let r = rng.gen::<f64>() * total;
        let candidate = index.find(r);

        if roles[candidate] != EpochRole::Unselected {
            stale += 1;
            if stale >= MAX_STALE_DRAWS {
                index.rebuild();
                stale = 0;
            }
            continue;
        }

        roles[candidate] = role;
        index.remove(candidate);
        selected += 1;
        stale = 0;
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn weights(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_fenwick_matches_cumulative_scan() {
        let w = vec![0.5, 0.0, 2.0, 1.5, 3.0, 0.25];
        let mut fenwick = FenwickIndex::from_weights(&w);
        let mut scan = CumulativeScan::from_weights(&w);
        assert!((fenwick.total() - scan.total()).abs() < 1e-12);

        for target in [0.1, 0.6, 2.49, 2.51, 3.9, 6.9, 7.2] {
            assert_eq!(fenwick.find(target), scan.find(target), "target {}", target);
        }

        fenwick.remove(2);
        scan.remove(2);
        assert!((fenwick.total() - 5.25).abs() < 1e-12);
        assert!((scan.total() - 5.25).abs() < 1e-12);
        for target in [0.1, 0.6, 1.9, 2.1, 4.9] {
            assert_ne!(fenwick.find(target), 2);
            assert_eq!(fenwick.find(target), scan.find(target), "target {}", target);
        }
    }

    #[test]
    fn test_fenwick_skips_zero_weights() {
        let index = FenwickIndex::from_weights(&[0.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(index.find(0.0), 2);
        assert_eq!(index.find(0.99), 2);
        assert_eq!(index.find(1.0), 4);
    }

    #[test]
    fn test_epoch_sets_disjoint_and_full() {
        let mut rng = StdRng::seed_from_u64(42);
        for kind in [SamplerKind::Fenwick, SamplerKind::CumulativeScan] {
            let sampler = EpochSampler::new(weights(40), 10, 15, kind).unwrap();
            for _ in 0..50 {
                let epoch = sampler.sample_epoch(&mut rng);
                assert_eq!(epoch.count(EpochRole::Active), 10);
                assert_eq!(epoch.count(EpochRole::Reserve), 15);
                assert_eq!(epoch.count(EpochRole::Unselected), 15);
            }
        }
    }

    #[test]
    fn test_fractions_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let sampler = EpochSampler::new(weights(30), 6, 9, SamplerKind::Fenwick).unwrap();
        let shares = sampler.run(200, &mut rng);

        for i in 0..30 {
            assert!(shares.active[i] + shares.reserve[i] <= 1.0 + 1e-12);
        }
        let active_total: f64 = shares.active.iter().sum();
        let reserve_total: f64 = shares.reserve.iter().sum();
        assert!((active_total - 6.0).abs() < 1e-9);
        assert!((reserve_total - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_heavier_nodes_selected_more_often() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut w = vec![1.0; 20];
        w[0] = 10.0;
        let sampler = EpochSampler::new(w, 2, 0, SamplerKind::Fenwick).unwrap();
        let shares = sampler.run(2000, &mut rng);
        let light_avg: f64 = shares.active[1..].iter().sum::<f64>() / 19.0;
        assert!(shares.active[0] > 3.0 * light_avg);
    }

    #[test]
    fn test_all_nodes_selected_when_slots_match() {
        let mut rng = StdRng::seed_from_u64(11);
        let sampler = EpochSampler::new(weights(12), 5, 7, SamplerKind::CumulativeScan).unwrap();
        let shares = sampler.run(30, &mut rng);
        for i in 0..12 {
            assert!((shares.active[i] + shares.reserve[i] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_too_many_slots_rejected() {
        let result = EpochSampler::new(vec![1.0, 1.0, 0.0], 2, 1, SamplerKind::Fenwick);
        assert!(result.is_err());
    }
}
