//! Deterministic-seeded emission order construction.
//!
//! The order is the sole driver of downstream processing: base identifiers
//! once, each noise identifier twice, shuffled in place under the caller's
//! seed. No other component re-derives ordering.

use rand::seq::SliceRandom;

use crate::dataset::IdentifierSpace;
use crate::rng::DeterministicRng;
use crate::types::RecordId;

/// Shuffled identifier sequence of length `N + 2M`, built once per run and
/// consumed once.
#[derive(Clone, Debug)]
pub struct EmissionOrder {
    ids: Vec<RecordId>,
}

impl EmissionOrder {
    /// Build the order for one merge run.
    ///
    /// `noise_ids` must be distinct; each is listed twice so the sign
    /// resolver can pair an insert with its delete. Only the count matters,
    /// adjacency is destroyed by the shuffle anyway.
    pub fn build(space: &IdentifierSpace, noise_ids: &[RecordId], seed: u64) -> Self {
        let mut ids = Vec::with_capacity(space.base_len() + 2 * noise_ids.len());
        ids.extend(space.ids());
        ids.extend_from_slice(noise_ids);
        ids.extend_from_slice(noise_ids);
        let mut rng = DeterministicRng::new(seed);
        ids.shuffle(&mut rng);
        Self { ids }
    }

    /// Total number of events.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when there is nothing to emit.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in emission order.
    pub fn iter(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.ids.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn space(len: usize) -> IdentifierSpace {
        IdentifierSpace::new(0, len)
    }

    #[test]
    fn length_is_base_plus_twice_noise() {
        let order = EmissionOrder::build(&space(5), &[5, 6], 42);
        assert_eq!(order.len(), 9);
    }

    #[test]
    fn every_base_id_once_and_every_noise_id_twice() {
        let noise: Vec<RecordId> = (10..20).collect();
        let order = EmissionOrder::build(&space(10), &noise, 42);
        let mut counts: HashMap<RecordId, usize> = HashMap::new();
        for id in order.iter() {
            *counts.entry(id).or_default() += 1;
        }
        for id in 0..10 {
            assert_eq!(counts.get(&id), Some(&1), "base id {id}");
        }
        for id in 10..20 {
            assert_eq!(counts.get(&id), Some(&2), "noise id {id}");
        }
        assert_eq!(counts.len(), 20);
    }

    #[test]
    fn same_seed_reproduces_the_order() {
        let noise: Vec<RecordId> = (64..96).collect();
        let a = EmissionOrder::build(&space(64), &noise, 7);
        let b = EmissionOrder::build(&space(64), &noise, 7);
        assert_eq!(a.ids, b.ids);
    }

    #[test]
    fn different_seed_changes_order_but_not_contents() {
        let noise: Vec<RecordId> = (64..96).collect();
        let a = EmissionOrder::build(&space(64), &noise, 7);
        let b = EmissionOrder::build(&space(64), &noise, 8);
        assert_ne!(a.ids, b.ids);
        let mut sa = a.ids.clone();
        let mut sb = b.ids.clone();
        sa.sort_unstable();
        sb.sort_unstable();
        assert_eq!(sa, sb);
    }

    #[test]
    fn one_based_base_uses_real_identifiers() {
        let order = EmissionOrder::build(&IdentifierSpace::new(1, 3), &[], 42);
        let mut ids: Vec<RecordId> = order.iter().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
