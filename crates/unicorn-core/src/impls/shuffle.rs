//! Deck shuffling with an injectable seed.

use std::sync::{Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Shared `StdRng`; seeded runs always produce the same order sequence.
#[derive(Debug)]
pub struct Shuffler {
    rng: Mutex<StdRng>,
}

impl Shuffler {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// `seed` when given, entropy otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    pub fn shuffle<T>(&self, items: &mut [T]) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        items.shuffle(&mut *rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_order() {
        let a = Shuffler::seeded(42);
        let b = Shuffler::seeded(42);
        let mut left: Vec<u32> = (0..20).collect();
        let mut right = left.clone();

        a.shuffle(&mut left);
        b.shuffle(&mut right);

        assert_eq!(left, right);
        let mut sorted = left.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }
}
