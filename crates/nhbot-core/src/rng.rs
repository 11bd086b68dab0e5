//! Random number generation for the bot
//!
//! Uses a seeded ChaCha RNG so a whole session can be replayed from its seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Bot random number generator
///
/// Every random choice the bot makes (exploration, typed names, eat slot)
/// is drawn from one of these, owned by the caller and passed in.
#[derive(Debug, Clone)]
pub struct BotRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl BotRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a new RNG with a random seed
    pub fn from_entropy() -> Self {
        let seed = rand::random();
        Self::new(seed)
    }

    /// Get the seed used to create this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns 0..n-1, or 0 if n is 0.
    pub fn rn2(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Choose a random element from a slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.rn2(items.len() as u32) as usize])
        }
    }
}

impl Default for BotRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rn2_bounds() {
        let mut rng = BotRng::new(42);
        for _ in 0..1000 {
            assert!(rng.rn2(10) < 10);
        }
        assert_eq!(rng.rn2(0), 0);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = BotRng::new(7);
        let mut b = BotRng::new(7);
        let xs: Vec<u32> = (0..32).map(|_| a.rn2(1000)).collect();
        let ys: Vec<u32> = (0..32).map(|_| b.rn2(1000)).collect();
        assert_eq!(xs, ys);
        assert_eq!(a.seed(), 7);
    }

    #[test]
    fn test_choose() {
        let mut rng = BotRng::new(3);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        let items = [b'a', b'b', b'c'];
        for _ in 0..50 {
            assert!(items.contains(rng.choose(&items).unwrap()));
        }
    }
}
