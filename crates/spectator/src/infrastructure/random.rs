//! Random source implementations.

use crate::ports::outbound::RandomProvider;

/// System random - uses the thread-local RNG.
#[derive(Clone, Default)]
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl RandomProvider for SystemRandom {
    fn random_range(&self, min: u64, max: u64) -> u64 {
        use rand::Rng;
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Fixed random for testing.
#[cfg(test)]
pub struct FixedRandom(pub u64);

#[cfg(test)]
impl RandomProvider for FixedRandom {
    fn random_range(&self, min: u64, max: u64) -> u64 {
        self.0.clamp(min, max.max(min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_random_stays_in_range() {
        let random = SystemRandom::new();
        for _ in 0..100 {
            let value = random.random_range(10, 20);
            assert!((10..=20).contains(&value));
        }
        assert_eq!(random.random_range(5, 5), 5);
        assert_eq!(random.random_range(9, 3), 9);
    }
}
