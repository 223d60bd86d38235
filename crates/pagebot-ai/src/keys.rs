// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Random selection among a page's API keys.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Picks one key uniformly at random from a comma-separated list.
///
/// The random source is injected so tests can pin the choice.
pub struct KeyRotator {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl Default for KeyRotator {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl std::fmt::Debug for KeyRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRotator").finish_non_exhaustive()
    }
}

impl KeyRotator {
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// Split `list` on commas, trim, drop empties, pick one.
    ///
    /// Returns `None` when the list holds no usable key.
    pub fn pick(&self, list: &str) -> Option<String> {
        let keys: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        match keys.len() {
            0 => None,
            1 => Some(keys[0].to_string()),
            n => {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                Some(keys[rng.gen_range(0..n)].to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use std::collections::HashSet;

    #[test]
    fn trims_and_drops_empty_entries() {
        let rotator = KeyRotator::default();
        assert_eq!(rotator.pick(" k1 ,, "), Some("k1".to_string()));
        assert_eq!(rotator.pick(" , ,"), None);
        assert_eq!(rotator.pick(""), None);
    }

    #[test]
    fn injected_rng_pins_the_choice() {
        let rotator = KeyRotator::with_rng(StepRng::new(0, 0));
        for _ in 0..5 {
            assert_eq!(rotator.pick("a, b, c"), Some("a".to_string()));
        }
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let first = KeyRotator::with_rng(StdRng::seed_from_u64(7));
        let second = KeyRotator::with_rng(StdRng::seed_from_u64(7));
        let a: Vec<_> = (0..10).map(|_| first.pick("a,b,c,d")).collect();
        let b: Vec<_> = (0..10).map(|_| second.pick("a,b,c,d")).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn every_key_is_reachable() {
        let rotator = KeyRotator::with_rng(StdRng::seed_from_u64(42));
        let seen: HashSet<_> = (0..200).filter_map(|_| rotator.pick("a,b,c")).collect();
        assert_eq!(seen.len(), 3);
    }
}
