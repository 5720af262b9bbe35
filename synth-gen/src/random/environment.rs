//! Environment and background randomization.

use super::sample_range;
use crate::{common::*, config::RandomizationConfig};

/// Per-channel multiplicative jitter applied to the sampled brightness.
const CHANNEL_JITTER: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct EnvironmentRandomizer {
    config: RandomizationConfig,
}

impl EnvironmentRandomizer {
    pub fn new(config: RandomizationConfig) -> Self {
        Self { config }
    }

    /// Sample a background color: uniform brightness with independent
    /// +/-5% channel jitter, clamped to the configured brightness maximum.
    /// Alpha is fixed at 1.0.
    pub fn sample_background(&self, rng: &mut StdRng) -> [f64; 4] {
        let brightness = sample_range(rng, self.config.background_brightness_range);
        let max = self.config.background_brightness_range.1.raw();

        let mut channel = || {
            let jitter = rng.gen_range(1.0 - CHANNEL_JITTER..=1.0 + CHANNEL_JITTER);
            (brightness * jitter).clamp(0.0, max)
        };

        [channel(), channel(), channel(), 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_stay_within_the_brightness_bound() {
        let config = RandomizationConfig::default();
        let randomizer = EnvironmentRandomizer::new(config.clone());
        let mut rng = StdRng::seed_from_u64(11);

        let max = config.background_brightness_range.1.raw();
        for _ in 0..128 {
            let [r, g, b, a] = randomizer.sample_background(&mut rng);
            for channel in [r, g, b] {
                assert!((0.0..=max).contains(&channel));
            }
            assert_eq!(a, 1.0);
        }
    }
}
