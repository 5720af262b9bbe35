//! Material parameter randomization.

use crate::{common::*, config::RandomizationConfig};

/// Sampled per-object material perturbation. The backend clamps the
/// resulting parameters to valid ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialJitter {
    pub color_shift: [f64; 3],
    pub roughness_shift: f64,
}

#[derive(Debug, Clone)]
pub struct MaterialRandomizer {
    config: RandomizationConfig,
}

impl MaterialRandomizer {
    pub fn new(config: RandomizationConfig) -> Self {
        Self { config }
    }

    pub fn sample_jitter(&self, rng: &mut StdRng) -> MaterialJitter {
        let color = self.config.material_color_jitter.raw();
        let roughness = self.config.material_roughness_jitter.raw();

        let mut shift = |amplitude: f64| {
            if amplitude == 0.0 {
                0.0
            } else {
                rng.gen_range(-amplitude..=amplitude)
            }
        };

        MaterialJitter {
            color_shift: [shift(color), shift(color), shift(color)],
            roughness_shift: shift(roughness),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_stay_within_the_configured_amplitude() {
        let config = RandomizationConfig::default();
        let randomizer = MaterialRandomizer::new(config.clone());
        let mut rng = StdRng::seed_from_u64(5);

        let color = config.material_color_jitter.raw();
        let roughness = config.material_roughness_jitter.raw();
        for _ in 0..64 {
            let jitter = randomizer.sample_jitter(&mut rng);
            for shift in jitter.color_shift {
                assert!(shift.abs() <= color);
            }
            assert!(jitter.roughness_shift.abs() <= roughness);
        }
    }
}
