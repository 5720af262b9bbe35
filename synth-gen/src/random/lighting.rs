//! Lighting randomization.

use super::sample_range;
use crate::{
    backend::{LightKind, LightSpec},
    common::*,
    config::RandomizationConfig,
};

const LIGHT_KINDS: [LightKind; 3] = [LightKind::Point, LightKind::Directional, LightKind::Area];

/// Directional lights sit far away at a fixed distance.
const DIRECTIONAL_DISTANCE: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct LightingRandomizer {
    config: RandomizationConfig,
}

impl LightingRandomizer {
    pub fn new(config: RandomizationConfig) -> Self {
        Self { config }
    }

    /// Sample a randomized light rig of 2 to 4 lights.
    pub fn sample_lights(&self, rng: &mut StdRng) -> Vec<LightSpec> {
        let num_lights = rng.gen_range(2..=4);

        (0..num_lights)
            .map(|_| {
                let kind = LIGHT_KINDS[rng.gen_range(0..LIGHT_KINDS.len())];
                let energy = sample_range(rng, self.config.lighting_intensity_range);
                let distance = match kind {
                    LightKind::Directional => DIRECTIONAL_DISTANCE,
                    LightKind::Point | LightKind::Area => rng.gen_range(2.0..=5.0),
                };
                let azimuth = rng.gen_range(0.0..2.0 * PI);
                let elevation = rng.gen_range(PI / 6.0..=PI / 3.0);
                let location = DVec3::new(
                    distance * azimuth.cos() * elevation.sin(),
                    distance * azimuth.sin() * elevation.sin(),
                    distance * elevation.cos(),
                );
                let temperature = sample_range(rng, self.config.lighting_color_temp_range);

                LightSpec {
                    kind,
                    energy,
                    location,
                    color: kelvin_to_rgb(temperature),
                }
            })
            .collect()
    }
}

/// Convert a color temperature in Kelvin to an RGB tint.
///
/// Fixed linear approximation of the 3000K-6500K band, not an exact
/// blackbody curve.
pub fn kelvin_to_rgb(temperature: f64) -> [f64; 3] {
    if temperature <= 6500.0 {
        let r = 1.0;
        let g = ((temperature - 3000.0) / 3500.0).min(1.0);
        let b = ((temperature - 4000.0) / 2500.0).clamp(0.0, 1.0);
        [r, g, b]
    } else {
        let r = (1.0 - (temperature - 6500.0) / 3500.0).min(1.0);
        [r, 1.0, 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn kelvin_endpoints() {
        assert_abs_diff_eq!(kelvin_to_rgb(3000.0)[0], 1.0);
        assert_abs_diff_eq!(kelvin_to_rgb(3000.0)[1], 0.0);
        assert_abs_diff_eq!(kelvin_to_rgb(3000.0)[2], 0.0);

        assert_abs_diff_eq!(kelvin_to_rgb(6500.0)[0], 1.0);
        assert_abs_diff_eq!(kelvin_to_rgb(6500.0)[1], 1.0);
        assert_abs_diff_eq!(kelvin_to_rgb(6500.0)[2], 1.0);

        assert_abs_diff_eq!(kelvin_to_rgb(5000.0)[2], 0.4);
    }

    #[test]
    fn light_rig_respects_configured_ranges() {
        let config = RandomizationConfig::default();
        let randomizer = LightingRandomizer::new(config.clone());
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..32 {
            let lights = randomizer.sample_lights(&mut rng);
            assert!((2..=4).contains(&lights.len()));

            let (min, max) = config.lighting_intensity_range;
            for light in &lights {
                assert!(light.energy >= min.raw() && light.energy <= max.raw());
                assert!(light.location.z > 0.0);

                let distance = light.location.length();
                match light.kind {
                    LightKind::Directional => assert_abs_diff_eq!(distance, 10.0, epsilon = 1e-9),
                    LightKind::Point | LightKind::Area => {
                        assert!((2.0..=5.0).contains(&distance));
                    }
                }
            }
        }
    }
}
