//! Camera randomization.

use super::sample_range;
use crate::{backend::CameraView, common::*, config::RandomizationConfig};

/// 50mm base lens with a +/-10mm jitter.
const BASE_FOCAL_LENGTH_MM: f64 = 50.0;
const FOCAL_JITTER_MM: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct CameraRandomizer {
    config: RandomizationConfig,
}

impl CameraRandomizer {
    pub fn new(config: RandomizationConfig) -> Self {
        Self { config }
    }

    /// Sample a camera pose orbiting the focus point.
    pub fn sample_view(&self, rng: &mut StdRng, focus: DVec3) -> CameraView {
        let distance = sample_range(rng, self.config.camera_distance_range);
        let azimuth = rng.gen_range(0.0..2.0 * PI);

        // elevation offset range is configured in degrees around pi/4
        let (angle_min, angle_max) = self.config.camera_angle_range;
        let elevation = rng.gen_range(
            (PI / 4.0 + angle_min.raw().to_radians())..=(PI / 4.0 + angle_max.raw().to_radians()),
        );

        let location = focus
            + DVec3::new(
                distance * azimuth.cos() * elevation.sin(),
                distance * azimuth.sin() * elevation.sin(),
                distance * elevation.cos(),
            );

        let focal_length =
            BASE_FOCAL_LENGTH_MM + rng.gen_range(-FOCAL_JITTER_MM..=FOCAL_JITTER_MM);

        CameraView {
            location,
            look_at: focus,
            focal_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sampled_views_orbit_the_focus_point() {
        let config = RandomizationConfig::default();
        let randomizer = CameraRandomizer::new(config.clone());
        let mut rng = StdRng::seed_from_u64(42);
        let focus = DVec3::new(0.0, 0.0, 0.5);

        let (min, max) = config.camera_distance_range;
        for _ in 0..64 {
            let view = randomizer.sample_view(&mut rng, focus);
            assert_eq!(view.look_at, focus);

            let distance = (view.location - focus).length();
            assert!(distance >= min.raw() - 1e-9 && distance <= max.raw() + 1e-9);
            assert!((40.0..=60.0).contains(&view.focal_length));
            assert!(view.location.z > focus.z);
        }
    }

    #[test]
    fn identical_seeds_sample_identical_views() {
        let randomizer = CameraRandomizer::new(RandomizationConfig::default());
        let focus = DVec3::ZERO;

        let mut first = StdRng::seed_from_u64(3);
        let mut second = StdRng::seed_from_u64(3);
        let lhs = randomizer.sample_view(&mut first, focus);
        let rhs = randomizer.sample_view(&mut second, focus);

        assert_abs_diff_eq!(lhs.location.x, rhs.location.x);
        assert_abs_diff_eq!(lhs.location.y, rhs.location.y);
        assert_abs_diff_eq!(lhs.focal_length, rhs.focal_length);
    }
}
