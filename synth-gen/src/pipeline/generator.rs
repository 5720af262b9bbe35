//! Main synthetic dataset generation pipeline.
//!
//! Each image attempt walks the sequence scene reset, object placement,
//! camera randomization, render, bbox projection, annotation emission.
//! Any gate can discard the attempt; discards are logged and counted but
//! never abort the split or the job.

use crate::{
    annotation::{accept_bbox, write_label_file, BoundingBox, BoxProjector},
    backend::{RenderBackend, RigidBodyKind},
    common::*,
    config::GenerationConfig,
    placement::{ClassRegistry, PlacementEngine},
    random::{CameraRandomizer, EnvironmentRandomizer, LightingRandomizer, MaterialRandomizer},
    utils,
};

const GROUND_PLANE_SIZE: f64 = 10.0;
const GROUND_PLANE_MASS: f64 = 1.0;
const CAMERA_FOCUS: DVec3 = glam::const_dvec3!([0.0, 0.0, 0.5]);
const WHITE_BACKGROUND: [f64; 4] = [1.0, 1.0, 1.0, 1.0];

/// The dataset splits, in generation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
    Val,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Test, Split::Val];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
            Split::Val => "val",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single image attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    Committed,
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    pub split: Split,
    pub requested: usize,
    pub committed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub splits: Vec<SplitSummary>,
}

impl GenerationSummary {
    pub fn total_requested(&self) -> usize {
        self.splits.iter().map(|split| split.requested).sum()
    }

    pub fn total_committed(&self) -> usize {
        self.splits.iter().map(|split| split.committed).sum()
    }
}

/// Number of images per split. Train and test truncate; val absorbs the
/// rounding so the three always sum to `total`.
pub fn split_counts(total: usize, (train, test, _): (R64, R64, R64)) -> (usize, usize, usize) {
    let train_count = (total as f64 * train.raw()) as usize;
    let test_count = (total as f64 * test.raw()) as usize;
    let val_count = total.saturating_sub(train_count + test_count);
    (train_count, test_count, val_count)
}

/// Drives the full generation pipeline against one backend instance.
#[derive(Debug)]
pub struct DatasetGenerator<B>
where
    B: RenderBackend,
{
    config: GenerationConfig,
    backend: B,
    rng: StdRng,
    model_files: Vec<PathBuf>,
    classes: ClassRegistry,
    placement: PlacementEngine,
    lighting: LightingRandomizer,
    camera: CameraRandomizer,
    environment: EnvironmentRandomizer,
    material: MaterialRandomizer,
    projector: BoxProjector,
}

impl<B> DatasetGenerator<B>
where
    B: RenderBackend,
{
    /// Validate the configuration, discover models, seed the generator, and
    /// prepare the output directory tree. Fails fast when the model
    /// directory yields no loadable assets.
    pub fn new(config: GenerationConfig, mut backend: B) -> Result<Self> {
        config.validate()?;

        let rng = match config.random_seed {
            Some(seed) => {
                info!("random seed set to {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        let model_files = utils::list_files(&config.model_dir, "**/*.glb")?;
        ensure!(
            !model_files.is_empty(),
            "no .glb files found in '{}'",
            config.model_dir.display()
        );
        info!("found {} 3D models", model_files.len());

        let [gx, gy, gz] = config.physics.gravity;
        backend.configure_physics(DVec3::new(gx.raw(), gy.raw(), gz.raw()), config.physics.substeps);
        backend.configure_render(&config.render);

        for split in Split::ALL {
            let split_dir = config.output_dir.join(split.as_str());
            utils::ensure_dir(&split_dir.join("images"))?;
            utils::ensure_dir(&split_dir.join("labels"))?;
        }

        let classes = ClassRegistry::new(config.annotation.class_names.iter().cloned());
        let placement = PlacementEngine::new(
            config.max_objects_per_scene,
            config.randomization.object_scale_range,
            config.physics.clone(),
        );
        let lighting = LightingRandomizer::new(config.randomization.clone());
        let camera = CameraRandomizer::new(config.randomization.clone());
        let environment = EnvironmentRandomizer::new(config.randomization.clone());
        let material = MaterialRandomizer::new(config.randomization.clone());
        let projector = BoxProjector::new(config.render.resolution);

        Ok(Self {
            config,
            backend,
            rng,
            model_files,
            classes,
            placement,
            lighting,
            camera,
            environment,
            material,
            projector,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn split_counts(&self) -> (usize, usize, usize) {
        split_counts(self.config.num_images, self.config.train_test_val_split)
    }

    /// Clear the scene and rebuild its fixed furniture: ground plane with
    /// a passive collider, a randomized light rig, and the background.
    fn reset_scene(&mut self) {
        self.backend.reset_scene();

        let plane = self.backend.add_plane(GROUND_PLANE_SIZE, DVec3::ZERO);
        self.backend.apply_rigid_body(
            plane,
            RigidBodyKind::Passive,
            GROUND_PLANE_MASS,
            self.config.physics.friction.raw(),
            self.config.physics.restitution.raw(),
        );

        for light in self.lighting.sample_lights(&mut self.rng) {
            self.backend.add_light(&light);
        }

        let background = if self.config.randomization.randomize_background {
            self.environment.sample_background(&mut self.rng)
        } else {
            WHITE_BACKGROUND
        };
        self.backend.set_background(background);
    }

    /// Run one image attempt through the pipeline gates.
    pub fn generate_single_image(&mut self, image_path: &Path, label_path: &Path) -> ImageOutcome {
        self.reset_scene();

        let placed = self.placement.place_objects(
            &mut self.backend,
            &self.model_files,
            &mut self.classes,
            &mut self.rng,
        );
        if placed.is_empty() {
            warn!("no objects placed, skipping image");
            return ImageOutcome::Discarded;
        }

        for obj in &placed {
            let jitter = self.material.sample_jitter(&mut self.rng);
            self.backend
                .jitter_material(obj.handle, jitter.color_shift, jitter.roughness_shift);
        }

        let view = self.camera.sample_view(&mut self.rng, CAMERA_FOCUS);
        view.apply(&mut self.backend);

        match self.backend.render(image_path) {
            Ok(true) => {}
            Ok(false) => {
                warn!("render failed for '{}'", image_path.display());
                return ImageOutcome::Discarded;
            }
            Err(err) => {
                warn!("render failed for '{}': {:#}", image_path.display(), err);
                return ImageOutcome::Discarded;
            }
        }

        let annotations: Vec<(usize, BoundingBox)> = placed
            .iter()
            .filter_map(|obj| {
                let bbox = self.projector.project(&self.backend, obj.handle)?;
                accept_bbox(&bbox, &self.config.annotation).then(|| (obj.class_id, bbox))
            })
            .collect();

        if annotations.is_empty() {
            warn!("no valid annotations, skipping image");
            if !self.config.keep_discarded_images {
                if let Err(err) = fs::remove_file(image_path) {
                    warn!(
                        "failed to remove discarded image '{}': {}",
                        image_path.display(),
                        err
                    );
                }
            }
            return ImageOutcome::Discarded;
        }

        if let Err(err) = write_label_file(label_path, &annotations) {
            warn!(
                "failed to write label file '{}': {:#}",
                label_path.display(),
                err
            );
            return ImageOutcome::Discarded;
        }

        ImageOutcome::Committed
    }

    /// Generate exactly `num_images` attempts for a split. Failed attempts
    /// are not retried; the shortfall shows up in the summary only.
    pub fn generate_split(&mut self, split: Split, num_images: usize) -> SplitSummary {
        info!("generating {} images for {} split", num_images, split);

        let split_dir = self.config.output_dir.join(split.as_str());
        let images_dir = split_dir.join("images");
        let labels_dir = split_dir.join("labels");
        let extension = self.config.render.file_format.extension();

        let mut committed = 0;
        for index in 0..num_images {
            let image_path = images_dir.join(format!("{}_{:06}.{}", split, index, extension));
            let label_path = labels_dir.join(format!("{}_{:06}.txt", split, index));

            if self.generate_single_image(&image_path, &label_path) == ImageOutcome::Committed {
                committed += 1;
            }
        }

        info!(
            "generated {}/{} images for {} split",
            committed, num_images, split
        );
        SplitSummary {
            split,
            requested: num_images,
            committed,
        }
    }

    /// Generate the complete dataset and persist the effective config and
    /// class list at the output root.
    pub fn generate(mut self) -> Result<GenerationSummary> {
        info!("starting synthetic dataset generation");

        let (train_count, test_count, val_count) = self.split_counts();
        info!(
            "dataset split: train={}, test={}, val={}",
            train_count, test_count, val_count
        );

        let summary = GenerationSummary {
            splits: vec![
                self.generate_split(Split::Train, train_count),
                self.generate_split(Split::Test, test_count),
                self.generate_split(Split::Val, val_count),
            ],
        };

        let mut effective = self.config.clone();
        effective.annotation.class_names = self.classes.to_vec();
        effective.save(self.config.output_dir.join("config.yaml"))?;
        self.classes.save(&self.config.output_dir.join("classes.txt"))?;

        info!(
            "dataset generation complete: {}",
            self.config.output_dir.display()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn val_absorbs_the_rounding() {
        assert_eq!(split_counts(10, (r64(0.8), r64(0.1), r64(0.1))), (8, 1, 1));
        assert_eq!(split_counts(7, (r64(0.7), r64(0.2), r64(0.1))), (4, 1, 2));
        assert_eq!(split_counts(0, (r64(0.8), r64(0.1), r64(0.1))), (0, 0, 0));
        assert_eq!(split_counts(5, (r64(1.0), r64(0.0), r64(0.0))), (5, 0, 0));
    }

    #[test]
    fn counts_always_sum_to_total() {
        let ratios = [
            (r64(0.8), r64(0.1), r64(0.1)),
            (r64(0.6), r64(0.2), r64(0.2)),
            (r64(0.34), r64(0.33), r64(0.33)),
            (r64(0.0), r64(0.0), r64(1.0)),
        ];
        for total in 0..257 {
            for ratio in ratios {
                let (train, test, val) = split_counts(total, ratio);
                assert_eq!(train + test + val, total);
            }
        }
    }
}
