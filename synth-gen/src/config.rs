//! Generation job configuration format.
//!
//! The on-disk representation is YAML mapping directly onto
//! [`GenerationConfig`]; unknown fields and out-of-range values are rejected
//! when the file is opened, before any generation work starts.

use crate::common::*;

pub use annotation::*;
pub use physics::*;
pub use randomization::*;
pub use render::*;

/// The main generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Directory containing 3D models (`.glb` files), searched recursively.
    pub model_dir: PathBuf,
    /// Output directory for the generated dataset.
    pub output_dir: PathBuf,
    /// Total number of images to generate across all splits.
    #[serde(default = "default_num_images")]
    pub num_images: usize,
    /// Dataset split ratios (train, test, val); must sum to 1.0.
    #[serde(default = "default_split")]
    pub train_test_val_split: (R64, R64, R64),
    /// Maximum number of objects per scene.
    #[serde(default = "default_max_objects")]
    pub max_objects_per_scene: usize,
    /// Random seed for reproducibility. Unset means a fresh entropy seed.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Keep rendered images of attempts that were discarded after rendering.
    #[serde(default = "default_true")]
    pub keep_discarded_images: bool,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub randomization: RandomizationConfig,
    #[serde(default)]
    pub annotation: AnnotationConfig,
}

impl GenerationConfig {
    /// Load and validate a configuration from a YAML file.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration with default parameters for the given
    /// model/output directories.
    pub fn with_dirs(model_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            output_dir: output_dir.into(),
            num_images: default_num_images(),
            train_test_val_split: default_split(),
            max_objects_per_scene: default_max_objects(),
            random_seed: None,
            keep_discarded_images: true,
            physics: PhysicsConfig::default(),
            render: RenderConfig::default(),
            randomization: RandomizationConfig::default(),
            annotation: AnnotationConfig::default(),
        }
    }

    /// Dump the configuration as YAML, creating parent directories on demand.
    pub fn save<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_yaml::to_string(self)?;
        fs::write(path, text)
            .with_context(|| format!("failed to write config file '{}'", path.display()))?;
        Ok(())
    }

    /// Reject invalid configurations before any generation work.
    pub fn validate(&self) -> Result<()> {
        let (train, test, val) = self.train_test_val_split;
        ensure!(
            (train.raw() + test.raw() + val.raw() - 1.0).abs() < 1e-6,
            "train_test_val_split must sum to 1.0, got ({}, {}, {})",
            train,
            test,
            val
        );
        ensure!(
            [train, test, val].iter().all(|r| (0.0..=1.0).contains(&r.raw())),
            "split ratios must lie in [0, 1]"
        );
        ensure!(self.num_images >= 1, "num_images must be at least 1");
        ensure!(
            self.max_objects_per_scene >= 1,
            "max_objects_per_scene must be at least 1"
        );
        self.physics.validate()?;
        self.render.validate()?;
        self.randomization.validate()?;
        self.annotation.validate()?;
        Ok(())
    }
}

mod physics {
    use super::*;

    /// Physics simulation options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct PhysicsConfig {
        /// Gravity vector (x, y, z).
        #[serde(default = "default_gravity")]
        pub gravity: [R64; 3],
        /// Number of simulation frames before freezing object poses.
        #[serde(default = "default_simulation_steps")]
        pub simulation_steps: u32,
        /// Substeps per frame for accuracy.
        #[serde(default = "default_substeps")]
        pub substeps: u32,
        /// Friction coefficient for the ground plane and dropped objects.
        #[serde(default = "default_friction")]
        pub friction: R64,
        /// Bounciness of dropped objects.
        #[serde(default = "default_restitution")]
        pub restitution: R64,
    }

    impl PhysicsConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(self.simulation_steps >= 1, "simulation_steps must be at least 1");
            ensure!(self.substeps >= 1, "substeps must be at least 1");
            ensure!(
                (0.0..=1.0).contains(&self.friction.raw()),
                "friction must lie in [0, 1]"
            );
            ensure!(
                (0.0..=1.0).contains(&self.restitution.raw()),
                "restitution must lie in [0, 1]"
            );
            Ok(())
        }
    }

    impl Default for PhysicsConfig {
        fn default() -> Self {
            Self {
                gravity: default_gravity(),
                simulation_steps: default_simulation_steps(),
                substeps: default_substeps(),
                friction: default_friction(),
                restitution: default_restitution(),
            }
        }
    }

    fn default_gravity() -> [R64; 3] {
        [r64(0.0), r64(0.0), r64(-9.81)]
    }

    fn default_simulation_steps() -> u32 {
        120
    }

    fn default_substeps() -> u32 {
        10
    }

    fn default_friction() -> R64 {
        r64(0.5)
    }

    fn default_restitution() -> R64 {
        r64(0.3)
    }
}

mod render {
    use super::*;

    /// Rendering options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RenderConfig {
        /// Render engine selection.
        #[serde(default)]
        pub engine: RenderEngine,
        /// Number of render samples.
        #[serde(default = "default_samples")]
        pub samples: u32,
        /// Use GPU acceleration if available.
        #[serde(default = "default_true")]
        pub use_gpu: bool,
        /// Image resolution (width, height).
        #[serde(default = "default_resolution")]
        pub resolution: (u32, u32),
        /// Output image format.
        #[serde(default)]
        pub file_format: ImageFileFormat,
        /// Image quality for JPEG output.
        #[serde(default = "default_quality")]
        pub quality: u8,
    }

    /// The render engine variants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum RenderEngine {
        #[serde(rename = "CYCLES")]
        Cycles,
        #[serde(rename = "EEVEE")]
        Eevee,
    }

    /// Output image file formats.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum ImageFileFormat {
        #[serde(rename = "JPEG")]
        Jpeg,
        #[serde(rename = "PNG")]
        Png,
    }

    impl ImageFileFormat {
        pub fn extension(&self) -> &'static str {
            match self {
                Self::Jpeg => "jpg",
                Self::Png => "png",
            }
        }
    }

    impl RenderConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(self.samples >= 1, "samples must be at least 1");
            ensure!(self.quality <= 100, "quality must lie in [0, 100]");
            let (width, height) = self.resolution;
            ensure!(width >= 1 && height >= 1, "resolution must be at least 1x1");
            Ok(())
        }
    }

    impl Default for RenderConfig {
        fn default() -> Self {
            Self {
                engine: RenderEngine::default(),
                samples: default_samples(),
                use_gpu: true,
                resolution: default_resolution(),
                file_format: ImageFileFormat::default(),
                quality: default_quality(),
            }
        }
    }

    impl Default for RenderEngine {
        fn default() -> Self {
            Self::Cycles
        }
    }

    impl Default for ImageFileFormat {
        fn default() -> Self {
            Self::Jpeg
        }
    }

    fn default_samples() -> u32 {
        128
    }

    fn default_resolution() -> (u32, u32) {
        (1920, 1080)
    }

    fn default_quality() -> u8 {
        95
    }
}

mod randomization {
    use super::*;

    /// Domain randomization ranges. All ranges are closed intervals sampled
    /// uniformly, inclusive of both bounds.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RandomizationConfig {
        /// Light intensity range.
        #[serde(default = "default_lighting_intensity_range")]
        pub lighting_intensity_range: (R64, R64),
        /// Light color temperature range in Kelvin.
        #[serde(default = "default_lighting_color_temp_range")]
        pub lighting_color_temp_range: (R64, R64),
        /// Camera distance range from the focus point.
        #[serde(default = "default_camera_distance_range")]
        pub camera_distance_range: (R64, R64),
        /// Camera elevation offset range in degrees.
        #[serde(default = "default_camera_angle_range")]
        pub camera_angle_range: (R64, R64),
        /// Object scale randomization range.
        #[serde(default = "default_object_scale_range")]
        pub object_scale_range: (R64, R64),
        /// Background brightness range.
        #[serde(default = "default_background_brightness_range")]
        pub background_brightness_range: (R64, R64),
        /// Replace the default white background with a sampled one.
        #[serde(default)]
        pub randomize_background: bool,
        /// Per-channel material base color jitter amplitude.
        #[serde(default = "default_material_color_jitter")]
        pub material_color_jitter: R64,
        /// Material roughness jitter amplitude.
        #[serde(default = "default_material_roughness_jitter")]
        pub material_roughness_jitter: R64,
    }

    impl RandomizationConfig {
        pub fn validate(&self) -> Result<()> {
            ensure_range("lighting_intensity_range", self.lighting_intensity_range)?;
            ensure_range("lighting_color_temp_range", self.lighting_color_temp_range)?;
            ensure_range("camera_distance_range", self.camera_distance_range)?;
            ensure_range("camera_angle_range", self.camera_angle_range)?;
            ensure_range("object_scale_range", self.object_scale_range)?;
            ensure_range(
                "background_brightness_range",
                self.background_brightness_range,
            )?;
            ensure!(
                (0.0..=1.0).contains(&self.material_color_jitter.raw()),
                "material_color_jitter must lie in [0, 1]"
            );
            ensure!(
                (0.0..=1.0).contains(&self.material_roughness_jitter.raw()),
                "material_roughness_jitter must lie in [0, 1]"
            );
            Ok(())
        }
    }

    impl Default for RandomizationConfig {
        fn default() -> Self {
            Self {
                lighting_intensity_range: default_lighting_intensity_range(),
                lighting_color_temp_range: default_lighting_color_temp_range(),
                camera_distance_range: default_camera_distance_range(),
                camera_angle_range: default_camera_angle_range(),
                object_scale_range: default_object_scale_range(),
                background_brightness_range: default_background_brightness_range(),
                randomize_background: false,
                material_color_jitter: default_material_color_jitter(),
                material_roughness_jitter: default_material_roughness_jitter(),
            }
        }
    }

    fn ensure_range(name: &str, (min, max): (R64, R64)) -> Result<()> {
        ensure!(
            min <= max,
            "{}: range minimum {} exceeds maximum {}",
            name,
            min,
            max
        );
        Ok(())
    }

    fn default_lighting_intensity_range() -> (R64, R64) {
        (r64(500.0), r64(2000.0))
    }

    fn default_lighting_color_temp_range() -> (R64, R64) {
        (r64(3000.0), r64(6500.0))
    }

    fn default_camera_distance_range() -> (R64, R64) {
        (r64(0.5), r64(2.0))
    }

    fn default_camera_angle_range() -> (R64, R64) {
        (r64(-30.0), r64(30.0))
    }

    fn default_object_scale_range() -> (R64, R64) {
        (r64(0.8), r64(1.2))
    }

    fn default_background_brightness_range() -> (R64, R64) {
        (r64(0.7), r64(1.0))
    }

    fn default_material_color_jitter() -> R64 {
        r64(0.1)
    }

    fn default_material_roughness_jitter() -> R64 {
        r64(0.2)
    }
}

mod annotation {
    use super::*;

    /// Annotation emission options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct AnnotationConfig {
        /// Annotation output format.
        #[serde(default)]
        pub format: AnnotationFormat,
        /// Minimum object visibility to include.
        #[serde(default = "default_min_visibility")]
        pub min_visibility: R64,
        /// Minimum bounding box area in pixels.
        #[serde(default = "default_min_bbox_area")]
        pub min_bbox_area: u64,
        /// Seed list of class names; discovered classes append after these.
        #[serde(default)]
        pub class_names: Vec<String>,
    }

    /// Annotation format variants. Only YOLO emission is implemented; the
    /// other variants parse but are rejected at validation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum AnnotationFormat {
        #[serde(rename = "yolo")]
        Yolo,
        #[serde(rename = "coco")]
        Coco,
        #[serde(rename = "pascal_voc")]
        PascalVoc,
    }

    impl AnnotationConfig {
        pub fn validate(&self) -> Result<()> {
            ensure!(
                self.format == AnnotationFormat::Yolo,
                "only the 'yolo' annotation format is implemented"
            );
            ensure!(
                (0.0..=1.0).contains(&self.min_visibility.raw()),
                "min_visibility must lie in [0, 1]"
            );
            ensure!(self.min_bbox_area >= 1, "min_bbox_area must be at least 1");
            Ok(())
        }
    }

    impl Default for AnnotationConfig {
        fn default() -> Self {
            Self {
                format: AnnotationFormat::default(),
                min_visibility: default_min_visibility(),
                min_bbox_area: default_min_bbox_area(),
                class_names: vec![],
            }
        }
    }

    impl Default for AnnotationFormat {
        fn default() -> Self {
            Self::Yolo
        }
    }

    fn default_min_visibility() -> R64 {
        r64(0.3)
    }

    fn default_min_bbox_area() -> u64 {
        100
    }
}

fn default_num_images() -> usize {
    1000
}

fn default_split() -> (R64, R64, R64) {
    (r64(0.8), r64(0.1), r64(0.1))
}

fn default_max_objects() -> usize {
    3
}

fn default_true() -> bool {
    true
}
